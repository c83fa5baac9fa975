use mapsync_core::{ActiveLocation, FlyTo, LocationFeature, MapEngine, MarkerId};
use std::io::Write;

/// A map engine that prints every instruction as one line.
pub struct ConsoleMap<W> {
    out: W,
}

impl<W: Write> ConsoleMap<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    fn line(&mut self, args: std::fmt::Arguments<'_>) {
        if let Err(e) = writeln!(self.out, "{args}") {
            tracing::warn!(error = %e, "console map output failed");
        }
    }
}

impl<W: Write> MapEngine for ConsoleMap<W> {
    fn fly_to(&mut self, camera: &FlyTo) {
        self.line(format_args!(
            "map: fly to {} (zoom {}, speed {}, {} ms)",
            camera.center, camera.zoom, camera.speed, camera.duration_ms
        ));
    }

    fn attach_marker(&mut self, marker: MarkerId, feature: &LocationFeature) {
        self.line(format_args!(
            "map: marker #{} at {} ({})",
            marker.0,
            feature.coordinate,
            feature.label()
        ));
    }

    fn detach_marker(&mut self, marker: MarkerId) {
        self.line(format_args!("map: remove marker #{}", marker.0));
    }

    fn show_popup(&mut self, active: &ActiveLocation) {
        self.line(format_args!(
            "map: popup on #{}: {}",
            active.marker.0,
            active.feature.label()
        ));
    }

    fn hide_popup(&mut self) {
        self.line(format_args!("map: hide popup"));
    }
}
