// crates/mapsync-core/src/map.rs
use crate::markers::{ActiveLocation, MarkerId};
use crate::model::{FlyTo, LocationFeature};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// The map rendering engine, as far as this crate is concerned.
///
/// All calls are synchronous to make and may settle later; the engine never
/// waits for an animation to finish. Hosts wire marker DOM events back in as
/// [`crate::markers::MarkerEvent`]s.
pub trait MapEngine {
    fn fly_to(&mut self, camera: &FlyTo);
    fn attach_marker(&mut self, marker: MarkerId, feature: &LocationFeature);
    fn detach_marker(&mut self, marker: MarkerId);
    fn show_popup(&mut self, active: &ActiveLocation);
    fn hide_popup(&mut self);
}

/// One call made on a [`RecordingMap`].
#[derive(Debug, Clone, PartialEq)]
pub enum MapCall {
    FlyTo(FlyTo),
    Attach(MarkerId, String),
    Detach(MarkerId),
    ShowPopup(MarkerId),
    HidePopup,
}

/// A map engine that only remembers what it was asked to do.
#[derive(Debug, Clone, Default)]
pub struct RecordingMap {
    pub calls: Vec<MapCall>,
}

impl RecordingMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn camera_moves(&self) -> Vec<FlyTo> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                MapCall::FlyTo(f) => Some(*f),
                _ => None,
            })
            .collect()
    }

    /// Markers currently attached, in attach order.
    pub fn attached(&self) -> Vec<MarkerId> {
        let mut live = Vec::new();
        for call in &self.calls {
            match call {
                MapCall::Attach(id, _) => live.push(*id),
                MapCall::Detach(id) => live.retain(|m| m != id),
                _ => {}
            }
        }
        live
    }

    /// The marker whose popup is showing, if any.
    pub fn popup(&self) -> Option<MarkerId> {
        self.calls.iter().fold(None, |open, call| match call {
            MapCall::ShowPopup(id) => Some(*id),
            MapCall::HidePopup => None,
            _ => open,
        })
    }
}

impl MapEngine for RecordingMap {
    fn fly_to(&mut self, camera: &FlyTo) {
        self.calls.push(MapCall::FlyTo(*camera));
    }

    fn attach_marker(&mut self, marker: MarkerId, feature: &LocationFeature) {
        self.calls.push(MapCall::Attach(marker, feature.id.clone()));
    }

    fn detach_marker(&mut self, marker: MarkerId) {
        self.calls.push(MapCall::Detach(marker));
    }

    fn show_popup(&mut self, active: &ActiveLocation) {
        self.calls.push(MapCall::ShowPopup(active.marker));
    }

    fn hide_popup(&mut self) {
        self.calls.push(MapCall::HidePopup);
    }
}

/// Lets a host keep a handle on a map the runtime owns.
impl<M: MapEngine> MapEngine for Arc<Mutex<M>> {
    fn fly_to(&mut self, camera: &FlyTo) {
        lock(self).fly_to(camera)
    }

    fn attach_marker(&mut self, marker: MarkerId, feature: &LocationFeature) {
        lock(self).attach_marker(marker, feature)
    }

    fn detach_marker(&mut self, marker: MarkerId) {
        lock(self).detach_marker(marker)
    }

    fn show_popup(&mut self, active: &ActiveLocation) {
        lock(self).show_popup(active)
    }

    fn hide_popup(&mut self) {
        lock(self).hide_popup()
    }
}

fn lock<M>(m: &Mutex<M>) -> MutexGuard<'_, M> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
