//! Hover sync example for mapsync-rs
//!
//! Drives the sans-IO engine by hand, the way a browser host would, to show
//! how marker hover events keep exactly one popup in sync with the pointer.

use mapsync_rs::prelude::*;

fn apply(map: &mut RecordingMap, effects: Vec<Effect>) {
    for fx in effects {
        match fx {
            Effect::FlyTo(camera) => map.fly_to(&camera),
            Effect::AttachMarker { marker, feature } => map.attach_marker(marker, &feature),
            Effect::DetachMarker { marker } => map.detach_marker(marker),
            Effect::ShowPopup(active) => map.show_popup(&active),
            Effect::HidePopup => map.hide_popup(),
            other => println!("  (host would handle {other:?})"),
        }
    }
}

fn describe(engine: &MapSearch) {
    match engine.view().active {
        Some(active) => println!("  popup: #{} {}", active.marker.0, active.feature.label()),
        None => println!("  popup: none"),
    }
}

fn main() {
    println!("=== mapsync hover sync example ===\n");

    let mut engine = MapSearch::new(&SearchConfig::default());
    let mut map = RecordingMap::new();

    // A selection that resolved to two features.
    let effects = engine.select(&Suggestion::new("cafes", "Cafés near me", ""));
    let Some(Effect::Retrieve(request)) = effects.into_iter().next() else {
        println!("no map attached; nothing to do");
        return;
    };
    let mut flore = LocationFeature::new("flore", (2.3327, 48.8541));
    flore.properties.name = Some("Café de Flore".into());
    let mut magots = LocationFeature::new("magots", (2.3333, 48.8540));
    magots.properties.name = Some("Les Deux Magots".into());
    let effects = engine.retrieve_settled(request.ticket, Ok(vec![flore, magots]));
    apply(&mut map, effects);

    let placed: Vec<_> = engine
        .markers()
        .markers()
        .iter()
        .map(|m| (m.marker, m.feature.coordinate))
        .collect();
    let [(a, at_a), (b, at_b)] = placed[..] else {
        println!("expected two markers");
        return;
    };

    println!("--- pointer enters B, then moves straight onto A ---");
    apply(&mut map, engine.marker_event(MarkerEvent::enter(b, at_b)));
    apply(&mut map, engine.marker_event(MarkerEvent::enter(a, at_a)));
    describe(&engine);

    println!("--- B's late leave arrives ---");
    apply(&mut map, engine.marker_event(MarkerEvent::leave(b, at_b)));
    describe(&engine);

    println!("--- click on B flies the camera, popup stays on A ---");
    apply(&mut map, engine.marker_event(MarkerEvent::click(b, at_b)));
    describe(&engine);

    println!("--- pointer leaves A ---");
    apply(&mut map, engine.marker_event(MarkerEvent::leave(a, at_a)));
    describe(&engine);

    println!("\nmap saw {} calls, popup open: {:?}", map.calls.len(), map.popup());
}
