// crates/mapsync-core/src/markers.rs

//! # Marker/Hover State Machine
//!
//! Tracks the rendered markers and the single *active* one whose popup is
//! visible. Markers never hold state of their own: they report typed
//! [`MarkerEvent`]s and this machine is the only writer of the active
//! location.
//!
//! Every attached marker gets a fresh [`MarkerId`], even when a later
//! selection returns the same feature again. A late `Leave` from a marker
//! that was already swapped out therefore cannot clear the popup of its
//! replacement.

use crate::model::{Coordinate, LocationFeature};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkerId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerEventKind {
    Enter,
    Leave,
    Click,
}

/// What a marker reports, with its position at the time of the event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarkerEvent {
    pub kind: MarkerEventKind,
    pub marker: MarkerId,
    pub coordinate: Coordinate,
}

impl MarkerEvent {
    pub fn enter(marker: MarkerId, coordinate: Coordinate) -> Self {
        Self {
            kind: MarkerEventKind::Enter,
            marker,
            coordinate,
        }
    }

    pub fn leave(marker: MarkerId, coordinate: Coordinate) -> Self {
        Self {
            kind: MarkerEventKind::Leave,
            marker,
            coordinate,
        }
    }

    pub fn click(marker: MarkerId, coordinate: Coordinate) -> Self {
        Self {
            kind: MarkerEventKind::Click,
            marker,
            coordinate,
        }
    }
}

/// The location whose popup is showing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveLocation {
    pub marker: MarkerId,
    pub feature: LocationFeature,
    pub coordinate: Coordinate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedMarker {
    pub marker: MarkerId,
    pub feature: LocationFeature,
}

/// Instructions for the map engine, in the order they must be applied.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkerChange {
    Attached(PlacedMarker),
    Detached(MarkerId),
    PopupShown(ActiveLocation),
    PopupHidden,
}

/// Result of feeding one event to the machine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HoverOutcome {
    pub changes: Vec<MarkerChange>,
    /// Set for clicks on a live marker; ActiveLocation is not touched.
    pub clicked: Option<(MarkerId, Coordinate)>,
}

#[derive(Debug, Clone, Default)]
pub struct MarkerSet {
    next: u64,
    markers: Vec<PlacedMarker>,
    active: Option<ActiveLocation>,
}

impl MarkerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn markers(&self) -> &[PlacedMarker] {
        &self.markers
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn active(&self) -> Option<&ActiveLocation> {
        self.active.as_ref()
    }

    pub fn get(&self, marker: MarkerId) -> Option<&LocationFeature> {
        self.markers
            .iter()
            .find(|m| m.marker == marker)
            .map(|m| &m.feature)
    }

    /// Swap the whole set for `features`.
    pub fn replace(&mut self, features: Vec<LocationFeature>) -> Vec<MarkerChange> {
        let mut changes = self.clear();
        for feature in features {
            self.next += 1;
            let placed = PlacedMarker {
                marker: MarkerId(self.next),
                feature,
            };
            changes.push(MarkerChange::Attached(placed.clone()));
            self.markers.push(placed);
        }
        changes
    }

    /// Detach every marker, hiding the popup first if one is showing.
    pub fn clear(&mut self) -> Vec<MarkerChange> {
        let mut changes = Vec::with_capacity(self.markers.len() + 1);
        if self.active.take().is_some() {
            changes.push(MarkerChange::PopupHidden);
        }
        changes.extend(self.markers.drain(..).map(|m| MarkerChange::Detached(m.marker)));
        changes
    }

    /// Detach one marker. Removing the active marker hides its popup.
    pub fn remove(&mut self, marker: MarkerId) -> Vec<MarkerChange> {
        let Some(pos) = self.markers.iter().position(|m| m.marker == marker) else {
            return Vec::new();
        };
        let mut changes = Vec::with_capacity(2);
        if self.active.as_ref().is_some_and(|a| a.marker == marker) {
            self.active = None;
            changes.push(MarkerChange::PopupHidden);
        }
        self.markers.remove(pos);
        changes.push(MarkerChange::Detached(marker));
        changes
    }

    pub fn handle(&mut self, event: MarkerEvent) -> HoverOutcome {
        let Some(feature) = self.get(event.marker).cloned() else {
            tracing::trace!(marker = event.marker.0, "event from detached marker");
            return HoverOutcome::default();
        };

        match event.kind {
            MarkerEventKind::Enter => {
                let active = ActiveLocation {
                    marker: event.marker,
                    feature,
                    coordinate: event.coordinate,
                };
                if self.active.as_ref() == Some(&active) {
                    return HoverOutcome::default();
                }
                self.active = Some(active.clone());
                HoverOutcome {
                    changes: vec![MarkerChange::PopupShown(active)],
                    clicked: None,
                }
            }
            MarkerEventKind::Leave => {
                if self.active.as_ref().is_some_and(|a| a.marker == event.marker) {
                    self.active = None;
                    HoverOutcome {
                        changes: vec![MarkerChange::PopupHidden],
                        clicked: None,
                    }
                } else {
                    HoverOutcome::default()
                }
            }
            MarkerEventKind::Click => HoverOutcome {
                changes: Vec::new(),
                clicked: Some((event.marker, event.coordinate)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_markers() -> (MarkerSet, MarkerId, MarkerId) {
        let mut set = MarkerSet::new();
        set.replace(vec![
            LocationFeature::new("a", (1.0, 1.0)),
            LocationFeature::new("b", (2.0, 2.0)),
        ]);
        let a = set.markers()[0].marker;
        let b = set.markers()[1].marker;
        (set, a, b)
    }

    fn at(v: f64) -> Coordinate {
        Coordinate::new(v, v)
    }

    #[test]
    fn enter_activates_immediately() {
        let (mut set, a, _) = two_markers();
        let out = set.handle(MarkerEvent::enter(a, at(1.0)));
        assert!(matches!(&out.changes[..], [MarkerChange::PopupShown(l)] if l.marker == a));
        assert_eq!(set.active().unwrap().feature.id, "a");
    }

    #[test]
    fn hover_switch_then_stale_leave_is_noop() {
        let (mut set, a, b) = two_markers();
        set.handle(MarkerEvent::enter(b, at(2.0)));
        set.handle(MarkerEvent::enter(a, at(1.0)));
        assert_eq!(set.active().unwrap().marker, a);

        let out = set.handle(MarkerEvent::leave(b, at(2.0)));
        assert!(out.changes.is_empty());
        assert_eq!(set.active().unwrap().marker, a);
    }

    #[test]
    fn leave_of_active_hides_popup() {
        let (mut set, a, _) = two_markers();
        set.handle(MarkerEvent::enter(a, at(1.0)));
        let out = set.handle(MarkerEvent::leave(a, at(1.0)));
        assert_eq!(out.changes, vec![MarkerChange::PopupHidden]);
        assert!(set.active().is_none());
    }

    #[test]
    fn click_forwards_without_touching_active() {
        let (mut set, a, b) = two_markers();
        set.handle(MarkerEvent::enter(a, at(1.0)));
        let out = set.handle(MarkerEvent::click(b, at(2.5)));
        assert!(out.changes.is_empty());
        assert_eq!(out.clicked, Some((b, at(2.5))));
        assert_eq!(set.active().unwrap().marker, a);
    }

    #[test]
    fn removing_active_marker_clears_popup() {
        let (mut set, a, b) = two_markers();
        set.handle(MarkerEvent::enter(a, at(1.0)));
        let changes = set.remove(a);
        assert_eq!(
            changes,
            vec![MarkerChange::PopupHidden, MarkerChange::Detached(a)]
        );
        assert!(set.active().is_none());
        assert_eq!(set.len(), 1);
        assert!(set.get(b).is_some());
    }

    #[test]
    fn removing_inactive_marker_keeps_popup() {
        let (mut set, a, b) = two_markers();
        set.handle(MarkerEvent::enter(a, at(1.0)));
        assert_eq!(set.remove(b), vec![MarkerChange::Detached(b)]);
        assert_eq!(set.active().unwrap().marker, a);
    }

    #[test]
    fn replace_invalidates_old_markers() {
        let (mut set, a, _) = two_markers();
        set.handle(MarkerEvent::enter(a, at(1.0)));

        let changes = set.replace(vec![LocationFeature::new("a", (1.0, 1.0))]);
        assert_eq!(changes[0], MarkerChange::PopupHidden);
        assert_eq!(changes.len(), 4);
        assert!(set.active().is_none());

        let fresh = set.markers()[0].marker;
        assert_ne!(fresh, a, "same feature gets a new marker identity");

        // Late events from the swapped-out marker are ignored.
        set.handle(MarkerEvent::enter(fresh, at(1.0)));
        assert!(set.handle(MarkerEvent::leave(a, at(1.0))).changes.is_empty());
        assert_eq!(set.active().unwrap().marker, fresh);
    }

    #[test]
    fn repeated_enter_is_idempotent() {
        let (mut set, a, _) = two_markers();
        set.handle(MarkerEvent::enter(a, at(1.0)));
        assert!(set.handle(MarkerEvent::enter(a, at(1.0))).changes.is_empty());
    }
}
