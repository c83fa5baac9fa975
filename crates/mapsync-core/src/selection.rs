// crates/mapsync-core/src/selection.rs

//! # Selection & Camera Controller
//!
//! Turns a picked suggestion into a `retrieve` request and, once it resolves,
//! into a camera move plus the marker set to show. One selection at a time:
//! while a retrieve is outstanding further picks are ignored. This busy flag
//! is independent of the search controller; a selection neither waits for
//! nor cancels an in-flight suggest.

use crate::error::SearchError;
use crate::model::{Coordinate, FlyTo, FlyToOptions, LocationFeature, Suggestion};
use serde::{Deserialize, Serialize};

/// Identity of one retrieve request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RetrieveTicket(pub u64);

/// A retrieve the caller must run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrieveRequest {
    pub ticket: RetrieveTicket,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectionOutcome {
    /// Not the outstanding ticket, or cancelled. Nothing changes.
    Ignored,
    /// The retrieve failed or found nothing; markers and camera stay put.
    Failed { message: String },
    /// Fly once, show every feature, put the name in the input.
    Resolved {
        camera: FlyTo,
        display: String,
        features: Vec<LocationFeature>,
    },
}

#[derive(Debug, Clone)]
pub struct SelectionController {
    fly_to: FlyToOptions,
    next: u64,
    pending: Option<(RetrieveTicket, Suggestion)>,
}

impl SelectionController {
    pub fn new(fly_to: FlyToOptions) -> Self {
        Self {
            fly_to,
            next: 0,
            pending: None,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    /// Start selecting `suggestion`. `None` when there is no map to move or a
    /// selection is already in progress.
    pub fn begin(&mut self, suggestion: &Suggestion, map_ready: bool) -> Option<RetrieveRequest> {
        if !map_ready {
            tracing::debug!(id = %suggestion.id, "selection ignored: no map");
            return None;
        }
        if let Some((ticket, busy)) = &self.pending {
            tracing::debug!(id = %suggestion.id, busy = %busy.id, ticket = ticket.0, "selection ignored: busy");
            return None;
        }

        self.next += 1;
        let ticket = RetrieveTicket(self.next);
        self.pending = Some((ticket, suggestion.clone()));
        tracing::info!(id = %suggestion.id, name = %suggestion.name, "retrieving selection");
        Some(RetrieveRequest {
            ticket,
            id: suggestion.id.clone(),
        })
    }

    /// Apply the outcome of a retrieve.
    pub fn finish(
        &mut self,
        ticket: RetrieveTicket,
        result: Result<Vec<LocationFeature>, SearchError>,
    ) -> SelectionOutcome {
        let suggestion = match self.pending.take() {
            Some((pending, s)) if pending == ticket => s,
            other => {
                self.pending = other;
                return SelectionOutcome::Ignored;
            }
        };

        let features = match result {
            Err(SearchError::Cancelled) => return SelectionOutcome::Ignored,
            Err(err) => {
                tracing::warn!(id = %suggestion.id, error = %err, "retrieve failed");
                return SelectionOutcome::Failed {
                    message: err.user_message(),
                };
            }
            Ok(features) => features,
        };

        let Some(first) = features.first() else {
            tracing::warn!(id = %suggestion.id, "retrieve returned no features");
            return SelectionOutcome::Failed {
                message: SearchError::EmptyResult.user_message(),
            };
        };

        let camera = FlyTo::new(first.coordinate, &self.fly_to);
        tracing::info!(
            id = %suggestion.id,
            lon = camera.center.longitude,
            lat = camera.center.latitude,
            markers = features.len(),
            "selection resolved"
        );
        SelectionOutcome::Resolved {
            camera,
            display: suggestion.name,
            features,
        }
    }

    /// Camera move for a clicked marker.
    pub fn focus(&self, coordinate: Coordinate) -> FlyTo {
        FlyTo::new(coordinate, &self.fly_to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn main_st() -> Suggestion {
        Suggestion::new("abc", "123 Main St", "Springfield")
    }

    #[test]
    fn no_map_is_a_noop() {
        let mut s = SelectionController::new(FlyToOptions::default());
        assert!(s.begin(&main_st(), false).is_none());
        assert!(!s.is_busy());
    }

    #[test]
    fn busy_blocks_second_selection() {
        let mut s = SelectionController::new(FlyToOptions::default());
        let req = s.begin(&main_st(), true).unwrap();
        assert_eq!(req.id, "abc");
        assert!(s.is_busy());
        assert!(s.begin(&Suggestion::new("other", "Other", ""), true).is_none());
    }

    #[test]
    fn resolves_to_first_feature_and_keeps_all() {
        let mut s = SelectionController::new(FlyToOptions::default());
        let req = s.begin(&main_st(), true).unwrap();
        let features = vec![
            LocationFeature::new("abc", (-122.1, 37.4)),
            LocationFeature::new("abc-2", (-122.2, 37.5)),
        ];
        match s.finish(req.ticket, Ok(features)) {
            SelectionOutcome::Resolved {
                camera,
                display,
                features,
            } => {
                assert_eq!(camera.center, Coordinate::new(-122.1, 37.4));
                assert_eq!(camera.zoom, 14.0);
                assert_eq!(display, "123 Main St");
                assert_eq!(features.len(), 2);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(!s.is_busy());
    }

    #[test]
    fn empty_result_is_soft_failure() {
        let mut s = SelectionController::new(FlyToOptions::default());
        let req = s.begin(&main_st(), true).unwrap();
        assert_eq!(
            s.finish(req.ticket, Ok(vec![])),
            SelectionOutcome::Failed {
                message: "No location details found".into()
            }
        );
        assert!(!s.is_busy());
    }

    #[test]
    fn stale_ticket_is_ignored_and_keeps_busy() {
        let mut s = SelectionController::new(FlyToOptions::default());
        let req = s.begin(&main_st(), true).unwrap();
        let stale = RetrieveTicket(req.ticket.0 + 7);
        assert_eq!(s.finish(stale, Ok(vec![])), SelectionOutcome::Ignored);
        assert!(s.is_busy());
    }

    #[test]
    fn cancelled_retrieve_is_swallowed() {
        let mut s = SelectionController::new(FlyToOptions::default());
        let req = s.begin(&main_st(), true).unwrap();
        assert_eq!(
            s.finish(req.ticket, Err(SearchError::Cancelled)),
            SelectionOutcome::Ignored
        );
        assert!(!s.is_busy());
    }

    #[test]
    fn focus_uses_configured_camera() {
        let s = SelectionController::new(FlyToOptions {
            zoom: 10.0,
            ..FlyToOptions::default()
        });
        let fly = s.focus(Coordinate::new(1.0, 2.0));
        assert_eq!(fly.zoom, 10.0);
        assert!(fly.essential);
    }
}
