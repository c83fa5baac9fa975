// crates/mapsync-core/src/engine.rs

//! # Map Search Engine
//!
//! Composes the query, selection and marker controllers into the single
//! state a search box + map pair needs. The engine performs no I/O: each
//! entry point returns the [`Effect`]s the host must carry out (arm a timer,
//! run or abort a request, drive the map). The tokio driver in
//! [`crate::runtime`] is one such host; the wasm bindings are another.

use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::markers::{ActiveLocation, MarkerChange, MarkerEvent, MarkerId, MarkerSet, PlacedMarker};
use crate::model::{FlyTo, LocationFeature, Suggestion};
use crate::query::{DebounceTicket, Generation, QueryController, SearchPhase, SuggestRequest};
use crate::selection::{RetrieveRequest, RetrieveTicket, SelectionController, SelectionOutcome};
use serde::Serialize;

/// Something the host has to do on the engine's behalf.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Effect {
    /// Call back [`MapSearch::debounce_elapsed`] after `delay_ms`.
    /// Supersedes any earlier timer.
    ScheduleDebounce {
        ticket: DebounceTicket,
        delay_ms: u64,
    },
    /// Abort the suggest request of this generation.
    CancelSuggest { generation: Generation },
    Suggest(SuggestRequest),
    Retrieve(RetrieveRequest),
    FlyTo(FlyTo),
    AttachMarker {
        marker: MarkerId,
        feature: LocationFeature,
    },
    DetachMarker { marker: MarkerId },
    ShowPopup(ActiveLocation),
    HidePopup,
}

impl From<MarkerChange> for Effect {
    fn from(change: MarkerChange) -> Self {
        match change {
            MarkerChange::Attached(PlacedMarker { marker, feature }) => {
                Effect::AttachMarker { marker, feature }
            }
            MarkerChange::Detached(marker) => Effect::DetachMarker { marker },
            MarkerChange::PopupShown(active) => Effect::ShowPopup(active),
            MarkerChange::PopupHidden => Effect::HidePopup,
        }
    }
}

/// A snapshot of everything a UI renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchView {
    pub query: String,
    /// Text shown in the input; differs from `query` after a selection.
    pub display: String,
    pub phase: SearchPhase,
    pub suggestions: Vec<Suggestion>,
    pub open: bool,
    pub searching: bool,
    pub busy: bool,
    pub error: Option<String>,
    pub show_empty_state: bool,
    pub markers: Vec<PlacedMarker>,
    pub active: Option<ActiveLocation>,
}

impl SearchView {
    /// Spinner state: a search or a selection is outstanding.
    pub fn loading(&self) -> bool {
        self.searching || self.busy
    }
}

#[derive(Debug, Clone)]
pub struct MapSearch {
    query: QueryController,
    selection: SelectionController,
    markers: MarkerSet,
    display: String,
    error: Option<String>,
    map_ready: bool,
}

impl MapSearch {
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            query: QueryController::new(config.debounce()),
            selection: SelectionController::new(config.fly_to),
            markers: MarkerSet::new(),
            display: String::new(),
            error: None,
            map_ready: true,
        }
    }

    /// Attach or detach the map. Without a map, selections are no-ops.
    pub fn set_map_ready(&mut self, ready: bool) {
        self.map_ready = ready;
    }

    pub fn query(&self) -> &QueryController {
        &self.query
    }

    pub fn markers(&self) -> &MarkerSet {
        &self.markers
    }

    pub fn display(&self) -> &str {
        &self.display
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_busy(&self) -> bool {
        self.selection.is_busy()
    }

    /// The user edited the input.
    pub fn input(&mut self, text: &str) -> Vec<Effect> {
        self.display.clear();
        self.display.push_str(text);

        let fx = self.query.input(text);
        let mut effects = Vec::new();
        if let Some(generation) = fx.cancel {
            effects.push(Effect::CancelSuggest { generation });
        }
        match fx.schedule {
            Some((ticket, delay)) => effects.push(Effect::ScheduleDebounce {
                ticket,
                delay_ms: delay.as_millis() as u64,
            }),
            None => self.error = None,
        }
        effects
    }

    pub fn debounce_elapsed(&mut self, ticket: DebounceTicket) -> Vec<Effect> {
        let Some(dispatch) = self.query.debounce_elapsed(ticket) else {
            return Vec::new();
        };
        self.error = None;
        let mut effects = Vec::with_capacity(2);
        if let Some(generation) = dispatch.cancel {
            effects.push(Effect::CancelSuggest { generation });
        }
        effects.push(Effect::Suggest(dispatch.request));
        effects
    }

    pub fn suggest_settled(
        &mut self,
        generation: Generation,
        result: Result<Vec<Suggestion>, SearchError>,
    ) -> Vec<Effect> {
        if self.query.settle(generation, result) {
            self.error = self.query.error().map(str::to_owned);
        }
        Vec::new()
    }

    /// Pick a suggestion by its position in the current list.
    pub fn select_index(&mut self, index: usize) -> Vec<Effect> {
        match self.query.suggestion(index).cloned() {
            Some(s) => self.select(&s),
            None => Vec::new(),
        }
    }

    pub fn select(&mut self, suggestion: &Suggestion) -> Vec<Effect> {
        match self.selection.begin(suggestion, self.map_ready) {
            Some(request) => {
                self.error = None;
                vec![Effect::Retrieve(request)]
            }
            None => Vec::new(),
        }
    }

    pub fn retrieve_settled(
        &mut self,
        ticket: RetrieveTicket,
        result: Result<Vec<LocationFeature>, SearchError>,
    ) -> Vec<Effect> {
        match self.selection.finish(ticket, result) {
            SelectionOutcome::Ignored => Vec::new(),
            SelectionOutcome::Failed { message } => {
                self.error = Some(message);
                Vec::new()
            }
            SelectionOutcome::Resolved {
                camera,
                display,
                features,
            } => {
                let mut effects = vec![Effect::FlyTo(camera)];
                effects.extend(self.markers.replace(features).into_iter().map(Effect::from));
                self.display = display;
                self.query.dismiss();
                effects
            }
        }
    }

    pub fn marker_event(&mut self, event: MarkerEvent) -> Vec<Effect> {
        let outcome = self.markers.handle(event);
        let mut effects: Vec<Effect> = outcome.changes.into_iter().map(Effect::from).collect();
        if let Some((marker, coordinate)) = outcome.clicked {
            if self.map_ready {
                tracing::debug!(marker = marker.0, "marker clicked; focusing camera");
                effects.push(Effect::FlyTo(self.selection.focus(coordinate)));
            }
        }
        effects
    }

    pub fn remove_marker(&mut self, marker: MarkerId) -> Vec<Effect> {
        self.markers.remove(marker).into_iter().map(Effect::from).collect()
    }

    /// The clear button: abort the search, drop results, markers and popup.
    pub fn clear(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        if let Some(generation) = self.query.clear() {
            effects.push(Effect::CancelSuggest { generation });
        }
        self.display.clear();
        self.error = None;
        effects.extend(self.markers.clear().into_iter().map(Effect::from));
        effects
    }

    pub fn view(&self) -> SearchView {
        let open = self.query.is_open();
        let searching = self.query.is_searching();
        let suggestions = self.query.suggestions().to_vec();
        let show_empty_state = open
            && !searching
            && !self.query.query().trim().is_empty()
            && suggestions.is_empty()
            && self.error.is_none();
        SearchView {
            query: self.query.query().to_string(),
            display: self.display.clone(),
            phase: self.query.phase().clone(),
            suggestions,
            open,
            searching,
            busy: self.selection.is_busy(),
            error: self.error.clone(),
            show_empty_state,
            markers: self.markers.markers().to_vec(),
            active: self.markers.active().cloned(),
        }
    }
}
