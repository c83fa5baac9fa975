// crates/mapsync-core/src/query.rs

//! # Debounced Query Controller
//!
//! Owns the typed query and decides when a `suggest` request goes out.
//!
//! Two counters replace timers and abort handles:
//! - every non-empty keystroke issues a fresh [`DebounceTicket`]; only the
//!   newest ticket may start a search, so resetting the quiet period is just
//!   issuing a new ticket;
//! - every dispatched search gets a fresh [`Generation`]; only the settlement
//!   of the in-flight generation is applied, everything else is dropped.
//!
//! The caller owns the clock and the network. It arms a timer for each
//! ticket, runs each [`SuggestRequest`], and aborts the generations this
//! controller reports as superseded.

use crate::error::SearchError;
use crate::model::Suggestion;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Identity of one debounce timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DebounceTicket(pub u64);

/// Identity of one dispatched suggest request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Generation(pub u64);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum Settlement {
    Results,
    Empty,
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", content = "settled", rename_all = "snake_case")]
pub enum SearchPhase {
    Idle,
    Pending,
    Searching,
    Settled(Settlement),
}

/// A search the caller must run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestRequest {
    pub generation: Generation,
    pub query: String,
}

/// What a keystroke asks of the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputEffects {
    /// Abort this request now.
    pub cancel: Option<Generation>,
    /// Arm a timer for this ticket; older timers may be dropped.
    pub schedule: Option<(DebounceTicket, Duration)>,
}

/// A search to start, after aborting the one it supersedes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub cancel: Option<Generation>,
    pub request: SuggestRequest,
}

#[derive(Debug, Clone)]
pub struct QueryController {
    debounce: Duration,
    query: String,
    phase: SearchPhase,
    suggestions: Vec<Suggestion>,
    open: bool,
    ticket: u64,
    generation: u64,
    in_flight: Option<Generation>,
}

impl QueryController {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            query: String::new(),
            phase: SearchPhase::Idle,
            suggestions: Vec::new(),
            open: false,
            ticket: 0,
            generation: 0,
            in_flight: None,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn phase(&self) -> &SearchPhase {
        &self.phase
    }

    pub fn suggestions(&self) -> &[Suggestion] {
        &self.suggestions
    }

    pub fn suggestion(&self, index: usize) -> Option<&Suggestion> {
        self.suggestions.get(index)
    }

    /// Whether the results panel is open.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// True while a suggest request is outstanding, including while a newer
    /// keystroke is still waiting out its debounce.
    pub fn is_searching(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn in_flight(&self) -> Option<Generation> {
        self.in_flight
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// Record a keystroke.
    ///
    /// Empty (after trimming) input short-circuits: the in-flight request is
    /// cancelled and results are cleared without waiting for anything.
    pub fn input(&mut self, text: &str) -> InputEffects {
        self.query.clear();
        self.query.push_str(text);
        // Any armed timer is stale from here on.
        self.ticket += 1;

        if text.trim().is_empty() {
            let cancel = self.in_flight.take();
            self.suggestions.clear();
            self.open = false;
            if self.phase != SearchPhase::Idle {
                self.phase = SearchPhase::Settled(Settlement::Empty);
            }
            tracing::debug!(cancelled = ?cancel, "query emptied");
            return InputEffects {
                cancel,
                schedule: None,
            };
        }

        self.phase = SearchPhase::Pending;
        InputEffects {
            cancel: None,
            schedule: Some((DebounceTicket(self.ticket), self.debounce)),
        }
    }

    /// A debounce timer fired. Returns the search to start, or `None` when
    /// the ticket was superseded by a later keystroke.
    pub fn debounce_elapsed(&mut self, ticket: DebounceTicket) -> Option<Dispatch> {
        if ticket.0 != self.ticket || self.phase != SearchPhase::Pending {
            tracing::trace!(ticket = ticket.0, current = self.ticket, "stale debounce ticket");
            return None;
        }

        let cancel = self.in_flight.take();
        self.generation += 1;
        let generation = Generation(self.generation);
        self.in_flight = Some(generation);
        self.phase = SearchPhase::Searching;
        self.open = true;

        let query = self.query.trim().to_string();
        tracing::debug!(generation = generation.0, superseded = ?cancel, %query, "dispatching suggest");
        Some(Dispatch {
            cancel,
            request: SuggestRequest { generation, query },
        })
    }

    /// Apply the outcome of a suggest request. Returns `true` if it changed
    /// state; superseded and cancelled settlements are dropped.
    pub fn settle(
        &mut self,
        generation: Generation,
        result: Result<Vec<Suggestion>, SearchError>,
    ) -> bool {
        if self.in_flight != Some(generation) {
            tracing::trace!(generation = generation.0, "dropping superseded settlement");
            return false;
        }
        if matches!(result, Err(SearchError::Cancelled)) {
            return false;
        }
        self.in_flight = None;

        let settled = match result {
            Ok(suggestions) => {
                tracing::debug!(generation = generation.0, count = suggestions.len(), "suggestions settled");
                self.suggestions = suggestions;
                Settlement::Results
            }
            Err(err) => {
                tracing::warn!(generation = generation.0, error = %err, "suggest failed");
                self.suggestions.clear();
                Settlement::Error(err.user_message())
            }
        };
        // A newer keystroke keeps its Pending phase; its search comes next.
        if self.phase == SearchPhase::Searching {
            self.phase = SearchPhase::Settled(settled);
        }
        true
    }

    /// Drop suggestions and close the panel (after a successful selection).
    pub fn dismiss(&mut self) {
        self.suggestions.clear();
        self.open = false;
    }

    /// Explicit clear: forget everything and report the request to abort.
    pub fn clear(&mut self) -> Option<Generation> {
        self.ticket += 1;
        self.query.clear();
        self.suggestions.clear();
        self.open = false;
        self.phase = SearchPhase::Idle;
        self.in_flight.take()
    }

    /// The settled error message, if the last search failed.
    pub fn error(&self) -> Option<&str> {
        match &self.phase {
            SearchPhase::Settled(Settlement::Error(msg)) => Some(msg),
            _ => None,
        }
    }
}
