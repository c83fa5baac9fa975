// crates/mapsync-core/src/runtime.rs
#![cfg(feature = "runtime")]

//! # Search Runtime
//!
//! Drives a [`MapSearch`] engine on tokio. One task owns the engine and the
//! map; everything else talks to it through channels:
//!
//! - UI commands (keystrokes, picks, clear) via [`SearchHandle`];
//! - marker hover/click events via [`MarkerEvents`];
//! - provider completions from spawned request tasks.
//!
//! Events are applied one at a time in arrival order, so the engine needs no
//! locking. Every state change is published as a [`SearchView`] on a watch
//! channel.

use crate::config::{SearchConfig, SuggestOptions};
use crate::engine::{Effect, MapSearch, SearchView};
use crate::error::{Result, SearchError};
use crate::map::MapEngine;
use crate::markers::{MarkerEvent, MarkerId};
use crate::model::{LocationFeature, Suggestion};
use crate::provider::GeocodingProvider;
use crate::query::{DebounceTicket, Generation};
use crate::selection::RetrieveTicket;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Input(String),
    Select(Suggestion),
    SelectIndex(usize),
    RemoveMarker(MarkerId),
    MapReady(bool),
    Clear,
}

#[derive(Debug)]
enum Completion {
    Suggest {
        generation: Generation,
        result: Result<Vec<Suggestion>>,
    },
    Retrieve {
        ticket: RetrieveTicket,
        result: Result<Vec<LocationFeature>>,
    },
}

/// The single subscriber end for marker events. Clone one into each marker.
#[derive(Debug, Clone)]
pub struct MarkerEvents {
    tx: mpsc::UnboundedSender<MarkerEvent>,
}

impl MarkerEvents {
    pub fn emit(&self, event: MarkerEvent) -> Result<()> {
        self.tx.send(event).map_err(|_| SearchError::Closed)
    }
}

/// UI-side handle to a running search session.
#[derive(Debug, Clone)]
pub struct SearchHandle {
    commands: mpsc::UnboundedSender<Command>,
    markers: MarkerEvents,
    view: watch::Receiver<SearchView>,
    shutdown: CancellationToken,
}

impl SearchHandle {
    pub fn send(&self, command: Command) -> Result<()> {
        self.commands.send(command).map_err(|_| SearchError::Closed)
    }

    pub fn input(&self, text: impl Into<String>) -> Result<()> {
        self.send(Command::Input(text.into()))
    }

    pub fn select(&self, suggestion: Suggestion) -> Result<()> {
        self.send(Command::Select(suggestion))
    }

    pub fn select_index(&self, index: usize) -> Result<()> {
        self.send(Command::SelectIndex(index))
    }

    pub fn clear(&self) -> Result<()> {
        self.send(Command::Clear)
    }

    pub fn remove_marker(&self, marker: MarkerId) -> Result<()> {
        self.send(Command::RemoveMarker(marker))
    }

    pub fn marker_events(&self) -> MarkerEvents {
        self.markers.clone()
    }

    /// Latest published state.
    pub fn view(&self) -> SearchView {
        self.view.borrow().clone()
    }

    /// A receiver that observes every published state.
    pub fn subscribe(&self) -> watch::Receiver<SearchView> {
        self.view.clone()
    }

    /// Wait until the published state satisfies `predicate`.
    pub async fn wait_for<F>(&self, mut predicate: F) -> Result<SearchView>
    where
        F: FnMut(&SearchView) -> bool,
    {
        let mut rx = self.view.clone();
        let view = rx
            .wait_for(|v| predicate(v))
            .await
            .map_err(|_| SearchError::Closed)?;
        Ok((*view).clone())
    }

    /// Stop the session and abort every outstanding request.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

pub struct SearchRuntime<P, M> {
    engine: MapSearch,
    provider: Arc<P>,
    map: M,
    options: SuggestOptions,
    debounce: Option<(DebounceTicket, Instant)>,
    suggest_cancel: Option<(Generation, CancellationToken)>,
    shutdown: CancellationToken,
    commands: mpsc::UnboundedReceiver<Command>,
    marker_events: mpsc::UnboundedReceiver<MarkerEvent>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions: mpsc::UnboundedReceiver<Completion>,
    view: watch::Sender<SearchView>,
}

impl<P, M> SearchRuntime<P, M>
where
    P: GeocodingProvider,
    M: MapEngine,
{
    pub fn new(config: &SearchConfig, provider: Arc<P>, map: M) -> (Self, SearchHandle) {
        let engine = MapSearch::new(config);
        let (command_tx, commands) = mpsc::unbounded_channel();
        let (marker_tx, marker_events) = mpsc::unbounded_channel();
        let (completions_tx, completions) = mpsc::unbounded_channel();
        let (view, view_rx) = watch::channel(engine.view());
        let shutdown = CancellationToken::new();

        let handle = SearchHandle {
            commands: command_tx,
            markers: MarkerEvents { tx: marker_tx },
            view: view_rx,
            shutdown: shutdown.clone(),
        };
        let runtime = Self {
            engine,
            provider,
            map,
            options: config.suggest_options(),
            debounce: None,
            suggest_cancel: None,
            shutdown,
            commands,
            marker_events,
            completions_tx,
            completions,
            view,
        };
        (runtime, handle)
    }

    /// Process events until every handle is dropped or shutdown is requested.
    pub async fn run(mut self) {
        tracing::debug!("search runtime started");
        loop {
            let deadline = self.debounce.map(|(_, at)| at);
            let effects = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                cmd = self.commands.recv() => match cmd {
                    Some(cmd) => self.apply(cmd),
                    None => break,
                },
                Some(done) = self.completions.recv() => self.complete(done),
                Some(event) = self.marker_events.recv() => self.engine.marker_event(event),
                _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    match self.debounce.take() {
                        Some((ticket, _)) => self.engine.debounce_elapsed(ticket),
                        None => Vec::new(),
                    }
                }
            };
            self.execute(effects);
            self.view.send_replace(self.engine.view());
        }
        self.shutdown.cancel();
        tracing::debug!("search runtime stopped");
    }

    fn apply(&mut self, command: Command) -> Vec<Effect> {
        match command {
            Command::Input(text) => self.engine.input(&text),
            Command::Select(s) => self.engine.select(&s),
            Command::SelectIndex(i) => self.engine.select_index(i),
            Command::RemoveMarker(m) => self.engine.remove_marker(m),
            Command::MapReady(ready) => {
                self.engine.set_map_ready(ready);
                Vec::new()
            }
            Command::Clear => {
                self.debounce = None;
                self.engine.clear()
            }
        }
    }

    fn complete(&mut self, done: Completion) -> Vec<Effect> {
        match done {
            Completion::Suggest { generation, result } => {
                if self
                    .suggest_cancel
                    .as_ref()
                    .is_some_and(|(g, _)| *g == generation)
                {
                    self.suggest_cancel = None;
                }
                self.engine.suggest_settled(generation, result)
            }
            Completion::Retrieve { ticket, result } => self.engine.retrieve_settled(ticket, result),
        }
    }

    fn execute(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::ScheduleDebounce { ticket, delay_ms } => {
                    let at = Instant::now() + Duration::from_millis(delay_ms);
                    self.debounce = Some((ticket, at));
                }
                Effect::CancelSuggest { generation } => {
                    if let Some((g, token)) = self.suggest_cancel.take() {
                        if g == generation {
                            token.cancel();
                        } else {
                            self.suggest_cancel = Some((g, token));
                        }
                    }
                }
                Effect::Suggest(request) => {
                    let token = self.shutdown.child_token();
                    self.suggest_cancel = Some((request.generation, token.clone()));
                    let provider = Arc::clone(&self.provider);
                    let options = self.options.clone();
                    let tx = self.completions_tx.clone();
                    tokio::spawn(async move {
                        let result = provider.suggest(request.query, options, token).await;
                        let _ = tx.send(Completion::Suggest {
                            generation: request.generation,
                            result,
                        });
                    });
                }
                Effect::Retrieve(request) => {
                    let token = self.shutdown.child_token();
                    let provider = Arc::clone(&self.provider);
                    let tx = self.completions_tx.clone();
                    tokio::spawn(async move {
                        let result = provider.retrieve(request.id, Some(token)).await;
                        let _ = tx.send(Completion::Retrieve {
                            ticket: request.ticket,
                            result,
                        });
                    });
                }
                Effect::FlyTo(camera) => self.map.fly_to(&camera),
                Effect::AttachMarker { marker, feature } => self.map.attach_marker(marker, &feature),
                Effect::DetachMarker { marker } => self.map.detach_marker(marker),
                Effect::ShowPopup(active) => self.map.show_popup(&active),
                Effect::HidePopup => self.map.hide_popup(),
            }
        }
    }
}

impl<P, M> SearchRuntime<P, M>
where
    P: GeocodingProvider,
    M: MapEngine + Send + 'static,
{
    /// Spawn the runtime on the current tokio runtime.
    pub fn spawn(config: &SearchConfig, provider: Arc<P>, map: M) -> (SearchHandle, JoinHandle<()>) {
        let (runtime, handle) = Self::new(config, provider, map);
        (handle, tokio::spawn(runtime.run()))
    }
}
