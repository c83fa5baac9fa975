// crates/mapsync-core/tests/runtime_pipeline.rs
//
// Drives the tokio runtime against a scripted provider on a paused clock.
// Every provider call sleeps for its scripted latency, so request ordering
// is fully deterministic.

use mapsync_core::provider::cancellable;
use mapsync_core::{
    CancellationToken, Coordinate, GeocodingProvider, LocationFeature, MarkerEvent,
    ProviderFuture, RecordingMap, Result, SearchConfig, SearchError, SearchHandle, SearchPhase,
    SearchRuntime, SearchView, SessionTokenStore, Settlement, Suggestion, SuggestOptions,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Suggest { query: String, session: String },
    Retrieve { id: String, session: String },
    Cancelled(String),
}

struct ScriptedProvider {
    suggest: HashMap<String, (u64, Result<Vec<Suggestion>>)>,
    retrieve: HashMap<String, (u64, Result<Vec<LocationFeature>>)>,
    honor_cancel: bool,
    session: Arc<SessionTokenStore>,
    log: Mutex<Vec<Call>>,
}

impl ScriptedProvider {
    fn new() -> Self {
        Self {
            suggest: HashMap::new(),
            retrieve: HashMap::new(),
            honor_cancel: true,
            session: Arc::new(SessionTokenStore::generated()),
            log: Mutex::new(Vec::new()),
        }
    }

    fn on_suggest(mut self, query: &str, delay_ms: u64, result: Result<Vec<Suggestion>>) -> Self {
        self.suggest.insert(query.into(), (delay_ms, result));
        self
    }

    fn on_retrieve(mut self, id: &str, delay_ms: u64, result: Result<Vec<LocationFeature>>) -> Self {
        self.retrieve.insert(id.into(), (delay_ms, result));
        self
    }

    fn ignoring_cancel(mut self) -> Self {
        self.honor_cancel = false;
        self
    }

    fn record(&self, call: Call) {
        self.log.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<Call> {
        self.log.lock().unwrap().clone()
    }

    fn suggest_queries(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Suggest { query, .. } => Some(query),
                _ => None,
            })
            .collect()
    }

    async fn delayed<T>(&self, cancel: Option<&CancellationToken>, delay_ms: u64, out: Result<T>) -> Result<T> {
        let work = async move {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            out
        };
        if self.honor_cancel {
            cancellable(cancel, work).await
        } else {
            work.await
        }
    }
}

impl GeocodingProvider for ScriptedProvider {
    fn suggest(
        &self,
        query: String,
        _options: SuggestOptions,
        cancel: CancellationToken,
    ) -> ProviderFuture<'_, Vec<Suggestion>> {
        Box::pin(async move {
            self.record(Call::Suggest {
                query: query.clone(),
                session: self.session.get().to_string(),
            });
            let (delay, out) = self
                .suggest
                .get(&query)
                .cloned()
                .unwrap_or((0, Ok(Vec::new())));
            let out = self.delayed(Some(&cancel), delay, out).await;
            if out == Err(SearchError::Cancelled) {
                self.record(Call::Cancelled(query));
            }
            out
        })
    }

    fn retrieve(
        &self,
        id: String,
        cancel: Option<CancellationToken>,
    ) -> ProviderFuture<'_, Vec<LocationFeature>> {
        Box::pin(async move {
            self.record(Call::Retrieve {
                id: id.clone(),
                session: self.session.get().to_string(),
            });
            let (delay, out) = self
                .retrieve
                .get(&id)
                .cloned()
                .unwrap_or((0, Ok(Vec::new())));
            self.delayed(cancel.as_ref(), delay, out).await
        })
    }
}

struct Session {
    handle: SearchHandle,
    task: JoinHandle<()>,
    provider: Arc<ScriptedProvider>,
    map: Arc<Mutex<RecordingMap>>,
}

fn start(provider: ScriptedProvider) -> Session {
    let provider = Arc::new(provider);
    let map = Arc::new(Mutex::new(RecordingMap::new()));
    let (handle, task) =
        SearchRuntime::spawn(&SearchConfig::default(), Arc::clone(&provider), Arc::clone(&map));
    Session {
        handle,
        task,
        provider,
        map,
    }
}

async fn until<F>(handle: &SearchHandle, predicate: F) -> SearchView
where
    F: FnMut(&SearchView) -> bool,
{
    tokio::time::timeout(Duration::from_secs(30), handle.wait_for(predicate))
        .await
        .expect("state never reached")
        .expect("runtime stopped")
}

async fn idle(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

fn settled(v: &SearchView) -> bool {
    matches!(v.phase, SearchPhase::Settled(_))
}

fn ids(view: &SearchView) -> Vec<&str> {
    view.suggestions.iter().map(|s| s.id.as_str()).collect()
}

fn paris() -> Vec<Suggestion> {
    vec![
        Suggestion::new("paris-fr", "Paris", "Île-de-France, France"),
        Suggestion::new("paris-tx", "Paris", "Texas, United States"),
    ]
}

#[tokio::test(start_paused = true)]
async fn burst_of_keystrokes_sends_one_request() {
    let s = start(ScriptedProvider::new().on_suggest("Par", 50, Ok(paris())));

    for text in ["P", "Pa", "Par"] {
        s.handle.input(text).unwrap();
        idle(100).await;
    }
    let view = until(&s.handle, settled).await;

    assert_eq!(s.provider.suggest_queries(), ["Par"]);
    assert_eq!(ids(&view), ["paris-fr", "paris-tx"]);
    assert!(view.open);
}

#[tokio::test(start_paused = true)]
async fn query_is_trimmed_before_sending() {
    let s = start(ScriptedProvider::new());
    s.handle.input("  Par ").unwrap();
    until(&s.handle, settled).await;
    assert_eq!(s.provider.suggest_queries(), ["Par"]);
}

#[tokio::test(start_paused = true)]
async fn newer_search_cancels_the_older_one() {
    let s = start(
        ScriptedProvider::new()
            .on_suggest("Par", 1000, Ok(vec![Suggestion::new("par", "Parma", "Italy")]))
            .on_suggest("Paris", 100, Ok(paris())),
    );

    s.handle.input("Par").unwrap();
    idle(500).await; // "Par" is in flight
    s.handle.input("Paris").unwrap();

    let view = until(&s.handle, |v| v.phase == SearchPhase::Settled(Settlement::Results)).await;
    assert_eq!(ids(&view), ["paris-fr", "paris-tx"]);
    assert!(s.provider.calls().contains(&Call::Cancelled("Par".into())));
}

#[tokio::test(start_paused = true)]
async fn late_response_of_superseded_search_is_dropped() {
    let s = start(
        ScriptedProvider::new()
            .ignoring_cancel()
            .on_suggest("Par", 1000, Ok(vec![Suggestion::new("par", "Parma", "Italy")]))
            .on_suggest("Paris", 100, Ok(paris())),
    );

    s.handle.input("Par").unwrap();
    idle(500).await;
    s.handle.input("Paris").unwrap();
    until(&s.handle, settled).await;

    // Let the "Par" response land.
    idle(2000).await;
    let view = s.handle.view();
    assert_eq!(ids(&view), ["paris-fr", "paris-tx"]);
    assert_eq!(view.query, "Paris");
}

#[tokio::test(start_paused = true)]
async fn emptying_the_input_cancels_without_waiting() {
    let s = start(ScriptedProvider::new().on_suggest("Par", 1000, Ok(paris())));

    s.handle.input("Par").unwrap();
    idle(500).await;
    s.handle.input("").unwrap();
    let view = until(&s.handle, |v| v.phase == SearchPhase::Settled(Settlement::Empty)).await;

    assert!(view.suggestions.is_empty());
    assert!(!view.open);
    idle(2000).await;
    assert!(s.handle.view().suggestions.is_empty());
    assert!(s.provider.calls().contains(&Call::Cancelled("Par".into())));
}

#[tokio::test(start_paused = true)]
async fn suggest_error_is_shown_inline() {
    let s = start(ScriptedProvider::new().on_suggest(
        "Par",
        10,
        Err(SearchError::Provider {
            status: 401,
            message: "Not Authorized - Invalid Token".into(),
        }),
    ));
    s.handle.input("Par").unwrap();
    let view = until(&s.handle, settled).await;
    assert_eq!(
        view.error.as_deref(),
        Some("provider error: 401 Not Authorized - Invalid Token")
    );
    assert!(view.suggestions.is_empty());
    assert!(!view.show_empty_state);
}

#[tokio::test(start_paused = true)]
async fn select_flies_once_and_places_markers() {
    let mut feature = LocationFeature::new("abc", (-122.1, 37.4));
    feature.properties.name = Some("123 Main St".into());
    let s = start(
        ScriptedProvider::new()
            .on_suggest(
                "123 Main",
                20,
                Ok(vec![Suggestion::new("abc", "123 Main St", "Springfield")]),
            )
            .on_retrieve("abc", 20, Ok(vec![feature])),
    );

    s.handle.input("123 Main").unwrap();
    until(&s.handle, |v| v.suggestions.len() == 1).await;
    s.handle.select_index(0).unwrap();
    let view = until(&s.handle, |v| !v.busy && !v.markers.is_empty()).await;

    assert_eq!(view.display, "123 Main St");
    assert!(!view.open);
    assert!(view.suggestions.is_empty());

    let map = s.map.lock().unwrap().clone();
    let moves = map.camera_moves();
    assert_eq!(moves.len(), 1);
    assert_eq!(moves[0].center, Coordinate::new(-122.1, 37.4));
    assert_eq!(moves[0].zoom, 14.0);
    assert_eq!(map.attached(), vec![view.markers[0].marker]);
}

#[tokio::test(start_paused = true)]
async fn empty_retrieve_keeps_the_map_still() {
    let s = start(ScriptedProvider::new().on_retrieve("none", 10, Ok(vec![])));

    s.handle
        .select(Suggestion::new("none", "Nowhere", ""))
        .unwrap();
    let view = until(&s.handle, |v| v.error.is_some()).await;

    assert_eq!(view.error.as_deref(), Some("No location details found"));
    assert!(!view.busy);
    assert!(s.map.lock().unwrap().calls.is_empty());
}

#[tokio::test(start_paused = true)]
async fn picks_while_busy_are_ignored() {
    let s = start(
        ScriptedProvider::new()
            .on_retrieve("a", 500, Ok(vec![LocationFeature::new("a", (1.0, 1.0))]))
            .on_retrieve("b", 10, Ok(vec![LocationFeature::new("b", (2.0, 2.0))])),
    );

    s.handle.select(Suggestion::new("a", "A", "")).unwrap();
    idle(50).await;
    s.handle.select(Suggestion::new("b", "B", "")).unwrap();
    let view = until(&s.handle, |v| !v.busy && !v.markers.is_empty()).await;

    assert_eq!(view.display, "A");
    let retrieved: Vec<_> = s
        .provider
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::Retrieve { .. }))
        .collect();
    assert_eq!(retrieved.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn hover_switch_follows_the_latest_marker() {
    let s = start(ScriptedProvider::new().on_retrieve(
        "multi",
        10,
        Ok(vec![
            LocationFeature::new("a", (1.0, 1.0)),
            LocationFeature::new("b", (2.0, 2.0)),
        ]),
    ));
    s.handle
        .select(Suggestion::new("multi", "Multi", ""))
        .unwrap();
    let view = until(&s.handle, |v| v.markers.len() == 2).await;
    let (a, b) = (view.markers[0].marker, view.markers[1].marker);

    let events = s.handle.marker_events();
    events.emit(MarkerEvent::enter(b, Coordinate::new(2.0, 2.0))).unwrap();
    events.emit(MarkerEvent::enter(a, Coordinate::new(1.0, 1.0))).unwrap();
    events.emit(MarkerEvent::leave(b, Coordinate::new(2.0, 2.0))).unwrap();
    let view = until(&s.handle, |v| v.active.as_ref().is_some_and(|l| l.marker == a)).await;
    idle(10).await;

    assert_eq!(s.handle.view().active, view.active);
    assert_eq!(s.map.lock().unwrap().popup(), Some(a));
}

#[tokio::test(start_paused = true)]
async fn removing_the_hovered_marker_closes_its_popup() {
    let s = start(ScriptedProvider::new().on_retrieve(
        "multi",
        10,
        Ok(vec![
            LocationFeature::new("a", (1.0, 1.0)),
            LocationFeature::new("b", (2.0, 2.0)),
        ]),
    ));
    s.handle
        .select(Suggestion::new("multi", "Multi", ""))
        .unwrap();
    let view = until(&s.handle, |v| v.markers.len() == 2).await;
    let (a, b) = (view.markers[0].marker, view.markers[1].marker);

    s.handle
        .marker_events()
        .emit(MarkerEvent::enter(a, Coordinate::new(1.0, 1.0)))
        .unwrap();
    until(&s.handle, |v| v.active.is_some()).await;
    assert_eq!(s.map.lock().unwrap().popup(), Some(a));

    s.handle.remove_marker(a).unwrap();
    let view = until(&s.handle, |v| v.markers.len() == 1).await;

    assert!(view.active.is_none());
    assert_eq!(view.markers[0].marker, b);
    let map = s.map.lock().unwrap();
    assert_eq!(map.popup(), None);
    assert_eq!(map.attached(), vec![b]);
}

#[tokio::test(start_paused = true)]
async fn clear_wipes_search_and_markers() {
    let s = start(
        ScriptedProvider::new()
            .on_suggest("Par", 1000, Ok(paris()))
            .on_retrieve("a", 10, Ok(vec![LocationFeature::new("a", (1.0, 1.0))])),
    );
    s.handle.select(Suggestion::new("a", "A", "")).unwrap();
    until(&s.handle, |v| v.markers.len() == 1).await;

    s.handle.input("Par").unwrap();
    idle(500).await;
    s.handle.clear().unwrap();
    let view = until(&s.handle, |v| v.phase == SearchPhase::Idle).await;

    assert!(view.markers.is_empty());
    assert_eq!(view.display, "");
    assert!(s.map.lock().unwrap().attached().is_empty());
    idle(2000).await;
    assert!(s.handle.view().suggestions.is_empty());
}

#[tokio::test(start_paused = true)]
async fn every_request_shares_one_session_token() {
    let s = start(
        ScriptedProvider::new()
            .on_suggest("Par", 10, Ok(paris()))
            .on_suggest("Paris", 10, Ok(paris()))
            .on_retrieve("paris-fr", 10, Ok(vec![LocationFeature::new("paris-fr", (2.35, 48.85))])),
    );
    s.handle.input("Par").unwrap();
    until(&s.handle, |v| v.suggestions.len() == 2).await;
    s.handle.input("Paris").unwrap();
    until(&s.handle, |v| v.query == "Paris" && settled(v)).await;
    s.handle.select_index(0).unwrap();
    until(&s.handle, |v| !v.markers.is_empty()).await;

    let sessions: Vec<_> = s
        .provider
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            Call::Suggest { session, .. } | Call::Retrieve { session, .. } => Some(session),
            Call::Cancelled(_) => None,
        })
        .collect();
    assert_eq!(sessions.len(), 3);
    assert!(sessions.iter().all(|t| t == &sessions[0] && !t.is_empty()));
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_the_runtime() {
    let s = start(ScriptedProvider::new().on_suggest("Par", 10_000, Ok(paris())));
    s.handle.input("Par").unwrap();
    idle(500).await;

    s.handle.shutdown();
    s.task.await.unwrap();
    idle(10).await;

    assert_eq!(s.handle.input("Paris"), Err(SearchError::Closed));
    assert!(s.provider.calls().contains(&Call::Cancelled("Par".into())));
}
