//! mapsync-wasm — WebAssembly bindings for mapsync-core
//!
//! Exposes the sans-IO search engine to a browser host. The engine never
//! touches the network or the clock; every method returns the list of
//! effects the host must carry out (arm a timer, start or abort a `fetch`,
//! drive the map) and the host reports back when they complete.
//!
//! Quick start (browser)
//! ---------------------
//! ```javascript
//! import init, { MapSearchHandle } from 'mapsync-wasm';
//!
//! await init();
//! const search = new MapSearchHandle({ access_token: 'pk....' });
//! const params = search.request_params(); // tokens + filters for URLs
//!
//! async function run(effects) {
//!   for (const fx of effects) {
//!     switch (fx.type) {
//!       case 'schedule_debounce':
//!         clearTimeout(timer);
//!         timer = setTimeout(() => run(search.debounce_elapsed(fx.ticket)), fx.delay_ms);
//!         break;
//!       case 'suggest': {
//!         const res = await fetch(suggestUrl(params, fx.query), { signal });
//!         run(search.suggest_response(fx.generation, res.status, res.statusText, await res.text()));
//!         break;
//!       }
//!       case 'fly_to': map.flyTo({ center: [fx.center.longitude, fx.center.latitude], zoom: fx.zoom }); break;
//!       // cancel_suggest, retrieve, attach_marker, detach_marker, show_popup, hide_popup ...
//!     }
//!   }
//!   render(search.view());
//! }
//!
//! input.addEventListener('input', (e) => run(search.input(e.target.value)));
//! ```
//!
//! Notes
//! -----
//! - Effects and views are plain JSON-compatible objects; ids and tickets
//!   are numbers and must be passed back unchanged.
//! - A request the host aborted is reported with `*_aborted`; the engine
//!   drops it without touching what the user sees.
use mapsync_core::raw::{parse_retrieve_body, parse_suggest_body, provider_error};
use mapsync_core::{
    DebounceTicket, Effect, Generation, LocationFeature, MapSearch, MarkerEvent, MarkerId,
    RetrieveTicket, SearchConfig, SearchError, SessionTokenStore, Suggestion,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    web_sys::console::log_1(&"mapsync wasm module ready".into());
}

/* --------------------------------------------------------------------------
   JS conversions
-------------------------------------------------------------------------- */

fn js_error(message: impl AsRef<str>) -> JsValue {
    js_sys::Error::new(message.as_ref()).into()
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| js_error(e.to_string()))
}

fn from_js<T: DeserializeOwned>(value: JsValue, what: &str) -> Result<T, JsValue> {
    serde_wasm_bindgen::from_value(value).map_err(|e| js_error(format!("invalid {what}: {e}")))
}

fn warn(message: &str) {
    #[cfg(target_arch = "wasm32")]
    web_sys::console::warn_1(&message.into());
    #[cfg(not(target_arch = "wasm32"))]
    let _ = message;
}

/// Tokens and filters the host needs to build request URLs.
#[derive(Debug, Serialize)]
pub struct RequestParams<'a> {
    pub base_url: &'a str,
    pub access_token: Option<&'a str>,
    pub session_token: &'a str,
    pub country: Option<&'a str>,
    pub limit: u32,
    /// `lon,lat`
    pub proximity: Option<String>,
}

/* --------------------------------------------------------------------------
   Response classification
-------------------------------------------------------------------------- */

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

fn suggest_outcome(status: u16, status_text: Option<&str>, body: &str) -> Result<Vec<Suggestion>, SearchError> {
    if !is_success(status) {
        return Err(provider_error(status, status_text, body));
    }
    parse_suggest_body(body)
}

fn retrieve_outcome(
    status: u16,
    status_text: Option<&str>,
    body: &str,
) -> Result<Vec<LocationFeature>, SearchError> {
    if !is_success(status) {
        return Err(provider_error(status, status_text, body));
    }
    parse_retrieve_body(body)
}

/* --------------------------------------------------------------------------
   MapSearchHandle
-------------------------------------------------------------------------- */

/// One search box bound to one map.
#[wasm_bindgen]
pub struct MapSearchHandle {
    config: SearchConfig,
    session: SessionTokenStore,
    engine: MapSearch,
}

impl MapSearchHandle {
    /// Rust-side constructor. A browser session always has a token: one is
    /// generated unless the config carries one.
    pub fn from_config(mut config: SearchConfig) -> Self {
        config.generate_session_token = true;
        let session = SessionTokenStore::from_config(&config);
        let engine = MapSearch::new(&config);
        Self {
            config,
            session,
            engine,
        }
    }

    pub fn engine(&self) -> &MapSearch {
        &self.engine
    }

    pub fn on_suggest_response(
        &mut self,
        generation: Generation,
        status: u16,
        status_text: Option<&str>,
        body: &str,
    ) -> Vec<Effect> {
        let result = suggest_outcome(status, status_text, body);
        if let Err(e) = &result {
            warn(&format!("suggest failed: {e}"));
        }
        self.engine.suggest_settled(generation, result)
    }

    pub fn on_retrieve_response(
        &mut self,
        ticket: RetrieveTicket,
        status: u16,
        status_text: Option<&str>,
        body: &str,
    ) -> Vec<Effect> {
        let result = retrieve_outcome(status, status_text, body);
        if let Err(e) = &result {
            warn(&format!("retrieve failed: {e}"));
        }
        self.engine.retrieve_settled(ticket, result)
    }

    pub fn params(&self) -> RequestParams<'_> {
        let options = &self.config;
        RequestParams {
            base_url: &options.base_url,
            access_token: options.access_token.as_deref().filter(|t| !t.is_empty()),
            session_token: self.session.get().as_str(),
            country: options.country.as_deref(),
            limit: options.limit.max(1),
            proximity: options.proximity.map(|c| c.to_string()),
        }
    }
}

#[wasm_bindgen]
impl MapSearchHandle {
    /// `config` is a partial `SearchConfig` object; `undefined` means defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<MapSearchHandle, JsValue> {
        let config = if config.is_undefined() || config.is_null() {
            SearchConfig::default()
        } else {
            from_js(config, "config")?
        };
        Ok(Self::from_config(config))
    }

    /// Build from a JSON string instead of an object.
    pub fn from_json(json: &str) -> Result<MapSearchHandle, JsValue> {
        let config = SearchConfig::from_json_str(json).map_err(|e| js_error(e.to_string()))?;
        Ok(Self::from_config(config))
    }

    pub fn set_map_ready(&mut self, ready: bool) {
        self.engine.set_map_ready(ready);
    }

    /* ---------------- search box ---------------- */

    pub fn input(&mut self, text: &str) -> Result<JsValue, JsValue> {
        to_js(&self.engine.input(text))
    }

    pub fn debounce_elapsed(&mut self, ticket: JsValue) -> Result<JsValue, JsValue> {
        let ticket: DebounceTicket = from_js(ticket, "debounce ticket")?;
        to_js(&self.engine.debounce_elapsed(ticket))
    }

    /// Report a finished `suggest` fetch, successful or not.
    pub fn suggest_response(
        &mut self,
        generation: JsValue,
        status: u16,
        status_text: Option<String>,
        body: &str,
    ) -> Result<JsValue, JsValue> {
        let generation: Generation = from_js(generation, "generation")?;
        to_js(&self.on_suggest_response(generation, status, status_text.as_deref(), body))
    }

    /// The `suggest` fetch rejected (network down, CORS, ...).
    pub fn suggest_failed(&mut self, generation: JsValue, message: &str) -> Result<JsValue, JsValue> {
        let generation: Generation = from_js(generation, "generation")?;
        let err = SearchError::Transport(format!("failed to search locations: {message}"));
        warn(&err.to_string());
        to_js(&self.engine.suggest_settled(generation, Err(err)))
    }

    /// The host aborted the `suggest` fetch after a `cancel_suggest` effect.
    pub fn suggest_aborted(&mut self, generation: JsValue) -> Result<JsValue, JsValue> {
        let generation: Generation = from_js(generation, "generation")?;
        to_js(&self.engine.suggest_settled(generation, Err(SearchError::Cancelled)))
    }

    pub fn clear(&mut self) -> Result<JsValue, JsValue> {
        to_js(&self.engine.clear())
    }

    /* ---------------- selection ---------------- */

    pub fn select_index(&mut self, index: usize) -> Result<JsValue, JsValue> {
        to_js(&self.engine.select_index(index))
    }

    pub fn select(&mut self, suggestion: JsValue) -> Result<JsValue, JsValue> {
        let suggestion: Suggestion = from_js(suggestion, "suggestion")?;
        to_js(&self.engine.select(&suggestion))
    }

    pub fn retrieve_response(
        &mut self,
        ticket: JsValue,
        status: u16,
        status_text: Option<String>,
        body: &str,
    ) -> Result<JsValue, JsValue> {
        let ticket: RetrieveTicket = from_js(ticket, "retrieve ticket")?;
        to_js(&self.on_retrieve_response(ticket, status, status_text.as_deref(), body))
    }

    pub fn retrieve_failed(&mut self, ticket: JsValue, message: &str) -> Result<JsValue, JsValue> {
        let ticket: RetrieveTicket = from_js(ticket, "retrieve ticket")?;
        let err = SearchError::Transport(format!("failed to retrieve location: {message}"));
        warn(&err.to_string());
        to_js(&self.engine.retrieve_settled(ticket, Err(err)))
    }

    /* ---------------- markers ---------------- */

    /// `{ kind: "enter" | "leave" | "click", marker, coordinate }`
    pub fn marker_event(&mut self, event: JsValue) -> Result<JsValue, JsValue> {
        let event: MarkerEvent = from_js(event, "marker event")?;
        to_js(&self.engine.marker_event(event))
    }

    pub fn remove_marker(&mut self, marker: JsValue) -> Result<JsValue, JsValue> {
        let marker: MarkerId = from_js(marker, "marker id")?;
        to_js(&self.engine.remove_marker(marker))
    }

    /* ---------------- state ---------------- */

    pub fn view(&self) -> Result<JsValue, JsValue> {
        to_js(&self.engine.view())
    }

    /// The view as a JSON string, for hosts that diff text.
    pub fn view_json(&self) -> String {
        serde_json::to_string(&self.engine.view()).unwrap_or_else(|e| {
            warn(&format!("view serialization failed: {e}"));
            String::from("{}")
        })
    }

    pub fn request_params(&self) -> Result<JsValue, JsValue> {
        to_js(&self.params())
    }

    pub fn session_token(&self) -> String {
        self.session.get().to_string()
    }

    pub fn query(&self) -> String {
        self.engine.query().query().to_string()
    }

    pub fn display(&self) -> String {
        self.engine.display().to_string()
    }

    pub fn error(&self) -> Option<String> {
        self.engine.error().map(str::to_owned)
    }

    pub fn suggestion_count(&self) -> usize {
        self.engine.query().suggestions().len()
    }

    pub fn marker_count(&self) -> usize {
        self.engine.markers().len()
    }

    pub fn is_busy(&self) -> bool {
        self.engine.is_busy()
    }
}
