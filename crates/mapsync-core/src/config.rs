// crates/mapsync-core/src/config.rs

//! # Configuration
//!
//! Everything the engine takes from the outside world. Nothing here is
//! validated beyond the presence of an access token, and that check happens
//! at request time so a misconfigured host still renders.

use crate::error::{Result, SearchError};
use crate::model::{Coordinate, FlyToOptions};
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.mapbox.com/search/searchbox/v1";
pub const DEFAULT_DEBOUNCE_MS: u64 = 400;
pub const DEFAULT_LIMIT: u32 = 5;
/// Central Paris: biases results without restricting them to a country.
pub const DEFAULT_PROXIMITY: Coordinate = Coordinate::new(2.3488, 48.8534);

pub const ENV_ACCESS_TOKEN: &str = "MAPBOX_TOKEN";
pub const ENV_SESSION_TOKEN: &str = "MAPBOX_SESSION_TOKEN";
pub const ENV_BASE_URL: &str = "MAPSYNC_BASE_URL";
pub const ENV_COUNTRY: &str = "MAPSYNC_COUNTRY";
pub const ENV_LIMIT: &str = "MAPSYNC_LIMIT";
pub const ENV_DEBOUNCE_MS: &str = "MAPSYNC_DEBOUNCE_MS";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub access_token: Option<String>,
    /// Seed for the session token. `None` leaves the token empty unless
    /// `generate_session_token` is set.
    pub session_token: Option<String>,
    pub generate_session_token: bool,
    pub base_url: String,
    pub country: Option<String>,
    pub limit: u32,
    pub proximity: Option<Coordinate>,
    pub debounce_ms: u64,
    pub fly_to: FlyToOptions,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            session_token: None,
            generate_session_token: false,
            base_url: DEFAULT_BASE_URL.to_string(),
            country: None,
            limit: DEFAULT_LIMIT,
            proximity: Some(DEFAULT_PROXIMITY),
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            fly_to: FlyToOptions::default(),
        }
    }
}

impl SearchConfig {
    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Self {
        Self::default().with_lookup(|key| std::env::var(key).ok())
    }

    /// Parse a JSON object; missing keys keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| SearchError::Config(format!("invalid config: {e}")))
    }

    /// Overlay values from an arbitrary key lookup (the environment in
    /// production, a map in tests). Unparseable numbers are ignored.
    pub fn with_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = non_empty(ENV_ACCESS_TOKEN) {
            self.access_token = Some(v);
        }
        if let Some(v) = non_empty(ENV_SESSION_TOKEN) {
            self.session_token = Some(v);
        }
        if let Some(v) = non_empty(ENV_BASE_URL) {
            self.base_url = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = non_empty(ENV_COUNTRY) {
            self.country = Some(v);
        }
        if let Some(v) = non_empty(ENV_LIMIT).and_then(|v| v.trim().parse().ok()) {
            self.limit = v;
        }
        if let Some(v) = non_empty(ENV_DEBOUNCE_MS).and_then(|v| v.trim().parse().ok()) {
            self.debounce_ms = v;
        }
        self
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// The access token, or the error every request reports when it is absent.
    pub fn require_access_token(&self) -> Result<&str> {
        self.access_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(SearchError::missing_access_token)
    }

    /// Per-request options derived from the configured defaults.
    pub fn suggest_options(&self) -> SuggestOptions {
        SuggestOptions {
            country: self.country.clone(),
            limit: self.limit.max(1),
            proximity: self.proximity,
        }
    }
}

/// Filters forwarded verbatim to `suggest`.
#[derive(Debug, Clone, PartialEq)]
pub struct SuggestOptions {
    pub country: Option<String>,
    pub limit: u32,
    pub proximity: Option<Coordinate>,
}

impl Default for SuggestOptions {
    fn default() -> Self {
        SearchConfig::default().suggest_options()
    }
}
