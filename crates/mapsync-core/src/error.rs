// crates/mapsync-core/src/error.rs
use thiserror::Error;

/// Errors produced by the geocoding client and the controllers built on it.
///
/// Only [`SearchError::Cancelled`] has special meaning: it marks a request
/// that was superseded or aborted, and controllers drop it without touching
/// user-visible state. Every other variant ends up as an inline message.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SearchError {
    /// Required configuration (the access token) is missing.
    #[error("{0}")]
    Config(String),

    /// The provider answered with a non-2xx status.
    #[error("provider error: {status} {message}")]
    Provider { status: u16, message: String },

    /// The request was cancelled before it settled.
    #[error("request cancelled")]
    Cancelled,

    /// Retrieval succeeded but produced no features.
    #[error("No location details found")]
    EmptyResult,

    /// The request never produced an HTTP response.
    #[error("{0}")]
    Transport(String),

    /// The response body could not be decoded.
    #[error("{0}")]
    Decode(String),

    /// The search session this handle talks to has stopped.
    #[error("search session has shut down")]
    Closed,
}

impl SearchError {
    pub fn missing_access_token() -> Self {
        SearchError::Config("MAPBOX_TOKEN is not configured".into())
    }

    /// `true` for superseded/aborted requests, which must never reach the UI.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SearchError::Cancelled)
    }

    /// Message shown inline in the search panel.
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

pub type Result<T> = std::result::Result<T, SearchError>;
