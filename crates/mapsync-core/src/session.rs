// crates/mapsync-core/src/session.rs

//! # Session Token Store
//!
//! The provider bills a sequence of `suggest` calls followed by a `retrieve`
//! as one session, so every request of a user's search session must carry
//! the same token. The store mints it lazily on first use and hands out the
//! cached value afterwards. Create one store per application session and
//! share it by `Arc`; there is no global instance.

use crate::config::SearchConfig;
use once_cell::sync::OnceCell;
use serde::Serialize;
use std::fmt;

/// Opaque session identifier. May be empty when nothing was configured.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SessionToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone)]
enum Source {
    Configured(String),
    Generated,
    Unset,
}

#[derive(Debug)]
pub struct SessionTokenStore {
    source: Source,
    token: OnceCell<SessionToken>,
}

impl SessionTokenStore {
    /// Token taken verbatim from configuration.
    pub fn configured(token: impl Into<String>) -> Self {
        Self::with_source(Source::Configured(token.into()))
    }

    /// Token minted as a random UUIDv4 on first use.
    pub fn generated() -> Self {
        Self::with_source(Source::Generated)
    }

    /// No way to mint a token: requests go out with an empty one.
    pub fn unset() -> Self {
        Self::with_source(Source::Unset)
    }

    pub fn from_config(config: &SearchConfig) -> Self {
        match config.session_token.as_deref().filter(|t| !t.is_empty()) {
            Some(t) => Self::configured(t),
            None if config.generate_session_token => Self::generated(),
            None => Self::unset(),
        }
    }

    fn with_source(source: Source) -> Self {
        Self {
            source,
            token: OnceCell::new(),
        }
    }

    /// The session token, minted on the first call.
    pub fn get(&self) -> &SessionToken {
        self.token.get_or_init(|| {
            let token = match &self.source {
                Source::Configured(t) => t.clone(),
                Source::Generated => uuid::Uuid::new_v4().to_string(),
                Source::Unset => {
                    tracing::warn!("no session token configured; requests use an empty token");
                    String::new()
                }
            };
            tracing::debug!(empty = token.is_empty(), "session token minted");
            SessionToken(token)
        })
    }

    /// Whether [`SessionTokenStore::get`] has been called yet.
    pub fn is_minted(&self) -> bool {
        self.token.get().is_some()
    }
}
