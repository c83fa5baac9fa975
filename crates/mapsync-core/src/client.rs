// crates/mapsync-core/src/client.rs
#![cfg(feature = "http")]

//! # Geocoding Client
//!
//! reqwest-backed client for the Mapbox Search Box API. Stateless apart from
//! the shared session token: every call checks the access token, attaches
//! both tokens, and normalizes failures into [`SearchError`].

use crate::config::{SearchConfig, SuggestOptions};
use crate::error::{Result, SearchError};
use crate::model::{LocationFeature, Suggestion};
use crate::provider::{cancellable, GeocodingProvider, ProviderFuture};
use crate::raw;
use crate::session::SessionTokenStore;
use reqwest::Url;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const USER_AGENT: &str = concat!("mapsync/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct MapboxClient {
    http: reqwest::Client,
    base_url: Url,
    access_token: Option<String>,
    session: Arc<SessionTokenStore>,
}

/// Which operation a request belongs to; prefixes transport errors.
#[derive(Debug, Clone, Copy)]
enum Operation {
    Suggest,
    Retrieve,
}

impl Operation {
    fn failure(self, detail: impl std::fmt::Display) -> String {
        match self {
            Operation::Suggest => format!("failed to search locations: {detail}"),
            Operation::Retrieve => format!("failed to retrieve location: {detail}"),
        }
    }
}

impl MapboxClient {
    pub fn new(config: &SearchConfig, session: Arc<SessionTokenStore>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| SearchError::Config(format!("failed to build HTTP client: {e}")))?;
        Self::with_http(http, config, session)
    }

    /// Use a caller-provided reqwest client (proxies, custom TLS, ...).
    pub fn with_http(
        http: reqwest::Client,
        config: &SearchConfig,
        session: Arc<SessionTokenStore>,
    ) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            SearchError::Config(format!("invalid base url {:?}: {e}", config.base_url))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(SearchError::Config(format!(
                "base url {:?} cannot carry a path",
                config.base_url
            )));
        }
        Ok(Self {
            http,
            base_url,
            access_token: config.access_token.clone().filter(|t| !t.is_empty()),
            session,
        })
    }

    pub fn session(&self) -> &Arc<SessionTokenStore> {
        &self.session
    }

    fn access_token(&self) -> Result<&str> {
        self.access_token
            .as_deref()
            .ok_or_else(SearchError::missing_access_token)
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// `GET {base}/suggest?...`
    pub fn suggest_url(&self, query: &str, options: &SuggestOptions) -> Result<Url> {
        let access_token = self.access_token()?;
        let mut url = self.endpoint(&["suggest"]);
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("q", query)
                .append_pair("access_token", access_token)
                .append_pair("session_token", self.session.get().as_str());
            if let Some(country) = &options.country {
                pairs.append_pair("country", country);
            }
            pairs.append_pair("limit", &options.limit.to_string());
            if let Some(proximity) = options.proximity {
                pairs.append_pair("proximity", &proximity.to_string());
            }
        }
        Ok(url)
    }

    /// `GET {base}/retrieve/{id}?...`
    pub fn retrieve_url(&self, id: &str) -> Result<Url> {
        let access_token = self.access_token()?;
        let mut url = self.endpoint(&["retrieve", id]);
        url.query_pairs_mut()
            .append_pair("access_token", access_token)
            .append_pair("session_token", self.session.get().as_str());
        Ok(url)
    }

    pub async fn fetch_suggestions(
        &self,
        query: &str,
        options: &SuggestOptions,
        cancel: Option<&CancellationToken>,
    ) -> Result<Vec<Suggestion>> {
        let url = self.suggest_url(query, options)?;
        tracing::debug!(%query, limit = options.limit, "suggest request");
        let body = cancellable(cancel, self.get(url, Operation::Suggest)).await?;
        raw::parse_suggest_body(&body)
    }

    pub async fn fetch_features(
        &self,
        id: &str,
        cancel: Option<&CancellationToken>,
    ) -> Result<Vec<LocationFeature>> {
        let url = self.retrieve_url(id)?;
        tracing::debug!(%id, "retrieve request");
        let body = cancellable(cancel, self.get(url, Operation::Retrieve)).await?;
        raw::parse_retrieve_body(&body)
    }

    async fn get(&self, url: Url, op: Operation) -> Result<String> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| SearchError::Transport(op.failure(e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SearchError::Transport(op.failure(e)))?;

        if !status.is_success() {
            let err = raw::provider_error(status.as_u16(), status.canonical_reason(), &body);
            tracing::warn!(status = status.as_u16(), error = %err, "provider rejected request");
            return Err(err);
        }
        Ok(body)
    }
}

impl GeocodingProvider for MapboxClient {
    fn suggest(
        &self,
        query: String,
        options: SuggestOptions,
        cancel: CancellationToken,
    ) -> ProviderFuture<'_, Vec<Suggestion>> {
        Box::pin(async move { self.fetch_suggestions(&query, &options, Some(&cancel)).await })
    }

    fn retrieve(
        &self,
        id: String,
        cancel: Option<CancellationToken>,
    ) -> ProviderFuture<'_, Vec<LocationFeature>> {
        Box::pin(async move { self.fetch_features(&id, cancel.as_ref()).await })
    }
}
