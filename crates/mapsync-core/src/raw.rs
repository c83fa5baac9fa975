// crates/mapsync-core/src/raw.rs

//! # Provider Wire Format
//!
//! Raw response bodies as the Search Box API sends them, and their
//! normalization into [`Suggestion`] / [`LocationFeature`]. Kept free of any
//! transport so the reqwest client and the wasm host (which does its own
//! `fetch`) parse bodies the same way.

use crate::error::{Result, SearchError};
use crate::model::{Coordinate, FeatureProperties, LocationFeature, Suggestion};
use serde::Deserialize;

/// `GET /suggest` body. A missing `suggestions` field means "none".
#[derive(Debug, Deserialize)]
pub struct SuggestResponseRaw {
    #[serde(default)]
    pub suggestions: Option<Vec<Suggestion>>,
}

/// `GET /retrieve/{id}` body.
#[derive(Debug, Deserialize)]
pub struct RetrieveResponseRaw {
    #[serde(default)]
    pub features: Option<Vec<FeatureRaw>>,
}

/// A GeoJSON point feature.
#[derive(Debug, Deserialize)]
pub struct FeatureRaw {
    pub geometry: GeometryRaw,
    #[serde(default)]
    pub properties: PropertiesRaw,
}

#[derive(Debug, Deserialize)]
pub struct GeometryRaw {
    #[serde(default)]
    pub coordinates: Vec<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PropertiesRaw {
    #[serde(default)]
    pub mapbox_id: Option<String>,
    #[serde(flatten)]
    pub rest: FeatureProperties,
}

/// Parse a suggest body into suggestions.
pub fn parse_suggest_body(body: &str) -> Result<Vec<Suggestion>> {
    let raw: SuggestResponseRaw = serde_json::from_str(body)
        .map_err(|e| SearchError::Decode(format!("failed to search locations: {e}")))?;
    Ok(raw.suggestions.unwrap_or_default())
}

/// Parse a retrieve body into features.
///
/// Features without a usable point geometry are skipped; an empty result is
/// returned as an empty list, never as an error.
pub fn parse_retrieve_body(body: &str) -> Result<Vec<LocationFeature>> {
    let raw: RetrieveResponseRaw = serde_json::from_str(body)
        .map_err(|e| SearchError::Decode(format!("failed to retrieve location: {e}")))?;
    Ok(raw
        .features
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .filter_map(|(i, f)| feature_from_raw(i, f))
        .collect())
}

/// Error body the provider sends with non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorBodyRaw {
    message: Option<String>,
}

/// Build a [`SearchError::Provider`], preferring the provider's own message
/// over the canonical reason phrase.
pub fn provider_error(status: u16, reason: Option<&str>, body: &str) -> SearchError {
    let message = serde_json::from_str::<ErrorBodyRaw>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.is_empty())
        .or_else(|| reason.map(str::to_owned))
        .unwrap_or_default();
    SearchError::Provider { status, message }
}

fn feature_from_raw(index: usize, raw: FeatureRaw) -> Option<LocationFeature> {
    let &[longitude, latitude, ..] = raw.geometry.coordinates.as_slice() else {
        tracing::warn!(index, "dropping feature without point coordinates");
        return None;
    };
    let id = raw
        .properties
        .mapbox_id
        .unwrap_or_else(|| format!("feature-{index}"));
    Some(LocationFeature {
        id,
        coordinate: Coordinate::new(longitude, latitude),
        properties: raw.properties.rest,
    })
}
