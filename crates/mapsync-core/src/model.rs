// crates/mapsync-core/src/model.rs
use serde::{Deserialize, Serialize};
use std::fmt;

/// A WGS84 position, longitude first as in GeoJSON.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub longitude: f64,
    pub latitude: f64,
}

impl Coordinate {
    pub const fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((longitude, latitude): (f64, f64)) -> Self {
        Self::new(longitude, latitude)
    }
}

/// `lon,lat`, the form the provider expects for `proximity`.
impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.longitude, self.latitude)
    }
}

/// A lightweight candidate returned by `suggest`.
///
/// Identity is `id`; the value is only meaningful together with the session
/// token it was issued under. Full detail needs a follow-up `retrieve`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    #[serde(rename = "mapbox_id")]
    pub id: String,
    pub name: String,
    #[serde(rename = "place_formatted", default)]
    pub formatted_place: String,
    /// Maki icon name, used as a coarse category.
    #[serde(rename = "maki", default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_address: Option<String>,
}

impl Suggestion {
    pub fn new(id: impl Into<String>, name: impl Into<String>, place: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            formatted_place: place.into(),
            category: None,
            feature_type: None,
            full_address: None,
        }
    }
}

/// Descriptive properties of a retrieved feature.
///
/// The well-known fields are lifted out; anything else the provider sends is
/// kept verbatim in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_formatted: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maki: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// The resolved detail for a suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationFeature {
    pub id: String,
    pub coordinate: Coordinate,
    #[serde(default)]
    pub properties: FeatureProperties,
}

impl LocationFeature {
    pub fn new(id: impl Into<String>, coordinate: impl Into<Coordinate>) -> Self {
        Self {
            id: id.into(),
            coordinate: coordinate.into(),
            properties: FeatureProperties::default(),
        }
    }

    /// Best label for a popup: name, then full address, then the id.
    pub fn label(&self) -> &str {
        self.properties
            .name
            .as_deref()
            .or(self.properties.full_address.as_deref())
            .unwrap_or(&self.id)
    }
}

/// Camera parameters that do not depend on the target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlyToOptions {
    pub zoom: f64,
    pub speed: f64,
    pub duration_ms: u64,
    /// Play the animation even under reduced-motion preferences.
    pub essential: bool,
}

impl Default for FlyToOptions {
    fn default() -> Self {
        Self {
            zoom: 14.0,
            speed: 4.0,
            duration_ms: 1000,
            essential: true,
        }
    }
}

/// A complete camera command.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlyTo {
    pub center: Coordinate,
    pub zoom: f64,
    pub speed: f64,
    pub duration_ms: u64,
    pub essential: bool,
}

impl FlyTo {
    pub fn new(center: Coordinate, options: &FlyToOptions) -> Self {
        Self {
            center,
            zoom: options.zoom,
            speed: options.speed,
            duration_ms: options.duration_ms,
            essential: options.essential,
        }
    }
}
