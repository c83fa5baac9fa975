// crates/mapsync-core/src/lib.rs

pub mod config;
pub mod engine; // Composes the three controllers below
pub mod error;
pub mod map;
pub mod markers; // Hover/popup state machine
pub mod model;
pub mod query; // Debounce + supersession
pub mod selection;
pub mod session;
// Provider wire format, shared by the reqwest client and the wasm host
#[doc(hidden)]
pub mod raw;

// Async pieces (tokio)
#[cfg(feature = "runtime")]
pub mod provider;
#[cfg(feature = "runtime")]
pub mod runtime;
#[cfg(feature = "http")]
pub mod client;

// Re-exports
pub use crate::config::{SearchConfig, SuggestOptions};
pub use crate::engine::{Effect, MapSearch, SearchView};
pub use crate::error::{Result, SearchError};
pub use crate::map::{MapCall, MapEngine, RecordingMap};
pub use crate::markers::{
    ActiveLocation, MarkerEvent, MarkerEventKind, MarkerId, MarkerSet, PlacedMarker,
};
pub use crate::model::{
    Coordinate, FeatureProperties, FlyTo, FlyToOptions, LocationFeature, Suggestion,
};
pub use crate::query::{DebounceTicket, Generation, SearchPhase, Settlement, SuggestRequest};
pub use crate::selection::{RetrieveRequest, RetrieveTicket};
pub use crate::session::{SessionToken, SessionTokenStore};

#[cfg(feature = "runtime")]
pub use crate::provider::{GeocodingProvider, ProviderFuture};
#[cfg(feature = "runtime")]
pub use crate::runtime::{Command, MarkerEvents, SearchHandle, SearchRuntime};
#[cfg(feature = "http")]
pub use crate::client::MapboxClient;
// Runtime users need the token type to implement a provider.
#[cfg(feature = "runtime")]
pub use tokio_util::sync::CancellationToken;
