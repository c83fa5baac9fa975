//! End-to-end example for mapsync-rs
//!
//! This example demonstrates how to:
//! - Run the search runtime against a provider (an offline one here)
//! - Type a burst of keystrokes and watch only the last one hit the provider
//! - Pick a suggestion and see the camera and markers follow
//!
//! Set `RUST_LOG=mapsync_core=debug` to watch debounce and supersession.

use mapsync_rs::prelude::*;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A provider answering from a fixed table after a short delay.
struct OfflineProvider {
    latency: Duration,
}

impl OfflineProvider {
    fn places() -> Vec<(Suggestion, LocationFeature)> {
        let mut main_st = LocationFeature::new("main-st", (-122.1, 37.4));
        main_st.properties.name = Some("123 Main St".into());
        main_st.properties.full_address = Some("123 Main St, Springfield".into());
        let mut main_ave = LocationFeature::new("main-ave", (-122.3, 37.6));
        main_ave.properties.name = Some("123 Main Ave".into());
        vec![
            (Suggestion::new("main-st", "123 Main St", "Springfield"), main_st),
            (Suggestion::new("main-ave", "123 Main Ave", "Shelbyville"), main_ave),
        ]
    }
}

impl GeocodingProvider for OfflineProvider {
    fn suggest(
        &self,
        query: String,
        options: SuggestOptions,
        cancel: CancellationToken,
    ) -> ProviderFuture<'_, Vec<Suggestion>> {
        Box::pin(async move {
            println!("  provider: suggest {query:?}");
            let latency = self.latency;
            mapsync_core::provider::cancellable(Some(&cancel), async move {
                tokio::time::sleep(latency).await;
                let needle = query.to_lowercase();
                Ok(Self::places()
                    .into_iter()
                    .map(|(s, _)| s)
                    .filter(|s| s.name.to_lowercase().contains(&needle))
                    .take(options.limit as usize)
                    .collect())
            })
            .await
        })
    }

    fn retrieve(
        &self,
        id: String,
        cancel: Option<CancellationToken>,
    ) -> ProviderFuture<'_, Vec<LocationFeature>> {
        Box::pin(async move {
            println!("  provider: retrieve {id:?}");
            let latency = self.latency;
            mapsync_core::provider::cancellable(cancel.as_ref(), async move {
                tokio::time::sleep(latency).await;
                Ok(Self::places()
                    .into_iter()
                    .filter(|(s, _)| s.id == id)
                    .map(|(_, f)| f)
                    .collect())
            })
            .await
        })
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    println!("=== mapsync end-to-end example ===\n");

    let config = SearchConfig {
        debounce_ms: 300,
        ..SearchConfig::default()
    };
    let provider = Arc::new(OfflineProvider {
        latency: Duration::from_millis(80),
    });
    let map = Arc::new(Mutex::new(RecordingMap::new()));
    let (handle, task) = SearchRuntime::spawn(&config, provider, Arc::clone(&map));

    // Example 1: typing
    println!("--- Example 1: typing \"123 Main\" one key at a time ---");
    let mut typed = String::new();
    for ch in "123 Main".chars() {
        typed.push(ch);
        handle.input(typed.clone())?;
        tokio::time::sleep(Duration::from_millis(60)).await;
    }
    let view = handle
        .wait_for(|v| matches!(v.phase, SearchPhase::Settled(_)))
        .await?;
    for (i, s) in view.suggestions.iter().enumerate() {
        println!("  {i}. {} - {}", s.name, s.formatted_place);
    }
    println!();

    // Example 2: picking
    println!("--- Example 2: picking the first suggestion ---");
    handle.select_index(0)?;
    let view = handle
        .wait_for(|v| !v.markers.is_empty() || v.error.is_some())
        .await?;
    println!("  input reads: {}", view.display);
    println!("  panel open: {}", view.open);
    {
        let map = map.lock().map_err(|_| SearchError::Closed)?;
        for camera in map.camera_moves() {
            println!("  camera: fly to {} at zoom {}", camera.center, camera.zoom);
        }
        println!("  markers on map: {}", map.attached().len());
    }
    println!();

    // Example 3: clearing
    println!("--- Example 3: clear ---");
    handle.clear()?;
    let view = handle.wait_for(|v| v.markers.is_empty()).await?;
    println!("  query: {:?}, markers: {}", view.query, view.markers.len());

    handle.shutdown();
    let _ = task.await;
    println!("\n✓ done");
    Ok(())
}
