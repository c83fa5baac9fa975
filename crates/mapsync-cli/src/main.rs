//! mapsync — command-line front end for mapsync-core
//!
//! Talks to the Mapbox Search Box API with the same client, session token
//! and engine a UI would use, and prints what a map would be told to do.
//!
//! Usage examples
//! --------------
//!
//! - List suggestions (needs `MAPBOX_TOKEN`)
//!   $ mapsync suggest "123 Main"
//!   $ mapsync --country US --limit 3 suggest "123 Main"
//!
//! - Resolve a suggestion id
//!   $ mapsync retrieve dXJuOm1ieHBsYzo...
//!
//! - Run the whole pipeline: debounce, suggest, pick, fly, markers
//!   $ mapsync pick "Eiffel Tower" --index 0
//!
//! - Show the session token
//!   $ mapsync token
//!
//! Configuration
//! -------------
//!
//! `MAPBOX_TOKEN`, `MAPBOX_SESSION_TOKEN`, `MAPSYNC_BASE_URL`,
//! `MAPSYNC_COUNTRY`, `MAPSYNC_LIMIT` and `MAPSYNC_DEBOUNCE_MS` are read from
//! the environment; flags win. Logging follows `RUST_LOG`.
mod args;
mod console;

use crate::args::{CliArgs, Commands};
use crate::console::ConsoleMap;
use anyhow::{bail, Context};
use clap::Parser;
use mapsync_core::{
    LocationFeature, MapboxClient, SearchConfig, SearchPhase, SearchRuntime, SessionTokenStore,
    Suggestion,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    init_tracing(args.verbose);

    let config = args.config();
    let session = Arc::new(SessionTokenStore::from_config(&config));

    match &args.command {
        Commands::Token => println!("{}", session.get()),

        Commands::Suggest { query } => {
            config.require_access_token()?;
            let client = MapboxClient::new(&config, session)?;
            let hits = client
                .fetch_suggestions(query.trim(), &config.suggest_options(), None)
                .await?;
            print_suggestions(&hits, args.json)?;
        }

        Commands::Retrieve { id } => {
            config.require_access_token()?;
            let client = MapboxClient::new(&config, session)?;
            let features = client.fetch_features(id, None).await?;
            if features.is_empty() {
                println!("No location details found");
            }
            print_features(&features, args.json)?;
        }

        Commands::Pick { query, index } => {
            config.require_access_token()?;
            let client = MapboxClient::new(&config, session)?;
            pick(&config, client, query, *index, args.json).await?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Drive the full engine: type, wait for suggestions, select, wait for the map.
async fn pick(
    config: &SearchConfig,
    client: MapboxClient,
    query: &str,
    index: usize,
    json: bool,
) -> anyhow::Result<()> {
    let map = ConsoleMap::new(std::io::stdout());
    let (handle, task) = SearchRuntime::spawn(config, Arc::new(client), map);

    handle.input(query)?;
    let view = handle
        .wait_for(|v| matches!(v.phase, SearchPhase::Settled(_)))
        .await?;
    if let Some(err) = view.error {
        bail!(err);
    }
    print_suggestions(&view.suggestions, json)?;
    let chosen = view
        .suggestions
        .get(index)
        .with_context(|| format!("no suggestion at index {index}"))?;
    println!("picking: {}", chosen.name);

    handle.select_index(index)?;
    let view = handle
        .wait_for(|v| !v.markers.is_empty() || v.error.is_some())
        .await?;
    if let Some(err) = view.error {
        bail!(err);
    }
    println!("input now reads: {}", view.display);

    handle.shutdown();
    task.await.context("search runtime panicked")?;
    Ok(())
}

fn print_suggestions(hits: &[Suggestion], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(hits)?);
        return Ok(());
    }
    if hits.is_empty() {
        println!("No results found");
    }
    for (i, s) in hits.iter().enumerate() {
        println!("{i}. {} - {}  [{}]", s.name, s.formatted_place, s.id);
    }
    Ok(())
}

fn print_features(features: &[LocationFeature], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(features)?);
        return Ok(());
    }
    for f in features {
        println!("{} at {}", f.label(), f.coordinate);
        if let Some(address) = &f.properties.full_address {
            println!("  {address}");
        }
    }
    Ok(())
}
