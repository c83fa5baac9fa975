use clap::{Parser, Subcommand};
use mapsync_core::{Coordinate, SearchConfig};

/// CLI arguments for mapsync
#[derive(Debug, Parser)]
#[command(
    name = "mapsync",
    version,
    about = "Search places and drive a (console) map through the mapsync engine"
)]
pub struct CliArgs {
    /// Restrict results to a country (ISO 3166 alpha-2, e.g. US)
    #[arg(short = 'c', long = "country", global = true)]
    pub country: Option<String>,

    /// Maximum number of suggestions
    #[arg(short = 'l', long = "limit", global = true)]
    pub limit: Option<u32>,

    /// Bias results towards a position, as `lon,lat`
    #[arg(short = 'p', long = "proximity", global = true, value_parser = parse_coordinate)]
    pub proximity: Option<Coordinate>,

    /// Do not bias results by position at all
    #[arg(long = "no-proximity", global = true, conflicts_with = "proximity")]
    pub no_proximity: bool,

    /// Provider base URL (default: Mapbox Search Box v1)
    #[arg(long = "base-url", global = true)]
    pub base_url: Option<String>,

    /// Quiet period before a keystroke triggers a search, in milliseconds
    #[arg(long = "debounce-ms", global = true)]
    pub debounce_ms: Option<u64>,

    /// Print results as JSON
    #[arg(long = "json", global = true)]
    pub json: bool,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List suggestions for a query
    Suggest {
        /// Free-text query (e.g. "123 Main")
        query: String,
    },

    /// Resolve a suggestion id to its features
    Retrieve {
        /// Suggestion id as printed by `suggest`
        id: String,
    },

    /// Type a query, pick a suggestion and show what the map would do
    Pick {
        /// Free-text query
        query: String,

        /// Position of the suggestion to pick
        #[arg(short = 'n', long = "index", default_value_t = 0)]
        index: usize,
    },

    /// Print the session token requests would carry
    Token,
}

impl CliArgs {
    /// Environment first, flags on top. The CLI always has a session token.
    pub fn config(&self) -> SearchConfig {
        let mut config = SearchConfig::from_env();
        config.generate_session_token = true;
        if let Some(country) = &self.country {
            config.country = Some(country.clone());
        }
        if let Some(limit) = self.limit {
            config.limit = limit;
        }
        if self.no_proximity {
            config.proximity = None;
        } else if let Some(proximity) = self.proximity {
            config.proximity = Some(proximity);
        }
        if let Some(url) = &self.base_url {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(ms) = self.debounce_ms {
            config.debounce_ms = ms;
        }
        config
    }
}

fn parse_coordinate(s: &str) -> Result<Coordinate, String> {
    let (lon, lat) = s
        .split_once(',')
        .ok_or_else(|| format!("expected `lon,lat`, got {s:?}"))?;
    let lon: f64 = lon.trim().parse().map_err(|e| format!("longitude: {e}"))?;
    let lat: f64 = lat.trim().parse().map_err(|e| format!("latitude: {e}"))?;
    if !(-180.0..=180.0).contains(&lon) || !(-90.0..=90.0).contains(&lat) {
        return Err(format!("{s:?} is out of range"));
    }
    Ok(Coordinate::new(lon, lat))
}
