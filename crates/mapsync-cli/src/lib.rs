//! mapsync-cli
//! ===========
//!
//! Command-line front end for the `mapsync-core` search-to-map engine.
//!
//! This crate primarily provides a binary (`mapsync`). The library target only
//! carries this overview so docs.rs renders a page for it.
//!
//! Quick start
//! -----------
//!
//! ```text
//! export MAPBOX_TOKEN=pk....
//! mapsync suggest "123 Main"
//! mapsync pick "123 Main" --index 0
//! mapsync token
//! ```
//!
//! For programmatic access use [`mapsync_core`] directly.
#![cfg_attr(docsrs, feature(doc_cfg))]
