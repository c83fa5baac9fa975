//! mapsync-rs — workspace crate hosting the demos.
//!
//! Re-exports `mapsync-core` so the demos can `use mapsync_rs::prelude::*`.

pub mod prelude {
    pub use mapsync_core::*;
}
