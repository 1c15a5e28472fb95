//! Workspace umbrella crate.
//!
//! Re-exports the song catalog facade from `core-service` so host
//! applications can depend on `song-library` alone and pick the bridge
//! implementation through the `desktop-shims` feature.

#[cfg(feature = "service")]
pub use core_service::*;
