//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the song library core:
//! - Logging and tracing infrastructure
//! - Configuration management
//!
//! Other crates depend on the conventions set here: one `CoreConfig` per
//! process and one global `tracing` subscriber.

pub mod config;
pub mod error;
pub mod logging;

pub use config::CoreConfig;
pub use error::{Error, Result};
