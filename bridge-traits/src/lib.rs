//! # Host Bridge Traits
//!
//! Capability traits the song library core needs from its host but does not
//! implement itself.
//!
//! ## Traits
//!
//! - [`HttpClient`](http::HttpClient) - Async HTTP operations used by the
//!   metadata collaborator
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate |
//! |----------|---------------------|
//! | Desktop / server | `bridge-desktop` |
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type. Platform
//! implementations convert their native errors into it and keep the message
//! actionable (URL, timeout, connect failure).
//!
//! ## Thread Safety
//!
//! Bridge traits require `Send + Sync` so a single handle can be shared by
//! every in-flight request task.

pub mod error;
pub mod http;

pub use error::BridgeError;
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
