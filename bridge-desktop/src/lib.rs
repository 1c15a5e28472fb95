//! # Desktop Bridge Implementations
//!
//! Native implementations of the host bridge traits for desktop and server
//! builds.
//!
//! - [`ReqwestHttpClient`] - HTTP client using reqwest with rustls

pub mod http;

pub use http::ReqwestHttpClient;
