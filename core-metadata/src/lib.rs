//! # Song Metadata Module
//!
//! Looks up the details of a newly added song from the external music info
//! service: release date, lyrics and link.
//!
//! ## Overview
//!
//! - [`SongDetailProvider`](providers::SongDetailProvider) is the seam the
//!   catalog facade depends on
//! - [`MusicInfoClient`](providers::MusicInfoClient) implements it over the
//!   host [`HttpClient`](bridge_traits::HttpClient)

pub mod error;
pub mod providers;

pub use error::{MetadataError, Result};
pub use providers::{MusicInfoClient, SongDetail, SongDetailProvider};
