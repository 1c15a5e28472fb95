//! External Metadata Providers
//!
//! A [`SongDetailProvider`] answers `(group, title) -> SongDetail`. The only
//! network implementation is [`MusicInfoClient`], which talks to the music
//! info HTTP API. Providers never retry; the caller owns the deadline.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod music_info;

pub use music_info::MusicInfoClient;

/// Details the metadata service knows about a song.
///
/// `release_date` is passed through verbatim in the service's `DD.MM.YYYY`
/// form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongDetail {
    #[serde(rename = "ReleaseDate", alias = "releaseDate", alias = "release_date", default)]
    pub release_date: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub link: String,
}

#[async_trait]
pub trait SongDetailProvider: Send + Sync {
    /// Look up release date, lyrics and link for a song
    ///
    /// # Errors
    ///
    /// Any failure of the remote service or the transport, including a body
    /// that does not decode.
    async fn lookup(&self, group: &str, title: &str) -> Result<SongDetail>;
}
