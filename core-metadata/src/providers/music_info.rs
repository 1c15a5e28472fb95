//! Music Info API Client
//!
//! ## API Endpoints
//!
//! - **Song info**: `GET {base}/info?group={group}&song={song}`
//!
//! ## Status handling
//!
//! | Status | Result |
//! |--------|--------|
//! | 200 | body decoded as [`SongDetail`] |
//! | 400 | [`MetadataError::Rejected`] |
//! | 5xx | [`MetadataError::RemoteFailure`] |
//! | other | [`MetadataError::UnexpectedStatus`] |
//!
//! ## Usage
//!
//! ```ignore
//! use core_metadata::providers::{MusicInfoClient, SongDetailProvider};
//!
//! let client = MusicInfoClient::new(http_client, "http://localhost:8081");
//! let detail = client.lookup("Muse", "Supermassive Black Hole").await?;
//! ```

use crate::error::{MetadataError, Result};
use crate::providers::{SongDetail, SongDetailProvider};
use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpRequest};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Longest response body kept in error messages
const MAX_ERROR_BODY: usize = 512;

pub struct MusicInfoClient {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    timeout: Option<Duration>,
}

impl MusicInfoClient {
    /// # Arguments
    ///
    /// * `http_client` - HTTP client for making requests
    /// * `base_url` - API root, without the `/info` path
    pub fn new(http_client: Arc<dyn HttpClient>, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: None,
        }
    }

    /// Per-request timeout handed to the HTTP client
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_request(&self, group: &str, title: &str) -> HttpRequest {
        let mut request = HttpRequest::get(format!("{}/info", self.base_url))
            .query("group", group)
            .query("song", title)
            .header("Accept", "application/json");

        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        request
    }
}

fn truncated_body(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    match text.char_indices().nth(MAX_ERROR_BODY) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.into_owned(),
    }
}

#[async_trait]
impl SongDetailProvider for MusicInfoClient {
    async fn lookup(&self, group: &str, title: &str) -> Result<SongDetail> {
        let request = self.build_request(group, title);
        debug!(url = %request.full_url(), "Querying music info API");

        let response = self.http_client.execute(request).await.map_err(|e| {
            warn!(group = %group, title = %title, error = %e, "Music info request failed");
            MetadataError::Bridge(e)
        })?;

        match response.status {
            200 => serde_json::from_slice::<SongDetail>(&response.body).map_err(|e| {
                MetadataError::InvalidResponse(format!("Failed to decode song details: {}", e))
            }),
            400 => Err(MetadataError::Rejected {
                status: response.status,
                body: truncated_body(&response.body),
            }),
            status if response.is_server_error() => Err(MetadataError::RemoteFailure {
                status,
                body: truncated_body(&response.body),
            }),
            status => Err(MetadataError::UnexpectedStatus { status }),
        }
    }
}
