//! Service assembly from a [`CoreConfig`].

use crate::error::{CoreError, Result};
use crate::service::SongLibraryService;
use bridge_traits::HttpClient;
use core_library::db::{apply_key_reuse_policy, create_pool, DatabaseConfig, KeyReusePolicy};
use core_library::SqliteSongRepository;
use core_metadata::MusicInfoClient;
use core_runtime::CoreConfig;
use std::sync::Arc;
use tracing::info;

/// Open the catalog database, migrate it and wire the facade around it.
///
/// The host supplies the HTTP client used for metadata lookups.
pub async fn bootstrap(
    config: &CoreConfig,
    http_client: Arc<dyn HttpClient>,
) -> Result<SongLibraryService> {
    config.validate()?;

    let db_config =
        DatabaseConfig::from_url(&config.database_url).max_connections(config.db_max_connections);
    let pool = create_pool(db_config).await?;

    let policy = if config.preserve_deleted_keys {
        KeyReusePolicy::PreserveHistory
    } else {
        KeyReusePolicy::ReuseAfterDelete
    };
    apply_key_reuse_policy(&pool, policy).await?;

    let repository = Arc::new(SqliteSongRepository::new(pool));
    let provider = Arc::new(
        MusicInfoClient::new(http_client, config.music_info_url.clone())
            .with_timeout(config.request_timeout),
    );

    info!(
        database = %config.database_url,
        music_info = %config.music_info_url,
        key_policy = ?policy,
        "Song library initialized"
    );

    Ok(SongLibraryService::new(repository, provider).with_default_timeout(config.request_timeout))
}

/// [`bootstrap`] with the reqwest-backed desktop HTTP client.
#[cfg(feature = "desktop-shims")]
pub async fn bootstrap_desktop(config: &CoreConfig) -> Result<SongLibraryService> {
    let http_client = bridge_desktop::ReqwestHttpClient::with_timeout(config.request_timeout)
        .map_err(|err| CoreError::InitializationFailed(err.to_string()))?;
    bootstrap(config, Arc::new(http_client)).await
}
