//! # Database Connection Pool Module
//!
//! Provides SQLite connection pooling configured for the song catalog.
//!
//! ## Features
//!
//! - **WAL Mode**: Enabled for better concurrency (multiple readers, one writer)
//! - **Connection Pooling**: Configurable min/max connections with timeouts
//! - **Statement Caching**: Automatic prepared statement caching
//! - **Automatic Migrations**: Runs on initialization
//! - **Health Checks**: Connection validation
//! - **Key reuse policy**: Whether a deleted song's (group, song) key may be
//!   inserted again
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_library::db::{apply_key_reuse_policy, create_pool, DatabaseConfig, KeyReusePolicy};
//!
//! let pool = create_pool(DatabaseConfig::new("songs.db")).await?;
//! apply_key_reuse_policy(&pool, KeyReusePolicy::ReuseAfterDelete).await?;
//! ```
//!
//! ## Testing
//!
//! For tests, use in-memory databases:
//!
//! ```rust,ignore
//! let pool = create_test_pool().await?;
//! ```

use crate::{LibraryError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, Sqlite};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Name of the optional index that makes (group, song) unique across deleted rows too.
pub const GLOBAL_KEY_INDEX: &str = "songs_group_song_idx";

/// Database configuration for SQLite connection pool
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Database URL (`sqlite:<path>` or `sqlite::memory:`)
    pub database_url: String,

    /// Minimum number of connections in the pool
    pub min_connections: u32,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Maximum time to wait for a connection from the pool
    pub acquire_timeout: Duration,

    /// Maximum lifetime of a connection
    pub max_lifetime: Option<Duration>,

    /// Maximum idle time for a connection before being closed
    pub idle_timeout: Option<Duration>,

    /// Enable statement caching (number of statements to cache)
    pub statement_cache_capacity: usize,
}

impl DatabaseConfig {
    /// Create a new database configuration for the given file path
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let config = DatabaseConfig::new("songs.db");
    /// ```
    pub fn new(database_path: impl Into<PathBuf>) -> Self {
        let path = database_path.into();
        Self::with_url(format!("sqlite:{}", path.display()))
    }

    /// Create a configuration from either a `sqlite:` URL or a bare file path
    pub fn from_url(url: &str) -> Self {
        let url = url.trim();
        if url == "sqlite::memory:" {
            Self::in_memory()
        } else if url.starts_with("sqlite:") {
            Self::with_url(url.to_string())
        } else {
            Self::new(url)
        }
    }

    fn with_url(database_url: String) -> Self {
        Self {
            database_url,
            min_connections: 1,
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
            max_lifetime: Some(Duration::from_secs(1800)), // 30 minutes
            idle_timeout: Some(Duration::from_secs(600)),  // 10 minutes
            statement_cache_capacity: 100,
        }
    }

    /// Create a configuration for an in-memory database (useful for testing)
    ///
    /// Connections never expire so the database lives as long as the pool.
    pub fn in_memory() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            min_connections: 1,
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
            max_lifetime: None,
            idle_timeout: None,
            statement_cache_capacity: 100,
        }
    }

    /// Set the minimum number of connections
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Set the maximum number of connections
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Set the connection acquire timeout
    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// Set the maximum connection lifetime
    pub fn max_lifetime(mut self, lifetime: Option<Duration>) -> Self {
        self.max_lifetime = lifetime;
        self
    }

    /// Set the idle timeout
    pub fn idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Set the statement cache capacity
    pub fn statement_cache_capacity(mut self, capacity: usize) -> Self {
        self.statement_cache_capacity = capacity;
        self
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::in_memory()
    }
}

/// What happens to the (group, song) key of a soft-deleted song.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyReusePolicy {
    /// Only live rows are unique; re-adding a deleted song creates a new row.
    #[default]
    ReuseAfterDelete,
    /// The key stays taken forever; re-adding a deleted song is a
    /// `DeletedConflict`.
    PreserveHistory,
}

/// Create a configured SQLite connection pool
///
/// This function:
/// 1. Configures SQLite connection options (WAL mode, foreign keys, etc.)
/// 2. Creates a connection pool with the specified configuration
/// 3. Runs database migrations
/// 4. Performs a health check
///
/// # Errors
///
/// Returns an error if:
/// - The database file cannot be accessed
/// - Connection pool creation fails
/// - Migrations fail
/// - Health check fails
pub async fn create_pool(config: DatabaseConfig) -> Result<Pool<Sqlite>> {
    info!(
        database_url = %config.database_url,
        min_connections = config.min_connections,
        max_connections = config.max_connections,
        "Creating database connection pool"
    );

    let connect_options = SqliteConnectOptions::from_str(&config.database_url)
        .map_err(LibraryError::Database)?
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true)
        .create_if_missing(true)
        .busy_timeout(Duration::from_secs(5))
        .pragma("cache_size", "-16000")
        .statement_cache_capacity(config.statement_cache_capacity);

    debug!("SQLite connection options configured");

    let pool = SqlitePoolOptions::new()
        .min_connections(config.min_connections)
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .max_lifetime(config.max_lifetime)
        .idle_timeout(config.idle_timeout)
        .connect_with(connect_options)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to create connection pool");
            LibraryError::Database(e)
        })?;

    info!(
        connections = pool.size(),
        "Database connection pool created successfully"
    );

    run_migrations(&pool).await?;
    health_check(&pool).await?;

    Ok(pool)
}

/// Create a connection pool for testing with in-memory database
///
/// Migrations are applied. The pool holds a single connection so tests see a
/// strictly serial store.
pub async fn create_test_pool() -> Result<Pool<Sqlite>> {
    create_pool(DatabaseConfig::in_memory().max_connections(1)).await
}

/// Run database migrations embedded from `migrations/`.
async fn run_migrations(pool: &Pool<Sqlite>) -> Result<()> {
    info!("Running database migrations");

    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Migration failed");
            LibraryError::Migration(e.to_string())
        })?;

    info!("Database migrations completed successfully");
    Ok(())
}

/// Perform a health check on the connection pool
///
/// # Errors
///
/// Returns an error if the health check query fails
pub async fn health_check(pool: &Pool<Sqlite>) -> Result<()> {
    debug!("Performing database health check");

    sqlx::query("SELECT 1").fetch_one(pool).await.map_err(|e| {
        warn!(error = %e, "Database health check failed");
        LibraryError::Database(e)
    })?;

    debug!("Database health check passed");
    Ok(())
}

/// Install or remove the global (group, song) unique index.
///
/// The partial index from the migrations is always present.
///
/// # Errors
///
/// Switching to [`KeyReusePolicy::PreserveHistory`] fails with a unique
/// violation if a deleted row already shares its key with another row.
pub async fn apply_key_reuse_policy(pool: &Pool<Sqlite>, policy: KeyReusePolicy) -> Result<()> {
    let statement = match policy {
        KeyReusePolicy::ReuseAfterDelete => format!("DROP INDEX IF EXISTS {}", GLOBAL_KEY_INDEX),
        KeyReusePolicy::PreserveHistory => format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS {} ON songs (\"group\", song)",
            GLOBAL_KEY_INDEX
        ),
    };

    sqlx::query(&statement).execute(pool).await.map_err(|e| {
        warn!(policy = ?policy, error = %e, "Failed to apply key reuse policy");
        LibraryError::Database(e)
    })?;

    info!(policy = ?policy, "Key reuse policy applied");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn index_exists(pool: &Pool<Sqlite>, name: &str) -> bool {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name = ?")
                .bind(name)
                .fetch_one(pool)
                .await
                .unwrap();
        count == 1
    }

    #[tokio::test]
    async fn test_create_in_memory_pool() {
        let pool = create_pool(DatabaseConfig::in_memory()).await;
        assert!(pool.is_ok(), "Should create in-memory pool successfully");
    }

    #[tokio::test]
    async fn test_health_check() {
        let pool = create_test_pool().await.unwrap();
        assert!(health_check(&pool).await.is_ok(), "Health check should pass");
    }

    #[test]
    fn test_database_config_builder() {
        let config = DatabaseConfig::in_memory()
            .min_connections(2)
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(60))
            .statement_cache_capacity(200);

        assert_eq!(config.min_connections, 2);
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.acquire_timeout, Duration::from_secs(60));
        assert_eq!(config.statement_cache_capacity, 200);
    }

    #[test]
    fn test_database_config_from_url() {
        assert_eq!(
            DatabaseConfig::from_url("sqlite://data/songs.db").database_url,
            "sqlite://data/songs.db"
        );
        assert_eq!(
            DatabaseConfig::from_url("songs.db").database_url,
            "sqlite:songs.db"
        );
        assert_eq!(
            DatabaseConfig::from_url("sqlite::memory:").database_url,
            "sqlite::memory:"
        );
    }

    #[tokio::test]
    async fn test_migrations_create_songs_table() {
        let pool = create_test_pool().await.unwrap();

        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'songs'",
        )
        .fetch_one(&pool)
        .await
        .unwrap();

        assert_eq!(count, 1, "songs table should exist");
        assert!(index_exists(&pool, "songs_live_group_song_idx").await);
        assert!(!index_exists(&pool, GLOBAL_KEY_INDEX).await);
    }

    #[tokio::test]
    async fn test_key_reuse_policy_toggles_global_index() {
        let pool = create_test_pool().await.unwrap();

        apply_key_reuse_policy(&pool, KeyReusePolicy::PreserveHistory)
            .await
            .unwrap();
        assert!(index_exists(&pool, GLOBAL_KEY_INDEX).await);

        // Idempotent in both directions.
        apply_key_reuse_policy(&pool, KeyReusePolicy::PreserveHistory)
            .await
            .unwrap();
        apply_key_reuse_policy(&pool, KeyReusePolicy::ReuseAfterDelete)
            .await
            .unwrap();
        apply_key_reuse_policy(&pool, KeyReusePolicy::ReuseAfterDelete)
            .await
            .unwrap();
        assert!(!index_exists(&pool, GLOBAL_KEY_INDEX).await);
    }

    #[test]
    fn test_default_policy_reuses_keys() {
        assert_eq!(KeyReusePolicy::default(), KeyReusePolicy::ReuseAfterDelete);
    }
}
