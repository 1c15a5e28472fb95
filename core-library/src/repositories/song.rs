//! Song repository trait and SQLite implementation

use crate::db::health_check;
use crate::error::{LibraryError, Result};
use crate::models::{LyricsPage, NewSong, Song, SongFilter, SongId, SongUpdate, SongsPage};
use crate::query::{SongQuery, SqlParam};
use crate::repositories::PageRequest;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::{debug, info, warn};

/// Song repository interface
///
/// Every operation is scoped to live (not soft-deleted) songs.
#[async_trait]
pub trait SongRepository: Send + Sync {
    /// Insert a new song under a freshly generated id
    ///
    /// # Errors
    /// - `AlreadyExists` if a live song has the same (group, title)
    /// - `DeletedConflict` if the key is held by a soft-deleted song
    /// - `Database` for any other failure
    async fn create(&self, song: &NewSong) -> Result<Song>;

    /// Overwrite the mutable fields of a live song
    ///
    /// # Errors
    /// Returns `NotFound` if the id is unknown or the song is deleted
    async fn update(&self, id: &SongId, update: &SongUpdate) -> Result<()>;

    /// Mark a live song as deleted
    ///
    /// # Errors
    /// Returns `NotFound` if the id is unknown or already deleted
    async fn soft_delete(&self, id: &SongId) -> Result<()>;

    /// One page of verses of a live song
    ///
    /// # Errors
    /// Returns `NotFound` if the id is unknown or the song is deleted
    async fn get_lyrics(&self, id: &SongId, page: PageRequest) -> Result<LyricsPage>;

    /// Live songs matching `filter`, in insertion order
    ///
    /// An empty page is not an error.
    async fn list(&self, filter: &SongFilter, page: PageRequest) -> Result<SongsPage>;

    /// The live song holding (group, title), if any
    async fn find_active_by_key(&self, group: &str, title: &str) -> Result<Option<Song>>;

    /// Liveness of the underlying store
    async fn ping(&self) -> Result<()>;
}

/// SQLite implementation of SongRepository
pub struct SqliteSongRepository {
    pool: SqlitePool,
}

impl SqliteSongRepository {
    /// Create a new SQLite song repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn to_timestamp(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.is_unique_violation())
}

pub(crate) fn row_to_song(row: &SqliteRow) -> Result<Song> {
    let id: String = row.try_get("id")?;
    let release_date: DateTime<Utc> = row.try_get("release_date")?;

    Ok(Song {
        id: SongId::from(id),
        group: row.try_get("group")?,
        title: row.try_get("song")?,
        release_date: release_date.date_naive(),
        text: row.try_get("text")?,
        link: row.try_get("link")?,
    })
}

#[async_trait]
impl SongRepository for SqliteSongRepository {
    async fn create(&self, song: &NewSong) -> Result<Song> {
        song.validate().map_err(|msg| LibraryError::InvalidInput {
            field: "song".to_string(),
            message: msg,
        })?;

        let id = SongId::new();

        // Dropping an uncommitted transaction rolls it back, so an interrupted
        // insert leaves no row behind.
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO songs (id, "group", song, release_date, text, link)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.as_str())
        .bind(&song.group)
        .bind(&song.title)
        .bind(to_timestamp(song.release_date))
        .bind(&song.text)
        .bind(&song.link)
        .execute(&mut *tx)
        .await;

        match inserted {
            Ok(_) => {
                tx.commit().await?;
                info!(song_id = %id, group = %song.group, title = %song.title, "Song created");
                Ok(song.clone().into_song(id))
            }
            Err(e) if is_unique_violation(&e) => {
                tx.rollback().await?;
                // A concurrent delete between the insert and this lookup reports
                // DeletedConflict for what was a live duplicate.
                let live = self.find_active_by_key(&song.group, &song.title).await?;
                let (group, title) = (song.group.clone(), song.title.clone());
                if live.is_some() {
                    debug!(group = %group, title = %title, "Live duplicate rejected");
                    Err(LibraryError::AlreadyExists { group, title })
                } else {
                    debug!(group = %group, title = %title, "Key held by a deleted song");
                    Err(LibraryError::DeletedConflict { group, title })
                }
            }
            Err(e) => {
                warn!(error = %e, "Song insert failed");
                Err(LibraryError::Database(e))
            }
        }
    }

    async fn update(&self, id: &SongId, update: &SongUpdate) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            r#"
            UPDATE songs SET release_date = ?, text = ?, link = ?
            WHERE id = ? AND deleted = 0
            "#,
        )
        .bind(to_timestamp(update.release_date))
        .bind(&update.text)
        .bind(&update.link)
        .bind(id.as_str())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(LibraryError::song_not_found(id));
        }

        tx.commit().await?;
        debug!(song_id = %id, "Song updated");
        Ok(())
    }

    async fn soft_delete(&self, id: &SongId) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("UPDATE songs SET deleted = 1 WHERE id = ? AND deleted = 0")
            .bind(id.as_str())
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(LibraryError::song_not_found(id));
        }

        tx.commit().await?;
        info!(song_id = %id, "Song soft-deleted");
        Ok(())
    }

    async fn get_lyrics(&self, id: &SongId, page: PageRequest) -> Result<LyricsPage> {
        let row = sqlx::query(r#"SELECT "group", song, text FROM songs WHERE id = ? AND deleted = 0"#)
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| LibraryError::song_not_found(id))?;

        let group: String = row.try_get("group")?;
        let title: String = row.try_get("song")?;
        let text: String = row.try_get("text")?;

        Ok(LyricsPage::from_text(id.clone(), group, title, &text, page))
    }

    async fn list(&self, filter: &SongFilter, page: PageRequest) -> Result<SongsPage> {
        let compiled = SongQuery::from_filter(filter, page).compile();
        debug!(sql = %compiled.sql, params = compiled.params.len(), "Listing songs");

        let mut query = sqlx::query(&compiled.sql);
        for param in &compiled.params {
            query = match param {
                SqlParam::Text(value) => query.bind(value.clone()),
                SqlParam::Timestamp(value) => query.bind(*value),
                SqlParam::Integer(value) => query.bind(*value),
            };
        }

        let rows = query.fetch_all(&self.pool).await?;
        let songs = rows.iter().map(row_to_song).collect::<Result<Vec<_>>>()?;

        Ok(SongsPage {
            songs,
            page: page.page,
            size: page.size,
        })
    }

    async fn find_active_by_key(&self, group: &str, title: &str) -> Result<Option<Song>> {
        let row = sqlx::query(
            r#"
            SELECT id, "group", song, release_date, text, link FROM songs
            WHERE "group" = ? AND song = ? AND deleted = 0
            "#,
        )
        .bind(group)
        .bind(title)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_song).transpose()
    }

    async fn ping(&self) -> Result<()> {
        health_check(&self.pool).await
    }
}
