//! Song catalog facade.
//!
//! [`SongLibraryService`] orchestrates the metadata lookup on add and
//! translates every store failure into a [`CatalogError`]. It holds no mutable
//! state and is cheap to clone across request tasks.

use crate::context::RequestContext;
use crate::error::{CatalogError, CatalogResult, StorageError, UpstreamError};
use chrono::NaiveDate;
use core_library::{
    LyricsPage, NewSong, PageRequest, Song, SongFilter, SongId, SongRepository, SongUpdate,
    SongsPage,
};
use core_metadata::SongDetailProvider;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Date format used by the metadata service.
pub const RELEASE_DATE_FORMAT: &str = "%d.%m.%Y";

/// Parse a `DD.MM.YYYY` release date.
pub fn parse_release_date(raw: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(raw.trim(), RELEASE_DATE_FORMAT)
}

/// Key of a song to add; everything else comes from the metadata service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddSongRequest {
    pub group: String,
    #[serde(rename = "song")]
    pub title: String,
}

impl AddSongRequest {
    pub fn new(group: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            title: title.into(),
        }
    }
}

#[derive(Clone)]
pub struct SongLibraryService {
    repository: Arc<dyn SongRepository>,
    provider: Arc<dyn SongDetailProvider>,
    default_timeout: Option<Duration>,
}

impl SongLibraryService {
    pub fn new(repository: Arc<dyn SongRepository>, provider: Arc<dyn SongDetailProvider>) -> Self {
        Self {
            repository,
            provider,
            default_timeout: None,
        }
    }

    /// Deadline applied to calls whose context carries none.
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = Some(timeout);
        self
    }

    /// Look up the song's details, then store it.
    ///
    /// # Errors
    ///
    /// - `UpstreamFault` if the lookup fails, is interrupted or returns an
    ///   unparsable release date
    /// - `AlreadyExists` / `DeletedConflict` on a key collision
    /// - `StorageFault` for any other store failure
    pub async fn add(&self, ctx: &RequestContext, request: &AddSongRequest) -> CatalogResult<Song> {
        let ctx = ctx.scoped(self.default_timeout);

        let detail = match ctx
            .run(self.provider.lookup(&request.group, &request.title))
            .await
        {
            Ok(Ok(detail)) => detail,
            Ok(Err(e)) => return Err(upstream_fault(request, UpstreamError::Metadata(e))),
            Err(interrupted) => {
                return Err(upstream_fault(request, UpstreamError::Interrupted(interrupted)))
            }
        };

        let release_date = parse_release_date(&detail.release_date).map_err(|source| {
            upstream_fault(
                request,
                UpstreamError::InvalidReleaseDate {
                    value: detail.release_date.clone(),
                    source,
                },
            )
        })?;

        let new_song = NewSong {
            group: request.group.clone(),
            title: request.title.clone(),
            release_date,
            text: detail.text,
            link: detail.link,
        };

        let song = in_storage(&ctx, self.repository.create(&new_song)).await?;
        info!(song_id = %song.id, group = %song.group, title = %song.title, "Song added");
        Ok(song)
    }

    /// Replace release date, lyrics and link of a live song.
    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: &SongId,
        update: &SongUpdate,
    ) -> CatalogResult<()> {
        let ctx = ctx.scoped(self.default_timeout);
        in_storage(&ctx, self.repository.update(id, update)).await
    }

    /// Soft-delete a live song. Deleting twice is `NotFound`.
    pub async fn delete(&self, ctx: &RequestContext, id: &SongId) -> CatalogResult<()> {
        let ctx = ctx.scoped(self.default_timeout);
        in_storage(&ctx, self.repository.soft_delete(id)).await
    }

    /// One page of verses of a live song.
    pub async fn lyrics(
        &self,
        ctx: &RequestContext,
        id: &SongId,
        page: PageRequest,
    ) -> CatalogResult<LyricsPage> {
        let ctx = ctx.scoped(self.default_timeout);
        in_storage(&ctx, self.repository.get_lyrics(id, page)).await
    }

    pub async fn list(
        &self,
        ctx: &RequestContext,
        filter: &SongFilter,
        page: PageRequest,
    ) -> CatalogResult<SongsPage> {
        let ctx = ctx.scoped(self.default_timeout);
        in_storage(&ctx, self.repository.list(filter, page)).await
    }

    pub async fn ping(&self, ctx: &RequestContext) -> CatalogResult<()> {
        let ctx = ctx.scoped(self.default_timeout);
        in_storage(&ctx, self.repository.ping()).await
    }
}

fn upstream_fault(request: &AddSongRequest, error: UpstreamError) -> CatalogError {
    warn!(
        group = %request.group,
        title = %request.title,
        error = %error,
        "Metadata lookup failed"
    );
    CatalogError::UpstreamFault(error)
}

async fn in_storage<T, F>(ctx: &RequestContext, work: F) -> CatalogResult<T>
where
    F: Future<Output = core_library::Result<T>>,
{
    match ctx.run(work).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => {
            let error = CatalogError::from(e);
            if let CatalogError::StorageFault(fault) = &error {
                warn!(error = %fault, "Storage operation failed");
            } else {
                debug!(kind = error.kind().as_str(), "Storage operation rejected");
            }
            Err(error)
        }
        Err(interrupted) => {
            warn!(cause = %interrupted, "Storage operation interrupted");
            Err(CatalogError::StorageFault(StorageError::Interrupted(
                interrupted,
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Interrupted;
    use crate::error::ErrorKind;
    use core_library::LibraryError;
    use core_metadata::{MetadataError, SongDetail};
    use mockall::mock;

    mock! {
        pub SongRepo {}

        #[async_trait::async_trait]
        impl SongRepository for SongRepo {
            async fn create(&self, song: &NewSong) -> core_library::Result<Song>;
            async fn update(&self, id: &SongId, update: &SongUpdate) -> core_library::Result<()>;
            async fn soft_delete(&self, id: &SongId) -> core_library::Result<()>;
            async fn get_lyrics(&self, id: &SongId, page: PageRequest) -> core_library::Result<LyricsPage>;
            async fn list(&self, filter: &SongFilter, page: PageRequest) -> core_library::Result<SongsPage>;
            async fn find_active_by_key(&self, group: &str, title: &str) -> core_library::Result<Option<Song>>;
            async fn ping(&self) -> core_library::Result<()>;
        }
    }

    mock! {
        pub Provider {}

        #[async_trait::async_trait]
        impl SongDetailProvider for Provider {
            async fn lookup(&self, group: &str, title: &str) -> core_metadata::Result<SongDetail>;
        }
    }

    fn detail(release_date: &str) -> SongDetail {
        SongDetail {
            release_date: release_date.to_string(),
            text: "line1\n\nline2".to_string(),
            link: "https://example.com".to_string(),
        }
    }

    fn service(repo: MockSongRepo, provider: MockProvider) -> SongLibraryService {
        SongLibraryService::new(Arc::new(repo), Arc::new(provider))
    }

    fn stored(song: &NewSong) -> Song {
        Song {
            id: SongId::from("generated"),
            group: song.group.clone(),
            title: song.title.clone(),
            release_date: song.release_date,
            text: song.text.clone(),
            link: song.link.clone(),
        }
    }

    #[test]
    fn test_parse_release_date() {
        assert_eq!(
            parse_release_date("16.07.2006").unwrap(),
            NaiveDate::from_ymd_opt(2006, 7, 16).unwrap()
        );
        assert!(parse_release_date("2006-07-16").is_err());
        assert!(parse_release_date("31.02.2006").is_err());
        assert!(parse_release_date("").is_err());
    }

    #[tokio::test]
    async fn test_add_stores_metadata() {
        let mut provider = MockProvider::new();
        provider
            .expect_lookup()
            .withf(|group, title| group == "Muse" && title == "Supermassive Black Hole")
            .times(1)
            .returning(|_, _| Ok(detail("16.07.2006")));

        let mut repo = MockSongRepo::new();
        repo.expect_create()
            .withf(|song: &NewSong| {
                song.release_date == NaiveDate::from_ymd_opt(2006, 7, 16).unwrap()
                    && song.text == "line1\n\nline2"
            })
            .times(1)
            .returning(|song| Ok(stored(song)));

        let song = service(repo, provider)
            .add(
                &RequestContext::background(),
                &AddSongRequest::new("Muse", "Supermassive Black Hole"),
            )
            .await
            .unwrap();
        assert_eq!(song.link, "https://example.com");
    }

    #[tokio::test]
    async fn test_add_lookup_failure_is_upstream_fault() {
        let mut provider = MockProvider::new();
        provider.expect_lookup().returning(|_, _| {
            Err(MetadataError::RemoteFailure {
                status: 500,
                body: "down".to_string(),
            })
        });
        let mut repo = MockSongRepo::new();
        repo.expect_create().never();

        let error = service(repo, provider)
            .add(&RequestContext::background(), &AddSongRequest::new("Muse", "Uprising"))
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::UpstreamFault);
    }

    #[tokio::test]
    async fn test_add_bad_release_date_is_upstream_fault() {
        let mut provider = MockProvider::new();
        provider
            .expect_lookup()
            .returning(|_, _| Ok(detail("2006/07/16")));
        let mut repo = MockSongRepo::new();
        repo.expect_create().never();

        let error = service(repo, provider)
            .add(&RequestContext::background(), &AddSongRequest::new("Muse", "Uprising"))
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            CatalogError::UpstreamFault(UpstreamError::InvalidReleaseDate { .. })
        ));
    }

    #[tokio::test]
    async fn test_add_passes_store_conflicts_through() {
        let mut provider = MockProvider::new();
        provider
            .expect_lookup()
            .returning(|_, _| Ok(detail("16.07.2006")));
        let mut repo = MockSongRepo::new();
        repo.expect_create().returning(|song| {
            Err(LibraryError::DeletedConflict {
                group: song.group.clone(),
                title: song.title.clone(),
            })
        });

        let error = service(repo, provider)
            .add(&RequestContext::background(), &AddSongRequest::new("Muse", "Uprising"))
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::DeletedConflict);
    }

    #[tokio::test]
    async fn test_add_with_cancelled_context_never_reaches_collaborators() {
        let mut provider = MockProvider::new();
        provider.expect_lookup().never();
        let mut repo = MockSongRepo::new();
        repo.expect_create().never();

        let ctx = RequestContext::background();
        ctx.cancel();

        let error = service(repo, provider)
            .add(&ctx, &AddSongRequest::new("Muse", "Uprising"))
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            CatalogError::UpstreamFault(UpstreamError::Interrupted(Interrupted::Cancelled))
        ));
    }

    #[tokio::test]
    async fn test_storage_operations_translate_errors() {
        let mut repo = MockSongRepo::new();
        repo.expect_soft_delete().returning(|id| {
            Err(LibraryError::NotFound {
                entity_type: "Song".to_string(),
                id: id.to_string(),
            })
        });
        repo.expect_ping()
            .returning(|| Err(LibraryError::Database(sqlx::Error::PoolClosed)));
        repo.expect_list().returning(|_, page| {
            Ok(SongsPage {
                songs: Vec::new(),
                page: page.page,
                size: page.size,
            })
        });

        let service = service(repo, MockProvider::new());
        let ctx = RequestContext::background();

        let error = service.delete(&ctx, &SongId::from("gone")).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::NotFound);

        let error = service.ping(&ctx).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::StorageFault);

        let page = service
            .list(&ctx, &SongFilter::new().with_group("Muse"), PageRequest::new(1, 10))
            .await
            .unwrap();
        assert!(page.songs.is_empty());
        assert_eq!((page.page, page.size), (1, 10));
    }

    #[tokio::test]
    async fn test_cancelled_storage_call_is_storage_fault() {
        let mut repo = MockSongRepo::new();
        repo.expect_get_lyrics().never();

        let ctx = RequestContext::background();
        ctx.cancel();

        let error = service(repo, MockProvider::new())
            .lyrics(&ctx, &SongId::from("x"), PageRequest::lyrics_default())
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            CatalogError::StorageFault(StorageError::Interrupted(Interrupted::Cancelled))
        ));
    }
}
