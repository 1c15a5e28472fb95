use crate::context::Interrupted;
use core_library::LibraryError;
use core_metadata::MetadataError;
use thiserror::Error;

/// Failure to assemble the service at startup.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Core initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Configuration error: {0}")]
    Config(#[from] core_runtime::Error),

    #[error("Library error: {0}")]
    Library(#[from] LibraryError),
}

pub type Result<T> = std::result::Result<T, CoreError>;

/// Stable classification of [`CatalogError`] for transport mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    AlreadyExists,
    DeletedConflict,
    NotFound,
    UpstreamFault,
    StorageFault,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::AlreadyExists => "already_exists",
            ErrorKind::DeletedConflict => "deleted_conflict",
            ErrorKind::NotFound => "not_found",
            ErrorKind::UpstreamFault => "upstream_fault",
            ErrorKind::StorageFault => "storage_fault",
        }
    }
}

/// Why the metadata phase of an add failed.
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error("release date {value:?} is not DD.MM.YYYY")]
    InvalidReleaseDate {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("metadata lookup interrupted: {0}")]
    Interrupted(#[from] Interrupted),
}

/// Why a storage operation failed.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error(transparent)]
    Library(#[from] LibraryError),

    #[error("storage operation interrupted: {0}")]
    Interrupted(#[from] Interrupted),
}

/// Domain errors returned by [`SongLibraryService`](crate::SongLibraryService).
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("song already exists: {group} - {title}")]
    AlreadyExists { group: String, title: String },

    #[error("song {group} - {title} was deleted")]
    DeletedConflict { group: String, title: String },

    #[error("song not found: {id}")]
    NotFound { id: String },

    #[error("metadata service failure: {0}")]
    UpstreamFault(#[from] UpstreamError),

    #[error("storage failure: {0}")]
    StorageFault(#[from] StorageError),
}

impl CatalogError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CatalogError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            CatalogError::DeletedConflict { .. } => ErrorKind::DeletedConflict,
            CatalogError::NotFound { .. } => ErrorKind::NotFound,
            CatalogError::UpstreamFault(_) => ErrorKind::UpstreamFault,
            CatalogError::StorageFault(_) => ErrorKind::StorageFault,
        }
    }
}

impl From<LibraryError> for CatalogError {
    fn from(error: LibraryError) -> Self {
        match error {
            LibraryError::AlreadyExists { group, title } => {
                CatalogError::AlreadyExists { group, title }
            }
            LibraryError::DeletedConflict { group, title } => {
                CatalogError::DeletedConflict { group, title }
            }
            LibraryError::NotFound { id, .. } => CatalogError::NotFound { id },
            other => CatalogError::StorageFault(StorageError::Library(other)),
        }
    }
}

pub type CatalogResult<T> = std::result::Result<T, CatalogError>;
