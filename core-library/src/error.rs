use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Song already exists: {group} - {title}")]
    AlreadyExists { group: String, title: String },

    #[error("Song {group} - {title} was deleted and its key is still reserved")]
    DeletedConflict { group: String, title: String },

    #[error("Invalid input: {field} - {message}")]
    InvalidInput { field: String, message: String },

    #[error("Migration failed: {0}")]
    Migration(String),
}

impl LibraryError {
    pub(crate) fn song_not_found(id: impl ToString) -> Self {
        LibraryError::NotFound {
            entity_type: "Song".to_string(),
            id: id.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LibraryError>;
