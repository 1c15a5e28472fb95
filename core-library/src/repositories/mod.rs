//! # Repository Pattern Implementation
//!
//! Repository traits and their SQLite implementations.
//!
//! ## Architecture
//!
//! - Traits define the interface for each repository
//! - SQLite implementations use sqlx for async database access
//! - All operations return `Result<T>` for error handling
//! - Pagination is expressed with 1-based [`PageRequest`]s
//!
//! ## Available Repositories
//!
//! - `SongRepository` - Songs with soft-delete, filtered listing and lyric pages

pub mod pagination;
pub mod song;

pub use pagination::{PageRequest, DEFAULT_LYRICS_PAGE_SIZE, DEFAULT_SONGS_PAGE_SIZE};
pub use song::{SongRepository, SqliteSongRepository};
