//! # Song Library Module
//!
//! Owns the song catalog database and the repository used to reach it.
//!
//! ## Overview
//!
//! This module manages:
//! - SQLite schema, migrations and the connection pool
//! - The song entity and its paginated read shapes
//! - A predicate-based query compiler for filtered listings
//! - Soft-delete semantics and (group, song) uniqueness among live rows

pub mod db;
pub mod error;
pub mod models;
pub mod query;
pub mod repositories;

pub use error::{LibraryError, Result};
pub use models::{
    split_verses, LyricsPage, NewSong, Song, SongFilter, SongId, SongUpdate, SongsPage,
    VERSE_DELIMITER,
};
pub use repositories::{PageRequest, SongRepository, SqliteSongRepository};
