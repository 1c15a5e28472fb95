//! Pagination helper types for repository queries

use serde::{Deserialize, Serialize};

/// Default page size for song listings
pub const DEFAULT_SONGS_PAGE_SIZE: u32 = 10;

/// Default page size for lyric verses
pub const DEFAULT_LYRICS_PAGE_SIZE: u32 = 3;

/// Pagination request parameters
///
/// Callers validate `page >= 1` and `size > 0` before reaching the store; the
/// arithmetic here saturates instead of failing on out-of-range input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Current page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub size: u32,
}

impl PageRequest {
    /// Create a new page request
    ///
    /// # Examples
    ///
    /// ```
    /// use core_library::repositories::PageRequest;
    ///
    /// let request = PageRequest::new(3, 20);
    /// assert_eq!(request.offset(), 40);
    /// assert_eq!(request.limit(), 20);
    /// ```
    pub fn new(page: u32, size: u32) -> Self {
        Self { page, size }
    }

    /// First page of songs with the default size
    pub fn songs_default() -> Self {
        Self::new(1, DEFAULT_SONGS_PAGE_SIZE)
    }

    /// First page of verses with the default size
    pub fn lyrics_default() -> Self {
        Self::new(1, DEFAULT_LYRICS_PAGE_SIZE)
    }

    /// Calculate the SQL OFFSET value
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.size)
    }

    /// Get the LIMIT value (same as size)
    pub fn limit(&self) -> u64 {
        u64::from(self.size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::songs_default()
    }
}
