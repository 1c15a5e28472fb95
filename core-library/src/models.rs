//! Domain models for the song catalog
//!
//! This module contains the song entity, its write shapes, the list filter
//! and the paginated read shapes handed to the transport layer.

use crate::repositories::PageRequest;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Separator between verses inside `Song::text`.
///
/// Exactly one blank line in LF form. CRLF text (`"\r\n\r\n"`) is not
/// normalised and reads as a single verse; lyrics are stored as received.
pub const VERSE_DELIMITER: &str = "\n\n";

// =============================================================================
// ID Types
// =============================================================================

/// Unique identifier for a song
///
/// Freshly created songs get a UUID v4. Lookups accept any string so that a
/// malformed id simply matches nothing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SongId(String);

impl SongId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SongId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SongId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SongId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SongId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

// =============================================================================
// Song
// =============================================================================

/// A song in the catalog
///
/// `id`, `group` and `title` never change after creation. `text` holds the
/// lyrics with verses separated by [`VERSE_DELIMITER`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    pub id: SongId,
    pub group: String,
    #[serde(rename = "song")]
    pub title: String,
    #[serde(with = "release_date_format")]
    pub release_date: NaiveDate,
    pub text: String,
    pub link: String,
}

/// Everything needed to insert a song; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSong {
    pub group: String,
    #[serde(rename = "song")]
    pub title: String,
    #[serde(with = "release_date_format")]
    pub release_date: NaiveDate,
    pub text: String,
    pub link: String,
}

impl NewSong {
    pub fn validate(&self) -> Result<(), String> {
        if self.group.trim().is_empty() {
            return Err("Group cannot be empty".to_string());
        }
        if self.title.trim().is_empty() {
            return Err("Song title cannot be empty".to_string());
        }
        Ok(())
    }

    pub(crate) fn into_song(self, id: SongId) -> Song {
        Song {
            id,
            group: self.group,
            title: self.title,
            release_date: self.release_date,
            text: self.text,
            link: self.link,
        }
    }
}

/// The mutable fields of a song.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongUpdate {
    #[serde(with = "release_date_format")]
    pub release_date: NaiveDate,
    pub text: String,
    pub link: String,
}

// =============================================================================
// Filter
// =============================================================================

/// Partial song used to narrow a list query
///
/// Absent fields impose no constraint. A present but empty string is treated
/// the same as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, rename = "song", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(
        default,
        with = "release_date_format::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub release_date: Option<NaiveDate>,
    /// Substring of the lyrics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl SongFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_release_date(mut self, date: NaiveDate) -> Self {
        self.release_date = Some(date);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    /// Number of fields that actually constrain the result.
    pub fn field_count(&self) -> usize {
        [
            non_empty(&self.id).is_some(),
            non_empty(&self.group).is_some(),
            non_empty(&self.title).is_some(),
            self.release_date.is_some(),
            non_empty(&self.text).is_some(),
            non_empty(&self.link).is_some(),
        ]
        .into_iter()
        .filter(|present| *present)
        .count()
    }

    pub fn is_empty(&self) -> bool {
        self.field_count() == 0
    }
}

pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

// =============================================================================
// Read shapes
// =============================================================================

/// One page of songs with the request echoed back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongsPage {
    pub songs: Vec<Song>,
    pub page: u32,
    pub size: u32,
}

/// One page of verses of a song's lyrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LyricsPage {
    pub id: SongId,
    pub group: String,
    #[serde(rename = "song")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub verses: Vec<String>,
    /// Verse count of the whole text
    pub total: u64,
    pub page: u32,
    pub size: u32,
}

impl LyricsPage {
    /// Slices `text` into verses and keeps `[offset, offset + size)`, clamped
    /// to the verse count. A page past the end has no verses but keeps `total`.
    pub fn from_text(
        id: SongId,
        group: impl Into<String>,
        title: impl Into<String>,
        text: &str,
        request: PageRequest,
    ) -> Self {
        let verses = split_verses(text);
        let total = verses.len();

        let start = usize::try_from(request.offset())
            .unwrap_or(usize::MAX)
            .min(total);
        let end = start
            .saturating_add(usize::try_from(request.limit()).unwrap_or(usize::MAX))
            .min(total);

        Self {
            id,
            group: group.into(),
            title: title.into(),
            verses: verses[start..end].iter().map(|v| v.to_string()).collect(),
            total: total as u64,
            page: request.page,
            size: request.size,
        }
    }
}

/// Splits lyrics on [`VERSE_DELIMITER`]. Always yields at least one verse.
pub fn split_verses(text: &str) -> Vec<&str> {
    text.split(VERSE_DELIMITER).collect()
}

/// Release dates travel as RFC 3339 timestamps at midnight UTC.
///
/// Plain `YYYY-MM-DD` dates are accepted on input.
pub mod release_date_format {
    use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let timestamp = date
            .and_time(NaiveTime::MIN)
            .and_utc()
            .to_rfc3339_opts(SecondsFormat::Secs, true);
        serializer.serialize_str(&timestamp)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(de::Error::custom)
    }

    fn parse(raw: &str) -> Result<NaiveDate, chrono::ParseError> {
        if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
            return Ok(timestamp.date_naive());
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
    }

    /// Same format for optional dates; `null` reads as `None`.
    pub mod optional {
        use chrono::NaiveDate;
        use serde::{de, Deserialize, Deserializer, Serializer};

        pub fn serialize<S>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match date {
                Some(date) => super::serialize(date, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
        where
            D: Deserializer<'de>,
        {
            Option::<String>::deserialize(deserializer)?
                .map(|raw| super::parse(&raw).map_err(de::Error::custom))
                .transpose()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_song() -> Song {
        Song {
            id: SongId::from("0b7f7d5e-2a8e-4d62-9d8e-3c7b2a1f0e11"),
            group: "Muse".to_string(),
            title: "Supermassive Black Hole".to_string(),
            release_date: date(2006, 7, 16),
            text: "line1\n\nline2".to_string(),
            link: "https://www.youtube.com/watch?v=Xsp3_a-PMTw".to_string(),
        }
    }

    #[test]
    fn test_song_id_generation() {
        let a = SongId::new();
        let b = SongId::new();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(a.as_str()).is_ok());
    }

    #[test]
    fn test_song_json_field_names() {
        let json = serde_json::to_value(sample_song()).unwrap();

        assert_eq!(json["id"], "0b7f7d5e-2a8e-4d62-9d8e-3c7b2a1f0e11");
        assert_eq!(json["group"], "Muse");
        assert_eq!(json["song"], "Supermassive Black Hole");
        assert_eq!(json["release_date"], "2006-07-16T00:00:00Z");
        assert!(json.get("title").is_none());
    }

    #[test]
    fn test_release_date_accepts_plain_dates() {
        let update: SongUpdate = serde_json::from_str(
            r#"{"release_date":"2006-07-16","text":"a","link":"b"}"#,
        )
        .unwrap();
        assert_eq!(update.release_date, date(2006, 7, 16));

        let song: Song = serde_json::from_value(serde_json::to_value(sample_song()).unwrap())
            .unwrap();
        assert_eq!(song, sample_song());
    }

    #[test]
    fn test_new_song_validation() {
        let mut song = NewSong {
            group: "Muse".to_string(),
            title: "Uprising".to_string(),
            release_date: date(2009, 9, 7),
            text: String::new(),
            link: String::new(),
        };
        assert!(song.validate().is_ok());

        song.group = "  ".to_string();
        assert!(song.validate().is_err());
    }

    #[test]
    fn test_filter_field_count_ignores_empty_strings() {
        assert_eq!(SongFilter::new().field_count(), 0);
        assert!(SongFilter::new().with_group("").is_empty());

        let filter = SongFilter::new()
            .with_group("Muse")
            .with_title("")
            .with_release_date(date(2006, 7, 16))
            .with_text("line");
        assert_eq!(filter.field_count(), 3);
    }

    #[test]
    fn test_filter_accepts_a_song_release_date() {
        let song = serde_json::to_value(sample_song()).unwrap();
        let filter: SongFilter =
            serde_json::from_value(serde_json::json!({ "release_date": song["release_date"] }))
                .unwrap();
        assert_eq!(filter.release_date, Some(date(2006, 7, 16)));

        let json = serde_json::to_value(&filter).unwrap();
        assert_eq!(json["release_date"], "2006-07-16T00:00:00Z");

        let plain: SongFilter = serde_json::from_str(r#"{"release_date":"2006-07-16"}"#).unwrap();
        assert_eq!(plain.release_date, Some(date(2006, 7, 16)));

        let null: SongFilter = serde_json::from_str(r#"{"release_date":null}"#).unwrap();
        assert_eq!(null.release_date, None);

        let absent: SongFilter = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.release_date, None);
        assert!(serde_json::to_value(&absent).unwrap().get("release_date").is_none());

        assert!(serde_json::from_str::<SongFilter>(r#"{"release_date":"16.07.2006"}"#).is_err());
    }

    #[test]
    fn test_split_verses() {
        assert_eq!(split_verses("a\n\nb\n\nc"), vec!["a", "b", "c"]);
        assert_eq!(split_verses("single"), vec!["single"]);
        assert_eq!(split_verses(""), vec![""]);
        assert_eq!(split_verses("a\nb"), vec!["a\nb"]);
        assert_eq!(split_verses("a\r\n\r\nb"), vec!["a\r\n\r\nb"]);
    }

    #[test]
    fn test_lyrics_page_slices_verses() {
        let text = "v1\n\nv2\n\nv3\n\nv4\n\nv5";

        let page = LyricsPage::from_text(
            SongId::from("x"),
            "Muse",
            "Uprising",
            text,
            PageRequest::new(2, 2),
        );
        assert_eq!(page.verses, vec!["v3", "v4"]);
        assert_eq!(page.total, 5);
        assert_eq!(page.page, 2);
        assert_eq!(page.size, 2);

        let last = LyricsPage::from_text(SongId::from("x"), "g", "t", text, PageRequest::new(3, 2));
        assert_eq!(last.verses, vec!["v5"]);
    }

    #[test]
    fn test_lyrics_page_past_the_end_keeps_total() {
        let page = LyricsPage::from_text(
            SongId::from("x"),
            "Muse",
            "Uprising",
            "v1\n\nv2",
            PageRequest::new(5, 3),
        );
        assert!(page.verses.is_empty());
        assert_eq!(page.total, 2);

        let json = serde_json::to_value(&page).unwrap();
        assert!(json.get("verses").is_none());
        assert_eq!(json["total"], 2);
        assert_eq!(json["song"], "Uprising");
    }

    #[test]
    fn test_lyrics_pages_reassemble_text() {
        let text = "first\nverse\n\nsecond\n\n\nthird\n\nfourth";
        let mut verses = Vec::new();
        let mut page = 1;
        loop {
            let slice = LyricsPage::from_text(
                SongId::from("x"),
                "g",
                "t",
                text,
                PageRequest::new(page, 3),
            );
            if slice.verses.is_empty() {
                break;
            }
            verses.extend(slice.verses);
            page += 1;
        }
        assert_eq!(verses.join(VERSE_DELIMITER), text);
    }
}
