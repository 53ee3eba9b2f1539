//! Event Metadata
//!
//! Per-event input of a generation run: service date and category, officiants,
//! sermon details, announcements and songs.

pub mod calendar;

pub use calendar::{cover_label, cover_sunday, week_of_month};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::fs::slugify_display_name;
use crate::core::Entry;

/// An announcement entry (`{title, contents}`)
pub type Announcement = Entry;

// =============================================================================
// Service Category
// =============================================================================

/// Kind of service the deck is generated for
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ServiceCategory {
    #[default]
    SundayMorning,
    SundayAfternoon,
    Wednesday,
    FridayVigil,
    Dawn,
    Other,
}

impl ServiceCategory {
    /// Display name, also the source of the output file slug
    pub fn display_name(&self) -> &'static str {
        match self {
            ServiceCategory::SundayMorning => "Sunday Morning Service",
            ServiceCategory::SundayAfternoon => "Sunday Afternoon Service",
            ServiceCategory::Wednesday => "Wednesday Service",
            ServiceCategory::FridayVigil => "Friday Vigil (Overnight)",
            ServiceCategory::Dawn => "Dawn Prayer Service",
            ServiceCategory::Other => "Other Service",
        }
    }

    /// File-name slug, e.g. `Sunday_Morning_Service`
    pub fn slug(&self) -> String {
        slugify_display_name(self.display_name())
    }
}

// =============================================================================
// Songs
// =============================================================================

/// A song of the service
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongRecord {
    pub title: String,
    /// Position among the songs of its kind
    #[serde(default)]
    pub order: u32,
    /// Full lyrics, when already known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lyrics: Option<String>,
    /// Lyrics already split into pages; used as-is when present
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lyrics_pages: Vec<String>,
    /// Reference handed to the lyric fetcher (usually a URL)
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "sourceUrl")]
    pub lyrics_source: Option<String>,
    /// The closing song sung after the sermon
    #[serde(default)]
    pub is_closing: bool,
}

impl SongRecord {
    pub fn new(title: impl Into<String>, order: u32) -> Self {
        Self {
            title: title.into(),
            order,
            ..Default::default()
        }
    }

    pub fn with_lyrics(mut self, lyrics: impl Into<String>) -> Self {
        self.lyrics = Some(lyrics.into());
        self
    }

    pub fn with_pages(mut self, pages: Vec<String>) -> Self {
        self.lyrics_pages = pages;
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.lyrics_source = Some(source.into());
        self
    }

    pub fn closing(mut self) -> Self {
        self.is_closing = true;
        self
    }
}

// =============================================================================
// Event
// =============================================================================

/// Single-line fields written into fixed template slides
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventField {
    PrayerMinister,
    OfferingMinister,
    AnnouncementsManager,
    SermonScripture,
    SermonTitle,
    Speaker,
    BenedictionMinister,
}

/// Metadata of one service
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventInfo {
    pub date: NaiveDate,
    #[serde(default)]
    pub category: ServiceCategory,
    #[serde(default)]
    pub speaker: String,
    #[serde(default)]
    pub sermon_title: String,
    /// Scripture reference text, e.g. "John 3:16 - 3:18"
    #[serde(default)]
    pub sermon_scripture: String,
    #[serde(default)]
    pub prayer_minister: String,
    #[serde(default)]
    pub offering_minister: String,
    #[serde(default)]
    pub announcements_manager: String,
    #[serde(default)]
    pub benediction_minister: String,
    #[serde(default)]
    pub announcements: Vec<Announcement>,
    #[serde(default)]
    pub songs: Vec<SongRecord>,
}

impl EventInfo {
    pub fn new(date: NaiveDate, category: ServiceCategory) -> Self {
        Self {
            date,
            category,
            speaker: String::new(),
            sermon_title: String::new(),
            sermon_scripture: String::new(),
            prayer_minister: String::new(),
            offering_minister: String::new(),
            announcements_manager: String::new(),
            benediction_minister: String::new(),
            announcements: Vec::new(),
            songs: Vec::new(),
        }
    }

    /// Value of a single-line field
    pub fn field(&self, field: EventField) -> &str {
        match field {
            EventField::PrayerMinister => &self.prayer_minister,
            EventField::OfferingMinister => &self.offering_minister,
            EventField::AnnouncementsManager => &self.announcements_manager,
            EventField::SermonScripture => &self.sermon_scripture,
            EventField::SermonTitle => &self.sermon_title,
            EventField::Speaker => &self.speaker,
            EventField::BenedictionMinister => &self.benediction_minister,
        }
    }

    /// Regular songs in singing order
    pub fn regular_songs(&self) -> Vec<&SongRecord> {
        let mut songs: Vec<&SongRecord> = self.songs.iter().filter(|s| !s.is_closing).collect();
        songs.sort_by_key(|s| s.order);
        songs
    }

    /// The closing song, if any. With several flagged songs the lowest order
    /// wins.
    pub fn closing_song(&self) -> Option<&SongRecord> {
        self.songs
            .iter()
            .filter(|s| s.is_closing)
            .min_by_key(|s| s.order)
    }

    /// Output file name: `<YYYYMMDD>_<CategorySlug>.deck`
    pub fn output_file_name(&self) -> String {
        format!(
            "{}_{}.deck",
            self.date.format("%Y%m%d"),
            self.category.slug()
        )
    }
}
