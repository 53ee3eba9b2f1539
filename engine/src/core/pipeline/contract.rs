//! Template Contracts
//!
//! Versioned tables of the nominal slide indices a template must provide.
//! Every fixed-position stage of the pipeline reads its index from here.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::deck::{Deck, PlaceholderAddress};
use crate::core::event::{EventField, EventInfo};
use crate::core::{CoreError, CoreResult};

/// Contract version used when none is configured
pub const DEFAULT_CONTRACT_VERSION: &str = "v1";

/// A single-line field written to the title of a fixed slide
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSlot {
    pub field: EventField,
    pub slide: usize,
}

impl FieldSlot {
    fn new(field: EventField, slide: usize) -> Self {
        Self { field, slide }
    }
}

/// Nominal slide layout a template provides
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateContract {
    pub version: String,
    /// Slide whose title receives the cover date label
    pub cover_slide: usize,
    /// Title slide of the first regular song
    pub song_title_slide: usize,
    /// Lyrics slide of the first regular song
    pub song_lyrics_slide: usize,
    /// Slides per song slot in the template (title + lyrics)
    #[serde(default = "default_song_stride")]
    pub song_stride: usize,
    /// Number of regular song slots the template provides
    pub song_slots: usize,
    pub fields: Vec<FieldSlot>,
    pub announcements_slide: usize,
    pub scripture_slide: usize,
    pub closing_title_slide: usize,
    pub closing_lyrics_slide: usize,
    pub lyrics_body: PlaceholderAddress,
    pub announcement_body: PlaceholderAddress,
    pub scripture_body: PlaceholderAddress,
}

fn default_song_stride() -> usize {
    2
}

impl TemplateContract {
    /// Original template layout
    pub fn v1() -> Self {
        Self {
            version: "v1".to_string(),
            cover_slide: 0,
            song_title_slide: 5,
            song_lyrics_slide: 6,
            song_stride: 2,
            song_slots: 4,
            fields: vec![
                FieldSlot::new(EventField::PrayerMinister, 14),
                FieldSlot::new(EventField::OfferingMinister, 15),
                FieldSlot::new(EventField::AnnouncementsManager, 18),
                FieldSlot::new(EventField::SermonScripture, 21),
                FieldSlot::new(EventField::SermonTitle, 23),
                FieldSlot::new(EventField::BenedictionMinister, 37),
            ],
            announcements_slide: 20,
            scripture_slide: 22,
            closing_title_slide: 27,
            closing_lyrics_slide: 28,
            lyrics_body: PlaceholderAddress::FirstAvailable,
            announcement_body: PlaceholderAddress::PositionalIndex(1),
            scripture_body: PlaceholderAddress::PositionalIndex(10),
        }
    }

    /// Revised template with one extra slide before the closing song
    pub fn v2() -> Self {
        let mut contract = Self::v1();
        contract.version = "v2".to_string();
        contract.closing_title_slide = 28;
        contract.closing_lyrics_slide = 29;
        for slot in &mut contract.fields {
            if slot.field == EventField::BenedictionMinister {
                slot.slide = 38;
            }
        }
        contract
    }

    /// Looks up a built-in contract by version
    pub fn builtin(version: &str) -> Option<Self> {
        match version.trim().to_ascii_lowercase().as_str() {
            "v1" | "1" => Some(Self::v1()),
            "v2" | "2" => Some(Self::v2()),
            _ => None,
        }
    }

    /// Resolves `spec` as a built-in version or a path to a JSON contract
    pub fn resolve(spec: &str) -> CoreResult<Self> {
        if let Some(contract) = Self::builtin(spec) {
            return Ok(contract);
        }
        let path = Path::new(spec);
        if path.is_file() {
            return Self::from_json_file(path);
        }
        Err(CoreError::ContractViolation(format!(
            "Unknown template contract: {spec}"
        )))
    }

    /// Loads and validates a contract from a JSON file
    pub fn from_json_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let contract: Self = serde_json::from_str(&content)?;
        contract.validate()?;
        Ok(contract)
    }

    /// Checks that the nominal indices are ordered the way the pipeline
    /// visits them.
    ///
    /// Expansion only shifts later slides, so every expanded section must
    /// sit after all sections expanded before it.
    pub fn validate(&self) -> CoreResult<()> {
        let violation = |msg: String| Err(CoreError::ContractViolation(msg));

        if self.song_stride == 0 {
            return violation("songStride must be at least 1".to_string());
        }
        if self.song_lyrics_slide < self.song_title_slide
            || self.song_lyrics_slide - self.song_title_slide >= self.song_stride
        {
            return violation(format!(
                "song lyrics slide {} must follow its title slide {} within one slot",
                self.song_lyrics_slide, self.song_title_slide
            ));
        }
        if self.song_slots > 0 && self.song_region_end() > self.announcements_slide {
            return violation(format!(
                "song slots end at slide {} after the announcements slide {}",
                self.song_region_end(),
                self.announcements_slide
            ));
        }
        if self.scripture_slide <= self.announcements_slide {
            return violation(format!(
                "scripture slide {} must follow announcements slide {}",
                self.scripture_slide, self.announcements_slide
            ));
        }
        if self.closing_title_slide <= self.scripture_slide
            || self.closing_lyrics_slide <= self.closing_title_slide
        {
            return violation(format!(
                "closing song slides {}/{} must follow scripture slide {}",
                self.closing_title_slide, self.closing_lyrics_slide, self.scripture_slide
            ));
        }
        Ok(())
    }

    /// First slide after the last song slot
    pub fn song_region_end(&self) -> usize {
        self.song_title_slide + self.song_stride * self.song_slots
    }

    /// Nominal title slide of regular song `position`
    pub fn song_title_at(&self, position: usize) -> usize {
        self.song_title_slide + self.song_stride * position
    }

    /// Nominal lyrics slide of regular song `position`
    pub fn song_lyrics_at(&self, position: usize) -> usize {
        self.song_lyrics_slide + self.song_stride * position
    }

    /// Number of slides a template needs to satisfy this contract
    pub fn required_slide_count(&self) -> usize {
        let fixed = [
            self.cover_slide,
            self.announcements_slide,
            self.scripture_slide,
            self.closing_title_slide,
            self.closing_lyrics_slide,
        ];
        let songs = (self.song_slots > 0).then(|| self.song_region_end() - 1);

        fixed
            .into_iter()
            .chain(songs)
            .chain(self.fields.iter().map(|f| f.slide))
            .max()
            .map_or(0, |max| max + 1)
    }

    /// Fails when `deck` has fewer slides than this contract addresses
    pub fn check_deck(&self, deck: &Deck) -> CoreResult<()> {
        let required = self.required_slide_count();
        if deck.len() < required {
            return Err(CoreError::ContractViolation(format!(
                "template has {} slides, contract {} needs {}",
                deck.len(),
                self.version,
                required
            )));
        }
        Ok(())
    }

    /// Fails when `event` has more regular songs than this contract has slots
    pub fn check_event(&self, event: &EventInfo) -> CoreResult<()> {
        let songs = event.regular_songs().len();
        if songs > self.song_slots {
            return Err(CoreError::ValidationError(format!(
                "{} regular songs given, template contract {} has {} song slots",
                songs, self.version, self.song_slots
            )));
        }
        Ok(())
    }
}

impl Default for TemplateContract {
    fn default() -> Self {
        Self::v1()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::deck::test_support::numbered_deck;
    use tempfile::TempDir;

    #[test]
    fn test_builtin_contracts_are_valid() {
        let v1 = TemplateContract::v1();
        let v2 = TemplateContract::v2();
        v1.validate().unwrap();
        v2.validate().unwrap();

        assert_eq!(v1.closing_title_slide, 27);
        assert_eq!(v2.closing_title_slide, 28);
        assert_eq!(v1.required_slide_count(), 38);
        assert_eq!(v2.required_slide_count(), 39);
        assert_eq!(v1.song_title_at(2), 9);
        assert_eq!(v1.song_lyrics_at(2), 10);
        assert_eq!(v1.song_region_end(), 13);
    }

    #[test]
    fn test_builtin_lookup() {
        assert_eq!(TemplateContract::builtin("V2").unwrap().version, "v2");
        assert!(TemplateContract::builtin("v9").is_none());
        assert!(matches!(
            TemplateContract::resolve("v9"),
            Err(CoreError::ContractViolation(_))
        ));
    }

    #[test]
    fn test_validate_rejects_misordered_sections() {
        let mut contract = TemplateContract::v1();
        contract.scripture_slide = 19;
        assert!(contract.validate().is_err());

        let mut contract = TemplateContract::v1();
        contract.song_slots = 10;
        assert!(contract.validate().is_err());

        let mut contract = TemplateContract::v1();
        contract.song_lyrics_slide = 4;
        assert!(contract.validate().is_err());
    }

    #[test]
    fn test_check_deck() {
        let contract = TemplateContract::v1();
        assert!(contract.check_deck(&numbered_deck(38)).is_ok());

        let err = contract.check_deck(&numbered_deck(30)).unwrap_err();
        assert!(err.is_config_error());
        assert!(err.to_string().contains("needs 38"));
    }

    #[test]
    fn test_check_event_song_capacity() {
        use crate::core::event::{ServiceCategory, SongRecord};

        let contract = TemplateContract::v1();
        let date = chrono::NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let mut event = EventInfo::new(date, ServiceCategory::SundayMorning);
        for order in 0..4 {
            event.songs.push(SongRecord::new(format!("Song {order}"), order));
        }
        event.songs.push(SongRecord::new("Closing", 9).closing());
        assert!(contract.check_event(&event).is_ok());

        event.songs.push(SongRecord::new("One too many", 5));
        assert!(matches!(
            contract.check_event(&event),
            Err(CoreError::ValidationError(_))
        ));
    }

    #[test]
    fn test_contract_from_json_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("contract.json");
        let mut contract = TemplateContract::v2();
        contract.version = "church-2027".to_string();
        std::fs::write(&path, serde_json::to_string_pretty(&contract).unwrap()).unwrap();

        let loaded = TemplateContract::resolve(path.to_str().unwrap()).unwrap();
        assert_eq!(loaded, contract);
    }
}
