//! Generation Pipeline
//!
//! Composes one service deck from a template: cover, single-line fields,
//! songs, announcements, scripture and the closing song, in that order.
//!
//! Every expansion inserts slides, so each stage addresses its template slide
//! at the contract's nominal index plus the slides inserted by all earlier
//! stages. Content-source failures never abort a run: the stage settles for
//! fallback content and records a degradation. Template, contract and
//! persistence failures abort it.

pub mod contract;
mod progress;

pub use contract::{FieldSlot, TemplateContract, DEFAULT_CONTRACT_VERSION};
pub use progress::{NoopProgress, ProgressReporter};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::content::{
    ChunkPaginator, ContentProviders, PaginationError, ScriptureError, ScriptureRange,
    TextCorpusScripture, LYRICS_UNAVAILABLE_TEXT, SCRIPTURE_UNAVAILABLE_TEXT,
    SCRIPTURE_UNAVAILABLE_TITLE,
};
use crate::core::deck::{
    edit_text_field, load_template, save_deck, Deck, ExpandTarget, PlaceholderAddress,
    SlideExpander,
};
use crate::core::event::{calendar::cover_label, EventInfo, SongRecord};
use crate::core::settings::AppSettings;
use crate::core::{Alignment, ContentItem, CoreResult, Entry};

use progress::{step_percent, MonotonicProgress};

/// Directory under the output root receiving generated decks
pub const GENERATED_DECKS_DIR: &str = "generated_decks";

// =============================================================================
// Stage Outcomes
// =============================================================================

/// A recoverable stage failure together with the content used instead
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Degradation<T> {
    pub reason: String,
    pub fallback: T,
}

impl<T> Degradation<T> {
    pub fn new(reason: impl Into<String>, fallback: T) -> Self {
        Self {
            reason: reason.into(),
            fallback,
        }
    }
}

/// Outcome of a stage that can degrade: the intended value, or the fallback
pub type StageResult<T> = Result<T, Degradation<T>>;

/// Unwraps a stage outcome, recording the reason when it degraded
fn settle<T>(outcome: StageResult<T>, stage: &str, degradations: &mut Vec<String>) -> T {
    match outcome {
        Ok(value) => value,
        Err(degradation) => {
            warn!("{} degraded: {}", stage, degradation.reason);
            degradations.push(format!("{}: {}", stage, degradation.reason));
            degradation.fallback
        }
    }
}

// =============================================================================
// Offset Tracking
// =============================================================================

/// Running count of slides inserted by expansions so far
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SlideOffset(usize);

impl SlideOffset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current index of the template slide at `nominal`
    pub fn at(&self, nominal: usize) -> usize {
        nominal + self.0
    }

    /// Accounts for `inserted` new slides
    pub fn add(&mut self, inserted: usize) {
        self.0 += inserted;
    }

    pub fn total(&self) -> usize {
        self.0
    }
}

// =============================================================================
// Results
// =============================================================================

/// Lyrics a song was rendered with
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedSong {
    pub title: String,
    /// Raw lyric text (fetched, inline, or the unavailable placeholder)
    pub lyrics: String,
    /// One entry per lyrics slide
    pub pages: Vec<String>,
    pub is_closing: bool,
}

/// What composing a deck did
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Composition {
    pub inserted_slides: usize,
    pub degradations: Vec<String>,
    pub resolved_songs: Vec<ResolvedSong>,
}

/// Summary of a completed generation run
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationReport {
    pub output_path: PathBuf,
    pub slide_count: usize,
    pub inserted_slides: usize,
    /// One message per stage that settled for fallback content
    pub degradations: Vec<String>,
    /// Lyrics and pages used per song, for callers that cache them
    pub resolved_songs: Vec<ResolvedSong>,
}

// =============================================================================
// Pipeline
// =============================================================================

/// Builds service decks from a template according to a template contract
#[derive(Clone, Debug)]
pub struct GenerationPipeline {
    contract: TemplateContract,
    providers: ContentProviders,
    expander: SlideExpander,
    language: String,
    fallback: ChunkPaginator,
}

impl GenerationPipeline {
    pub fn new(contract: TemplateContract, providers: ContentProviders) -> Self {
        Self {
            contract,
            providers,
            expander: SlideExpander::new(),
            language: "en".to_string(),
            fallback: ChunkPaginator::default(),
        }
    }

    /// Builds a pipeline from persisted settings
    pub fn from_settings(settings: &AppSettings) -> CoreResult<Self> {
        let generation = &settings.generation;
        let contract = TemplateContract::resolve(&generation.contract_version)?;
        let lines_per_page = generation.lyrics_lines_per_page as usize;

        let mut providers = ContentProviders::offline(lines_per_page);
        if let Some(dir) = &generation.scripture_corpus_dir {
            providers = providers.with_scripture(Arc::new(TextCorpusScripture::new(dir)));
        }
        #[cfg(feature = "remote-lyrics")]
        {
            providers =
                providers.with_lyrics(Arc::new(crate::core::content::HttpLyricFetcher::new()));
        }

        Ok(Self::new(contract, providers)
            .with_language(&settings.general.language)
            .with_lines_per_page(lines_per_page))
    }

    /// Language of the cover label
    pub fn with_language(mut self, language: &str) -> Self {
        self.language = language.to_string();
        self
    }

    /// Line count of the fallback lyric splitter
    pub fn with_lines_per_page(mut self, lines_per_page: usize) -> Self {
        self.fallback = ChunkPaginator::new(lines_per_page);
        self
    }

    pub fn with_expander(mut self, expander: SlideExpander) -> Self {
        self.expander = expander;
        self
    }

    pub fn contract(&self) -> &TemplateContract {
        &self.contract
    }

    /// Where the deck of `event` is written under `output_dir`
    pub fn output_path(&self, event: &EventInfo, output_dir: &Path) -> PathBuf {
        output_dir
            .join(GENERATED_DECKS_DIR)
            .join(event.output_file_name())
    }

    /// Loads `template`, composes the deck for `event` and saves it under
    /// `output_dir`.
    pub fn run(
        &self,
        event: &EventInfo,
        template: &Path,
        output_dir: &Path,
        progress: &dyn ProgressReporter,
    ) -> CoreResult<GenerationReport> {
        let progress = MonotonicProgress::new(progress);

        progress.report(5, "Loading template");
        let mut deck = load_template(template)?;

        let composition = self.compose(&mut deck, event, &progress)?;

        progress.report(95, "Saving deck");
        let output_path = self.output_path(event, output_dir);
        save_deck(&deck, &output_path)?;

        info!(
            "Generated {} ({} slides, {} inserted, {} degraded stages)",
            output_path.display(),
            deck.len(),
            composition.inserted_slides,
            composition.degradations.len()
        );

        Ok(GenerationReport {
            output_path,
            slide_count: deck.len(),
            inserted_slides: composition.inserted_slides,
            degradations: composition.degradations,
            resolved_songs: composition.resolved_songs,
        })
    }

    /// Runs every composition stage on `deck`.
    ///
    /// Fails before the first mutation when the deck or the event does not
    /// fit the contract.
    pub fn compose(
        &self,
        deck: &mut Deck,
        event: &EventInfo,
        progress: &dyn ProgressReporter,
    ) -> CoreResult<Composition> {
        let contract = &self.contract;
        contract.check_deck(deck)?;
        contract.check_event(event)?;

        let mut degradations = Vec::new();
        let mut offset = SlideOffset::new();

        progress.report(10, "Updating cover");
        let label = cover_label(event.date, &self.language);
        edit_text_field(
            deck,
            contract.cover_slide,
            &PlaceholderAddress::RoleTitle,
            &label,
            Alignment::Center,
        );

        // Field slots precede the first expansion, so no offset applies.
        progress.report(20, "Writing service details");
        for slot in &contract.fields {
            edit_text_field(
                deck,
                slot.slide,
                &PlaceholderAddress::RoleTitle,
                event.field(slot.field),
                Alignment::Center,
            );
        }

        let regular = event.regular_songs();
        let closing = event.closing_song();
        let to_prepare: Vec<&SongRecord> = regular.iter().copied().chain(closing).collect();
        let mut resolved = Vec::with_capacity(to_prepare.len());
        for (i, song) in to_prepare.iter().enumerate() {
            progress.report(
                step_percent(25, 45, i, to_prepare.len()),
                &format!(
                    "Preparing lyrics for '{}' ({}/{})",
                    song.title,
                    i + 1,
                    to_prepare.len()
                ),
            );
            let stage = format!("lyrics '{}'", song.title);
            resolved.push(settle(self.resolve_song(song), &stage, &mut degradations));
        }

        let lyrics_target = ExpandTarget::body(contract.lyrics_body.clone(), Alignment::Center);
        for (position, song) in resolved.iter().filter(|s| !s.is_closing).enumerate() {
            progress.report(
                step_percent(50, 70, position, regular.len()),
                &format!(
                    "Adding song '{}' ({}/{})",
                    song.title,
                    position + 1,
                    regular.len()
                ),
            );
            edit_text_field(
                deck,
                offset.at(contract.song_title_at(position)),
                &PlaceholderAddress::RoleTitle,
                &song.title,
                Alignment::Center,
            );
            let inserted = self.expander.expand(
                deck,
                offset.at(contract.song_lyrics_at(position)),
                &pages_as_items(&song.pages),
                &lyrics_target,
            )?;
            offset.add(inserted);
        }

        progress.report(80, "Adding announcements");
        if event.announcements.is_empty() {
            debug!("No announcements, skipping stage");
        } else {
            let inserted = self.expander.expand_entries(
                deck,
                offset.at(contract.announcements_slide),
                &event.announcements,
                &contract.announcement_body,
            )?;
            offset.add(inserted);
        }

        progress.report(85, "Adding scripture");
        let verses = settle(
            self.resolve_scripture(&event.sermon_scripture),
            "scripture",
            &mut degradations,
        );
        let inserted = self.expander.expand_entries(
            deck,
            offset.at(contract.scripture_slide),
            &verses,
            &contract.scripture_body,
        )?;
        offset.add(inserted);

        if let Some(song) = resolved.iter().find(|s| s.is_closing) {
            progress.report(90, &format!("Adding closing song '{}'", song.title));
            edit_text_field(
                deck,
                offset.at(contract.closing_title_slide),
                &PlaceholderAddress::RoleTitle,
                &song.title,
                Alignment::Center,
            );
            let inserted = self.expander.expand(
                deck,
                offset.at(contract.closing_lyrics_slide),
                &pages_as_items(&song.pages),
                &lyrics_target,
            )?;
            offset.add(inserted);
        } else {
            debug!("No closing song, skipping stage");
        }

        Ok(Composition {
            inserted_slides: offset.total(),
            degradations,
            resolved_songs: resolved,
        })
    }

    /// Lyrics and pages for `song`.
    ///
    /// Precomputed pages win, then inline lyrics, then lyrics fetched from the
    /// song's source reference. Without any lyrics the song degrades to
    /// [`LYRICS_UNAVAILABLE_TEXT`] split by the fixed-size chunker.
    pub fn resolve_song(&self, song: &SongRecord) -> StageResult<ResolvedSong> {
        let resolved = |lyrics: String, pages: Vec<String>| ResolvedSong {
            title: song.title.clone(),
            lyrics,
            pages,
            is_closing: song.is_closing,
        };

        let pages: Vec<String> = song
            .lyrics_pages
            .iter()
            .filter(|p| !p.trim().is_empty())
            .cloned()
            .collect();
        if !pages.is_empty() {
            return Ok(resolved(song.lyrics.clone().unwrap_or_default(), pages));
        }

        let unavailable = |reason: String| {
            let pages = self.fallback.chunk(LYRICS_UNAVAILABLE_TEXT);
            Degradation::new(reason, resolved(LYRICS_UNAVAILABLE_TEXT.to_string(), pages))
        };

        let lyrics = match (&song.lyrics, &song.lyrics_source) {
            (Some(lyrics), _) if !lyrics.trim().is_empty() => lyrics.clone(),
            (_, Some(source)) if !source.trim().is_empty() => self
                .providers
                .lyrics
                .fetch(source)
                .map_err(|e| unavailable(e.to_string()))?,
            _ => return Err(unavailable("no lyrics or lyric source".to_string())),
        };

        match self.providers.paginator.paginate(&song.title, &lyrics) {
            Ok(pages) if !pages.is_empty() => Ok(resolved(lyrics, pages)),
            outcome => {
                let reason = match outcome {
                    Err(e) => e.to_string(),
                    Ok(_) => PaginationError::Empty.to_string(),
                };
                let pages = self.fallback.chunk(&lyrics);
                Err(Degradation::new(
                    format!("{}, using fixed-size pages", reason),
                    resolved(lyrics, pages),
                ))
            }
        }
    }

    /// Verse entries for a scripture `reference`, or a single
    /// "could not be retrieved" entry.
    pub fn resolve_scripture(&self, reference: &str) -> StageResult<Vec<Entry>> {
        let unavailable = |e: ScriptureError| {
            Degradation::new(
                e.to_string(),
                vec![Entry::new(
                    SCRIPTURE_UNAVAILABLE_TITLE,
                    SCRIPTURE_UNAVAILABLE_TEXT,
                )],
            )
        };

        let range = ScriptureRange::parse(reference).map_err(unavailable)?;
        match self.providers.scripture.lookup(&range) {
            Ok(verses) if !verses.is_empty() => Ok(verses),
            Ok(_) => Err(unavailable(ScriptureError::NotFound(range.to_string()))),
            Err(e) => Err(unavailable(e)),
        }
    }
}

fn pages_as_items(pages: &[String]) -> Vec<ContentItem> {
    pages.iter().cloned().map(ContentItem::Text).collect()
}
