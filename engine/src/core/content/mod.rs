//! Content Providers
//!
//! Sources of variable-length slide content: lyric text, lyric pagination and
//! scripture passages. Each source reports failures through its own error type
//! so the pipeline can substitute fallback content instead of failing the job.

pub mod lyrics;
pub mod paginate;
pub mod scripture;

pub use lyrics::{extract_lyrics_text, LyricFetcher, LyricsError, NoLyricFetcher, StaticLyricFetcher};
#[cfg(feature = "remote-lyrics")]
pub use lyrics::HttpLyricFetcher;
pub use paginate::{
    AiLyricPaginator, ChunkPaginator, LyricPaginator, PaginationError, DEFAULT_LINES_PER_PAGE,
};
pub use scripture::{
    NoScriptureSource, ScriptureError, ScriptureRange, ScriptureSource, TextCorpusScripture,
};

use std::sync::Arc;

/// Lyrics written when no lyric text could be obtained
pub const LYRICS_UNAVAILABLE_TEXT: &str = "Lyrics unavailable.";

/// Title of the single slide written when scripture could not be retrieved
pub const SCRIPTURE_UNAVAILABLE_TITLE: &str = "Scripture";

/// Body of the single slide written when scripture could not be retrieved
pub const SCRIPTURE_UNAVAILABLE_TEXT: &str = "The scripture passage could not be retrieved.";

/// The content sources a generation run draws from
#[derive(Clone)]
pub struct ContentProviders {
    pub lyrics: Arc<dyn LyricFetcher>,
    pub paginator: Arc<dyn LyricPaginator>,
    pub scripture: Arc<dyn ScriptureSource>,
}

impl ContentProviders {
    /// Providers that never leave the machine: no lyric fetching, fixed-size
    /// pagination, no scripture corpus.
    pub fn offline(lines_per_page: usize) -> Self {
        Self {
            lyrics: Arc::new(NoLyricFetcher),
            paginator: Arc::new(ChunkPaginator::new(lines_per_page)),
            scripture: Arc::new(NoScriptureSource),
        }
    }

    pub fn with_lyrics(mut self, lyrics: Arc<dyn LyricFetcher>) -> Self {
        self.lyrics = lyrics;
        self
    }

    pub fn with_paginator(mut self, paginator: Arc<dyn LyricPaginator>) -> Self {
        self.paginator = paginator;
        self
    }

    pub fn with_scripture(mut self, scripture: Arc<dyn ScriptureSource>) -> Self {
        self.scripture = scripture;
        self
    }
}

impl Default for ContentProviders {
    fn default() -> Self {
        Self::offline(DEFAULT_LINES_PER_PAGE)
    }
}

impl std::fmt::Debug for ContentProviders {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentProviders")
            .field("paginator", &self.paginator.name())
            .finish_non_exhaustive()
    }
}
