//! Lyric pagination.
//!
//! Splits raw lyrics into slide-sized pages. [`ChunkPaginator`] is the
//! deterministic fixed-size splitter that every other paginator falls back
//! to; [`AiLyricPaginator`] asks a completion backend for a phrase-aware
//! split.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::core::ai::{CompletionBackend, CompletionRequest};

/// Lines per page of the fixed-size splitter
pub const DEFAULT_LINES_PER_PAGE: usize = 5;

/// Page produced when lyrics contain no text at all
pub const EMPTY_LYRICS_PAGE: &str = "Lyrics could not be split into pages.";

/// Pagination failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaginationError {
    #[error("Paginator backend failed: {0}")]
    Backend(String),

    #[error("Paginator returned malformed output: {0}")]
    Malformed(String),

    #[error("Paginator returned no pages")]
    Empty,
}

/// Splits raw lyrics into ordered page texts
pub trait LyricPaginator: Send + Sync {
    /// Returns the paginator name
    fn name(&self) -> &str;

    /// Splits `raw` lyrics of the song `title` into pages
    fn paginate(&self, title: &str, raw: &str) -> Result<Vec<String>, PaginationError>;
}

// =============================================================================
// Fixed-size Chunking
// =============================================================================

/// Groups lyric lines into pages of a fixed line count
#[derive(Clone, Copy, Debug)]
pub struct ChunkPaginator {
    lines_per_page: usize,
}

impl Default for ChunkPaginator {
    fn default() -> Self {
        Self::new(DEFAULT_LINES_PER_PAGE)
    }
}

impl ChunkPaginator {
    /// Creates a splitter; a line count of 0 is treated as 1
    pub fn new(lines_per_page: usize) -> Self {
        Self {
            lines_per_page: lines_per_page.max(1),
        }
    }

    pub fn lines_per_page(&self) -> usize {
        self.lines_per_page
    }

    /// Splits `raw` into pages of at most `lines_per_page` lines.
    ///
    /// Pages that are blank after trimming are dropped. The result is never
    /// empty: text without any content yields [`EMPTY_LYRICS_PAGE`].
    pub fn chunk(&self, raw: &str) -> Vec<String> {
        let lines: Vec<&str> = raw.lines().collect();
        let pages: Vec<String> = lines
            .chunks(self.lines_per_page)
            .map(|chunk| chunk.join("\n"))
            .filter(|page| !page.trim().is_empty())
            .collect();

        if pages.is_empty() {
            vec![EMPTY_LYRICS_PAGE.to_string()]
        } else {
            pages
        }
    }
}

impl LyricPaginator for ChunkPaginator {
    fn name(&self) -> &str {
        "chunk"
    }

    fn paginate(&self, _title: &str, raw: &str) -> Result<Vec<String>, PaginationError> {
        Ok(self.chunk(raw))
    }
}

// =============================================================================
// AI-backed Splitting
// =============================================================================

const SYSTEM_PROMPT: &str = "You prepare worship song lyrics for projection slides. \
Answer with JSON only.";

const MAX_LINES_PER_PAGE_HINT: usize = 4;
const MAX_CHARS_PER_LINE_HINT: usize = 15;

/// Paginator delegating the split to a completion backend
pub struct AiLyricPaginator {
    backend: Arc<dyn CompletionBackend>,
    model: Option<String>,
}

impl AiLyricPaginator {
    pub fn new(backend: Arc<dyn CompletionBackend>) -> Self {
        Self {
            backend,
            model: None,
        }
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = Some(model.to_string());
        self
    }

    fn build_request(&self, title: &str, raw: &str) -> CompletionRequest {
        let prompt = format!(
            "Split the following song lyrics into slide pages.\n\
             - Keep each page to 3-{MAX_LINES_PER_PAGE_HINT} lines that belong together.\n\
             - Keep each line under {MAX_CHARS_PER_LINE_HINT} characters where the language allows.\n\
             - Do not repeat a chorus page twice in a row.\n\
             Respond as {{\"title\": string, \"pages\": [string]}} with lines joined by \\n.\n\n\
             Title: {title}\n\
             Lyrics:\n{raw}"
        );
        let request = CompletionRequest::new(&prompt)
            .with_system(SYSTEM_PROMPT)
            .with_temperature(0.2)
            .with_json_mode();
        match &self.model {
            Some(model) => request.with_model(model),
            None => request,
        }
    }
}

impl LyricPaginator for AiLyricPaginator {
    fn name(&self) -> &str {
        self.backend.name()
    }

    fn paginate(&self, title: &str, raw: &str) -> Result<Vec<String>, PaginationError> {
        if !self.backend.is_available() {
            return Err(PaginationError::Backend(format!(
                "{} is not available",
                self.backend.name()
            )));
        }

        let response = self
            .backend
            .complete(&self.build_request(title, raw))
            .map_err(|e| PaginationError::Backend(e.to_string()))?;

        let pages = clean_pages(parse_pages(&response.text)?);
        debug!(
            "{} split '{}' into {} pages",
            self.backend.name(),
            title,
            pages.len()
        );
        if pages.is_empty() {
            return Err(PaginationError::Empty);
        }
        Ok(pages)
    }
}

/// Reads pages from a model answer: a JSON array of strings, or an object
/// holding one under `pages` (or the legacy `splitted_lyrics`). Markdown code
/// fences around the JSON are ignored.
fn parse_pages(text: &str) -> Result<Vec<String>, PaginationError> {
    let trimmed = text.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .unwrap_or(trimmed);

    let value: Value =
        serde_json::from_str(body.trim()).map_err(|e| PaginationError::Malformed(e.to_string()))?;

    let pages = match &value {
        Value::Array(_) => &value,
        Value::Object(map) => map
            .get("pages")
            .or_else(|| map.get("splitted_lyrics"))
            .ok_or_else(|| PaginationError::Malformed("missing 'pages'".to_string()))?,
        _ => {
            return Err(PaginationError::Malformed(
                "expected a JSON array or object".to_string(),
            ))
        }
    };

    let items = pages
        .as_array()
        .ok_or_else(|| PaginationError::Malformed("'pages' is not an array".to_string()))?;
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| PaginationError::Malformed("page is not a string".to_string()))
        })
        .collect()
}

/// Trims pages, drops blank ones and collapses consecutive repeats
fn clean_pages(pages: Vec<String>) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::with_capacity(pages.len());
    for page in pages {
        let page = page.trim().to_string();
        if page.is_empty() {
            continue;
        }
        if cleaned.last().is_some_and(|last| *last == page) {
            continue;
        }
        cleaned.push(page);
    }
    cleaned
}
