//! Lyric fetching.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

/// Lyric fetch failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LyricsError {
    #[error("No lyric source available for '{0}'")]
    Unavailable(String),

    #[error("Lyric request for '{source_ref}' failed: {reason}")]
    Request { source_ref: String, reason: String },

    #[error("No lyrics found at '{0}'")]
    Empty(String),
}

/// Resolves a lyric source reference to raw lyric text
pub trait LyricFetcher: Send + Sync {
    fn fetch(&self, source: &str) -> Result<String, LyricsError>;
}

/// Fetcher used when lyric fetching is disabled
#[derive(Clone, Copy, Debug, Default)]
pub struct NoLyricFetcher;

impl LyricFetcher for NoLyricFetcher {
    fn fetch(&self, source: &str) -> Result<String, LyricsError> {
        Err(LyricsError::Unavailable(source.to_string()))
    }
}

/// Fetcher answering from an in-memory table (source reference → lyrics)
#[derive(Clone, Debug, Default)]
pub struct StaticLyricFetcher {
    entries: HashMap<String, String>,
}

impl StaticLyricFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, source: impl Into<String>, lyrics: impl Into<String>) -> Self {
        self.entries.insert(source.into(), lyrics.into());
        self
    }
}

impl LyricFetcher for StaticLyricFetcher {
    fn fetch(&self, source: &str) -> Result<String, LyricsError> {
        match self.entries.get(source) {
            Some(lyrics) if !lyrics.trim().is_empty() => Ok(lyrics.clone()),
            Some(_) => Err(LyricsError::Empty(source.to_string())),
            None => Err(LyricsError::Unavailable(source.to_string())),
        }
    }
}

fn lyrics_block_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<xmp[^>]*>(.*?)</xmp>").expect("static regex"))
}

fn line_break_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)<br\s*/?>|</p>").expect("static regex"))
}

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<[^>]*>").expect("static regex"))
}

/// Extracts lyric text from a fetched page.
///
/// Lyric sites wrap the verbatim lyrics in an `<xmp>` block; that block wins
/// when present. Otherwise markup is stripped, with `<br>` and paragraph ends
/// kept as line breaks. Plain text passes through unchanged apart from
/// trimming.
pub fn extract_lyrics_text(page: &str) -> String {
    if let Some(block) = lyrics_block_regex()
        .captures(page)
        .and_then(|caps| caps.get(1))
    {
        return block.as_str().trim().to_string();
    }

    if !page.contains('<') {
        return page.trim().to_string();
    }

    let with_breaks = line_break_regex().replace_all(page, "\n");
    let stripped = tag_regex().replace_all(&with_breaks, "");
    let decoded = stripped
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");

    decoded
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

// =============================================================================
// HTTP Fetcher
// =============================================================================

#[cfg(feature = "remote-lyrics")]
mod http {
    use std::time::Duration;

    use tracing::debug;

    use super::{extract_lyrics_text, LyricFetcher, LyricsError};

    const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
    const USER_AGENT: &str = concat!("servicedeck/", env!("CARGO_PKG_VERSION"));

    /// Fetches lyric pages over HTTP(S)
    ///
    /// Runs on the generation worker thread and blocks it for the duration of
    /// the request.
    #[derive(Clone, Debug)]
    pub struct HttpLyricFetcher {
        timeout: Duration,
    }

    impl Default for HttpLyricFetcher {
        fn default() -> Self {
            Self {
                timeout: DEFAULT_TIMEOUT,
            }
        }
    }

    impl HttpLyricFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_timeout(mut self, timeout: Duration) -> Self {
            self.timeout = timeout;
            self
        }
    }

    impl LyricFetcher for HttpLyricFetcher {
        fn fetch(&self, source: &str) -> Result<String, LyricsError> {
            let request_failed = |e: reqwest::Error| LyricsError::Request {
                source_ref: source.to_string(),
                reason: e.to_string(),
            };

            if !(source.starts_with("http://") || source.starts_with("https://")) {
                return Err(LyricsError::Unavailable(source.to_string()));
            }

            // Built per call: the blocking client owns a runtime that must not
            // be dropped on an async thread.
            let client = reqwest::blocking::Client::builder()
                .timeout(self.timeout)
                .user_agent(USER_AGENT)
                .build()
                .map_err(request_failed)?;

            let body = client
                .get(source)
                .send()
                .and_then(|r| r.error_for_status())
                .and_then(|r| r.text())
                .map_err(request_failed)?;
            debug!("Fetched {} bytes of lyrics from {}", body.len(), source);

            let lyrics = extract_lyrics_text(&body);
            if lyrics.is_empty() {
                return Err(LyricsError::Empty(source.to_string()));
            }
            Ok(lyrics)
        }
    }
}

#[cfg(feature = "remote-lyrics")]
pub use http::HttpLyricFetcher;
