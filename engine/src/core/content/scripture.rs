//! Scripture references and lookup.
//!
//! A reference such as `John 3:16 - 3:18` is parsed into a [`ScriptureRange`]
//! and resolved by a [`ScriptureSource`] into one `{title, body}` entry per
//! verse.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;
use tracing::debug;

use crate::core::Entry;

/// Book-name to file-name index of a corpus directory
pub const CORPUS_INDEX_FILE: &str = "books.json";

/// Scripture lookup failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScriptureError {
    #[error("Unrecognized scripture reference: {0}")]
    Unparsable(String),

    #[error("Unknown book: {0}")]
    UnknownBook(String),

    #[error("Scripture source missing: {0}")]
    SourceMissing(String),

    #[error("Passage not found: {0}")]
    NotFound(String),
}

impl ScriptureError {
    /// The source was readable but holds no such passage
    pub fn is_not_found(&self) -> bool {
        matches!(self, ScriptureError::NotFound(_) | ScriptureError::UnknownBook(_))
    }

    /// The source itself (corpus, book file) is unavailable
    pub fn is_source_missing(&self) -> bool {
        matches!(self, ScriptureError::SourceMissing(_))
    }
}

// =============================================================================
// References
// =============================================================================

/// An inclusive verse range within one book
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptureRange {
    pub book: String,
    pub start_chapter: u32,
    pub start_verse: u32,
    pub end_chapter: u32,
    pub end_verse: u32,
}

fn reference_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*(.+?)\s*(\d+):(\d+)\s*(?:-\s*(?:(.+?)\s*)?(\d+):(\d+))?\s*$")
            .expect("static regex")
    })
}

impl ScriptureRange {
    pub fn new(book: &str, start: (u32, u32), end: (u32, u32)) -> Self {
        Self {
            book: book.to_string(),
            start_chapter: start.0,
            start_verse: start.1,
            end_chapter: end.0,
            end_verse: end.1,
        }
    }

    /// Parses `BOOK CH:VS[ - [BOOK] CH:VS]`.
    ///
    /// A missing end repeats the start. Ranges ending before they start, or
    /// spanning two books, are rejected.
    pub fn parse(reference: &str) -> Result<Self, ScriptureError> {
        let unparsable = || ScriptureError::Unparsable(reference.trim().to_string());
        let caps = reference_regex().captures(reference).ok_or_else(unparsable)?;

        let number = |i: usize| -> Option<u32> { caps.get(i).and_then(|m| m.as_str().parse().ok()) };

        let book = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
        let start_chapter = number(2).ok_or_else(unparsable)?;
        let start_verse = number(3).ok_or_else(unparsable)?;
        let end_chapter = number(5).unwrap_or(start_chapter);
        let end_verse = number(6).unwrap_or(start_verse);

        if let Some(end_book) = caps.get(4).map(|m| m.as_str().trim()) {
            if end_book != book {
                return Err(unparsable());
            }
        }
        if book.is_empty() || (end_chapter, end_verse) < (start_chapter, start_verse) {
            return Err(unparsable());
        }

        Ok(Self {
            book: book.to_string(),
            start_chapter,
            start_verse,
            end_chapter,
            end_verse,
        })
    }

    /// Whether `(chapter, verse)` lies inside the range
    pub fn contains(&self, chapter: u32, verse: u32) -> bool {
        (self.start_chapter, self.start_verse) <= (chapter, verse)
            && (chapter, verse) <= (self.end_chapter, self.end_verse)
    }
}

impl fmt::Display for ScriptureRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}:{}", self.book, self.start_chapter, self.start_verse)?;
        if (self.end_chapter, self.end_verse) != (self.start_chapter, self.start_verse) {
            write!(f, "-{}:{}", self.end_chapter, self.end_verse)?;
        }
        Ok(())
    }
}

// =============================================================================
// Sources
// =============================================================================

/// Resolves a verse range into `{title, body}` entries in reading order
pub trait ScriptureSource: Send + Sync {
    fn lookup(&self, range: &ScriptureRange) -> Result<Vec<Entry>, ScriptureError>;
}

/// Source used when no scripture corpus is configured
#[derive(Clone, Copy, Debug, Default)]
pub struct NoScriptureSource;

impl ScriptureSource for NoScriptureSource {
    fn lookup(&self, _range: &ScriptureRange) -> Result<Vec<Entry>, ScriptureError> {
        Err(ScriptureError::SourceMissing(
            "no scripture corpus configured".to_string(),
        ))
    }
}

fn verse_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\S+?)(\d+):(\d+)\s+(.*)$").expect("static regex"))
}

fn section_title_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]+>").expect("static regex"))
}

fn file_prefix_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+-\d+").expect("static regex"))
}

/// Plain-text corpus with one file per book
///
/// Each line reads `<abbrev><chapter>:<verse> <text>`, e.g.
/// `Jn3:16 For God so loved the world`. Section headings written as `<...>`
/// inside the text are removed. Book files are located through
/// `books.json` (`{"John": "2-04John.txt"}`) when present, otherwise by file
/// name with any `N-NN` ordering prefix stripped (`2-04John.txt` → `John`).
#[derive(Clone, Debug)]
pub struct TextCorpusScripture {
    root: PathBuf,
}

impl TextCorpusScripture {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn book_index(&self) -> Result<HashMap<String, PathBuf>, ScriptureError> {
        let missing = |e: std::io::Error| {
            ScriptureError::SourceMissing(format!("{}: {}", self.root.display(), e))
        };

        let index_path = self.root.join(CORPUS_INDEX_FILE);
        if index_path.is_file() {
            let content = std::fs::read_to_string(&index_path).map_err(missing)?;
            let map: HashMap<String, String> = serde_json::from_str(&content).map_err(|e| {
                ScriptureError::SourceMissing(format!("{}: {}", index_path.display(), e))
            })?;
            return Ok(map
                .into_iter()
                .map(|(book, file)| (book, self.root.join(file)))
                .collect());
        }

        let mut index = HashMap::new();
        for entry in std::fs::read_dir(&self.root).map_err(missing)? {
            let path = entry.map_err(missing)?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("txt") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                let book = file_prefix_regex().replace(stem, "").trim().to_string();
                index.insert(book, path.clone());
            }
        }
        Ok(index)
    }
}

impl ScriptureSource for TextCorpusScripture {
    fn lookup(&self, range: &ScriptureRange) -> Result<Vec<Entry>, ScriptureError> {
        let index = self.book_index()?;
        let path = index
            .get(&range.book)
            .ok_or_else(|| ScriptureError::UnknownBook(range.book.clone()))?;
        let content = std::fs::read_to_string(path).map_err(|e| {
            ScriptureError::SourceMissing(format!("{}: {}", path.display(), e))
        })?;

        let mut verses = Vec::new();
        for line in content.lines() {
            let Some(caps) = verse_line_regex().captures(line.trim()) else {
                continue;
            };
            let (Ok(chapter), Ok(verse)) = (caps[2].parse::<u32>(), caps[3].parse::<u32>()) else {
                continue;
            };
            if (chapter, verse) > (range.end_chapter, range.end_verse) {
                break;
            }
            if !range.contains(chapter, verse) {
                continue;
            }
            let text = section_title_regex().replace_all(&caps[4], "").trim().to_string();
            verses.push(Entry::new(format!("{} {}:{}", range.book, chapter, verse), text));
        }

        debug!("Found {} verses for {}", verses.len(), range);
        if verses.is_empty() {
            return Err(ScriptureError::NotFound(range.to_string()));
        }
        Ok(verses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const JOHN: &str = "Jn3:15 That whosoever believeth in him should not perish\n\
Jn3:16 <God's love> For God so loved the world\n\
Jn3:17 For God sent not his Son\n\
not a verse line\n\
Jn3:18 He that believeth on him is not condemned\n\
Jn4:1 When therefore the Lord knew\n";

    fn corpus() -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("2-04John.txt"), JOHN).unwrap();
        dir
    }

    #[test]
    fn test_parse_single_verse() {
        let range = ScriptureRange::parse("John 3:16").unwrap();
        assert_eq!(range, ScriptureRange::new("John", (3, 16), (3, 16)));
        assert_eq!(range.to_string(), "John 3:16");
    }

    #[test]
    fn test_parse_ranges() {
        assert_eq!(
            ScriptureRange::parse(" John 3:16 - 3:18 ").unwrap(),
            ScriptureRange::new("John", (3, 16), (3, 18))
        );
        assert_eq!(
            ScriptureRange::parse("1 John 1:9-2:1").unwrap(),
            ScriptureRange::new("1 John", (1, 9), (2, 1))
        );
        assert_eq!(
            ScriptureRange::parse("요한복음3:16-요한복음 3:17").unwrap(),
            ScriptureRange::new("요한복음", (3, 16), (3, 17))
        );
    }

    #[test]
    fn test_parse_rejects_bad_references() {
        for reference in ["", "John", "John 3", "John 3:18 - 3:16", "John 3:16 - Acts 1:1"] {
            assert!(
                matches!(
                    ScriptureRange::parse(reference),
                    Err(ScriptureError::Unparsable(_))
                ),
                "{reference}"
            );
        }
    }

    #[test]
    fn test_corpus_lookup_by_file_name() {
        let dir = corpus();
        let source = TextCorpusScripture::new(dir.path());

        let verses = source
            .lookup(&ScriptureRange::new("John", (3, 16), (3, 18)))
            .unwrap();

        assert_eq!(verses.len(), 3);
        assert_eq!(verses[0], Entry::new("John 3:16", "For God so loved the world"));
        assert_eq!(verses[2].title, "John 3:18");
    }

    #[test]
    fn test_corpus_lookup_across_chapters() {
        let dir = corpus();
        let source = TextCorpusScripture::new(dir.path());
        let verses = source
            .lookup(&ScriptureRange::new("John", (3, 18), (4, 1)))
            .unwrap();
        assert_eq!(verses.len(), 2);
        assert_eq!(verses[1].title, "John 4:1");
    }

    #[test]
    fn test_corpus_lookup_with_index_file() {
        let dir = corpus();
        std::fs::write(
            dir.path().join(CORPUS_INDEX_FILE),
            r#"{"요한복음": "2-04John.txt"}"#,
        )
        .unwrap();
        let source = TextCorpusScripture::new(dir.path());

        let verses = source
            .lookup(&ScriptureRange::new("요한복음", (3, 15), (3, 15)))
            .unwrap();
        assert_eq!(verses[0].title, "요한복음 3:15");
    }

    #[test]
    fn test_not_found_and_source_missing_are_distinct() {
        let dir = corpus();
        let source = TextCorpusScripture::new(dir.path());

        let not_found = source
            .lookup(&ScriptureRange::new("John", (9, 1), (9, 2)))
            .unwrap_err();
        assert!(not_found.is_not_found());
        assert!(!not_found.is_source_missing());

        let unknown = source
            .lookup(&ScriptureRange::new("Acts", (1, 1), (1, 1)))
            .unwrap_err();
        assert_eq!(unknown, ScriptureError::UnknownBook("Acts".to_string()));

        let missing = TextCorpusScripture::new(dir.path().join("nope"))
            .lookup(&ScriptureRange::new("John", (3, 16), (3, 16)))
            .unwrap_err();
        assert!(missing.is_source_missing());

        assert!(NoScriptureSource
            .lookup(&ScriptureRange::new("John", (3, 16), (3, 16)))
            .unwrap_err()
            .is_source_missing());
    }
}
