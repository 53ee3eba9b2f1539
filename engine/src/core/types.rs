//! servicedeck Core Type Definitions
//!
//! Defines fundamental types used throughout the project.

use serde::{Deserialize, Serialize};

// =============================================================================
// ID Types
// =============================================================================

/// Slide unique identifier within one deck
pub type SlideId = u64;

/// Layout identifier (assigned by the template author)
pub type LayoutId = String;

/// Job correlation identifier (ULID)
pub type JobId = String;

// =============================================================================
// Text Types
// =============================================================================

/// Paragraph alignment applied by the field editor
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Alignment {
    /// Centered text (default for titles and lyrics)
    #[default]
    Center,
    /// Left-aligned text (announcements, scripture)
    Left,
}

/// A titled entry of an expandable section (announcement, scripture verse,
/// lyric page with a heading)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Heading written to the slide title
    pub title: String,
    /// Body text written to the content placeholder
    #[serde(alias = "contents")]
    pub body: String,
}

impl Entry {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

/// Content rendered into a slide: either a flat string or a titled entry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentItem {
    /// Flat text (field substitution, lyric page)
    Text(String),
    /// `{title, body}` pair
    Entry(Entry),
}

impl ContentItem {
    /// Returns the body text of this item
    pub fn body(&self) -> &str {
        match self {
            ContentItem::Text(text) => text,
            ContentItem::Entry(entry) => &entry.body,
        }
    }

    /// Returns the title, if this item carries one
    pub fn title(&self) -> Option<&str> {
        match self {
            ContentItem::Text(_) => None,
            ContentItem::Entry(entry) => Some(&entry.title),
        }
    }
}

impl From<&str> for ContentItem {
    fn from(value: &str) -> Self {
        ContentItem::Text(value.to_string())
    }
}

impl From<String> for ContentItem {
    fn from(value: String) -> Self {
        ContentItem::Text(value)
    }
}

impl From<Entry> for ContentItem {
    fn from(value: Entry) -> Self {
        ContentItem::Entry(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_item_accessors() {
        let text = ContentItem::from("page one");
        assert_eq!(text.body(), "page one");
        assert!(text.title().is_none());

        let entry = ContentItem::from(Entry::new("John 3:16", "For God so loved"));
        assert_eq!(entry.title(), Some("John 3:16"));
        assert_eq!(entry.body(), "For God so loved");
    }

    #[test]
    fn test_entry_accepts_contents_alias() {
        let entry: Entry =
            serde_json::from_str(r#"{"title":"Picnic","contents":"Sunday at noon"}"#).unwrap();
        assert_eq!(entry.body, "Sunday at noon");
    }

    #[test]
    fn test_content_item_untagged_deserialization() {
        let items: Vec<ContentItem> =
            serde_json::from_str(r#"["plain", {"title":"t","body":"b"}]"#).unwrap();
        assert_eq!(items[0], ContentItem::Text("plain".to_string()));
        assert_eq!(items[1], ContentItem::Entry(Entry::new("t", "b")));
    }
}
