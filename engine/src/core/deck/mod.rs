//! Deck Document Model
//!
//! In-memory representation of a slide deck: an ordered list of slides, the
//! layouts they are instantiated from, and the text-bearing shapes on each
//! slide.
//!
//! # Modules
//!
//! - `package`: binary container codec (template loading, deck persistence)
//! - `editor`: placeholder addressing and text replacement
//! - `expander`: cloning a slide position into N content-bearing slides
//! - `scaffold`: starter templates that satisfy a template contract

pub mod editor;
pub mod expander;
pub mod package;
pub mod scaffold;

pub use editor::{edit_text_field, EditOutcome, PlaceholderAddress, SkipReason};
pub use expander::{expand, CloneStrategy, ExpandTarget, SlideExpander};
pub use package::{decode_deck, encode_deck, load_template, save_deck};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::{Alignment, CoreError, CoreResult, LayoutId, SlideId};

/// First id handed out to slides of a new deck
pub const FIRST_SLIDE_ID: SlideId = 256;

// =============================================================================
// Text
// =============================================================================

/// How a text frame reacts to overflowing content
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AutoFit {
    /// Text overflows the frame
    #[default]
    None,
    /// The shape grows or shrinks to fit its text
    ShapeToFitText,
    /// Text is scaled down to fit the shape
    Normal,
}

/// Character formatting carried by runs and layout placeholders
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_pt: Option<f32>,
    #[serde(default)]
    pub bold: bool,
    /// Hex color, e.g. "#FFFFFF"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// A run of uniformly formatted text
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<TextStyle>,
}

/// A paragraph of runs
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<Alignment>,
    #[serde(default)]
    pub runs: Vec<Run>,
}

impl Paragraph {
    /// Concatenated text of all runs
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

/// Text frame of a shape
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextBody {
    pub paragraphs: Vec<Paragraph>,
    #[serde(default)]
    pub autofit: AutoFit,
    /// Formatting inherited by runs that carry no style of their own
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_style: Option<TextStyle>,
}

impl Default for TextBody {
    fn default() -> Self {
        Self::empty()
    }
}

impl TextBody {
    /// A text frame holding a single empty paragraph
    pub fn empty() -> Self {
        Self {
            paragraphs: vec![Paragraph::default()],
            autofit: AutoFit::None,
            default_style: None,
        }
    }

    /// A text frame holding `text` as one run
    pub fn with_text(text: &str) -> Self {
        let mut body = Self::empty();
        body.paragraphs[0].runs.push(Run {
            text: text.to_string(),
            style: None,
        });
        body
    }

    /// Text of all paragraphs joined by newlines
    pub fn plain_text(&self) -> String {
        self.paragraphs
            .iter()
            .map(Paragraph::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Removes all content, leaving a single empty paragraph
    pub fn clear(&mut self) {
        self.paragraphs.truncate(1);
        match self.paragraphs.first_mut() {
            Some(first) => first.runs.clear(),
            None => self.paragraphs.push(Paragraph::default()),
        }
    }

    /// Replaces the whole content with `text` as a single run, sizes the shape
    /// to its text and applies `alignment` to the paragraph.
    pub fn replace_text(&mut self, text: &str, alignment: Alignment) {
        self.clear();
        self.autofit = AutoFit::ShapeToFitText;
        if let Some(paragraph) = self.paragraphs.first_mut() {
            paragraph.alignment = Some(alignment);
            paragraph.runs.push(Run {
                text: text.to_string(),
                style: None,
            });
        }
    }
}

// =============================================================================
// Shapes
// =============================================================================

/// Designated role of a layout placeholder
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlaceholderRole {
    Title,
    CenterTitle,
    Subtitle,
    Body,
    Other,
}

impl PlaceholderRole {
    /// Whether this placeholder is the slide's title region
    pub fn is_title(&self) -> bool {
        matches!(self, PlaceholderRole::Title | PlaceholderRole::CenterTitle)
    }
}

/// Kind of a shape on a slide
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ShapeKind {
    /// Placeholder inherited from the layout
    Placeholder { role: PlaceholderRole, idx: u32 },
    /// Freestanding text box
    TextBox,
    /// Embedded image referencing a `media/` entry
    Picture { media: String },
    /// Table
    Table { rows: u32, cols: u32 },
    /// Any other drawing
    Freeform,
}

/// Position and size in EMU
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl Frame {
    pub fn new(x: i64, y: i64, width: i64, height: i64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// A shape on a slide or layout
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    /// Stable name assigned in the template
    pub name: String,
    pub kind: ShapeKind,
    #[serde(default)]
    pub frame: Frame,
    /// Text frame, if the shape can hold text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<TextBody>,
}

impl Shape {
    /// Creates a text-bearing placeholder
    pub fn placeholder(name: impl Into<String>, role: PlaceholderRole, idx: u32) -> Self {
        Self {
            name: name.into(),
            kind: ShapeKind::Placeholder { role, idx },
            frame: Frame::default(),
            text: Some(TextBody::empty()),
        }
    }

    /// Creates a freestanding text box
    pub fn text_box(name: impl Into<String>, text: &str) -> Self {
        Self {
            name: name.into(),
            kind: ShapeKind::TextBox,
            frame: Frame::default(),
            text: Some(TextBody::with_text(text)),
        }
    }

    /// Sets the frame
    pub fn with_frame(mut self, frame: Frame) -> Self {
        self.frame = frame;
        self
    }

    /// Sets the text content
    pub fn with_text(mut self, text: &str) -> Self {
        self.text = Some(TextBody::with_text(text));
        self
    }

    /// Sets the default character style of the text frame
    pub fn with_style(mut self, style: TextStyle) -> Self {
        let body = self.text.get_or_insert_with(TextBody::empty);
        body.default_style = Some(style);
        self
    }

    pub fn has_text_frame(&self) -> bool {
        self.text.is_some()
    }

    /// Placeholder role, if this shape is a placeholder
    pub fn role(&self) -> Option<PlaceholderRole> {
        match self.kind {
            ShapeKind::Placeholder { role, .. } => Some(role),
            _ => None,
        }
    }

    /// Placeholder ordinal, if this shape is a placeholder
    pub fn placeholder_idx(&self) -> Option<u32> {
        match self.kind {
            ShapeKind::Placeholder { idx, .. } => Some(idx),
            _ => None,
        }
    }

    /// Plain text content, empty when the shape has no text frame
    pub fn plain_text(&self) -> String {
        self.text.as_ref().map(TextBody::plain_text).unwrap_or_default()
    }
}

// =============================================================================
// Layouts and Slides
// =============================================================================

/// Reusable slide structure
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub id: LayoutId,
    pub name: String,
    /// Placeholders every slide of this layout starts with
    pub placeholders: Vec<Shape>,
}

impl Layout {
    pub fn new(id: impl Into<LayoutId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            placeholders: Vec::new(),
        }
    }

    /// Adds a placeholder
    pub fn with_placeholder(mut self, shape: Shape) -> Self {
        self.placeholders.push(shape);
        self
    }

    /// Shapes for a fresh slide: the layout placeholders with their styles and
    /// empty text.
    pub fn instantiate(&self) -> Vec<Shape> {
        self.placeholders
            .iter()
            .cloned()
            .map(|mut shape| {
                if let Some(body) = shape.text.as_mut() {
                    body.clear();
                }
                shape
            })
            .collect()
    }
}

/// A slide of a deck
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slide {
    pub id: SlideId,
    /// Layout this slide was instantiated from (referenced, not owned)
    pub layout_id: LayoutId,
    pub shapes: Vec<Shape>,
}

impl Slide {
    /// The slide's title placeholder
    pub fn title_shape(&self) -> Option<&Shape> {
        self.shapes
            .iter()
            .find(|s| s.role().is_some_and(|r| r.is_title()) && s.has_text_frame())
    }

    /// Text of the title placeholder
    pub fn title_text(&self) -> Option<String> {
        self.title_shape().map(Shape::plain_text)
    }

    /// Finds a shape by its stable name
    pub fn shape_named(&self, name: &str) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.name == name)
    }

    /// Texts of all text-bearing shapes, in shape order
    pub fn texts(&self) -> Vec<String> {
        self.shapes
            .iter()
            .filter(|s| s.has_text_frame())
            .map(Shape::plain_text)
            .collect()
    }
}

// =============================================================================
// Deck
// =============================================================================

/// Descriptive metadata stored with a deck
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckMeta {
    pub title: String,
    /// Template contract version the deck was authored for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_version: Option<String>,
}

/// An ordered, index-addressable sequence of slides
///
/// Index order is presentation order. Slides can only be inserted through the
/// slide expander, which keeps every later slide shifted by exactly the
/// number of slides it inserts.
#[derive(Clone, Debug, PartialEq)]
pub struct Deck {
    pub meta: DeckMeta,
    layouts: Vec<Layout>,
    slides: Vec<Slide>,
    next_slide_id: SlideId,
    media: BTreeMap<String, Vec<u8>>,
}

impl Deck {
    /// Creates an empty deck
    pub fn new(meta: DeckMeta) -> Self {
        Self {
            meta,
            layouts: Vec::new(),
            slides: Vec::new(),
            next_slide_id: FIRST_SLIDE_ID,
            media: BTreeMap::new(),
        }
    }

    /// Rebuilds a deck from decoded parts, validating slide identity.
    pub fn from_parts(
        meta: DeckMeta,
        layouts: Vec<Layout>,
        slides: Vec<Slide>,
        next_slide_id: Option<SlideId>,
        media: BTreeMap<String, Vec<u8>>,
    ) -> CoreResult<Self> {
        let mut seen = std::collections::HashSet::with_capacity(slides.len());
        for slide in &slides {
            if !seen.insert(slide.id) {
                return Err(CoreError::DuplicateSlideId(slide.id));
            }
        }

        if next_slide_id == Some(SlideId::MAX) {
            return Err(CoreError::TemplateCorrupted(
                "slide id counter is exhausted".to_string(),
            ));
        }
        let after_max = match slides.iter().map(|s| s.id).max() {
            Some(id) => Some(id.checked_add(1).ok_or_else(|| {
                CoreError::TemplateCorrupted(format!("slide id {id} leaves no room for new slides"))
            })?),
            None => None,
        };
        let next = after_max
            .into_iter()
            .chain(next_slide_id)
            .chain(std::iter::once(FIRST_SLIDE_ID))
            .max()
            .unwrap_or(FIRST_SLIDE_ID);

        Ok(Self {
            meta,
            layouts,
            slides,
            next_slide_id: next,
            media,
        })
    }

    /// Registers a layout, replacing any layout with the same id
    pub fn add_layout(&mut self, layout: Layout) {
        match self.layouts.iter_mut().find(|l| l.id == layout.id) {
            Some(existing) => *existing = layout,
            None => self.layouts.push(layout),
        }
    }

    /// Appends a slide instantiated from `layout_id`
    pub fn push_slide(&mut self, layout_id: &str) -> CoreResult<SlideId> {
        let shapes = self
            .layout(layout_id)
            .map(Layout::instantiate)
            .ok_or_else(|| CoreError::ValidationError(format!("Unknown layout: {layout_id}")))?;

        let id = self.allocate_slide_id()?;
        self.slides.push(Slide {
            id,
            layout_id: layout_id.to_string(),
            shapes,
        });
        Ok(id)
    }

    /// Adds a binary media entry (stored under `media/` in the container)
    pub fn add_media(&mut self, name: impl Into<String>, bytes: Vec<u8>) {
        self.media.insert(name.into(), bytes);
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub fn slide(&self, index: usize) -> Option<&Slide> {
        self.slides.get(index)
    }

    pub(crate) fn slide_mut(&mut self, index: usize) -> Option<&mut Slide> {
        self.slides.get_mut(index)
    }

    pub fn layouts(&self) -> &[Layout] {
        &self.layouts
    }

    pub fn layout(&self, id: &str) -> Option<&Layout> {
        self.layouts.iter().find(|l| l.id == id)
    }

    pub fn media(&self) -> &BTreeMap<String, Vec<u8>> {
        &self.media
    }

    /// Slide ids in presentation order
    pub fn slide_ids(&self) -> Vec<SlideId> {
        self.slides.iter().map(|s| s.id).collect()
    }

    /// Current index of the slide with `id`
    pub fn index_of(&self, id: SlideId) -> Option<usize> {
        self.slides.iter().position(|s| s.id == id)
    }

    pub(crate) fn next_slide_id(&self) -> SlideId {
        self.next_slide_id
    }

    pub(crate) fn allocate_slide_id(&mut self) -> CoreResult<SlideId> {
        let id = self.next_slide_id;
        self.next_slide_id = id.checked_add(1).ok_or_else(|| {
            CoreError::TemplateCorrupted("slide id counter is exhausted".to_string())
        })?;
        Ok(id)
    }

    /// Inserts `slide` at `index`, shifting every slide at `index` or later
    /// up by one.
    pub(crate) fn insert_at(&mut self, index: usize, slide: Slide) -> CoreResult<()> {
        if index > self.slides.len() {
            return Err(CoreError::SlideOutOfRange {
                index,
                len: self.slides.len(),
            });
        }
        if self.index_of(slide.id).is_some() {
            return Err(CoreError::DuplicateSlideId(slide.id));
        }
        self.slides.insert(index, slide);
        Ok(())
    }
}
