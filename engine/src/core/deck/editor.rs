//! Field Editor
//!
//! Locates one placeholder on a slide and overwrites its text. Resolution
//! failures are reported as an [`EditOutcome`] and never abort the caller.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{Deck, Slide};
use crate::core::Alignment;

// =============================================================================
// Addressing
// =============================================================================

/// How a placeholder on a slide is addressed
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "value", rename_all = "camelCase")]
pub enum PlaceholderAddress {
    /// The slide's title placeholder
    RoleTitle,
    /// A shape with this template-assigned name
    StableName(String),
    /// A placeholder with this layout ordinal
    PositionalIndex(u32),
    /// The title placeholder, else the first shape with a text frame
    FirstAvailable,
}

impl PlaceholderAddress {
    /// Position of the addressed shape within `slide.shapes`.
    ///
    /// Only shapes that carry a text frame can be resolved.
    pub fn resolve(&self, slide: &Slide) -> Option<usize> {
        let shapes = &slide.shapes;
        let title = || {
            shapes.iter().position(|s| {
                s.has_text_frame() && s.role().is_some_and(|role| role.is_title())
            })
        };

        match self {
            PlaceholderAddress::RoleTitle => title(),
            PlaceholderAddress::StableName(name) => shapes
                .iter()
                .position(|s| s.has_text_frame() && &s.name == name),
            PlaceholderAddress::PositionalIndex(idx) => shapes
                .iter()
                .position(|s| s.has_text_frame() && s.placeholder_idx() == Some(*idx)),
            PlaceholderAddress::FirstAvailable => {
                title().or_else(|| shapes.iter().position(|s| s.has_text_frame()))
            }
        }
    }
}

impl fmt::Display for PlaceholderAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaceholderAddress::RoleTitle => write!(f, "title"),
            PlaceholderAddress::StableName(name) => write!(f, "name '{name}'"),
            PlaceholderAddress::PositionalIndex(idx) => write!(f, "placeholder idx {idx}"),
            PlaceholderAddress::FirstAvailable => write!(f, "first available"),
        }
    }
}

// =============================================================================
// Outcome
// =============================================================================

/// Why an edit was skipped
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    SlideOutOfRange { index: usize, len: usize },
    PlaceholderNotFound { index: usize, address: PlaceholderAddress },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::SlideOutOfRange { index, len } => {
                write!(f, "slide {index} out of range (deck has {len} slides)")
            }
            SkipReason::PlaceholderNotFound { index, address } => {
                write!(f, "no placeholder matching {address} on slide {index}")
            }
        }
    }
}

/// Result of a field edit
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EditOutcome {
    Applied { slide_index: usize, shape_name: String },
    Skipped(SkipReason),
}

impl EditOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, EditOutcome::Applied { .. })
    }
}

// =============================================================================
// Edit
// =============================================================================

/// Replaces the text of the addressed placeholder on slide `slide_index`.
///
/// The previous content is cleared, `text` is written as a single run, the
/// shape is set to fit its text and the paragraph gets `align`. An invalid
/// slide index or an unresolvable address leaves the deck untouched and
/// returns [`EditOutcome::Skipped`].
pub fn edit_text_field(
    deck: &mut Deck,
    slide_index: usize,
    address: &PlaceholderAddress,
    text: &str,
    align: Alignment,
) -> EditOutcome {
    let len = deck.len();
    let Some(slide) = deck.slide_mut(slide_index) else {
        let reason = SkipReason::SlideOutOfRange {
            index: slide_index,
            len,
        };
        warn!("Skipping field edit: {}", reason);
        return EditOutcome::Skipped(reason);
    };

    let Some(position) = address.resolve(slide) else {
        let reason = SkipReason::PlaceholderNotFound {
            index: slide_index,
            address: address.clone(),
        };
        warn!("Skipping field edit: {}", reason);
        return EditOutcome::Skipped(reason);
    };

    let shape = &mut slide.shapes[position];
    if let Some(body) = shape.text.as_mut() {
        body.replace_text(text, align);
    }
    debug!(
        "Wrote {} chars to '{}' on slide {}",
        text.chars().count(),
        shape.name,
        slide_index
    );

    EditOutcome::Applied {
        slide_index,
        shape_name: shape.name.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::deck::test_support::numbered_deck;
    use crate::core::deck::{AutoFit, Layout, PlaceholderRole, Shape, ShapeKind};

    fn slide_with(shapes: Vec<Shape>) -> Slide {
        Slide {
            id: 1,
            layout_id: "l".to_string(),
            shapes,
        }
    }

    #[test]
    fn test_resolve_modes() {
        let slide = slide_with(vec![
            Shape {
                name: "Logo".to_string(),
                kind: ShapeKind::Picture {
                    media: "logo.png".to_string(),
                },
                frame: Default::default(),
                text: None,
            },
            Shape::placeholder("Content 2", PlaceholderRole::Body, 10),
            Shape::placeholder("Title 1", PlaceholderRole::Title, 0),
        ]);

        assert_eq!(PlaceholderAddress::RoleTitle.resolve(&slide), Some(2));
        assert_eq!(PlaceholderAddress::FirstAvailable.resolve(&slide), Some(2));
        assert_eq!(PlaceholderAddress::PositionalIndex(10).resolve(&slide), Some(1));
        assert_eq!(PlaceholderAddress::PositionalIndex(1).resolve(&slide), None);
        assert_eq!(
            PlaceholderAddress::StableName("Content 2".to_string()).resolve(&slide),
            Some(1)
        );
        // Pictures carry no text frame and never resolve.
        assert_eq!(
            PlaceholderAddress::StableName("Logo".to_string()).resolve(&slide),
            None
        );
    }

    #[test]
    fn test_first_available_without_title() {
        let slide = slide_with(vec![
            Shape::placeholder("Lyrics", PlaceholderRole::Body, 1),
            Shape::text_box("Footer", "church"),
        ]);
        assert_eq!(PlaceholderAddress::FirstAvailable.resolve(&slide), Some(0));
        assert_eq!(PlaceholderAddress::RoleTitle.resolve(&slide), None);
    }

    #[test]
    fn test_edit_replaces_content() {
        let mut deck = numbered_deck(3);

        let outcome = edit_text_field(
            &mut deck,
            1,
            &PlaceholderAddress::RoleTitle,
            "Amazing Grace",
            Alignment::Center,
        );

        assert_eq!(
            outcome,
            EditOutcome::Applied {
                slide_index: 1,
                shape_name: "Title 1".to_string()
            }
        );
        let shape = deck.slide(1).unwrap().title_shape().unwrap();
        let body = shape.text.as_ref().unwrap();
        assert_eq!(body.plain_text(), "Amazing Grace");
        assert_eq!(body.autofit, AutoFit::ShapeToFitText);
        assert_eq!(body.paragraphs[0].alignment, Some(Alignment::Center));
    }

    #[test]
    fn test_edit_out_of_range_is_noop() {
        let mut deck = numbered_deck(2);
        let before = deck.clone();

        let outcome = edit_text_field(
            &mut deck,
            9,
            &PlaceholderAddress::RoleTitle,
            "x",
            Alignment::Left,
        );

        assert_eq!(
            outcome,
            EditOutcome::Skipped(SkipReason::SlideOutOfRange { index: 9, len: 2 })
        );
        assert_eq!(deck, before);
    }

    #[test]
    fn test_edit_unresolved_placeholder_is_noop() {
        let mut deck = numbered_deck(2);
        let before = deck.clone();

        let outcome = edit_text_field(
            &mut deck,
            0,
            &PlaceholderAddress::PositionalIndex(42),
            "x",
            Alignment::Left,
        );

        assert!(!outcome.is_applied());
        assert_eq!(deck, before);
    }

    #[test]
    fn test_edit_is_idempotent() {
        let mut once = numbered_deck(2);
        let address = PlaceholderAddress::PositionalIndex(1);
        edit_text_field(&mut once, 0, &address, "line 1\nline 2", Alignment::Left);

        let mut twice = once.clone();
        edit_text_field(&mut twice, 0, &address, "line 1\nline 2", Alignment::Left);

        assert_eq!(once, twice);
    }

    #[test]
    fn test_edit_on_layout_without_title() {
        let mut deck = numbered_deck(0);
        deck.add_layout(
            Layout::new("lyrics", "Lyrics")
                .with_placeholder(Shape::placeholder("Lyrics", PlaceholderRole::Body, 1)),
        );
        deck.push_slide("lyrics").unwrap();

        let outcome = edit_text_field(
            &mut deck,
            0,
            &PlaceholderAddress::FirstAvailable,
            "verse",
            Alignment::Center,
        );

        assert!(outcome.is_applied());
        assert_eq!(deck.slide(0).unwrap().texts(), vec!["verse".to_string()]);
    }

    #[test]
    fn test_address_serialization() {
        let json = serde_json::to_string(&PlaceholderAddress::PositionalIndex(10)).unwrap();
        assert_eq!(json, r#"{"mode":"positionalIndex","value":10}"#);

        let parsed: PlaceholderAddress = serde_json::from_str(r#"{"mode":"roleTitle"}"#).unwrap();
        assert_eq!(parsed, PlaceholderAddress::RoleTitle);
    }
}
