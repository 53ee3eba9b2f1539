//! Slide Expander
//!
//! Turns one template slide position into N content-bearing slides. The first
//! item is written into the existing slide, every further item goes into a new
//! slide inserted right after the previous one.

use tracing::{debug, warn};

use super::editor::{edit_text_field, PlaceholderAddress};
use super::{Deck, Shape, ShapeKind, Slide};
use crate::core::{Alignment, ContentItem, CoreError, CoreResult, Entry};

/// How a new slide is produced from the template slide
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CloneStrategy {
    /// Instantiate the template slide's layout (placeholders and their style)
    #[default]
    FromLayout,
    /// Copy the template slide's text-bearing shapes. Pictures, tables and
    /// freeform shapes are dropped.
    CopyInstance,
}

/// Where expanded content is written on each slide
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpandTarget {
    /// Placeholder receiving the item body
    pub body: PlaceholderAddress,
    /// Placeholder receiving the title of `{title, body}` items
    pub title: PlaceholderAddress,
    pub align: Alignment,
}

impl ExpandTarget {
    /// Flat text written to `body`
    pub fn body(body: PlaceholderAddress, align: Alignment) -> Self {
        Self {
            body,
            title: PlaceholderAddress::RoleTitle,
            align,
        }
    }

    /// Titled entries: title to the title placeholder, body to `body`, both
    /// left aligned
    pub fn entries(body: PlaceholderAddress) -> Self {
        Self {
            body,
            title: PlaceholderAddress::RoleTitle,
            align: Alignment::Left,
        }
    }
}

/// Expands template slides into runs of cloned slides
#[derive(Clone, Debug, Default)]
pub struct SlideExpander {
    strategy: CloneStrategy,
}

impl SlideExpander {
    /// Creates an expander cloning from layouts
    pub fn new() -> Self {
        Self::default()
    }

    /// Forces a clone strategy
    pub fn with_strategy(mut self, strategy: CloneStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn strategy(&self) -> CloneStrategy {
        self.strategy
    }

    /// Writes `items` into slides starting at `template_index` and returns the
    /// number of slides inserted (`items.len() - 1`, or 0 when empty).
    ///
    /// After the call slides `template_index..template_index + items.len()`
    /// hold the items in order, and every pre-existing slide after the
    /// template slide is shifted by the returned count.
    pub fn expand(
        &self,
        deck: &mut Deck,
        template_index: usize,
        items: &[ContentItem],
        target: &ExpandTarget,
    ) -> CoreResult<usize> {
        let Some((first, rest)) = items.split_first() else {
            return Ok(0);
        };

        let template = deck
            .slide(template_index)
            .ok_or(CoreError::SlideOutOfRange {
                index: template_index,
                len: deck.len(),
            })?;
        let layout_id = template.layout_id.clone();
        let shapes = self.clone_shapes(deck, template_index)?;

        write_item(deck, template_index, first, target);

        for (offset, item) in rest.iter().enumerate() {
            let index = template_index + offset + 1;
            let slide = Slide {
                id: deck.allocate_slide_id()?,
                layout_id: layout_id.clone(),
                shapes: shapes.clone(),
            };
            deck.insert_at(index, slide)?;
            write_item(deck, index, item, target);
        }

        debug!(
            "Expanded slide {} into {} slides",
            template_index,
            items.len()
        );
        Ok(rest.len())
    }

    /// Expands `{title, body}` entries, see [`ExpandTarget::entries`].
    pub fn expand_entries(
        &self,
        deck: &mut Deck,
        template_index: usize,
        entries: &[Entry],
        body: &PlaceholderAddress,
    ) -> CoreResult<usize> {
        let items: Vec<ContentItem> = entries.iter().cloned().map(ContentItem::Entry).collect();
        self.expand(deck, template_index, &items, &ExpandTarget::entries(body.clone()))
    }

    /// Shapes every cloned slide starts with.
    fn clone_shapes(&self, deck: &Deck, template_index: usize) -> CoreResult<Vec<Shape>> {
        let template = deck
            .slide(template_index)
            .ok_or(CoreError::SlideOutOfRange {
                index: template_index,
                len: deck.len(),
            })?;

        if self.strategy == CloneStrategy::FromLayout {
            if let Some(layout) = deck.layout(&template.layout_id) {
                return Ok(layout.instantiate());
            }
            warn!(
                "Layout '{}' of slide {} not found, copying the slide instance instead",
                template.layout_id, template_index
            );
        }

        let (kept, dropped): (Vec<&Shape>, Vec<&Shape>) =
            template.shapes.iter().partition(|s| {
                matches!(s.kind, ShapeKind::Placeholder { .. } | ShapeKind::TextBox)
            });
        if !dropped.is_empty() {
            warn!(
                "Degraded slide copy from slide {}: {} non-text shapes dropped",
                template_index,
                dropped.len()
            );
        }
        Ok(kept.into_iter().cloned().collect())
    }
}

fn write_item(deck: &mut Deck, index: usize, item: &ContentItem, target: &ExpandTarget) {
    if let Some(title) = item.title() {
        edit_text_field(deck, index, &target.title, title, target.align);
    }
    edit_text_field(deck, index, &target.body, item.body(), target.align);
}

/// Expands flat strings into slides starting at `template_index`, writing each
/// centered into the placeholder at `address`. Returns the insertion count.
pub fn expand(
    deck: &mut Deck,
    template_index: usize,
    items: &[String],
    address: &PlaceholderAddress,
) -> CoreResult<usize> {
    let items: Vec<ContentItem> = items.iter().cloned().map(ContentItem::Text).collect();
    SlideExpander::new().expand(
        deck,
        template_index,
        &items,
        &ExpandTarget::body(address.clone(), Alignment::Center),
    )
}
