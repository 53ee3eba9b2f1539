//! Starter templates
//!
//! Builds a plain deck that satisfies a template contract, so a church can
//! start from a working template and restyle it.

use super::{Deck, DeckMeta, Frame, Layout, PlaceholderRole, Shape, TextStyle};
use crate::core::event::EventField;
use crate::core::pipeline::contract::TemplateContract;
use crate::core::CoreResult;

const LAYOUT_COVER: &str = "cover";
const LAYOUT_SECTION: &str = "section";
const LAYOUT_LYRICS: &str = "lyrics";
const LAYOUT_ANNOUNCEMENT: &str = "announcement";
const LAYOUT_SCRIPTURE: &str = "scripture";

// 16:9 slide in EMU
const SLIDE_WIDTH: i64 = 12_192_000;
const SLIDE_HEIGHT: i64 = 6_858_000;
const MARGIN: i64 = 457_200;

fn style(size_pt: f32, bold: bool) -> TextStyle {
    TextStyle {
        font: None,
        size_pt: Some(size_pt),
        bold,
        color: Some("#FFFFFF".to_string()),
    }
}

fn title_frame() -> Frame {
    Frame::new(MARGIN, MARGIN, SLIDE_WIDTH - 2 * MARGIN, 1_143_000)
}

fn body_frame() -> Frame {
    let top = MARGIN + 1_143_000 + MARGIN;
    Frame::new(MARGIN, top, SLIDE_WIDTH - 2 * MARGIN, SLIDE_HEIGHT - top - MARGIN)
}

fn layouts() -> Vec<Layout> {
    let title = |role| {
        Shape::placeholder("Title 1", role, 0)
            .with_frame(title_frame())
            .with_style(style(40.0, true))
    };
    let body = |name: &str, idx| {
        Shape::placeholder(name, PlaceholderRole::Body, idx)
            .with_frame(body_frame())
            .with_style(style(28.0, false))
    };

    vec![
        Layout::new(LAYOUT_COVER, "Cover")
            .with_placeholder(title(PlaceholderRole::CenterTitle))
            .with_placeholder(
                Shape::placeholder("Subtitle 2", PlaceholderRole::Subtitle, 1)
                    .with_frame(body_frame())
                    .with_style(style(24.0, false)),
            ),
        Layout::new(LAYOUT_SECTION, "Section Header").with_placeholder(title(PlaceholderRole::Title)),
        Layout::new(LAYOUT_LYRICS, "Lyrics").with_placeholder(
            Shape::placeholder("Lyrics", PlaceholderRole::Body, 1)
                .with_frame(Frame::new(MARGIN, MARGIN, SLIDE_WIDTH - 2 * MARGIN, SLIDE_HEIGHT - 2 * MARGIN))
                .with_style(style(36.0, true)),
        ),
        Layout::new(LAYOUT_ANNOUNCEMENT, "Announcement")
            .with_placeholder(title(PlaceholderRole::Title))
            .with_placeholder(body("Content 2", 1)),
        Layout::new(LAYOUT_SCRIPTURE, "Scripture")
            .with_placeholder(title(PlaceholderRole::Title))
            .with_placeholder(body("Scripture 3", 10)),
    ]
}

fn field_label(field: EventField) -> &'static str {
    match field {
        EventField::PrayerMinister => "Prayer",
        EventField::OfferingMinister => "Offering",
        EventField::AnnouncementsManager => "Announcements",
        EventField::SermonScripture => "Scripture Reading",
        EventField::SermonTitle => "Sermon",
        EventField::Speaker => "Speaker",
        EventField::BenedictionMinister => "Benediction",
    }
}

/// Layout id and placeholder texts for nominal slide `index`
fn slide_plan(contract: &TemplateContract, index: usize) -> (&'static str, Vec<String>) {
    if index == contract.cover_slide {
        return (LAYOUT_COVER, vec!["Cover".to_string(), String::new()]);
    }
    if index >= contract.song_title_slide && index < contract.song_region_end() {
        let slot = (index - contract.song_title_slide) / contract.song_stride;
        let in_slot = (index - contract.song_title_slide) % contract.song_stride;
        if contract.song_title_slide + in_slot == contract.song_lyrics_slide {
            return (LAYOUT_LYRICS, vec![format!("Song {} lyrics", slot + 1)]);
        }
        if in_slot == 0 {
            return (LAYOUT_SECTION, vec![format!("Song {}", slot + 1)]);
        }
    }
    if index == contract.closing_title_slide {
        return (LAYOUT_SECTION, vec!["Closing Song".to_string()]);
    }
    if index == contract.closing_lyrics_slide {
        return (LAYOUT_LYRICS, vec!["Closing song lyrics".to_string()]);
    }
    if index == contract.announcements_slide {
        return (
            LAYOUT_ANNOUNCEMENT,
            vec!["Announcement".to_string(), "Details".to_string()],
        );
    }
    if index == contract.scripture_slide {
        return (
            LAYOUT_SCRIPTURE,
            vec!["Scripture".to_string(), "Verse".to_string()],
        );
    }
    if let Some(slot) = contract.fields.iter().find(|f| f.slide == index) {
        return (LAYOUT_SECTION, vec![field_label(slot.field).to_string()]);
    }
    (LAYOUT_SECTION, vec![format!("Slide {}", index + 1)])
}

/// Builds a deck with every slide `contract` addresses
pub fn scaffold_template(contract: &TemplateContract) -> CoreResult<Deck> {
    contract.validate()?;

    let mut deck = Deck::new(DeckMeta {
        title: format!("Service template ({})", contract.version),
        contract_version: Some(contract.version.clone()),
    });
    for layout in layouts() {
        deck.add_layout(layout);
    }

    for index in 0..contract.required_slide_count() {
        let (layout_id, texts) = slide_plan(contract, index);
        deck.push_slide(layout_id)?;
        if let Some(slide) = deck.slide_mut(index) {
            for (shape, text) in slide.shapes.iter_mut().zip(texts) {
                if let Some(body) = shape.text.as_mut() {
                    body.replace_text(&text, crate::core::Alignment::Center);
                }
            }
        }
    }

    Ok(deck)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::deck::PlaceholderAddress;

    #[test]
    fn test_scaffold_satisfies_contracts() {
        for contract in [TemplateContract::v1(), TemplateContract::v2()] {
            let deck = scaffold_template(&contract).unwrap();
            contract.check_deck(&deck).unwrap();
            assert_eq!(deck.meta.contract_version.as_deref(), Some(contract.version.as_str()));
        }
    }

    #[test]
    fn test_scaffold_places_expandable_layouts() {
        let contract = TemplateContract::v1();
        let deck = scaffold_template(&contract).unwrap();

        let layout_at = |i: usize| deck.slide(i).unwrap().layout_id.as_str();
        assert_eq!(layout_at(0), LAYOUT_COVER);
        assert_eq!(layout_at(5), LAYOUT_SECTION);
        assert_eq!(layout_at(6), LAYOUT_LYRICS);
        assert_eq!(layout_at(12), LAYOUT_LYRICS);
        assert_eq!(layout_at(20), LAYOUT_ANNOUNCEMENT);
        assert_eq!(layout_at(22), LAYOUT_SCRIPTURE);
        assert_eq!(layout_at(28), LAYOUT_LYRICS);

        let scripture = deck.slide(22).unwrap();
        assert!(contract.scripture_body.resolve(scripture).is_some());
        let announcement = deck.slide(20).unwrap();
        assert!(contract.announcement_body.resolve(announcement).is_some());
        let lyrics = deck.slide(6).unwrap();
        assert_eq!(PlaceholderAddress::FirstAvailable.resolve(lyrics), Some(0));
    }

    #[test]
    fn test_scaffold_labels() {
        let deck = scaffold_template(&TemplateContract::v2()).unwrap();
        assert_eq!(deck.slide(7).unwrap().title_text().unwrap(), "Song 2");
        assert_eq!(deck.slide(14).unwrap().title_text().unwrap(), "Prayer");
        assert_eq!(deck.slide(28).unwrap().title_text().unwrap(), "Closing Song");
        assert_eq!(deck.slide(38).unwrap().title_text().unwrap(), "Benediction");
    }
}
