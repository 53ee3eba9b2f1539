//! End-to-end composition scenarios
//!
//! Runs the expander and the full pipeline against scaffolded templates saved
//! to disk, then reads the generated decks back.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tempfile::TempDir;

use crate::core::content::{
    ContentProviders, LYRICS_UNAVAILABLE_TEXT, SCRIPTURE_UNAVAILABLE_TEXT,
};
use crate::core::deck::scaffold::scaffold_template;
use crate::core::deck::test_support::numbered_deck;
use crate::core::deck::{expand, load_template, save_deck, Deck, PlaceholderAddress};
use crate::core::event::{EventInfo, ServiceCategory, SongRecord};
use crate::core::pipeline::{GenerationPipeline, NoopProgress, SlideOffset, TemplateContract};
use crate::core::Entry;

fn pages(count: usize, song: &str) -> Vec<String> {
    (1..=count).map(|i| format!("{song} page {i}")).collect()
}

fn body(deck: &Deck, index: usize) -> String {
    deck.slide(index)
        .and_then(|s| s.texts().last().cloned())
        .unwrap_or_default()
}

fn saved_template(dir: &TempDir, contract: &TemplateContract) -> PathBuf {
    let path = dir.path().join("template.deck");
    save_deck(&scaffold_template(contract).unwrap(), &path).unwrap();
    path
}

fn bare_event() -> EventInfo {
    EventInfo::new(
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(),
        ServiceCategory::SundayMorning,
    )
}

fn generate(event: &EventInfo, dir: &TempDir) -> (crate::core::pipeline::GenerationReport, Deck) {
    let contract = TemplateContract::v1();
    let template = saved_template(dir, &contract);
    let pipeline = GenerationPipeline::new(contract, ContentProviders::default());

    let report = pipeline
        .run(event, &template, &dir.path().join("out"), &NoopProgress)
        .unwrap();
    let deck = load_template(Path::new(&report.output_path)).unwrap();
    (report, deck)
}

#[test]
fn test_scenario_a_expand_three_items() {
    let mut deck = numbered_deck(10);
    let former_sixth = deck.slide(6).unwrap().id;
    let items = vec!["p1".to_string(), "p2".to_string(), "p3".to_string()];

    let inserted = expand(&mut deck, 5, &items, &PlaceholderAddress::PositionalIndex(1)).unwrap();

    assert_eq!(inserted, 2);
    assert_eq!(body(&deck, 5), "p1");
    assert_eq!(body(&deck, 6), "p2");
    assert_eq!(body(&deck, 7), "p3");
    assert_eq!(deck.index_of(former_sixth), Some(8));
}

#[test]
fn test_scenario_b_offset_accumulates_across_songs() {
    let mut deck = numbered_deck(12);
    let mut offset = SlideOffset::new();

    for (position, count) in [2, 1, 3].into_iter().enumerate() {
        let lyrics_index = offset.at(6 + 2 * position);
        let song = format!("song {position}");
        let inserted = expand(
            &mut deck,
            lyrics_index,
            &pages(count, &song),
            &PlaceholderAddress::PositionalIndex(1),
        )
        .unwrap();
        assert_eq!(inserted, count - 1);
        offset.add(inserted);
    }

    assert_eq!(offset.total(), 3);
    assert_eq!(deck.len(), 15);
    assert_eq!(body(&deck, 6), "song 0 page 1");
    assert_eq!(body(&deck, 9), "song 1 page 1");
    assert_eq!(body(&deck, 11), "song 2 page 1");
    assert_eq!(body(&deck, 13), "song 2 page 3");
    assert_eq!(deck.slide(14).unwrap().title_text().unwrap(), "slide 11");
}

#[test]
fn test_scenario_c_unparsable_scripture_yields_one_slide() {
    let dir = TempDir::new().unwrap();
    let mut event = bare_event();
    event.sermon_scripture = "see bulletin".to_string();

    let (report, deck) = generate(&event, &dir);

    let fallback_slides = deck
        .slides()
        .iter()
        .filter(|s| s.texts().iter().any(|t| t == SCRIPTURE_UNAVAILABLE_TEXT))
        .count();
    assert_eq!(fallback_slides, 1);
    assert_eq!(body(&deck, 22), SCRIPTURE_UNAVAILABLE_TEXT);
    assert_eq!(report.inserted_slides, 0);
    assert!(report.degradations.iter().any(|d| d.starts_with("scripture")));
}

#[test]
fn test_scenario_d_empty_announcements_skip_stage() {
    let dir = TempDir::new().unwrap();
    let mut event = bare_event();
    event.songs = vec![SongRecord::new("Only", 1).with_pages(pages(2, "only"))];

    let (report, deck) = generate(&event, &dir);

    // Only the song inserted a slide; the announcement slide keeps its label
    assert_eq!(report.inserted_slides, 1);
    assert_eq!(deck.slide(21).unwrap().title_text().unwrap(), "Announcement");
    assert_eq!(body(&deck, 23), SCRIPTURE_UNAVAILABLE_TEXT);
    assert_eq!(deck.len(), 39);
}

#[test]
fn test_scenario_e_lyric_fetch_failure_still_completes() {
    let dir = TempDir::new().unwrap();
    let mut event = bare_event();
    event.songs = vec![
        SongRecord::new("Unreachable", 1).with_source("https://lyrics.example/404"),
        SongRecord::new("Closing", 2).with_source("https://lyrics.example/500").closing(),
    ];
    event.announcements = vec![Entry::new("Welcome", "Coffee after service")];

    let (report, deck) = generate(&event, &dir);

    assert_eq!(deck.slide(5).unwrap().title_text().unwrap(), "Unreachable");
    assert_eq!(body(&deck, 6), LYRICS_UNAVAILABLE_TEXT);
    assert_eq!(body(&deck, 28), LYRICS_UNAVAILABLE_TEXT);
    assert_eq!(report.inserted_slides, 0);
    assert_eq!(
        report
            .resolved_songs
            .iter()
            .filter(|s| s.pages == vec![LYRICS_UNAVAILABLE_TEXT.to_string()])
            .count(),
        2
    );
    // Two lyric degradations plus the missing scripture
    assert_eq!(report.degradations.len(), 3);
}
