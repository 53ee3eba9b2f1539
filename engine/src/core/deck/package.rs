//! Deck Container Codec
//!
//! A deck file is a ZIP archive holding:
//!
//! - `manifest.json`: `{"format": "servicedeck", "version": 1}`
//! - `deck.json`: metadata, layouts and the ordered slides
//! - `media/*`: binary entries referenced by picture shapes, carried through
//!   unchanged
//!
//! Templates and generated decks share this format.

use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::{Deck, DeckMeta, Layout, Slide};
use crate::core::fs::{atomic_write_bytes, validate_local_input_path};
use crate::core::{CoreError, CoreResult, SlideId};

/// Container format identifier
pub const DECK_FORMAT: &str = "servicedeck";

/// Highest container version this build reads and the version it writes
pub const DECK_FORMAT_VERSION: u32 = 1;

const MANIFEST_ENTRY: &str = "manifest.json";
const DOCUMENT_ENTRY: &str = "deck.json";
const MEDIA_PREFIX: &str = "media/";

/// Largest uncompressed entry a deck container may hold
const MAX_ENTRY_BYTES: u64 = 256 * 1024 * 1024; // 256MiB

#[derive(Debug, Serialize, Deserialize)]
struct Manifest {
    format: String,
    version: u32,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeckDocument {
    #[serde(default)]
    meta: DeckMeta,
    #[serde(default)]
    layouts: Vec<Layout>,
    #[serde(default)]
    slides: Vec<Slide>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    next_slide_id: Option<SlideId>,
}

// =============================================================================
// Template Loader
// =============================================================================

/// Opens the template at `path`.
///
/// A missing, unreadable or slide-less template is a configuration error and
/// aborts generation.
pub fn load_template(path: &Path) -> CoreResult<Deck> {
    let path = validate_local_input_path(path, "Template").map_err(CoreError::TemplateNotFound)?;
    let bytes = std::fs::read(&path)
        .map_err(|e| CoreError::TemplateNotFound(format!("{}: {}", path.display(), e)))?;

    let deck = decode_deck(&bytes)?;
    if deck.is_empty() {
        return Err(CoreError::TemplateEmpty(path.display().to_string()));
    }

    info!(
        "Loaded template {} ({} slides, {} layouts)",
        path.display(),
        deck.len(),
        deck.layouts().len()
    );
    Ok(deck)
}

/// Decodes a deck container
pub fn decode_deck(bytes: &[u8]) -> CoreResult<Deck> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| CoreError::TemplateCorrupted(format!("not a deck archive: {e}")))?;

    let manifest: Manifest = serde_json::from_slice(&read_entry(&mut archive, MANIFEST_ENTRY)?)
        .map_err(|e| CoreError::TemplateCorrupted(format!("invalid {MANIFEST_ENTRY}: {e}")))?;
    if manifest.format != DECK_FORMAT {
        return Err(CoreError::UnsupportedDeckFormat(manifest.format));
    }
    if manifest.version == 0 || manifest.version > DECK_FORMAT_VERSION {
        return Err(CoreError::UnsupportedDeckFormat(format!(
            "{} version {}",
            manifest.format, manifest.version
        )));
    }

    let document: DeckDocument = serde_json::from_slice(&read_entry(&mut archive, DOCUMENT_ENTRY)?)
        .map_err(|e| CoreError::TemplateCorrupted(format!("invalid {DOCUMENT_ENTRY}: {e}")))?;

    let mut media = BTreeMap::new();
    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        if file.is_dir() {
            continue;
        }
        let Some(name) = file.name().strip_prefix(MEDIA_PREFIX).map(str::to_string) else {
            continue;
        };
        let data = read_limited(&mut file, format!("{MEDIA_PREFIX}{name}"), MAX_ENTRY_BYTES)?;
        media.insert(name, data);
    }

    Deck::from_parts(
        document.meta,
        document.layouts,
        document.slides,
        document.next_slide_id,
        media,
    )
    .map_err(|e| match e {
        CoreError::TemplateCorrupted(_) => e,
        other => CoreError::TemplateCorrupted(other.to_string()),
    })
}

fn read_entry(archive: &mut ZipArchive<Cursor<&[u8]>>, name: &str) -> CoreResult<Vec<u8>> {
    let mut file = archive
        .by_name(name)
        .map_err(|_| CoreError::TemplateCorrupted(format!("missing {name}")))?;
    read_limited(&mut file, name.to_string(), MAX_ENTRY_BYTES)
}

/// Reads at most `limit` bytes. The size declared in the entry header is not
/// trusted for allocation.
fn read_limited<R: Read>(reader: R, name: String, limit: u64) -> CoreResult<Vec<u8>> {
    let mut data = Vec::new();
    reader.take(limit.saturating_add(1)).read_to_end(&mut data)?;
    if data.len() as u64 > limit {
        return Err(CoreError::TemplateCorrupted(format!(
            "{name} exceeds {limit} bytes"
        )));
    }
    Ok(data)
}

// =============================================================================
// Persistence
// =============================================================================

/// Encodes a deck container
pub fn encode_deck(deck: &Deck) -> CoreResult<Vec<u8>> {
    let document = DeckDocument {
        meta: deck.meta.clone(),
        layouts: deck.layouts().to_vec(),
        slides: deck.slides().to_vec(),
        next_slide_id: Some(deck.next_slide_id()),
    };
    let manifest = Manifest {
        format: DECK_FORMAT.to_string(),
        version: DECK_FORMAT_VERSION,
    };

    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

    writer.start_file(MANIFEST_ENTRY, options)?;
    writer.write_all(&serde_json::to_vec_pretty(&manifest)?)?;

    writer.start_file(DOCUMENT_ENTRY, options)?;
    writer.write_all(&serde_json::to_vec_pretty(&document)?)?;

    for (name, data) in deck.media() {
        writer.start_file(format!("{MEDIA_PREFIX}{name}"), options)?;
        writer.write_all(data)?;
    }

    Ok(writer.finish()?.into_inner())
}

/// Writes `deck` to `path` atomically.
///
/// Any failure is reported as [`CoreError::PersistFailed`] carrying the
/// underlying error message.
pub fn save_deck(deck: &Deck, path: &Path) -> CoreResult<()> {
    let persist_failed = |reason: String| CoreError::PersistFailed {
        path: path.display().to_string(),
        reason,
    };

    let bytes = encode_deck(deck).map_err(|e| persist_failed(e.to_string()))?;
    atomic_write_bytes(path, &bytes).map_err(|e| persist_failed(e.to_string()))?;

    debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::deck::test_support::numbered_deck;
    use tempfile::TempDir;

    fn archive_with(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in entries {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_save_and_load_preserves_deck() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("template.deck");
        let mut deck = numbered_deck(3);
        deck.add_media("logo.png", vec![0x89, 0x50, 0x4e, 0x47]);

        save_deck(&deck, &path).unwrap();
        let loaded = load_template(&path).unwrap();

        assert_eq!(loaded, deck);
        assert_eq!(loaded.media().get("logo.png").unwrap().len(), 4);
    }

    #[test]
    fn test_load_missing_template() {
        let dir = TempDir::new().unwrap();
        let result = load_template(&dir.path().join("nope.deck"));
        match result {
            Err(e @ CoreError::TemplateNotFound(_)) => assert!(e.is_config_error()),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_load_empty_template() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.deck");
        save_deck(&numbered_deck(0), &path).unwrap();

        assert!(matches!(
            load_template(&path),
            Err(CoreError::TemplateEmpty(_))
        ));
    }

    #[test]
    fn test_decode_garbage_is_corrupted() {
        assert!(matches!(
            decode_deck(b"not a zip file"),
            Err(CoreError::TemplateCorrupted(_))
        ));
    }

    #[test]
    fn test_decode_rejects_foreign_manifest() {
        let bytes = archive_with(&[(
            MANIFEST_ENTRY,
            br#"{"format":"something-else","version":1}"#,
        )]);
        assert!(matches!(
            decode_deck(&bytes),
            Err(CoreError::UnsupportedDeckFormat(_))
        ));

        let bytes = archive_with(&[(MANIFEST_ENTRY, br#"{"format":"servicedeck","version":9}"#)]);
        assert!(matches!(
            decode_deck(&bytes),
            Err(CoreError::UnsupportedDeckFormat(_))
        ));
    }

    #[test]
    fn test_decode_missing_document() {
        let bytes = archive_with(&[(MANIFEST_ENTRY, br#"{"format":"servicedeck","version":1}"#)]);
        let err = decode_deck(&bytes).unwrap_err();
        assert!(err.to_string().contains("deck.json"));
    }

    #[test]
    fn test_decode_duplicate_slide_ids_is_corrupted() {
        let document = br#"{
            "layouts": [],
            "slides": [
                {"id": 300, "layoutId": "a", "shapes": []},
                {"id": 300, "layoutId": "a", "shapes": []}
            ]
        }"#;
        let bytes = archive_with(&[
            (MANIFEST_ENTRY, br#"{"format":"servicedeck","version":1}"#),
            (DOCUMENT_ENTRY, document),
        ]);
        assert!(matches!(
            decode_deck(&bytes),
            Err(CoreError::TemplateCorrupted(_))
        ));
    }

    #[test]
    fn test_decode_exhausted_slide_ids_is_corrupted() {
        let document = format!(
            r#"{{"layouts": [], "slides": [{{"id": {}, "layoutId": "a", "shapes": []}}]}}"#,
            u64::MAX
        );
        let bytes = archive_with(&[
            (MANIFEST_ENTRY, br#"{"format":"servicedeck","version":1}"#),
            (DOCUMENT_ENTRY, document.as_bytes()),
        ]);
        match decode_deck(&bytes) {
            Err(CoreError::TemplateCorrupted(msg)) => assert!(msg.contains("no room")),
            other => panic!("unexpected: {other:?}"),
        }

        let document = format!(
            r#"{{"slides": [{{"id": 300, "layoutId": "a", "shapes": []}}], "nextSlideId": {}}}"#,
            u64::MAX
        );
        let bytes = archive_with(&[
            (MANIFEST_ENTRY, br#"{"format":"servicedeck","version":1}"#),
            (DOCUMENT_ENTRY, document.as_bytes()),
        ]);
        assert!(matches!(
            decode_deck(&bytes),
            Err(CoreError::TemplateCorrupted(_))
        ));
    }

    #[test]
    fn test_read_limited_caps_entry_size() {
        let data = read_limited(Cursor::new(vec![7u8; 16]), "media/a.png".to_string(), 16).unwrap();
        assert_eq!(data.len(), 16);

        let err = read_limited(Cursor::new(vec![7u8; 17]), "media/b.png".to_string(), 16)
            .unwrap_err();
        assert!(matches!(err, CoreError::TemplateCorrupted(_)));
        assert!(err.to_string().contains("media/b.png"));
    }

    #[test]
    fn test_save_into_file_parent_fails_with_persist_error() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"x").unwrap();

        let err = save_deck(&numbered_deck(1), &blocker.join("out.deck")).unwrap_err();
        assert!(matches!(err, CoreError::PersistFailed { .. }));
        assert!(!err.is_config_error());
    }
}
