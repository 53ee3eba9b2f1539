//! Generation request parsing and validation.
//!
//! Requests arrive as JSON from the CLI or a status front end and are treated
//! as untrusted input:
//! - Typed payload (serde `deny_unknown_fields`)
//! - Size limits to mitigate JSON payload DoS
//! - Lightweight semantic validation (lengths, counts, contract capacity)

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::event::EventInfo;
use crate::core::pipeline::TemplateContract;

const MAX_REQUEST_BYTES: usize = 1024 * 1024; // 1MiB
const MAX_PATH_CHARS: usize = 4096;
const MAX_FIELD_CHARS: usize = 1000;
const MAX_ANNOUNCEMENTS: usize = 50;
const MAX_SONGS: usize = 32;

fn enforce_payload_limits(value: &serde_json::Value) -> Result<(), String> {
    if !value.is_object() {
        return Err("Generation request must be a JSON object".to_string());
    }
    let size = serde_json::to_vec(value)
        .map(|b| b.len())
        .map_err(|e| format!("Failed to serialize request for size check: {e}"))?;
    if size > MAX_REQUEST_BYTES {
        return Err(format!(
            "Generation request too large ({} bytes > {} bytes)",
            size, MAX_REQUEST_BYTES
        ));
    }
    Ok(())
}

fn validate_string_len(label: &str, value: &str, max: usize) -> Result<(), String> {
    if value.chars().count() > max {
        return Err(format!("{label} is too long (max {max} chars)"));
    }
    Ok(())
}

fn validate_path(label: &str, path: &std::path::Path) -> Result<(), String> {
    let display = path.to_string_lossy();
    if display.trim().is_empty() {
        return Err(format!("{label} is empty"));
    }
    if display.to_ascii_lowercase().contains("://") {
        return Err(format!("{label} must be a local path, not a URL"));
    }
    validate_string_len(label, &display, MAX_PATH_CHARS)
}

// =============================================================================
// Generation Request
// =============================================================================

/// Everything one generation job needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GenerationRequest {
    pub event: EventInfo,
    pub template_path: PathBuf,
    /// Root directory; the deck is written to `generated_decks/` inside it
    pub output_dir: PathBuf,
}

impl GenerationRequest {
    pub fn new(event: EventInfo, template_path: PathBuf, output_dir: PathBuf) -> Self {
        Self {
            event,
            template_path,
            output_dir,
        }
    }

    /// Checks limits and that the event fits `contract`.
    ///
    /// The template itself is not opened here; a missing template fails the
    /// job when it runs.
    pub fn validate(&self, contract: &TemplateContract) -> Result<(), String> {
        validate_path("templatePath", &self.template_path)?;
        validate_path("outputDir", &self.output_dir)?;

        let event = &self.event;
        for (label, value) in [
            ("speaker", &event.speaker),
            ("sermonTitle", &event.sermon_title),
            ("sermonScripture", &event.sermon_scripture),
            ("prayerMinister", &event.prayer_minister),
            ("offeringMinister", &event.offering_minister),
            ("announcementsManager", &event.announcements_manager),
            ("benedictionMinister", &event.benediction_minister),
        ] {
            validate_string_len(label, value, MAX_FIELD_CHARS)?;
        }

        if event.announcements.len() > MAX_ANNOUNCEMENTS {
            return Err(format!(
                "Too many announcements ({} > {})",
                event.announcements.len(),
                MAX_ANNOUNCEMENTS
            ));
        }
        if event.songs.len() > MAX_SONGS {
            return Err(format!(
                "Too many songs ({} > {})",
                event.songs.len(),
                MAX_SONGS
            ));
        }
        for song in &event.songs {
            if song.title.trim().is_empty() {
                return Err("Song title is empty".to_string());
            }
            validate_string_len("song title", &song.title, MAX_FIELD_CHARS)?;
        }

        contract.check_event(event).map_err(|e| e.to_string())
    }
}

/// Parses and validates a JSON generation request
pub fn parse_generation_request(
    value: serde_json::Value,
    contract: &TemplateContract,
) -> Result<GenerationRequest, String> {
    enforce_payload_limits(&value)?;
    let request: GenerationRequest =
        serde_json::from_value(value).map_err(|e| format!("Invalid generation request: {e}"))?;
    request.validate(contract)?;
    Ok(request)
}
