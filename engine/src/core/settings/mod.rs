//! Settings Persistence System
//!
//! Provides persistent application settings with:
//! - Atomic file writes (temp file + rename)
//! - Schema validation with defaults
//! - Migration support for schema changes
//!
//! Storage location: {app_data_dir}/settings.json

use serde::{Deserialize, Serialize};
use std::fs;
use std::fs::OpenOptions;
use std::path::PathBuf;

use tracing::{info, warn};

use crate::core::content::DEFAULT_LINES_PER_PAGE;
use crate::core::fs::atomic_write_bytes;
use crate::core::pipeline::contract::{TemplateContract, DEFAULT_CONTRACT_VERSION};

/// Settings schema version for migration support
pub const SETTINGS_VERSION: u32 = 1;

/// Settings file name
pub const SETTINGS_FILE: &str = "settings.json";

/// Lock file name (advisory lock to prevent concurrent writers)
pub const SETTINGS_LOCK_FILE: &str = "settings.json.lock";

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    /// Schema version for migrations
    #[serde(default = "default_version")]
    pub version: u32,

    /// General settings
    #[serde(default)]
    pub general: GeneralSettings,

    /// Deck generation settings
    #[serde(default)]
    pub generation: GenerationSettings,

    /// Worker pool settings
    #[serde(default)]
    pub workers: WorkerSettings,
}

fn default_version() -> u32 {
    SETTINGS_VERSION
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            general: GeneralSettings::default(),
            generation: GenerationSettings::default(),
            workers: WorkerSettings::default(),
        }
    }
}

impl AppSettings {
    /// Normalizes and clamps settings so persisted state is always valid.
    ///
    /// Bad values are corrected instead of rejected, so an old or hand-edited
    /// file never prevents generation.
    pub fn normalize(&mut self) {
        self.version = SETTINGS_VERSION;

        self.general.language =
            normalize_enum(&self.general.language, &["en", "ko"], default_language());

        self.generation.lyrics_lines_per_page = self.generation.lyrics_lines_per_page.clamp(1, 20);
        let contract = self.generation.contract_version.trim();
        if TemplateContract::builtin(contract).is_none() && !std::path::Path::new(contract).is_file()
        {
            self.generation.contract_version = default_contract_version();
        }
        normalize_path(&mut self.generation.template_path);
        normalize_path(&mut self.generation.output_dir);
        normalize_path(&mut self.generation.scripture_corpus_dir);

        self.workers.max_concurrent_jobs = self.workers.max_concurrent_jobs.clamp(1, 32);
        self.workers.max_queue_size = self.workers.max_queue_size.clamp(1, 100_000);
    }
}

fn normalize_enum(value: &str, allowed: &[&str], fallback: String) -> String {
    if allowed.iter().any(|v| v.eq_ignore_ascii_case(value)) {
        value.to_ascii_lowercase()
    } else {
        fallback
    }
}

fn normalize_path(value: &mut Option<String>) {
    if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
        *value = None;
    }
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GeneralSettings {
    /// Language of generated labels ("en" or "ko")
    #[serde(default = "default_language")]
    pub language: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            language: default_language(),
        }
    }
}

fn default_language() -> String {
    "en".to_string()
}

/// Deck generation settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationSettings {
    /// Template deck used when a request names none
    #[serde(default)]
    pub template_path: Option<String>,

    /// Directory receiving `generated_decks/`
    #[serde(default)]
    pub output_dir: Option<String>,

    /// Built-in contract version ("v1", "v2") or path to a contract JSON file
    #[serde(default = "default_contract_version")]
    pub contract_version: String,

    /// Lines per page of the fixed-size lyric splitter
    #[serde(default = "default_lines_per_page")]
    pub lyrics_lines_per_page: u32,

    /// Scripture text corpus directory
    #[serde(default)]
    pub scripture_corpus_dir: Option<String>,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            template_path: None,
            output_dir: None,
            contract_version: default_contract_version(),
            lyrics_lines_per_page: default_lines_per_page(),
            scripture_corpus_dir: None,
        }
    }
}

fn default_contract_version() -> String {
    DEFAULT_CONTRACT_VERSION.to_string()
}

fn default_lines_per_page() -> u32 {
    DEFAULT_LINES_PER_PAGE as u32
}

/// Worker pool settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkerSettings {
    /// Maximum concurrent generation jobs
    #[serde(default = "default_max_jobs")]
    pub max_concurrent_jobs: u32,

    /// Maximum queued jobs
    #[serde(default = "default_max_queue_size")]
    pub max_queue_size: u32,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: default_max_jobs(),
            max_queue_size: default_max_queue_size(),
        }
    }
}

fn default_max_jobs() -> u32 {
    num_cpus::get().max(2) as u32
}

fn default_max_queue_size() -> u32 {
    1000
}

/// Settings manager for loading, saving, and resetting settings
pub struct SettingsManager {
    settings_path: PathBuf,
}

impl SettingsManager {
    /// Create a new settings manager with the given app data directory
    pub fn new(app_data_dir: PathBuf) -> Self {
        Self {
            settings_path: app_data_dir.join(SETTINGS_FILE),
        }
    }

    fn lock_path(&self) -> PathBuf {
        self.settings_path
            .parent()
            .unwrap_or_else(|| std::path::Path::new("."))
            .join(SETTINGS_LOCK_FILE)
    }

    fn with_lock<T>(
        &self,
        exclusive: bool,
        op: impl FnOnce() -> Result<T, String>,
    ) -> Result<T, String> {
        if let Some(parent) = self.settings_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create settings directory: {}", e))?;
        }

        let lock_file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(self.lock_path())
            .map_err(|e| format!("Failed to open settings lock file: {}", e))?;

        if exclusive {
            fs2::FileExt::lock_exclusive(&lock_file)
                .map_err(|e| format!("Failed to lock settings file (exclusive): {}", e))?;
        } else {
            fs2::FileExt::lock_shared(&lock_file)
                .map_err(|e| format!("Failed to lock settings file (shared): {}", e))?;
        }

        let result = op();

        if let Err(e) = fs2::FileExt::unlock(&lock_file) {
            warn!("Failed to unlock settings lock file: {}", e);
        }

        result
    }

    /// Get the settings file path
    pub fn settings_path(&self) -> &PathBuf {
        &self.settings_path
    }

    /// Load settings from disk, returning defaults if the file is missing or
    /// unreadable
    pub fn load(&self) -> AppSettings {
        let result = self.with_lock(false, || {
            if !self.settings_path.exists() {
                info!("Settings file not found, using defaults");
                return Ok(AppSettings::default());
            }

            let content = fs::read_to_string(&self.settings_path)
                .map_err(|e| format!("Failed to read settings file: {}", e))?;

            let mut settings = serde_json::from_str::<AppSettings>(&content)
                .map_err(|e| format!("Failed to parse settings file: {}", e))?;

            if settings.version < SETTINGS_VERSION {
                info!(
                    "Migrating settings from version {} to {}",
                    settings.version, SETTINGS_VERSION
                );
                settings = self.migrate(settings);
            }

            settings.normalize();
            Ok(settings)
        });

        match result {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Failed to load settings, using defaults: {}", e);
                AppSettings::default()
            }
        }
    }

    /// Save normalized settings to disk and return what was written
    pub fn save(&self, settings: &AppSettings) -> Result<AppSettings, String> {
        self.with_lock(true, || {
            let mut normalized = settings.clone();
            normalized.normalize();

            let content = serde_json::to_string_pretty(&normalized)
                .map_err(|e| format!("Failed to serialize settings: {}", e))?;
            atomic_write_bytes(&self.settings_path, content.as_bytes())
                .map_err(|e| format!("Failed to write settings: {}", e))?;

            info!("Settings saved to {:?}", self.settings_path);
            Ok(normalized)
        })
    }

    /// Reset settings to defaults and delete the settings file
    pub fn reset(&self) -> Result<AppSettings, String> {
        self.with_lock(true, || {
            if self.settings_path.exists() {
                fs::remove_file(&self.settings_path)
                    .map_err(|e| format!("Failed to delete settings file: {}", e))?;
                info!("Settings file deleted");
            }
            Ok(AppSettings::default())
        })
    }

    fn migrate(&self, mut settings: AppSettings) -> AppSettings {
        settings.version = SETTINGS_VERSION;
        settings
    }
}
