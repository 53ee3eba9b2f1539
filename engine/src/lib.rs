//! servicedeck Core Library
//!
//! Builds the slide deck for a recurring service from a fixed template:
//! per-event text goes into fixed slides, and songs, announcements and
//! scripture expand into as many slides as their content needs.
//!
//! The entry point for a single run is [`GenerationPipeline`]; background
//! runs with status tracking go through [`jobs::WorkerPool`].

pub mod core;

pub use crate::core::deck::{load_template, save_deck, Deck};
pub use crate::core::event::EventInfo;
pub use crate::core::pipeline::{GenerationPipeline, GenerationReport, TemplateContract};
pub use crate::core::settings::{AppSettings, SettingsManager};
pub use crate::core::{jobs, CoreError, CoreResult};
