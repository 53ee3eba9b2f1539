//! servicedeck Core Engine
//!
//! Template-driven composition of service slide decks: the deck model and its
//! container format, content providers, the generation pipeline, and the job
//! system that runs it.

pub mod ai;
pub mod content;
pub mod deck;
pub mod event;
pub mod fs;
pub mod jobs;
pub mod pipeline;
pub mod settings;

// Re-export common types
mod types;
pub use types::*;

mod error;
pub use error::*;

#[cfg(test)]
mod tests_scenarios;
