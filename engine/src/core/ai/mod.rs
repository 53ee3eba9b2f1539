//! AI Module
//!
//! Completion-backend seam used by the AI lyric paginator.

pub mod provider;

pub use provider::{
    CompletionBackend, CompletionRequest, CompletionResponse, FinishReason,
    StaticCompletionBackend,
};
