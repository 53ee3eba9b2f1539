//! AI Completion Backend
//!
//! Defines the seam through which text-completion models are called. The
//! generation pipeline runs on blocking worker threads, so backends are
//! synchronous; adapters over async clients block on their own runtime.

use serde::{Deserialize, Serialize};

use crate::core::{CoreError, CoreResult};

// =============================================================================
// Completion Backend Trait
// =============================================================================

/// A text-completion model (hosted API, local model, ...)
pub trait CompletionBackend: Send + Sync {
    /// Returns the backend name
    fn name(&self) -> &str;

    /// Generates a completion from a prompt
    fn complete(&self, request: &CompletionRequest) -> CoreResult<CompletionResponse>;

    /// Checks if the backend is configured and reachable
    fn is_available(&self) -> bool {
        true
    }
}

// =============================================================================
// Completion Request
// =============================================================================

/// Request for text completion
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRequest {
    /// System prompt/instructions
    pub system: Option<String>,
    /// User prompt
    pub prompt: String,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
    /// Temperature (0.0 - 2.0)
    pub temperature: Option<f32>,
    /// Model to use (backend-specific)
    pub model: Option<String>,
    /// Whether to return JSON
    pub json_mode: bool,
}

impl CompletionRequest {
    pub fn new(prompt: &str) -> Self {
        Self {
            system: None,
            prompt: prompt.to_string(),
            max_tokens: None,
            temperature: None,
            model: None,
            json_mode: false,
        }
    }

    pub fn with_system(mut self, system: &str) -> Self {
        self.system = Some(system.to_string());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = Some(model.to_string());
        self
    }

    /// Asks the backend for a JSON document
    pub fn with_json_mode(mut self) -> Self {
        self.json_mode = true;
        self
    }
}

// =============================================================================
// Completion Response
// =============================================================================

/// Response from text completion
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionResponse {
    /// Generated text
    pub text: String,
    /// Model used
    pub model: String,
    /// Finish reason
    #[serde(default)]
    pub finish_reason: FinishReason,
}

impl CompletionResponse {
    pub fn new(text: &str, model: &str) -> Self {
        Self {
            text: text.to_string(),
            model: model.to_string(),
            finish_reason: FinishReason::Stop,
        }
    }
}

/// Reason for completion finish
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Normal stop
    #[default]
    Stop,
    /// Reached max tokens
    Length,
    /// Content filter triggered
    ContentFilter,
}

// =============================================================================
// Static Backend
// =============================================================================

/// Backend answering every request with a fixed text
///
/// Useful for offline runs and for exercising model-dependent code paths.
pub struct StaticCompletionBackend {
    name: String,
    response: String,
    available: bool,
}

impl StaticCompletionBackend {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            response: String::new(),
            available: true,
        }
    }

    /// Sets the canned response
    pub fn with_response(mut self, response: &str) -> Self {
        self.response = response.to_string();
        self
    }

    /// Sets availability; an unavailable backend fails every request
    pub fn with_available(mut self, available: bool) -> Self {
        self.available = available;
        self
    }
}

impl CompletionBackend for StaticCompletionBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn complete(&self, _request: &CompletionRequest) -> CoreResult<CompletionResponse> {
        if !self.available {
            return Err(CoreError::Internal(format!(
                "Completion backend '{}' is not available",
                self.name
            )));
        }
        Ok(CompletionResponse::new(&self.response, "static"))
    }

    fn is_available(&self) -> bool {
        self.available
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_request_builder() {
        let request = CompletionRequest::new("Split these lyrics")
            .with_system("You format worship slides")
            .with_max_tokens(2048)
            .with_temperature(0.2)
            .with_model("gemini-2.5-flash")
            .with_json_mode();

        assert_eq!(request.prompt, "Split these lyrics");
        assert_eq!(request.system.as_deref(), Some("You format worship slides"));
        assert_eq!(request.max_tokens, Some(2048));
        assert_eq!(request.temperature, Some(0.2));
        assert_eq!(request.model.as_deref(), Some("gemini-2.5-flash"));
        assert!(request.json_mode);
    }

    #[test]
    fn test_static_backend() {
        let backend = StaticCompletionBackend::new("offline").with_response("[\"a\"]");
        assert_eq!(backend.name(), "offline");
        assert!(backend.is_available());

        let response = backend.complete(&CompletionRequest::new("x")).unwrap();
        assert_eq!(response.text, "[\"a\"]");
        assert_eq!(response.finish_reason, FinishReason::Stop);
    }

    #[test]
    fn test_static_backend_unavailable() {
        let backend = StaticCompletionBackend::new("offline").with_available(false);
        assert!(!backend.is_available());
        assert!(backend.complete(&CompletionRequest::new("x")).is_err());
    }
}
