//! Request/response types for the text generation boundary.
//!
//! The generator itself is an external collaborator; these types are the
//! contract between a character workflow and whatever produces the text.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Read-only view of a personality handed to the generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalitySnapshot {
    pub character_id: String,
    pub display_name: String,
    /// Short description of the character's voice and stance.
    pub voice: String,
    pub interests: Vec<String>,
    pub signature_phrases: Vec<String>,
}

/// A single generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub personality: PersonalitySnapshot,
    /// The content (or thread context) the character is reacting to.
    pub context_text: String,
    /// Most recent reply from another character, on the thread path.
    pub prior_thread_excerpt: Option<String>,
    pub target_topic: Option<String>,
    /// 1-based attempt number within the validation loop.
    pub attempt: u32,
}

/// Output of a generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedResponse {
    pub text: String,
    /// Generator's own confidence in `[0, 1]`.
    pub confidence: f64,
    /// Generator's claim that the text is in character.
    pub consistency_flag: bool,
    pub latency_ms: u64,
}

/// Errors from a response generator.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GenerationError {
    #[error("generator error: {message}")]
    Provider { message: String },

    #[error("generation timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("generator returned an unusable response: {0}")]
    InvalidResponse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_error_display() {
        let err = GenerationError::Timeout { timeout_ms: 30_000 };
        assert_eq!(err.to_string(), "generation timed out after 30000ms");

        let err = GenerationError::Provider {
            message: "503 upstream".to_string(),
        };
        assert_eq!(err.to_string(), "generator error: 503 upstream");
    }

    #[test]
    fn request_serializes_optional_fields() {
        let request = GenerationRequest {
            personality: PersonalitySnapshot {
                character_id: "analyst".to_string(),
                display_name: "Ada".to_string(),
                voice: "measured".to_string(),
                interests: vec!["economy".to_string()],
                signature_phrases: vec!["the numbers say".to_string()],
            },
            context_text: "Rates rise".to_string(),
            prior_thread_excerpt: None,
            target_topic: Some("economy".to_string()),
            attempt: 1,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["target_topic"], "economy");
        assert!(json["prior_thread_excerpt"].is_null());
        assert_eq!(json["personality"]["display_name"], "Ada");
    }
}
