//! Offline template-based response generator.
//!
//! `TemplateGenerator` produces short in-character lines without any network
//! call. It opens with one of the character's signature phrases (rotated by
//! attempt), reacts to the headline, and addresses the latest reply when
//! answering inside a thread. Every response is flagged consistent.

use std::future::Future;
use std::time::Instant;

use chorus_core::generation::ResponseGenerator;
use chorus_types::generation::{GeneratedResponse, GenerationError, GenerationRequest};

/// Longest headline excerpt quoted in a response.
const MAX_HEADLINE_CHARS: usize = 120;

/// Deterministic generator for offline runs and demos.
#[derive(Debug, Clone, Default)]
pub struct TemplateGenerator;

impl TemplateGenerator {
    pub fn new() -> Self {
        Self
    }

    fn render(request: &GenerationRequest) -> Result<String, GenerationError> {
        let headline = request
            .context_text
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .ok_or_else(|| GenerationError::InvalidResponse("empty context".to_string()))?;
        let headline = truncate(headline, MAX_HEADLINE_CHARS);

        let phrases = &request.personality.signature_phrases;
        let opener = if phrases.is_empty() {
            request.personality.display_name.clone()
        } else {
            let index = (request.attempt.saturating_sub(1) as usize) % phrases.len();
            capitalize(&phrases[index])
        };

        let topic = request
            .target_topic
            .as_deref()
            .map(|t| format!(" Keep an eye on {t}."))
            .unwrap_or_default();

        Ok(match &request.prior_thread_excerpt {
            Some(excerpt) => {
                let (who, _) = excerpt.split_once(':').unwrap_or(("you", excerpt));
                format!("@{who} {opener}. On \"{headline}\", I see it differently.{topic}")
            }
            None => format!("{opener}: \"{headline}\".{topic}"),
        })
    }
}

impl ResponseGenerator for TemplateGenerator {
    fn name(&self) -> &str {
        "template"
    }

    fn generate(
        &self,
        request: &GenerationRequest,
    ) -> impl Future<Output = Result<GeneratedResponse, GenerationError>> + Send {
        let start = Instant::now();
        let rendered = Self::render(request);
        async move {
            let text = rendered?;
            Ok(GeneratedResponse {
                text,
                confidence: 0.8,
                consistency_flag: true,
                latency_ms: start.elapsed().as_millis() as u64,
            })
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}...", cut.trim_end())
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
