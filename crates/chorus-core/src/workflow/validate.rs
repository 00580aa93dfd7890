//! Voice validation for generated text.

use chorus_types::generation::GeneratedResponse;

use crate::personality::scoring::contains_any_phrase;

/// Why a generated response was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The text is empty after trimming.
    Blank,
    /// Neither the consistency flag nor a signature phrase vouches for it.
    OutOfCharacter,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::Blank => write!(f, "generated text is blank"),
            Rejection::OutOfCharacter => write!(
                f,
                "response not flagged consistent and contains no signature phrase"
            ),
        }
    }
}

/// Accept a response when the generator flags it consistent, or when it
/// contains one of the character's signature phrases.
pub fn validate_response(
    response: &GeneratedResponse,
    signature_phrases: &[String],
) -> Result<(), Rejection> {
    if response.text.trim().is_empty() {
        return Err(Rejection::Blank);
    }
    if response.consistency_flag || contains_any_phrase(&response.text, signature_phrases) {
        Ok(())
    } else {
        Err(Rejection::OutOfCharacter)
    }
}

/// Final message shape: trimmed, with internal runs of blank lines collapsed.
pub fn format_output(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0;
    for line in text.trim().lines() {
        let line = line.trim_end();
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(line);
    }
    out
}
