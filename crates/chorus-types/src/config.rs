//! Global configuration types for Chorus.
//!
//! `ChorusConfig` represents the top-level `config.toml` that controls the
//! call budget, eligibility, thread policy, generation timeout and the
//! character roster.

use serde::{Deserialize, Serialize};

/// Ceiling on `max_validation_retries`; keeps the Generate/Validate loop
/// short regardless of configuration.
pub const MAX_VALIDATION_RETRIES: u32 = 5;

/// Top-level configuration for the engagement engine.
///
/// Loaded from `~/.chorus/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChorusConfig {
    /// Estimated generator calls allowed per rolling hour.
    #[serde(default = "default_hourly_call_budget")]
    pub hourly_call_budget: u32,

    /// Percentage of the hourly budget at which a warning is reported.
    #[serde(default = "default_budget_warning_percent")]
    pub budget_warning_percent: u8,

    /// Minimum `topic_relevance` a character needs to be offered an item.
    #[serde(default = "default_eligibility_threshold")]
    pub eligibility_threshold: f64,

    /// Timeout applied to every generator call.
    #[serde(default = "default_generation_timeout_secs")]
    pub generation_timeout_secs: u64,

    /// Threads without activity for this long are pruned.
    #[serde(default = "default_thread_retention_hours")]
    pub thread_retention_hours: u32,

    /// Extra generation attempts after a failed validation, at most
    /// [`MAX_VALIDATION_RETRIES`].
    #[serde(default = "default_max_validation_retries")]
    pub max_validation_retries: u32,

    /// Replies from other characters included in a thread context.
    #[serde(default = "default_max_context_replies")]
    pub max_context_replies: usize,

    /// Replace generator failures with a canned fallback line.
    #[serde(default)]
    pub always_respond: bool,

    /// Thread reply cap used when no participant personality provides one.
    #[serde(default = "default_max_replies_per_character")]
    pub default_max_replies_per_character: usize,

    /// Reply rounds offered on each newly created thread by `chorus run`.
    #[serde(default = "default_reply_rounds")]
    pub reply_rounds: u32,

    /// Character roster. Empty means the built-in default cast.
    #[serde(default)]
    pub characters: Vec<CharacterDefinition>,
}

fn default_hourly_call_budget() -> u32 {
    100
}

fn default_budget_warning_percent() -> u8 {
    80
}

fn default_eligibility_threshold() -> f64 {
    0.3
}

fn default_generation_timeout_secs() -> u64 {
    30
}

fn default_thread_retention_hours() -> u32 {
    24
}

fn default_max_validation_retries() -> u32 {
    2
}

fn default_max_context_replies() -> usize {
    5
}

fn default_max_replies_per_character() -> usize {
    2
}

fn default_reply_rounds() -> u32 {
    1
}

impl Default for ChorusConfig {
    fn default() -> Self {
        Self {
            hourly_call_budget: default_hourly_call_budget(),
            budget_warning_percent: default_budget_warning_percent(),
            eligibility_threshold: default_eligibility_threshold(),
            generation_timeout_secs: default_generation_timeout_secs(),
            thread_retention_hours: default_thread_retention_hours(),
            max_validation_retries: default_max_validation_retries(),
            max_context_replies: default_max_context_replies(),
            always_respond: false,
            default_max_replies_per_character: default_max_replies_per_character(),
            reply_rounds: default_reply_rounds(),
            characters: Vec::new(),
        }
    }
}

/// Which personality implementation backs a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharacterKind {
    Analyst,
    Contrarian,
    Enthusiast,
}

impl std::fmt::Display for CharacterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CharacterKind::Analyst => write!(f, "analyst"),
            CharacterKind::Contrarian => write!(f, "contrarian"),
            CharacterKind::Enthusiast => write!(f, "enthusiast"),
        }
    }
}

/// One roster entry: a character id, its kind, and optional policy overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterDefinition {
    pub id: String,
    pub kind: CharacterKind,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub engagement_threshold: Option<f64>,
    #[serde(default)]
    pub cooldown_minutes: Option<u32>,
    #[serde(default)]
    pub max_daily_interactions: Option<u32>,
    #[serde(default)]
    pub max_replies_per_thread: Option<usize>,
    /// Extra interest keywords appended to the kind's defaults.
    #[serde(default)]
    pub interests: Vec<String>,
}

impl CharacterDefinition {
    /// A definition with no overrides.
    pub fn new(id: impl Into<String>, kind: CharacterKind) -> Self {
        Self {
            id: id.into(),
            kind,
            display_name: None,
            engagement_threshold: None,
            cooldown_minutes: None,
            max_daily_interactions: None,
            max_replies_per_thread: None,
            interests: Vec::new(),
        }
    }
}
