//! Character workflow outcome types.
//!
//! A workflow run walks `Init -> AnalyzeRelevance -> Decide -> Generate ->
//! Validate -> FormatOutput -> Done`, or stops early at `Decide` (Ignore /
//! Defer) or at the terminal `Error` step.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a character decided to do with an engagement opportunity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngagementDecision {
    Engage,
    Ignore,
    Defer,
}

impl std::fmt::Display for EngagementDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngagementDecision::Engage => write!(f, "engage"),
            EngagementDecision::Ignore => write!(f, "ignore"),
            EngagementDecision::Defer => write!(f, "defer"),
        }
    }
}

/// Step of the character workflow state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStep {
    Init,
    AnalyzeRelevance,
    Decide,
    Generate,
    Validate,
    FormatOutput,
    Done,
    Error,
}

impl std::fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            WorkflowStep::Init => "init",
            WorkflowStep::AnalyzeRelevance => "analyze_relevance",
            WorkflowStep::Decide => "decide",
            WorkflowStep::Generate => "generate",
            WorkflowStep::Validate => "validate",
            WorkflowStep::FormatOutput => "format_output",
            WorkflowStep::Done => "done",
            WorkflowStep::Error => "error",
        };
        f.write_str(s)
    }
}

/// Why a character deferred instead of engaging.
///
/// Deferral is rate limiting, not an error: the opportunity may be retried
/// on a later cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeferReason {
    Cooldown,
    DailyCap,
    ThreadCap,
}

impl std::fmt::Display for DeferReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeferReason::Cooldown => write!(f, "cooldown active"),
            DeferReason::DailyCap => write!(f, "daily interaction cap reached"),
            DeferReason::ThreadCap => write!(f, "thread reply cap reached"),
        }
    }
}

/// Classification of a failed workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Every generation attempt failed validation.
    ValidationFailure,
    /// The generator returned an error or timed out.
    ExternalServiceFailure,
    /// The workflow task itself failed (e.g. panicked).
    Internal,
}

/// Failure detail captured at the terminal `Error` step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl WorkflowFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for WorkflowFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.kind {
            FailureKind::ValidationFailure => "validation failure",
            FailureKind::ExternalServiceFailure => "external service failure",
            FailureKind::Internal => "internal failure",
        };
        write!(f, "{kind}: {}", self.message)
    }
}

/// Outcome of one character workflow run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowResult {
    pub character_id: String,
    pub content_id: String,
    /// Set on the thread reply path.
    pub thread_id: Option<Uuid>,
    /// False only when the run ended at the `Error` step without a fallback.
    pub success: bool,
    pub decision: EngagementDecision,
    pub generated_text: Option<String>,
    pub error: Option<WorkflowFailure>,
    pub defer_reason: Option<DeferReason>,
    pub step_reached: WorkflowStep,
    /// Number of generator calls made (0 unless the decision was Engage).
    pub generation_attempts: u32,
    /// The text is a canned fallback line, not generated output.
    pub used_fallback: bool,
    pub elapsed_ms: u64,
}

impl WorkflowResult {
    /// Successful engagement that produced text.
    pub fn is_reaction(&self) -> bool {
        self.success && self.decision == EngagementDecision::Engage && self.generated_text.is_some()
    }

    /// The run ended in the `Error` step with no usable output.
    pub fn is_failure(&self) -> bool {
        !self.success
    }
}
