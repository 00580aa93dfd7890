//! Structured per-cycle report returned by the orchestrator.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::workflow::{EngagementDecision, FailureKind, WorkflowResult};

/// A character whose workflow failed during a cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterFailure {
    pub character_id: String,
    pub kind: FailureKind,
    pub detail: String,
}

/// Outcome of one orchestrator cycle (or reply round).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleReport {
    pub cycle_id: Uuid,
    /// The item consumed this cycle. `None` when the queue was empty, the
    /// budget was exhausted, or this was a reply round.
    pub content_id: Option<String>,
    /// Thread targeted by a reply round.
    pub thread_id: Option<Uuid>,
    /// Every workflow result, sorted by character id.
    pub results: Vec<WorkflowResult>,
    pub threads_created: Vec<Uuid>,
    pub failures: Vec<CharacterFailure>,
    pub warnings: Vec<String>,
    pub processed_count: u64,
    pub calls_this_hour: u32,
    pub elapsed_ms: u64,
}

impl CycleReport {
    /// An empty report for the given cycle.
    pub fn empty(cycle_id: Uuid) -> Self {
        Self {
            cycle_id,
            content_id: None,
            thread_id: None,
            results: Vec::new(),
            threads_created: Vec::new(),
            failures: Vec::new(),
            warnings: Vec::new(),
            processed_count: 0,
            calls_this_hour: 0,
            elapsed_ms: 0,
        }
    }

    /// Results that produced publishable text.
    pub fn reactions(&self) -> impl Iterator<Item = &WorkflowResult> {
        self.results.iter().filter(|r| r.is_reaction())
    }

    pub fn reaction_count(&self) -> usize {
        self.reactions().count()
    }

    /// Runs that did not end in the error step.
    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Number of results with the given decision.
    pub fn count_decision(&self, decision: EngagementDecision) -> usize {
        self.results.iter().filter(|r| r.decision == decision).count()
    }

    /// Whether the cycle did anything at all.
    pub fn is_idle(&self) -> bool {
        self.content_id.is_none() && self.thread_id.is_none() && self.results.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::WorkflowStep;

    fn result(id: &str, success: bool, decision: EngagementDecision) -> WorkflowResult {
        WorkflowResult {
            character_id: id.to_string(),
            content_id: "n1".to_string(),
            thread_id: None,
            success,
            decision,
            generated_text: (success && decision == EngagementDecision::Engage)
                .then(|| format!("{id} says hi")),
            error: None,
            defer_reason: None,
            step_reached: WorkflowStep::Done,
            generation_attempts: 1,
            used_fallback: false,
            elapsed_ms: 1,
        }
    }

    #[test]
    fn counts_reactions_and_successes() {
        let mut report = CycleReport::empty(Uuid::now_v7());
        report.content_id = Some("n1".to_string());
        report.results = vec![
            result("a", true, EngagementDecision::Engage),
            result("b", true, EngagementDecision::Ignore),
            result("c", false, EngagementDecision::Engage),
        ];
        report.failures.push(CharacterFailure {
            character_id: "c".to_string(),
            kind: FailureKind::ExternalServiceFailure,
            detail: "boom".to_string(),
        });

        assert_eq!(report.reaction_count(), 1);
        assert_eq!(report.success_count(), 2);
        assert_eq!(report.failure_count(), 1);
        assert_eq!(report.count_decision(EngagementDecision::Engage), 2);
        assert!(!report.is_idle());
    }

    #[test]
    fn empty_report_is_idle() {
        assert!(CycleReport::empty(Uuid::now_v7()).is_idle());
    }
}
