//! Event types for the Chorus event bus.
//!
//! `ChorusEvent` is broadcast during orchestration so that observers (CLI
//! renderers, logging, tests) can follow a cycle without reading the
//! orchestration state directly. All variants are Clone + Send + Sync for use
//! with tokio broadcast channels.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::workflow::{DeferReason, FailureKind};

/// Events emitted while the orchestrator runs cycles.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChorusEvent {
    /// A processing cycle has started.
    CycleStarted { cycle_id: Uuid, queue_depth: usize },

    /// A content item was popped from the queue.
    ContentDequeued {
        cycle_id: Uuid,
        content_id: String,
        /// Number of characters offered the item.
        eligible: usize,
    },

    /// A character produced a reaction.
    CharacterEngaged {
        cycle_id: Uuid,
        character_id: String,
        content_id: String,
        thread_id: Option<Uuid>,
        used_fallback: bool,
    },

    /// A character passed on the opportunity.
    CharacterIgnored {
        cycle_id: Uuid,
        character_id: String,
        confidence: f64,
    },

    /// A character was rate limited.
    CharacterDeferred {
        cycle_id: Uuid,
        character_id: String,
        reason: DeferReason,
    },

    /// A character's workflow ended in the error step.
    CharacterFailed {
        cycle_id: Uuid,
        character_id: String,
        kind: FailureKind,
        error: String,
    },

    /// A thread was created from joint reactions.
    ThreadCreated {
        thread_id: Uuid,
        content_id: String,
        participants: Vec<String>,
    },

    /// Inactive threads were discarded.
    ThreadsPruned { thread_ids: Vec<Uuid> },

    /// The hourly call budget crossed its warning threshold.
    BudgetWarning { calls_used: u32, budget_total: u32 },

    /// The hourly call budget is exhausted; content stays queued.
    BudgetExhausted { calls_used: u32, budget_total: u32 },

    /// A processing cycle finished.
    CycleCompleted {
        cycle_id: Uuid,
        reactions: usize,
        failures: usize,
        threads_created: usize,
        duration_ms: u64,
    },

    /// The engine context was shut down.
    EngineShutdown { processed_count: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_tagged_serialization() {
        let event = ChorusEvent::CharacterDeferred {
            cycle_id: Uuid::now_v7(),
            character_id: "ada".to_string(),
            reason: DeferReason::Cooldown,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "character_deferred");
        assert_eq!(json["reason"], "cooldown");
    }

    #[test]
    fn test_event_roundtrip() {
        let event = ChorusEvent::ThreadCreated {
            thread_id: Uuid::now_v7(),
            content_id: "n1".to_string(),
            participants: vec!["ada".to_string(), "rex".to_string()],
        };
        let json = serde_json::to_string(&event).unwrap();
        let parsed: ChorusEvent = serde_json::from_str(&json).unwrap();
        assert!(matches!(
            parsed,
            ChorusEvent::ThreadCreated { ref participants, .. } if participants.len() == 2
        ));
    }
}
