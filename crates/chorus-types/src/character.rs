//! Per-character runtime state.
//!
//! `CharacterState` is owned by the orchestration state, one instance per
//! character id. Only that character's own workflow run mutates it.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::content::clamp_unit;
use crate::workflow::WorkflowStep;

/// Mutable bookkeeping for one character.
///
/// Invariants: `cooldown_until >= last_interaction_time` whenever both are
/// set, and `decision_confidence` stays in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterState {
    pub character_id: String,
    /// Lifetime count of successful engagements.
    pub interaction_count: u64,
    /// Engagements on `day` (UTC), used for the daily cap.
    pub interactions_today: u32,
    pub day: Option<NaiveDate>,
    pub last_interaction_time: Option<DateTime<Utc>>,
    pub cooldown_until: Option<DateTime<Utc>>,
    decision_confidence: f64,
    pub current_step: WorkflowStep,
    pub last_error: Option<String>,
}

impl CharacterState {
    pub fn new(character_id: impl Into<String>) -> Self {
        Self {
            character_id: character_id.into(),
            interaction_count: 0,
            interactions_today: 0,
            day: None,
            last_interaction_time: None,
            cooldown_until: None,
            decision_confidence: 0.0,
            current_step: WorkflowStep::Init,
            last_error: None,
        }
    }

    /// Most recent engagement probability computed for this character.
    pub fn decision_confidence(&self) -> f64 {
        self.decision_confidence
    }

    /// Store a new confidence, clamped into `[0, 1]`.
    pub fn set_decision_confidence(&mut self, value: f64) {
        self.decision_confidence = clamp_unit(value);
    }

    /// Whether the character is still inside its cooldown window at `now`.
    pub fn is_cooling_down(&self, now: DateTime<Utc>) -> bool {
        self.cooldown_until.is_some_and(|until| now < until)
    }

    /// Engagements counted against the daily cap for the UTC day of `now`.
    pub fn interactions_on(&self, now: DateTime<Utc>) -> u32 {
        if self.day == Some(now.date_naive()) {
            self.interactions_today
        } else {
            0
        }
    }

    /// Record a successful engagement at `now` and start the cooldown.
    pub fn record_interaction(&mut self, now: DateTime<Utc>, cooldown_minutes: u32) {
        let today = now.date_naive();
        if self.day != Some(today) {
            self.day = Some(today);
            self.interactions_today = 0;
        }
        self.interactions_today = self.interactions_today.saturating_add(1);
        self.interaction_count = self.interaction_count.saturating_add(1);
        self.last_interaction_time = Some(now);
        self.cooldown_until = Some(now + Duration::minutes(i64::from(cooldown_minutes)));
    }

    /// Start a fresh run: reset the step and clear the previous error.
    pub fn begin_run(&mut self) {
        self.current_step = WorkflowStep::Init;
        self.last_error = None;
    }

    /// Check the state invariants, returning a description of the first
    /// violation found.
    pub fn check_invariants(&self) -> Result<(), String> {
        if let (Some(last), Some(until)) = (self.last_interaction_time, self.cooldown_until) {
            if until < last {
                return Err(format!(
                    "character '{}': cooldown_until {until} precedes last interaction {last}",
                    self.character_id
                ));
            }
        }
        if !(0.0..=1.0).contains(&self.decision_confidence) {
            return Err(format!(
                "character '{}': decision_confidence {} outside [0, 1]",
                self.character_id, self.decision_confidence
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, h, m, 0).unwrap()
    }

    #[test]
    fn confidence_is_clamped() {
        let mut state = CharacterState::new("alice");
        state.set_decision_confidence(1.4);
        assert_eq!(state.decision_confidence(), 1.0);
        state.set_decision_confidence(-0.1);
        assert_eq!(state.decision_confidence(), 0.0);
    }

    #[test]
    fn record_interaction_sets_cooldown_after_last_interaction() {
        let mut state = CharacterState::new("alice");
        state.record_interaction(at(10, 0), 30);
        assert_eq!(state.interaction_count, 1);
        assert_eq!(state.last_interaction_time, Some(at(10, 0)));
        assert_eq!(state.cooldown_until, Some(at(10, 30)));
        assert!(state.is_cooling_down(at(10, 29)));
        assert!(!state.is_cooling_down(at(10, 30)));
        assert!(state.check_invariants().is_ok());
    }

    #[test]
    fn zero_cooldown_never_cools_down() {
        let mut state = CharacterState::new("bob");
        state.record_interaction(at(9, 0), 0);
        assert!(!state.is_cooling_down(at(9, 0)));
    }

    #[test]
    fn daily_counter_resets_on_new_day() {
        let mut state = CharacterState::new("alice");
        state.record_interaction(at(10, 0), 0);
        state.record_interaction(at(11, 0), 0);
        assert_eq!(state.interactions_on(at(12, 0)), 2);

        let tomorrow = Utc.with_ymd_and_hms(2025, 3, 15, 8, 0, 0).unwrap();
        assert_eq!(state.interactions_on(tomorrow), 0);
        state.record_interaction(tomorrow, 0);
        assert_eq!(state.interactions_today, 1);
        assert_eq!(state.interaction_count, 3);
    }

    #[test]
    fn invariant_check_flags_inverted_cooldown() {
        let mut state = CharacterState::new("eve");
        state.last_interaction_time = Some(at(10, 0));
        state.cooldown_until = Some(at(9, 0));
        let err = state.check_invariants().unwrap_err();
        assert!(err.contains("eve"));
    }

    #[test]
    fn begin_run_clears_error() {
        let mut state = CharacterState::new("alice");
        state.current_step = WorkflowStep::Error;
        state.last_error = Some("boom".to_string());
        state.begin_run();
        assert_eq!(state.current_step, WorkflowStep::Init);
        assert!(state.last_error.is_none());
    }
}
