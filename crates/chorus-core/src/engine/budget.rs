//! Hourly generator call budget.
//!
//! `HourlyCallBudget` counts generate attempts inside a one-hour window. It
//! reports a threshold crossing (default 80%) exactly once per window and
//! exhaustion at 100%. The window is rolled explicitly with [`roll`], so the
//! orchestrator controls when a new hour begins.
//!
//! [`roll`]: HourlyCallBudget::roll

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Status returned after recording calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetStatus {
    /// Under the warning threshold, or already warned this window.
    Ok,
    /// Just crossed the warning threshold. Returned once per window.
    Warning,
    /// At or over the budget.
    Exhausted,
}

/// Generator call budget for the current hour.
#[derive(Debug, Clone, Serialize)]
pub struct HourlyCallBudget {
    total_budget: u32,
    warning_percent: u8,
    calls_used: u32,
    warning_emitted: bool,
    window_start: DateTime<Utc>,
}

impl HourlyCallBudget {
    pub fn new(total_budget: u32, warning_percent: u8, now: DateTime<Utc>) -> Self {
        Self {
            total_budget,
            warning_percent: warning_percent.min(100),
            calls_used: 0,
            warning_emitted: false,
            window_start: now,
        }
    }

    /// Start a new window if the current one has expired. Returns whether
    /// the window was reset.
    pub fn roll(&mut self, now: DateTime<Utc>) -> bool {
        if now < self.reset_time() {
            return false;
        }
        self.calls_used = 0;
        self.warning_emitted = false;
        self.window_start = now;
        true
    }

    /// Record `calls` generate attempts and return the resulting status.
    pub fn record_calls(&mut self, calls: u32) -> BudgetStatus {
        let prev = self.calls_used;
        self.calls_used = prev.saturating_add(calls);

        if self.calls_used >= self.total_budget {
            return BudgetStatus::Exhausted;
        }

        let threshold = self.warning_threshold();
        if !self.warning_emitted && prev < threshold && self.calls_used >= threshold {
            self.warning_emitted = true;
            return BudgetStatus::Warning;
        }

        BudgetStatus::Ok
    }

    pub fn is_exhausted(&self) -> bool {
        self.calls_used >= self.total_budget
    }

    pub fn calls_used(&self) -> u32 {
        self.calls_used
    }

    pub fn total_budget(&self) -> u32 {
        self.total_budget
    }

    pub fn remaining(&self) -> u32 {
        self.total_budget.saturating_sub(self.calls_used)
    }

    /// Percentage of the budget consumed (0.0 to 100.0+).
    pub fn percentage(&self) -> f32 {
        if self.total_budget == 0 {
            return 100.0;
        }
        self.calls_used as f32 / self.total_budget as f32 * 100.0
    }

    /// When the current window ends.
    pub fn reset_time(&self) -> DateTime<Utc> {
        self.window_start + Duration::hours(1)
    }

    fn warning_threshold(&self) -> u32 {
        (u64::from(self.total_budget) * u64::from(self.warning_percent) / 100) as u32
    }
}
