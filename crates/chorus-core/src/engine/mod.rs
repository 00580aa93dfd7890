//! Orchestration engine.
//!
//! - `budget`: hourly generator call budget
//! - `context`: explicit `EngineContext` passed to every cycle
//! - `eligibility`: which characters are offered an item
//! - `orchestrator`: cycle processing, reply rounds and the run loop
//! - `state`: `OrchestrationState`, the single-writer mutable state

pub mod budget;
pub mod context;
pub mod eligibility;
pub mod orchestrator;
pub mod state;

pub use budget::{BudgetStatus, HourlyCallBudget};
pub use context::EngineContext;
pub use orchestrator::{Orchestrator, OrchestratorError, RunOutcome};
pub use state::{OrchestrationState, ThreadEntry};
