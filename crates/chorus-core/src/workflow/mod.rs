//! Per-character engagement workflow.
//!
//! - `character`: the `CharacterWorkflow` state machine
//! - `rate_limit`: daily cap and cooldown checks for the Decide step
//! - `validate`: voice validation and output formatting

pub mod character;
pub mod rate_limit;
pub mod validate;

pub use character::{CharacterWorkflow, EngagementTarget, WorkflowSettings};
