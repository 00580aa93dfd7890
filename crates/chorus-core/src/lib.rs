//! Engagement engine for Chorus.
//!
//! This crate holds the capability traits (`PersonalityProfile`,
//! `ResponseGenerator`), the per-character workflow, thread bookkeeping and
//! the orchestrator. It depends only on `chorus-types`; concrete characters,
//! generators and config loading live in `chorus-infra`.

pub mod engine;
pub mod event;
pub mod generation;
pub mod personality;
pub mod thread;
pub mod workflow;
