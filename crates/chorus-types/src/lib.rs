//! Shared domain types for Chorus.
//!
//! This crate contains the core domain types used across the Chorus engine:
//! content items, character state, workflow results, cycle reports, events,
//! configuration, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod character;
pub mod config;
pub mod content;
pub mod error;
pub mod event;
pub mod generation;
pub mod report;
pub mod workflow;
