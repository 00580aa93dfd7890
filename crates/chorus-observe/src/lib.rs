//! Observability setup for Chorus: tracing subscriber with optional
//! OpenTelemetry export, plus shared span names and filter directives.

pub mod attrs;
pub mod tracing_setup;
