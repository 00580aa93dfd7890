//! Text generation boundary for Chorus.
//!
//! - `ResponseGenerator`: RPITIT trait for concrete generator backends
//! - `BoxResponseGenerator`: object-safe, cloneable wrapper for dynamic dispatch

pub mod box_generator;
pub mod generator;

pub use box_generator::BoxResponseGenerator;
pub use generator::ResponseGenerator;
