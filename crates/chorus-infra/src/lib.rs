//! Infrastructure layer for Chorus.
//!
//! Concrete implementations behind the ports defined in `chorus-core`:
//! config loading, data directory resolution, the built-in personalities,
//! the offline template generator, and the content file loader.

pub mod config;
pub mod content;
pub mod filesystem;
pub mod generator;
pub mod persona;
