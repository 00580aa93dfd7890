//! Discussion threads built from joint character reactions.

pub mod engagement;

pub use engagement::{SharedThread, ThreadEngagementState, ThreadReply};
