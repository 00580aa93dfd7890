//! Event bus carrying `ChorusEvent` to observers.

pub mod bus;

pub use bus::{DEFAULT_EVENT_CAPACITY, EventBus};
