//! Broadcast bus for `ChorusEvent`.
//!
//! Publishing with no subscribers drops the event.

use chorus_types::event::ChorusEvent;
use tokio::sync::broadcast;

/// Default channel capacity used by `EngineContext`.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Multi-consumer event bus. Clones share the same channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ChorusEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Receive every event published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ChorusEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: ChorusEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("receiver_count", &self.sender.receiver_count())
            .finish()
    }
}
