//! Asynchronous event delivery to channel subscribers
//!
//! Fire-and-forget signaling: emitting an event never blocks the
//! emitting writer. A slow subscriber lags (the broadcast ring drops its
//! oldest events) instead of stalling the channel; an absent subscriber
//! costs one discarded send.
//!
//! Subscribing returns a `broadcast::Receiver`. There is no unsubscribe
//! call: drop the receiver and the subscription is gone.

use tokio::sync::broadcast;

/// Default depth of the per-channel event ring.
pub const DEFAULT_EVENT_CAPACITY: usize = 16;

/// Event delivered to channel subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelEvent {
    /// The channel went from empty to non-empty
    Readable,
    /// The channel was torn down
    Closed,
}

/// Set of registered notification targets for one channel.
pub struct NotificationRegistry {
    sender: broadcast::Sender<ChannelEvent>,
}

impl NotificationRegistry {
    /// Create a registry whose event ring holds `event_capacity` entries
    /// per subscriber before lagging.
    #[must_use]
    pub fn new(event_capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(event_capacity);
        Self { sender }
    }

    /// Register a new subscriber. Drop the receiver to unsubscribe.
    #[must_use]
    pub fn subscribe(&self, debug_hint: &str) -> broadcast::Receiver<ChannelEvent> {
        log::debug!("notifications: new subscriber (hint: {debug_hint})");
        self.sender.subscribe()
    }

    /// Number of live subscribers
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Deliver an event to every subscriber without blocking.
    pub fn emit(&self, event: ChannelEvent) {
        if let Err(e) = self.sender.send(event) {
            // No live subscribers; nothing to deliver
            log::debug!("notifications: {event:?} dropped: {e}");
        }
    }
}

impl Default for NotificationRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}
