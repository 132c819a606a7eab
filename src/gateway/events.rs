//! Session lifecycle broadcast
//!
//! The gateway publishes here when the backend rejects the bearer credential.
//! Any number of subscribers (a CLI prompt, a login screen) can react without
//! the gateway knowing about them.

use tokio::sync::broadcast;

/// Buffered events per subscriber before the oldest are dropped.
const DEFAULT_CAPACITY: usize = 16;

/// Events published on the session bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// The backend answered 401; local credentials have been cleared.
    Expired,
}

/// Publish/subscribe handle for [`SessionEvent`]s.
///
/// Cloning shares the underlying channel.
///
/// # Examples
///
/// ```
/// use parley::gateway::{SessionEvent, SessionEvents};
///
/// let events = SessionEvents::new();
/// let mut rx = events.subscribe();
/// events.publish(SessionEvent::Expired);
/// assert_eq!(rx.try_recv().unwrap(), SessionEvent::Expired);
/// ```
#[derive(Debug, Clone)]
pub struct SessionEvents {
    tx: broadcast::Sender<SessionEvent>,
}

impl SessionEvents {
    /// Creates a bus with the default per-subscriber buffer.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates a bus buffering up to `capacity` events per subscriber.
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Subscribe to future session events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    /// Publishes `event` and returns how many subscribers received it.
    ///
    /// Publishing with nobody listening is not an error.
    pub fn publish(&self, event: SessionEvent) -> usize {
        self.tx.send(event).unwrap_or(0)
    }
}

impl Default for SessionEvents {
    fn default() -> Self {
        Self::new()
    }
}
