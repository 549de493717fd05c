//! Domain events emitted by Sharegate operations.
//!
//! Events are published on the [`EventBus`] and never influence control
//! flow; external policies (scanning, auditing) subscribe to them.

pub mod reverse_share;
pub mod share;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

pub use reverse_share::{AdoptionEvent, ReverseShareEvent};
pub use share::ShareEvent;

/// Wrapper for all domain events with metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent {
    /// Unique event ID.
    pub id: Uuid,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// The owner who caused the event, `None` for anonymous callers.
    pub actor_id: Option<Uuid>,
    /// The event payload.
    pub payload: EventPayload,
}

/// Union of all domain event types.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event")]
pub enum EventPayload {
    /// A share-related event.
    Share(ShareEvent),
    /// A reverse-share-related event.
    ReverseShare(ReverseShareEvent),
    /// An adoption outcome.
    Adoption(AdoptionEvent),
}

impl DomainEvent {
    /// Create a new domain event.
    pub fn new(actor_id: Option<Uuid>, payload: EventPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            actor_id,
            payload,
        }
    }
}

/// In-process fan-out of domain events.
///
/// Publishing never blocks and never fails: with no subscribers the event
/// is dropped, and lagging subscribers lose the oldest events.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    /// Create a bus buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event.
    pub fn publish(&self, actor_id: Option<Uuid>, payload: EventPayload) {
        let _ = self.sender.send(DomainEvent::new(actor_id, payload));
    }

    /// Subscribe to all subsequently published events.
    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
