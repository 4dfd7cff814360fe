//! Fire-and-forget domain event publishing.
//!
//! Passed verifications are announced on a bounded in-process channel for
//! downstream reward processing. Publishing never blocks the check-in
//! response path: a full or closed channel is logged and dropped.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::warn;

use crate::domain::VerificationPassed;
use crate::infra::{EventSink, PresenceError, Result};

/// Default bound for the in-process event channel. Check-ins are
/// human-timescale; a backlog this deep means the consumer is gone.
const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// In-process event bus backed by a bounded mpsc channel.
pub struct EventBus {
    sender: mpsc::Sender<VerificationPassed>,
}

impl EventBus {
    /// Create a bus with the default capacity, returning the consumer end.
    pub fn new() -> (Self, mpsc::Receiver<VerificationPassed>) {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> (Self, mpsc::Receiver<VerificationPassed>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl EventSink for EventBus {
    async fn publish(&self, event: VerificationPassed) -> Result<()> {
        // try_send, not send: the response path must not wait on a slow
        // consumer.
        self.sender
            .try_send(event)
            .map_err(|e| PresenceError::EventPublish(e.to_string()))
    }
}

/// Publish an event and swallow any failure with a warning. The check-in
/// verdict has already been persisted by the time this runs; losing the
/// event is a downstream-delivery problem, not a verification problem.
pub async fn publish_best_effort(sink: &dyn EventSink, event: VerificationPassed) {
    let venue_id = event.venue_id;
    let user_id = event.user_id;
    if let Err(e) = sink.publish(event).await {
        warn!(
            %venue_id,
            %user_id,
            error = %e,
            "failed to publish verification.passed event"
        );
    }
}
