//! Per-webhook processing context.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use hookbridge_entity::IdSequence;

/// State owned by the processing of one webhook.
///
/// Created when a webhook is accepted and dropped when its event has been
/// sent or has failed. The id sequence lives here so that every identity
/// and data stream of the event draws from the same counter.
#[derive(Debug)]
pub struct ProcessingContext {
    /// Correlation id used in logs and notifications.
    pub request_id: Uuid,
    /// Which endpoint or request type produced the webhook.
    pub source: String,
    /// When the webhook was received.
    pub received_at: DateTime<Utc>,
    /// Local id allocator for this webhook's event.
    pub ids: IdSequence,
}

impl ProcessingContext {
    /// Creates a context for a newly received webhook.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            source: source.into(),
            received_at: Utc::now(),
            ids: IdSequence::new(),
        }
    }

    /// Milliseconds since the webhook was received.
    pub fn elapsed_ms(&self) -> i64 {
        (Utc::now() - self.received_at).num_milliseconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contexts_are_independent() {
        let a = ProcessingContext::new("get_hook");
        let b = ProcessingContext::new("get_hook");
        assert_ne!(a.request_id, b.request_id);
        assert_eq!(a.ids.next_id(), 1);
        assert_eq!(b.ids.next_id(), 1);
        assert!(a.elapsed_ms() >= 0);
    }
}
