//! Local id allocation for identities and data streams.

use std::sync::atomic::{AtomicI64, Ordering};

/// Allocates the local ids that tie chat messages to senders and streams
/// to their data entries within one event.
///
/// Ids start at 1 and are unique per sequence. Create one sequence per
/// webhook and pass it by reference to everything that builds parts of
/// that webhook's event. The counter is atomic, so a shared sequence is
/// also safe; `Relaxed` is sufficient because callers only rely on
/// uniqueness, never on cross-thread ordering of the values.
#[derive(Debug, Default)]
pub struct IdSequence {
    last: AtomicI64,
}

impl IdSequence {
    /// Create a sequence whose first id is 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next id.
    pub fn next_id(&self) -> i64 {
        self.last.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// The most recently allocated id, or 0 if none was allocated yet.
    pub fn last_id(&self) -> i64 {
        self.last.load(Ordering::Relaxed)
    }
}
