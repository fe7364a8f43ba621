//! Per-session mutable record.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;

use super::key::SessionId;
use super::traits::{Event, Session};

/// One session's event log and state behind its own lock.
///
/// The store-wide lock only guards which records exist; appends to different
/// records never contend with each other.
#[derive(Debug)]
pub struct SessionRecord {
    id: SessionId,
    inner: Mutex<RecordInner>,
}

#[derive(Debug)]
struct RecordInner {
    events: Vec<Event>,
    state: HashMap<String, serde_json::Value>,
    updated_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn new(id: SessionId, state: HashMap<String, serde_json::Value>) -> Self {
        Self {
            id,
            inner: Mutex::new(RecordInner {
                events: Vec::new(),
                state,
                updated_at: Utc::now(),
            }),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn append(&self, event: Event) {
        let mut inner = self.inner.lock();
        inner.updated_at = event.timestamp;
        inner.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.inner.lock().updated_at
    }

    /// Copy out the session; events matching `keep` only, then at most the last `limit`.
    pub fn snapshot_filtered(
        &self,
        keep: impl Fn(&Event) -> bool,
        limit: Option<usize>,
    ) -> Session {
        let inner = self.inner.lock();
        let mut events: Vec<Event> = inner.events.iter().filter(|e| keep(*e)).cloned().collect();
        if let Some(n) = limit {
            let start = events.len().saturating_sub(n);
            events.drain(..start);
        }
        Session {
            id: self.id.clone(),
            state: inner.state.clone(),
            events,
            updated_at: inner.updated_at,
        }
    }

    pub fn snapshot(&self) -> Session {
        self.snapshot_filtered(|_| true, None)
    }
}
