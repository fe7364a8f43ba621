//! Session service traits and types for agent conversation state.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::error::Result;
use super::key::SessionId;

/// One immutable turn record, authored by the end user or a named agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub invocation_id: String,
    /// End-user sentinel (`"user"` by default) or the name of an agent node.
    pub author: String,
    pub branch: String,
    pub timestamp: DateTime<Utc>,
    /// Streaming chunk; not persisted by `append_event`.
    #[serde(default)]
    pub partial: bool,
    /// Opaque payload, never inspected by the store or the router.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<serde_json::Value>,
}

impl Event {
    /// A complete event with a fresh id, stamped now.
    pub fn new(author: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            invocation_id: String::new(),
            author: author.into(),
            branch: String::new(),
            timestamp: Utc::now(),
            partial: false,
            content: None,
        }
    }

    pub fn with_invocation_id(mut self, invocation_id: impl Into<String>) -> Self {
        self.invocation_id = invocation_id.into();
        self
    }

    pub fn with_content(mut self, content: serde_json::Value) -> Self {
        self.content = Some(content);
        self
    }
}

/// A point-in-time copy of a stored session.
///
/// Holding a `Session` never blocks the store; it does not observe appends
/// made after it was taken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub state: HashMap<String, serde_json::Value>,
    pub events: Vec<Event>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn state_value(&self, key: &str) -> Option<&serde_json::Value> {
        self.state.get(key)
    }
}

#[derive(Debug, Clone, Default)]
pub struct CreateRequest {
    /// Required.
    pub app_name: String,
    /// Required.
    pub user_id: String,
    /// When empty the service assigns a fresh id.
    pub session_id: String,
    pub state: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct GetRequest {
    pub id: SessionId,
    /// Keep only the most recent N events (applied after `after`).
    pub num_recent_events: Option<usize>,
    /// Keep only events with `timestamp >= after`.
    pub after: Option<DateTime<Utc>>,
}

impl GetRequest {
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            num_recent_events: None,
            after: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ListRequest {
    pub app_name: String,
    pub user_id: String,
}

/// Conversation session storage.
#[async_trait]
pub trait SessionService: Send + Sync {
    /// Create a session with no events. Fails with `AlreadyExists` if the id is taken.
    async fn create(&self, req: CreateRequest) -> Result<Session>;

    /// Snapshot of a session, filtered per the request.
    async fn get(&self, req: &GetRequest) -> Result<Session>;

    /// All sessions of one user within one app, in session id order.
    async fn list(&self, req: &ListRequest) -> Result<Vec<Session>>;

    /// Remove a session. Fails with `NotFound` if it does not exist.
    async fn delete(&self, id: &SessionId) -> Result<()>;

    /// Append an event to the session's log.
    async fn append_event(&self, id: &SessionId, event: Event) -> Result<()>;

    /// The name of this session service implementation.
    fn name(&self) -> &str;
}
