//! In-memory session service implementation.

use async_trait::async_trait;
use std::ops::Bound;
use std::sync::Arc;
use tracing::{debug, warn};

use super::error::{require, Result, SessionError};
use super::key::{self, SessionId};
use super::record::SessionRecord;
use super::store::OrderedStore;
use super::traits::{CreateRequest, Event, GetRequest, ListRequest, Session, SessionService};
use crate::config::SessionsConfig;

/// A session service backed by an [`OrderedStore`] keyed on the encoded
/// `(app_name, user_id, session_id)` tuple. Thread-safe.
pub struct InMemorySessionService {
    store: OrderedStore<Arc<SessionRecord>>,
    generate_ids: bool,
}

impl InMemorySessionService {
    pub fn new() -> Self {
        Self::with_config(&SessionsConfig::default())
    }

    pub fn with_config(config: &SessionsConfig) -> Self {
        Self {
            store: OrderedStore::new(),
            generate_ids: config.generate_ids,
        }
    }

    fn lookup(&self, id: &SessionId) -> Result<Arc<SessionRecord>> {
        require(&[
            ("app_name", id.app_name.as_str()),
            ("user_id", id.user_id.as_str()),
            ("session_id", id.session_id.as_str()),
        ])?;
        self.store
            .get(&id.encode())
            .ok_or_else(|| SessionError::NotFound(id.clone()))
    }
}

impl Default for InMemorySessionService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionService for InMemorySessionService {
    async fn create(&self, req: CreateRequest) -> Result<Session> {
        require(&[("app_name", req.app_name.as_str()), ("user_id", req.user_id.as_str())])?;

        let session_id = if req.session_id.is_empty() {
            if !self.generate_ids {
                return Err(SessionError::MissingField {
                    field: "session_id",
                });
            }
            uuid::Uuid::new_v4().to_string()
        } else {
            req.session_id
        };

        let id = SessionId::new(req.app_name, req.user_id, session_id);
        let record = Arc::new(SessionRecord::new(id.clone(), req.state));

        if !self.store.insert_if_absent(id.encode(), Arc::clone(&record)) {
            return Err(SessionError::AlreadyExists(id));
        }

        debug!(session = %id, "session created");
        Ok(record.snapshot())
    }

    async fn get(&self, req: &GetRequest) -> Result<Session> {
        let record = self.lookup(&req.id)?;
        let after = req.after;
        Ok(record.snapshot_filtered(
            |event| after.map_or(true, |t| event.timestamp >= t),
            req.num_recent_events,
        ))
    }

    async fn list(&self, req: &ListRequest) -> Result<Vec<Session>> {
        require(&[("app_name", req.app_name.as_str()), ("user_id", req.user_id.as_str())])?;

        let prefix = key::encode_prefix(&req.app_name, &req.user_id);
        let hi = match prefix.prefix_successor() {
            Some(succ) => Bound::Excluded(succ),
            None => Bound::Unbounded,
        };

        let mut sessions = Vec::new();
        for (encoded, record) in self.store.scan_range(Bound::Included(prefix), hi) {
            if let Err(e) = key::decode(&encoded) {
                warn!(error = %e, key = ?encoded, "skipping undecodable session key");
                continue;
            }
            sessions.push(record.snapshot());
        }
        Ok(sessions)
    }

    async fn delete(&self, id: &SessionId) -> Result<()> {
        require(&[
            ("app_name", id.app_name.as_str()),
            ("user_id", id.user_id.as_str()),
            ("session_id", id.session_id.as_str()),
        ])?;

        match self.store.delete(&id.encode()) {
            Some(_) => {
                debug!(session = %id, "session deleted");
                Ok(())
            }
            None => Err(SessionError::NotFound(id.clone())),
        }
    }

    async fn append_event(&self, id: &SessionId, event: Event) -> Result<()> {
        let record = self.lookup(id)?;

        if event.partial {
            debug!(session = %id, event = %event.id, "partial event not persisted");
            return Ok(());
        }

        debug!(session = %id, event = %event.id, author = %event.author, "event appended");
        record.append(event);
        Ok(())
    }

    fn name(&self) -> &str {
        "in_memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use serde_json::json;
    use std::collections::HashMap;

    fn create_req(app: &str, user: &str, session: &str) -> CreateRequest {
        CreateRequest {
            app_name: app.to_string(),
            user_id: user.to_string(),
            session_id: session.to_string(),
            state: HashMap::new(),
        }
    }

    fn list_req(app: &str, user: &str) -> ListRequest {
        ListRequest {
            app_name: app.to_string(),
            user_id: user.to_string(),
        }
    }

    async fn service_with_data() -> InMemorySessionService {
        let service = InMemorySessionService::new();
        for (app, user, session, v) in [
            ("app1", "user1", "session1", "v1"),
            ("app1", "user2", "session1", "v2"),
            ("app1", "user1", "session2", "v2"),
            ("app2", "user2", "session2", "v2"),
        ] {
            let mut req = create_req(app, user, session);
            req.state.insert("k1".to_string(), json!(v));
            service.create(req).await.unwrap();
        }
        service
    }

    fn session_ids(sessions: &[Session]) -> Vec<&str> {
        sessions.iter().map(|s| s.id.session_id.as_str()).collect()
    }

    #[tokio::test]
    async fn create_and_get_session() {
        let service = InMemorySessionService::new();
        let mut req = create_req("testApp", "testUser", "testSession");
        req.state.insert("k".to_string(), json!(5));

        let created = service.create(req).await.unwrap();
        assert_eq!(created.id, SessionId::new("testApp", "testUser", "testSession"));
        assert!(created.events.is_empty());

        let fetched = service.get(&GetRequest::new(created.id.clone())).await.unwrap();
        assert_eq!(fetched.id, created.id);
        assert!(fetched.events.is_empty());
        assert_eq!(fetched.state_value("k"), Some(&json!(5)));
    }

    #[tokio::test]
    async fn create_generates_session_id_when_empty() {
        let service = InMemorySessionService::new();
        let a = service.create(create_req("app", "user", "")).await.unwrap();
        let b = service.create(create_req("app", "user", "")).await.unwrap();
        assert!(!a.id.session_id.is_empty());
        assert_ne!(a.id.session_id, b.id.session_id);
    }

    #[tokio::test]
    async fn create_without_id_generation_requires_session_id() {
        let service = InMemorySessionService::with_config(&SessionsConfig {
            generate_ids: false,
            ..SessionsConfig::default()
        });
        let err = service.create(create_req("app", "user", "")).await.unwrap_err();
        assert!(matches!(err, SessionError::MissingField { field: "session_id" }));
    }

    #[tokio::test]
    async fn create_rejects_missing_fields() {
        let service = InMemorySessionService::new();
        let err = service.create(create_req("", "user", "s")).await.unwrap_err();
        assert!(matches!(err, SessionError::MissingField { field: "app_name" }));
        let err = service.create(create_req("app", "", "s")).await.unwrap_err();
        assert!(matches!(err, SessionError::MissingField { field: "user_id" }));
    }

    #[tokio::test]
    async fn create_duplicate_fails_and_keeps_original() {
        let service = service_with_data().await;
        let mut req = create_req("app1", "user1", "session1");
        req.state.insert("k1".to_string(), json!("overwritten"));

        let err = service.create(req).await.unwrap_err();
        assert!(err.is_already_exists());

        let kept = service
            .get(&GetRequest::new(SessionId::new("app1", "user1", "session1")))
            .await
            .unwrap();
        assert_eq!(kept.state_value("k1"), Some(&json!("v1")));
    }

    #[tokio::test]
    async fn get_missing_session_is_not_found() {
        let service = service_with_data().await;
        let err = service
            .get(&GetRequest::new(SessionId::new("testApp", "user1", "session1")))
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let err = service
            .get(&GetRequest::new(SessionId::new("app1", "user1", "")))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::MissingField { field: "session_id" }));
    }

    #[tokio::test]
    async fn get_applies_event_filters() {
        let service = InMemorySessionService::new();
        let session = service.create(create_req("app", "user", "s")).await.unwrap();
        let base = Utc::now();
        for i in 0..5 {
            let mut event = Event::new("user");
            event.id = format!("e{i}");
            event.timestamp = base + Duration::seconds(i);
            service.append_event(&session.id, event).await.unwrap();
        }

        let mut req = GetRequest::new(session.id.clone());
        req.num_recent_events = Some(2);
        let got = service.get(&req).await.unwrap();
        let ids: Vec<_> = got.events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["e3", "e4"]);

        let mut req = GetRequest::new(session.id.clone());
        req.after = Some(base + Duration::seconds(3));
        let got = service.get(&req).await.unwrap();
        assert_eq!(got.events.len(), 2);

        // Filters never touch the stored log.
        let all = service.get(&GetRequest::new(session.id)).await.unwrap();
        assert_eq!(all.events.len(), 5);
    }

    #[tokio::test]
    async fn list_is_isolated_by_app_and_user() {
        let service = InMemorySessionService::new();
        for (app, user, session) in [
            ("app1", "user1", "s1"),
            ("app1", "user1", "s2"),
            ("app1", "user2", "s3"),
            ("app2", "user1", "s4"),
        ] {
            service.create(create_req(app, user, session)).await.unwrap();
        }

        let got = service.list(&list_req("app1", "user1")).await.unwrap();
        assert_eq!(session_ids(&got), vec!["s1", "s2"]);
        let got = service.list(&list_req("app1", "user2")).await.unwrap();
        assert_eq!(session_ids(&got), vec!["s3"]);
        let got = service.list(&list_req("app2", "user1")).await.unwrap();
        assert_eq!(session_ids(&got), vec!["s4"]);
        let got = service.list(&list_req("app1", "user3")).await.unwrap();
        assert!(got.is_empty());
    }

    #[tokio::test]
    async fn list_does_not_leak_into_neighbouring_user_ids() {
        let service = InMemorySessionService::new();
        for user in ["user", "user\0", "user\u{1}", "userA", "use"] {
            service.create(create_req("app", user, "s")).await.unwrap();
        }

        let got = service.list(&list_req("app", "user")).await.unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].id.user_id, "user");
    }

    #[tokio::test]
    async fn list_requires_app_and_user() {
        let service = InMemorySessionService::new();
        let err = service.list(&list_req("app", "")).await.unwrap_err();
        assert!(matches!(err, SessionError::MissingField { field: "user_id" }));
    }

    #[tokio::test]
    async fn list_skips_undecodable_keys() {
        let service = service_with_data().await;
        let mut corrupt = key::encode_prefix("app1", "user1").as_bytes().to_vec();
        corrupt.extend_from_slice(b"no-terminator");
        service.store.set(
            key::EncodedKey::from_bytes(corrupt),
            Arc::new(SessionRecord::new(
                SessionId::new("app1", "user1", "bogus"),
                HashMap::new(),
            )),
        );

        let got = service.list(&list_req("app1", "user1")).await.unwrap();
        assert_eq!(session_ids(&got), vec!["session1", "session2"]);
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        let service = service_with_data().await;
        let id = SessionId::new("app1", "user1", "session1");

        service.delete(&id).await.unwrap();
        let err = service.get(&GetRequest::new(id.clone())).await.unwrap_err();
        assert!(err.is_not_found());

        let err = service.delete(&id).await.unwrap_err();
        assert!(err.is_not_found());

        let remaining = service.list(&list_req("app1", "user1")).await.unwrap();
        assert_eq!(session_ids(&remaining), vec!["session2"]);
    }

    #[tokio::test]
    async fn append_preserves_order() {
        let service = service_with_data().await;
        let id = SessionId::new("app1", "user1", "session1");
        let e1 = Event::new("user");
        let e2 = Event::new("agent");

        service.append_event(&id, e1.clone()).await.unwrap();
        service.append_event(&id, e2.clone()).await.unwrap();

        let got = service.get(&GetRequest::new(id)).await.unwrap();
        assert_eq!(got.events, vec![e1, e2.clone()]);
        assert_eq!(got.updated_at, e2.timestamp);
    }

    #[tokio::test]
    async fn append_to_missing_session_is_not_found() {
        let service = service_with_data().await;
        let id = SessionId::new("app1", "user1", "custom_session");
        let err = service.append_event(&id, Event::new("user")).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn append_after_delete_is_not_found() {
        let service = service_with_data().await;
        let id = SessionId::new("app1", "user1", "session1");
        service.delete(&id).await.unwrap();
        let err = service.append_event(&id, Event::new("user")).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn partial_events_are_not_persisted() {
        let service = service_with_data().await;
        let id = SessionId::new("app1", "user1", "session1");
        let mut chunk = Event::new("agent");
        chunk.partial = true;

        service.append_event(&id, chunk).await.unwrap();
        let got = service.get(&GetRequest::new(id)).await.unwrap();
        assert!(got.events.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_appends_to_one_session_are_all_kept() {
        let service = Arc::new(service_with_data().await);
        let id = SessionId::new("app1", "user1", "session1");

        let mut handles = Vec::new();
        for writer in 0..8 {
            let service = Arc::clone(&service);
            let id = id.clone();
            handles.push(tokio::spawn(async move {
                for i in 0..25 {
                    let mut event = Event::new("user");
                    event.id = format!("w{writer}-{i}");
                    service.append_event(&id, event).await.unwrap();
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let got = service.get(&GetRequest::new(id)).await.unwrap();
        assert_eq!(got.events.len(), 200);
        // Each writer's own events keep their relative order.
        for writer in 0..8 {
            let prefix = format!("w{writer}-");
            let seq: Vec<usize> = got
                .events
                .iter()
                .filter_map(|e| e.id.strip_prefix(prefix.as_str()))
                .map(|n| n.parse().unwrap())
                .collect();
            assert_eq!(seq, (0..25).collect::<Vec<_>>());
        }
    }
}
