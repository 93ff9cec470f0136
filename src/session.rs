//! Session store — owns funnel sessions keyed by session key.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::funnel::Session;

/// Storage for in-progress conversations.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Look up the session for a key.
    async fn get(&self, key: &str) -> Option<Session>;

    /// Insert or replace a session.
    async fn put(&self, session: Session);

    /// Drop a session. Returns whether one existed.
    async fn remove(&self, key: &str) -> bool;

    /// Drop sessions untouched for longer than `max_idle`. Returns how many
    /// were removed.
    async fn prune_idle(&self, max_idle: Duration) -> usize;

    /// Number of live sessions.
    async fn len(&self) -> usize;
}

/// Process-local session store.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, key: &str) -> Option<Session> {
        self.sessions.read().await.get(key).cloned()
    }

    async fn put(&self, session: Session) {
        self.sessions
            .write()
            .await
            .insert(session.key.clone(), session);
    }

    async fn remove(&self, key: &str) -> bool {
        self.sessions.write().await.remove(key).is_some()
    }

    async fn prune_idle(&self, max_idle: Duration) -> usize {
        let Ok(max_idle) = chrono::Duration::from_std(max_idle) else {
            return 0;
        };
        let cutoff = Utc::now() - max_idle;

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.updated_at >= cutoff);
        let pruned = before - sessions.len();

        if pruned > 0 {
            tracing::info!(pruned, remaining = sessions.len(), "Pruned idle sessions");
        }
        pruned
    }

    async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
