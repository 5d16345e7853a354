use std::sync::Arc;

use dashmap::DashMap;
use uuid::Uuid;

use super::Connection;

/// user_id -> current Connection (last writer wins)
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<String, Arc<Connection>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Map `user_id` to `connection`, returning whatever was mapped before
    pub fn put(&self, user_id: impl Into<String>, connection: Arc<Connection>) -> Option<Arc<Connection>> {
        let user_id = user_id.into();
        let previous = self.sessions.insert(user_id.clone(), connection.clone());

        if let Some(ref old) = previous {
            if old.id != connection.id {
                tracing::info!(
                    user_id = %user_id,
                    previous_connection_id = %old.id,
                    connection_id = %connection.id,
                    "Session replaced by newer connection"
                );
            }
        }

        previous
    }

    /// Remove whatever is mapped under `user_id`
    pub fn remove(&self, user_id: &str) -> Option<Arc<Connection>> {
        self.sessions.remove(user_id).map(|(_, conn)| conn)
    }

    /// Remove the mapping only while it still points at `connection_id`
    pub fn remove_if(&self, user_id: &str, connection_id: Uuid) -> bool {
        self.sessions
            .remove_if(user_id, |_, conn| conn.id == connection_id)
            .is_some()
    }

    pub fn get(&self, user_id: &str) -> Option<Arc<Connection>> {
        self.sessions.get(user_id).map(|r| r.value().clone())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn user_ids(&self) -> Vec<String> {
        self.sessions.iter().map(|r| r.key().clone()).collect()
    }
}
