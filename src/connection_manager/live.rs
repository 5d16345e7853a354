use std::sync::Arc;

use dashmap::DashMap;
use uuid::Uuid;

use super::Connection;

/// Every open connection, whether or not it is registered or subscribed
#[derive(Default)]
pub struct LiveConnections {
    connections: DashMap<Uuid, Arc<Connection>>,
}

impl LiveConnections {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
        }
    }

    pub fn insert(&self, connection: Arc<Connection>) {
        self.connections.insert(connection.id, connection);
    }

    pub fn remove(&self, connection_id: Uuid) -> Option<Arc<Connection>> {
        self.connections.remove(&connection_id).map(|(_, conn)| conn)
    }

    pub fn get(&self, connection_id: Uuid) -> Option<Arc<Connection>> {
        self.connections.get(&connection_id).map(|r| r.value().clone())
    }

    pub fn snapshot(&self) -> Vec<Arc<Connection>> {
        self.connections.iter().map(|r| r.value().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
