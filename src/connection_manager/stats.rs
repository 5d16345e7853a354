//! Connection statistics and info structures

use serde::Serialize;
use std::collections::HashMap;

/// Connection statistics
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionStats {
    pub total_connections: usize,
    pub unique_users: usize,
    pub topics: HashMap<String, usize>,
}

/// Topic information
#[derive(Debug, Clone, Serialize)]
pub struct TopicInfo {
    pub name: String,
    pub subscriber_count: usize,
}
