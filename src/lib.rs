// Shared infrastructure
pub mod config;
pub mod error;
pub mod metrics;
pub mod telemetry;

// Hub core
pub mod connection_manager;
pub mod dispatch;
pub mod websocket;

// Application layer
pub mod api;
pub mod server;

// Supporting modules
pub mod shutdown;
