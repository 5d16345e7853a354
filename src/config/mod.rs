mod settings;

pub use settings::{ApiConfig, LoggingConfig, ServerConfig, Settings, WebSocketConfig};
