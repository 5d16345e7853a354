use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub websocket: WebSocketConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiConfig {
    /// When set, `/api/v1` trigger routes require a matching `X-API-Key` header
    pub key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebSocketConfig {
    /// Outbound frames buffered per connection before sends fail
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer: usize,
    /// Text sent to a client right after it connects
    #[serde(default = "default_connected_ack")]
    pub connected_ack: String,
    /// Reply to an empty inbound text frame
    #[serde(default = "default_empty_message_notice")]
    pub empty_message_notice: String,
    /// Drop a closed connection from every topic it subscribed to
    #[serde(default = "default_cleanup_subscriptions_on_close")]
    pub cleanup_subscriptions_on_close: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,
    /// `pretty` or `json`
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_channel_buffer() -> usize {
    32
}

fn default_connected_ack() -> String {
    "connected".to_string()
}

fn default_empty_message_notice() -> String {
    "empty message".to_string()
}

fn default_cleanup_subscriptions_on_close() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port() as i64)?
            .set_default("websocket.channel_buffer", default_channel_buffer() as i64)?
            .set_default("websocket.connected_ack", default_connected_ack())?
            .set_default("websocket.empty_message_notice", default_empty_message_notice())?
            .set_default(
                "websocket.cleanup_subscriptions_on_close",
                default_cleanup_subscriptions_on_close(),
            )?
            .set_default("logging.level", default_log_level())?
            .set_default("logging.format", default_log_format())?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // HUB__SERVER__PORT, HUB__API__KEY, HUB__WEBSOCKET__CHANNEL_BUFFER, ...
            .add_source(
                Environment::with_prefix("HUB")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("server.cors_origins"),
            );

        builder.build()?.try_deserialize()
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![],
        }
    }
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            channel_buffer: default_channel_buffer(),
            connected_ack: default_connected_ack(),
            empty_message_notice: default_empty_message_notice(),
            cleanup_subscriptions_on_close: default_cleanup_subscriptions_on_close(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let server = ServerConfig::default();
        assert_eq!(server.host, "0.0.0.0");
        assert_eq!(server.port, 8080);
    }

    #[test]
    fn test_websocket_defaults() {
        let ws = WebSocketConfig::default();
        assert_eq!(ws.channel_buffer, 32);
        assert_eq!(ws.connected_ack, "connected");
        assert!(ws.cleanup_subscriptions_on_close);
    }

    #[test]
    fn test_server_addr() {
        let settings = Settings::default();
        assert_eq!(settings.server_addr(), "0.0.0.0:8080");
    }
}
