use std::time::Duration;

use maple_core::{Language, Region};
use maple_gateway::{Connector, EventSender, MockConfig, MockConnector, WsConfig, WsConnector};
use serde::{Deserialize, Serialize};

/// Root configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub version: String,
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            transport: TransportConfig::default(),
            chat: ChatConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Look up a value by dotted key
    pub fn get_value(&self, key: &str) -> Option<String> {
        let parts: Vec<&str> = key.split('.').collect();
        match parts.as_slice() {
            ["version"] => Some(self.version.clone()),
            ["transport", "mode"] => Some(self.transport.mode.as_str().to_string()),
            ["transport", "endpoint"] => Some(self.transport.endpoint.clone()),
            ["transport", "origin"] => self.transport.origin.clone(),
            ["transport", "mock_reply_delay_ms"] => {
                Some(self.transport.mock_reply_delay_ms.to_string())
            }
            ["transport", "close_grace_ms"] => Some(self.transport.close_grace_ms.to_string()),
            ["chat", "default_region"] => Some(self.chat.default_region.as_str().to_string()),
            ["chat", "default_language"] => Some(self.chat.default_language.as_str().to_string()),
            ["chat", "seed_history"] => Some(self.chat.seed_history.to_string()),
            ["chat", "show_history"] => Some(self.chat.show_history.to_string()),
            ["logging", "level"] => Some(self.logging.level.as_str().to_string()),
            ["logging", "file"] => self.logging.file.clone(),
            ["logging", "json_format"] => Some(self.logging.json_format.to_string()),
            _ => None,
        }
    }

    /// Set a value by dotted key
    pub fn set_value(&mut self, key: &str, value: &str) -> ConfigResult<()> {
        let parts: Vec<&str> = key.split('.').collect();
        match parts.as_slice() {
            ["transport", "mode"] => {
                self.transport.mode = value.parse()?;
            }
            ["transport", "endpoint"] => {
                self.transport.endpoint = value.to_string();
            }
            ["transport", "origin"] => {
                self.transport.origin = if value.is_empty() || value == "null" {
                    None
                } else {
                    Some(value.to_string())
                };
            }
            ["transport", "mock_reply_delay_ms"] => {
                self.transport.mock_reply_delay_ms = parse_number(value)?;
            }
            ["transport", "close_grace_ms"] => {
                self.transport.close_grace_ms = parse_number(value)?;
            }
            ["chat", "default_region"] => {
                self.chat.default_region = value
                    .parse()
                    .map_err(|e: maple_core::ParseTagError| ConfigError::Validation(e.to_string()))?;
            }
            ["chat", "default_language"] => {
                self.chat.default_language = value
                    .parse()
                    .map_err(|e: maple_core::ParseTagError| ConfigError::Validation(e.to_string()))?;
            }
            ["chat", "seed_history"] => {
                self.chat.seed_history = parse_bool(value)?;
            }
            ["chat", "show_history"] => {
                self.chat.show_history = parse_bool(value)?;
            }
            ["logging", "level"] => {
                self.logging.level = value.parse()?;
            }
            ["logging", "file"] => {
                self.logging.file = Some(value.to_string());
            }
            ["logging", "json_format"] => {
                self.logging.json_format = parse_bool(value)?;
            }
            _ => return Err(ConfigError::KeyNotFound(key.to_string())),
        }
        Ok(())
    }
}

fn parse_bool(value: &str) -> ConfigResult<bool> {
    value
        .parse()
        .map_err(|_| ConfigError::Validation(format!("Invalid boolean: {}", value)))
}

fn parse_number(value: &str) -> ConfigResult<u64> {
    value
        .parse()
        .map_err(|_| ConfigError::Validation(format!("Invalid number: {}", value)))
}

/// Which connector the front ends use
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    #[default]
    Websocket,
    Mock,
}

impl TransportMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportMode::Websocket => "websocket",
            TransportMode::Mock => "mock",
        }
    }
}

impl std::str::FromStr for TransportMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> ConfigResult<Self> {
        match s.to_lowercase().as_str() {
            "websocket" | "ws" => Ok(TransportMode::Websocket),
            "mock" => Ok(TransportMode::Mock),
            _ => Err(ConfigError::Validation(format!("Invalid transport mode: {}", s))),
        }
    }
}

/// Transport configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransportConfig {
    pub mode: TransportMode,
    /// WebSocket endpoint (e.g., "ws://127.0.0.1:8000/ws")
    pub endpoint: String,
    /// Page origin; when set the endpoint is derived from it
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default = "default_mock_reply_delay_ms")]
    pub mock_reply_delay_ms: u64,
    #[serde(default = "default_close_grace_ms")]
    pub close_grace_ms: u64,
}

fn default_mock_reply_delay_ms() -> u64 {
    600
}

fn default_close_grace_ms() -> u64 {
    2000
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            mode: TransportMode::Websocket,
            endpoint: "ws://127.0.0.1:8000/ws".to_string(),
            origin: None,
            mock_reply_delay_ms: default_mock_reply_delay_ms(),
            close_grace_ms: default_close_grace_ms(),
        }
    }
}

impl TransportConfig {
    /// The endpoint to dial, derived from `origin` when one is set
    pub fn resolved_endpoint(&self) -> ConfigResult<String> {
        match &self.origin {
            Some(origin) => maple_gateway::endpoint_from_origin(origin)
                .map_err(|e| ConfigError::Validation(e.to_string())),
            None => Ok(self.endpoint.clone()),
        }
    }

    /// Build the configured connector, reporting to `events`
    pub fn build_connector(&self, events: EventSender) -> ConfigResult<Box<dyn Connector + Send>> {
        match self.mode {
            TransportMode::Mock => {
                let config = MockConfig {
                    reply_delay: Duration::from_millis(self.mock_reply_delay_ms),
                };
                Ok(Box::new(MockConnector::new(config, events)))
            }
            TransportMode::Websocket => {
                let config = WsConfig {
                    endpoint: self.resolved_endpoint()?,
                    close_grace: Duration::from_millis(self.close_grace_ms),
                };
                let connector = WsConnector::new(config, events)
                    .map_err(|e| ConfigError::Validation(e.to_string()))?;
                Ok(Box::new(connector))
            }
        }
    }
}

/// Chat window defaults
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatConfig {
    pub default_region: Region,
    pub default_language: Language,
    /// Pre-fill the history sidebar with sample conversations
    pub seed_history: bool,
    pub show_history: bool,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            default_region: Region::None,
            default_language: Language::En,
            seed_history: true,
            show_history: true,
        }
    }
}

/// Log level
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> ConfigResult<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(ConfigError::Validation(format!("Invalid log level: {}", s))),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub file: Option<String>,
    #[serde(default)]
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            file: Some("~/.maple/logs/maple.log".to_string()),
            json_format: false,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.transport.mode, TransportMode::Websocket);
        assert_eq!(config.transport.endpoint, "ws://127.0.0.1:8000/ws");
        assert_eq!(config.chat.default_region, Region::None);
        assert!(config.chat.seed_history);
    }

    #[test]
    fn test_serialized_shape() {
        let value = serde_json::to_value(Config::default()).unwrap();
        assert_eq!(value["transport"]["mode"], "websocket");
        assert_eq!(value["chat"]["default_region"], "none");
        assert_eq!(value["chat"]["default_language"], "en");
        assert_eq!(value["logging"]["level"], "info");
        assert!(value["transport"]["origin"].is_null());
    }

    #[test]
    fn test_get_and_set_value() {
        let mut config = Config::default();
        config.set_value("chat.default_region", "quebec").unwrap();
        config.set_value("chat.default_language", "fr").unwrap();
        config.set_value("transport.mode", "mock").unwrap();
        config.set_value("transport.close_grace_ms", "500").unwrap();

        assert_eq!(config.get_value("chat.default_region").as_deref(), Some("Quebec"));
        assert_eq!(config.get_value("chat.default_language").as_deref(), Some("fr"));
        assert_eq!(config.get_value("transport.mode").as_deref(), Some("mock"));
        assert_eq!(config.get_value("transport.close_grace_ms").as_deref(), Some("500"));
        assert_eq!(config.get_value("transport.origin"), None);
    }

    #[test]
    fn test_set_value_errors() {
        let mut config = Config::default();
        assert!(matches!(
            config.set_value("chat.default_region", "Yukon"),
            Err(ConfigError::Validation(_))
        ));
        assert!(matches!(
            config.set_value("chat.seed_history", "maybe"),
            Err(ConfigError::Validation(_))
        ));
        assert!(matches!(
            config.set_value("server.port", "80"),
            Err(ConfigError::KeyNotFound(_))
        ));
    }

    #[test]
    fn test_build_connector_rejects_bad_endpoint() {
        let (tx, _rx) = maple_gateway::event_channel();
        let transport = TransportConfig {
            endpoint: "127.0.0.1:8000".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            transport.build_connector(tx),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_resolved_endpoint_prefers_origin() {
        let mut transport = TransportConfig::default();
        assert_eq!(transport.resolved_endpoint().unwrap(), "ws://127.0.0.1:8000/ws");

        transport.origin = Some("https://chat.example.ca".to_string());
        assert_eq!(
            transport.resolved_endpoint().unwrap(),
            "wss://chat.example.ca/ws"
        );
    }
}
