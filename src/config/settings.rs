use serde::Deserialize;
use url::Url;

use crate::utils::{Result, TalkerError};

/// Top-level configuration settings for the talker.
///
/// Includes the node identity, the publisher behaviour, the middleware
/// connection and logging.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Settings {
    pub node: NodeSettings,
    pub publisher: PublisherSettings,
    pub middleware: MiddlewareSettings,
    pub log: LogSettings,
}

/// Name and namespace the node registers under.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct NodeSettings {
    pub name: String,
    pub namespace: String,
}

/// Controls what is published, where and how often.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct PublisherSettings {
    pub topic: String,
    pub period_ms: u64,
    pub message_prefix: String,
    pub qos: u8,
    /// Stop after this many ticks. `None` runs until interrupted.
    pub max_messages: Option<u64>,
}

/// Which transport carries frames to the middleware.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    WebSocket,
    Loopback,
}

/// Connection parameters for the middleware.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct MiddlewareSettings {
    pub transport: TransportKind,
    pub url: String,
    pub connect_timeout_ms: u64,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LogSettings {
    pub level: String,
}

/// Partial configuration settings loaded from files or environment.
///
/// Allows partial specification of settings. Missing values can be filled using defaults.
#[derive(Debug, Deserialize, Default)]
pub struct PartialSettings {
    pub node: Option<PartialNodeSettings>,
    pub publisher: Option<PartialPublisherSettings>,
    pub middleware: Option<PartialMiddlewareSettings>,
    pub log: Option<PartialLogSettings>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialNodeSettings {
    pub name: Option<String>,
    pub namespace: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialPublisherSettings {
    pub topic: Option<String>,
    pub period_ms: Option<u64>,
    pub message_prefix: Option<String>,
    pub qos: Option<u8>,
    pub max_messages: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialMiddlewareSettings {
    pub transport: Option<TransportKind>,
    pub url: Option<String>,
    pub connect_timeout_ms: Option<u64>,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialLogSettings {
    pub level: Option<String>,
}

/// Provides default values for `Settings`.
///
/// Matches the classic demo talker: `/chatter`-style topic, one message a second.
impl Default for Settings {
    fn default() -> Self {
        Self {
            node: NodeSettings {
                name: "talker".to_string(),
                namespace: "/".to_string(),
            },
            publisher: PublisherSettings {
                topic: "chatter".to_string(),
                period_ms: 1000,
                message_prefix: "Hello World: ".to_string(),
                qos: 0,
                max_messages: None,
            },
            middleware: MiddlewareSettings {
                transport: TransportKind::WebSocket,
                url: "ws://127.0.0.1:8080".to_string(),
                connect_timeout_ms: 5000,
                username: None,
                password: None,
            },
            log: LogSettings {
                level: "info".to_string(),
            },
        }
    }
}

impl Settings {
    /// Fills every missing value of `partial` from the defaults.
    pub fn merge(partial: PartialSettings) -> Self {
        let default = Settings::default();
        let node = partial.node.unwrap_or_default();
        let publisher = partial.publisher.unwrap_or_default();
        let middleware = partial.middleware.unwrap_or_default();
        let log = partial.log.unwrap_or_default();

        Settings {
            node: NodeSettings {
                name: node.name.unwrap_or(default.node.name),
                namespace: node.namespace.unwrap_or(default.node.namespace),
            },
            publisher: PublisherSettings {
                topic: publisher.topic.unwrap_or(default.publisher.topic),
                period_ms: publisher.period_ms.unwrap_or(default.publisher.period_ms),
                message_prefix: publisher
                    .message_prefix
                    .unwrap_or(default.publisher.message_prefix),
                qos: publisher.qos.unwrap_or(default.publisher.qos),
                max_messages: publisher.max_messages.or(default.publisher.max_messages),
            },
            middleware: MiddlewareSettings {
                transport: middleware
                    .transport
                    .unwrap_or(default.middleware.transport),
                url: middleware.url.unwrap_or(default.middleware.url),
                connect_timeout_ms: middleware
                    .connect_timeout_ms
                    .unwrap_or(default.middleware.connect_timeout_ms),
                username: middleware.username.or(default.middleware.username),
                password: middleware.password.or(default.middleware.password),
            },
            log: LogSettings {
                level: log.level.unwrap_or(default.log.level),
            },
        }
    }

    /// Rejects settings the talker cannot run with.
    ///
    /// Name syntax is checked later by the node itself.
    pub fn validate(&self) -> Result<()> {
        if self.publisher.period_ms == 0 {
            return Err(TalkerError::Config(
                "publisher.period_ms must be greater than zero".to_string(),
            ));
        }
        if self.publisher.qos > 1 {
            return Err(TalkerError::Config(format!(
                "publisher.qos must be 0 or 1, got {}",
                self.publisher.qos
            )));
        }
        if self.middleware.transport == TransportKind::WebSocket {
            let url = Url::parse(&self.middleware.url).map_err(|e| {
                TalkerError::Config(format!("middleware.url '{}': {e}", self.middleware.url))
            })?;
            if !matches!(url.scheme(), "ws" | "wss") {
                return Err(TalkerError::Config(format!(
                    "middleware.url must use ws:// or wss://, got '{}'",
                    url.scheme()
                )));
            }
        }
        if self.middleware.username.is_some() != self.middleware.password.is_some() {
            return Err(TalkerError::Config(
                "middleware.username and middleware.password must be set together".to_string(),
            ));
        }
        Ok(())
    }
}
