use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Frames the talker sends to the broker.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "login")]
    Login { username: String, password: String },

    #[serde(rename = "auth")]
    Auth { token: String },

    #[serde(rename = "publish")]
    Publish {
        topic: String,
        payload: String,
        message_id: Option<String>,
        qos: Option<u8>,
    },
}

impl ClientMessage {
    /// Builds a publish frame with a fresh message id.
    pub fn publish(topic: &str, payload: String, qos: u8) -> Self {
        ClientMessage::Publish {
            topic: topic.to_string(),
            payload,
            message_id: Some(Uuid::new_v4().to_string()),
            qos: Some(qos),
        }
    }
}

/// Frames the broker sends back during the connection handshake.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "login_response")]
    LoginResponse { token: String },
    #[serde(rename = "authenticated")]
    Authenticated {},
    #[serde(rename = "error")]
    Error { message: String },
}
