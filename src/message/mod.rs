//! Message types the talker can publish.
//!
//! Every publishable type implements [`RosMessage`], which ties a Rust type
//! to its middleware type name and to the JSON encoding carried in the
//! `payload` field of a publish frame.

pub mod std_msgs;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::utils::Result;

pub trait RosMessage: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Fully qualified type name, e.g. `std_msgs/msg/String`.
    const TYPE_NAME: &'static str;

    /// Encodes the message as the text carried in a publish frame.
    fn to_payload(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    fn from_payload(payload: &str) -> Result<Self> {
        Ok(serde_json::from_str(payload)?)
    }
}
