//! std_msgs message types

use serde::{Deserialize, Serialize};

use super::RosMessage;

/// String message (std_msgs/msg/String)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct String {
    pub data: std::string::String,
}

impl String {
    pub fn new(data: impl Into<std::string::String>) -> Self {
        Self { data: data.into() }
    }
}

impl RosMessage for String {
    const TYPE_NAME: &'static str = "std_msgs/msg/String";
}

/// Int32 message (std_msgs/msg/Int32)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Int32 {
    pub data: i32,
}

impl RosMessage for Int32 {
    const TYPE_NAME: &'static str = "std_msgs/msg/Int32";
}
