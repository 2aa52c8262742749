//! # talker
//!
//! `talker` is the classic middleware "hello world" publisher: it joins a
//! publish/subscribe broker as a node, binds one publisher to a topic and
//! emits `Hello World: <n>` once per period until it is told to stop.
//!
//! ## Core Modules
//!
//! - `app`: Runs the talker until a shutdown signal and maps the outcome to an exit code.
//! - `config`: Loads settings from `config/default.*` and `TALKER__*` environment variables.
//! - `context`: The process-wide middleware handle; owns the transport and tracks live handles.
//! - `message`: The `RosMessage` trait and the `std_msgs` types.
//! - `node`: Nodes, publishers, the tick timer and the `Talker` itself.
//! - `transport`: The broker frame protocol plus WebSocket and loopback transports.
//! - `utils`: Error type and logging setup.

pub mod app;
pub mod config;
pub mod context;
pub mod message;
pub mod node;
pub mod transport;
pub mod utils;

pub use app::run;
pub use context::{Context, live_handles};
pub use node::Talker;
pub use utils::{Result, TalkerError};
