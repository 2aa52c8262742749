//! The `transport` module carries frames from the talker to the middleware.
//!
//! It defines the JSON frame protocol spoken with the broker, the
//! [`Transport`] seam used by the context, a WebSocket client for real
//! deployments and an in-process loopback for simulation and tests.

pub mod loopback;
pub mod message;
pub mod websocket;

use std::future::Future;

use crate::utils::Result;

pub use loopback::LoopbackTransport;
pub use message::{ClientMessage, ServerMessage};
pub use websocket::WebSocketTransport;

/// A connection to the middleware that frames can be pushed through.
pub trait Transport: Send + 'static {
    /// Delivers one frame. Returns once the frame has been handed off.
    fn send(&mut self, frame: ClientMessage) -> impl Future<Output = Result<()>> + Send;

    /// Closes the connection. Calling it on a closed transport is not an error.
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Human readable peer description for logs.
    fn describe(&self) -> String;
}
