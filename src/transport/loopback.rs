use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use super::{ClientMessage, Transport};
use crate::utils::{Result, TalkerError};

/// In-process transport: every frame lands in a channel owned by the caller.
///
/// Closing drops the sending half, so the receiver sees the end of the stream.
#[derive(Debug)]
pub struct LoopbackTransport {
    sender: Option<UnboundedSender<ClientMessage>>,
}

impl LoopbackTransport {
    pub fn channel() -> (Self, UnboundedReceiver<ClientMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { sender: Some(tx) }, rx)
    }

    pub fn is_closed(&self) -> bool {
        self.sender.as_ref().is_none_or(|tx| tx.is_closed())
    }
}

impl Transport for LoopbackTransport {
    async fn send(&mut self, frame: ClientMessage) -> Result<()> {
        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| TalkerError::Transport("loopback transport is closed".to_string()))?;
        sender
            .send(frame)
            .map_err(|_| TalkerError::Transport("loopback receiver dropped".to_string()))
    }

    async fn close(&mut self) -> Result<()> {
        self.sender = None;
        Ok(())
    }

    fn describe(&self) -> String {
        "loopback".to_string()
    }
}
