//! WebSocket transport
//!
//! Client side of the broker's JSON-over-WebSocket protocol. Responsibilities:
//! - Connect to the broker within the configured timeout
//! - Run the login -> auth handshake when credentials are configured, since
//!   the broker rejects publishes from unauthenticated clients
//! - Serialize publish frames and push them down the socket
//! - Watch what the broker sends back: `error` replies are logged and counted,
//!   and a close from the broker marks the transport closed
//!
//! Any failure while connecting or authenticating is reported as
//! `TalkerError::Init`. Sends and the closing handshake are bounded by the
//! same timeout as the connection.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};
use tungstenite::protocol::Message as WsMessage;

use super::{ClientMessage, ServerMessage, Transport};
use crate::config::MiddlewareSettings;
use crate::utils::{Result, TalkerError};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// What the reader task has seen on the incoming half of the socket.
#[derive(Debug, Default)]
struct ReplyState {
    peer_closed: AtomicBool,
    rejected: AtomicU64,
}

pub struct WebSocketTransport {
    sink: SplitSink<WsStream, WsMessage>,
    reader: Option<JoinHandle<()>>,
    replies: Arc<ReplyState>,
    url: String,
    timeout: Duration,
    closed: bool,
}

impl std::fmt::Debug for WebSocketTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebSocketTransport")
            .field("url", &self.url)
            .field("closed", &self.closed)
            .field("replies", &self.replies)
            .finish()
    }
}

impl WebSocketTransport {
    pub async fn connect(settings: &MiddlewareSettings) -> Result<Self> {
        let url = settings.url.clone();
        let timeout = Duration::from_millis(settings.connect_timeout_ms);

        let (mut stream, _response) = tokio::time::timeout(timeout, connect_async(url.as_str()))
            .await
            .map_err(|_| {
                TalkerError::Init(format!(
                    "timed out connecting to {url} after {}ms",
                    settings.connect_timeout_ms
                ))
            })?
            .map_err(|e| TalkerError::Init(format!("cannot connect to {url}: {e}")))?;

        info!("Connected to middleware at {url}");

        if let (Some(username), Some(password)) = (&settings.username, &settings.password) {
            tokio::time::timeout(timeout, authenticate(&mut stream, &url, username, password))
                .await
                .map_err(|_| TalkerError::Init("timed out during authentication".to_string()))?
                .map_err(|e| match e {
                    TalkerError::Init(_) => e,
                    other => TalkerError::Init(format!("authentication failed: {other}")),
                })?;
        }

        let (sink, incoming) = stream.split();
        let replies = Arc::new(ReplyState::default());
        let reader = tokio::spawn(read_replies(incoming, url.clone(), replies.clone()));

        Ok(Self {
            sink,
            reader: Some(reader),
            replies,
            url,
            timeout,
            closed: false,
        })
    }

    /// Number of `error` replies the broker has sent since the connection opened.
    pub fn rejected(&self) -> u64 {
        self.replies.rejected.load(Ordering::SeqCst)
    }

    /// True once the broker closed the connection or the socket failed.
    pub fn peer_closed(&self) -> bool {
        self.replies.peer_closed.load(Ordering::SeqCst)
    }
}

impl Drop for WebSocketTransport {
    fn drop(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }
}

async fn send_frame(stream: &mut WsStream, frame: &ClientMessage) -> Result<()> {
    let text = serde_json::to_string(frame)?;
    stream.send(WsMessage::Text(text.into())).await?;
    Ok(())
}

async fn authenticate(
    stream: &mut WsStream,
    url: &str,
    username: &str,
    password: &str,
) -> Result<()> {
    send_frame(
        stream,
        &ClientMessage::Login {
            username: username.to_string(),
            password: password.to_string(),
        },
    )
    .await?;

    let token = match next_server_message(stream).await? {
        ServerMessage::LoginResponse { token } => token,
        ServerMessage::Error { message } => {
            return Err(TalkerError::Init(format!("login rejected: {message}")));
        }
        other => {
            return Err(TalkerError::Init(format!(
                "unexpected reply to login: {other:?}"
            )));
        }
    };
    debug!("Received session token from {url}");

    send_frame(stream, &ClientMessage::Auth { token }).await?;

    match next_server_message(stream).await? {
        ServerMessage::Authenticated {} => {
            info!("Authenticated as {username}");
            Ok(())
        }
        ServerMessage::Error { message } => {
            Err(TalkerError::Init(format!("auth rejected: {message}")))
        }
        other => Err(TalkerError::Init(format!(
            "unexpected reply to auth: {other:?}"
        ))),
    }
}

async fn next_server_message(stream: &mut WsStream) -> Result<ServerMessage> {
    while let Some(msg) = stream.next().await {
        match msg? {
            WsMessage::Text(text) => return Ok(serde_json::from_str(&text)?),
            WsMessage::Close(_) => break,
            _ => continue,
        }
    }
    Err(TalkerError::Init(
        "connection closed during handshake".to_string(),
    ))
}

/// Drains the incoming half of the socket until the broker goes away.
async fn read_replies(
    mut incoming: SplitStream<WsStream>,
    url: String,
    replies: Arc<ReplyState>,
) {
    while let Some(msg) = incoming.next().await {
        match msg {
            Ok(WsMessage::Text(text)) => match serde_json::from_str::<ServerMessage>(&text) {
                Ok(ServerMessage::Error { message }) => {
                    replies.rejected.fetch_add(1, Ordering::SeqCst);
                    warn!("Broker at {url} rejected a frame: {message}");
                }
                Ok(other) => debug!("Broker at {url} sent {other:?}"),
                Err(e) => warn!("Unreadable frame from {url}: {e}"),
            },
            Ok(WsMessage::Close(frame)) => {
                // Keep polling so the close reply is flushed; the stream ends after it.
                replies.peer_closed.store(true, Ordering::SeqCst);
                info!("Broker at {url} closed the connection: {frame:?}");
            }
            Ok(_) => {}
            Err(tungstenite::Error::ConnectionClosed) => break,
            Err(e) => {
                warn!("Connection to {url} failed: {e}");
                break;
            }
        }
    }
    replies.peer_closed.store(true, Ordering::SeqCst);
}

impl Transport for WebSocketTransport {
    async fn send(&mut self, frame: ClientMessage) -> Result<()> {
        if self.closed || self.peer_closed() {
            return Err(TalkerError::Transport(format!(
                "connection to {} is closed",
                self.url
            )));
        }
        let text = serde_json::to_string(&frame)?;
        tokio::time::timeout(self.timeout, self.sink.send(WsMessage::Text(text.into())))
            .await
            .map_err(|_| {
                TalkerError::Transport(format!(
                    "send to {} timed out after {}ms",
                    self.url,
                    self.timeout.as_millis()
                ))
            })??;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        // The broker already ended the session; there is nobody left to answer.
        if self.peer_closed() {
            if let Some(reader) = self.reader.take() {
                reader.abort();
            }
            return Ok(());
        }

        let closed = match tokio::time::timeout(self.timeout, self.sink.close()).await {
            Ok(Ok(()))
            | Ok(Err(tungstenite::Error::ConnectionClosed))
            | Ok(Err(tungstenite::Error::AlreadyClosed)) => Ok(()),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => {
                warn!("Closing handshake with {} timed out", self.url);
                Ok(())
            }
        };

        // Give the broker a moment to answer the close, then stop listening.
        if let Some(mut reader) = self.reader.take() {
            if tokio::time::timeout(self.timeout, &mut reader).await.is_err() {
                reader.abort();
            }
        }
        closed
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}
