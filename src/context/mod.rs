//! Middleware context
//!
//! A [`Context`] is the process-wide handle to the middleware runtime. It owns
//! the transport, hands out nodes, and is released exactly once: either by an
//! explicit [`Context::shutdown`] or, on any other exit path, when the last
//! handle referring to it is dropped.
//!
//! Contexts and publishers register themselves in a process-wide counter so
//! that leaks show up in [`live_handles`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tokio::sync::Mutex;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{MiddlewareSettings, TransportKind};
use crate::transport::{ClientMessage, LoopbackTransport, Transport, WebSocketTransport};
use crate::utils::{Result, TalkerError};

static LIVE_HANDLES: AtomicUsize = AtomicUsize::new(0);

/// Number of contexts and publishers currently alive in this process.
pub fn live_handles() -> usize {
    LIVE_HANDLES.load(Ordering::SeqCst)
}

/// Counts itself in `LIVE_HANDLES` for as long as it exists.
#[derive(Debug)]
pub(crate) struct HandleGuard(());

impl HandleGuard {
    pub(crate) fn acquire() -> Self {
        LIVE_HANDLES.fetch_add(1, Ordering::SeqCst);
        HandleGuard(())
    }
}

impl Drop for HandleGuard {
    fn drop(&mut self) {
        LIVE_HANDLES.fetch_sub(1, Ordering::SeqCst);
    }
}

struct ContextInner<T: Transport> {
    id: String,
    transport: Mutex<Option<T>>,
    shut_down: AtomicBool,
    _guard: HandleGuard,
}

impl<T: Transport> Drop for ContextInner<T> {
    fn drop(&mut self) {
        if !self.shut_down.load(Ordering::SeqCst) {
            warn!(
                "Context {} dropped without shutdown; releasing transport",
                self.id
            );
        }
        debug!("Context {} released", self.id);
    }
}

/// Shared handle to the middleware. Cloning is cheap and refers to the same context.
pub struct Context<T: Transport> {
    inner: Arc<ContextInner<T>>,
}

impl<T: Transport> Clone for Context<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Transport> std::fmt::Debug for Context<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("id", &self.inner.id)
            .field("ok", &self.ok())
            .finish()
    }
}

impl Context<WebSocketTransport> {
    /// Connects to the broker described by `settings`.
    pub async fn connect(settings: &MiddlewareSettings) -> Result<Self> {
        if settings.transport != TransportKind::WebSocket {
            return Err(TalkerError::Init(format!(
                "middleware.transport is {:?}, not websocket",
                settings.transport
            )));
        }
        let transport = WebSocketTransport::connect(settings).await?;
        Ok(Self::with_transport(transport))
    }
}

impl Context<LoopbackTransport> {
    /// Context whose frames go into the returned receiver instead of a broker.
    pub fn loopback() -> (Self, UnboundedReceiver<ClientMessage>) {
        let (transport, rx) = LoopbackTransport::channel();
        (Self::with_transport(transport), rx)
    }
}

impl<T: Transport> Context<T> {
    pub fn with_transport(transport: T) -> Self {
        let id = Uuid::new_v4().to_string();
        info!("Context {id} initialized over {}", transport.describe());
        Self {
            inner: Arc::new(ContextInner {
                id,
                transport: Mutex::new(Some(transport)),
                shut_down: AtomicBool::new(false),
                _guard: HandleGuard::acquire(),
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// True until `shutdown` has been called on any handle to this context.
    pub fn ok(&self) -> bool {
        !self.inner.shut_down.load(Ordering::SeqCst)
    }

    /// Sends one frame through the context's transport.
    pub(crate) async fn send(&self, frame: ClientMessage) -> Result<()> {
        if !self.ok() {
            return Err(TalkerError::ContextShutdown);
        }
        let mut transport = self.inner.transport.lock().await;
        match transport.as_mut() {
            Some(transport) => transport.send(frame).await,
            None => Err(TalkerError::ContextShutdown),
        }
    }

    /// Closes the transport. Safe to call more than once; only the first call
    /// does any work.
    pub async fn shutdown(&self) -> Result<()> {
        if self.inner.shut_down.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let transport = self.inner.transport.lock().await.take();
        if let Some(mut transport) = transport {
            transport.close().await?;
            info!("Context {} shut down", self.inner.id);
        }
        Ok(())
    }
}
