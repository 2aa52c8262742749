//! Process-level driver shared by the `talker` binary and its tests.
//!
//! `run` picks the transport named in the settings, starts the talker, spins
//! it until `shutdown` resolves and maps the outcome onto the process exit
//! code: 0 after a clean shutdown, 1 when the middleware or the node could
//! not be initialized or the context failed while running.

use std::future::Future;
use std::process::ExitCode;

use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, error, info};

use crate::config::{Settings, TransportKind};
use crate::context::Context;
use crate::node::Talker;
use crate::transport::{ClientMessage, Transport};
use crate::utils::Result;

/// Runs the talker described by `settings` until `shutdown` resolves.
pub async fn run<F>(settings: &Settings, shutdown: F) -> ExitCode
where
    F: Future<Output = ()>,
{
    let result = match settings.middleware.transport {
        TransportKind::WebSocket => match Context::connect(&settings.middleware).await {
            Ok(context) => run_on(context, settings, shutdown).await,
            Err(e) => Err(e),
        },
        TransportKind::Loopback => {
            info!("Running without a broker (loopback transport)");
            let (context, frames) = Context::loopback();
            tokio::spawn(log_frames(frames));
            run_on(context, settings, shutdown).await
        }
    };

    exit_code(result)
}

pub(crate) fn exit_code(result: Result<u64>) -> ExitCode {
    match result {
        Ok(published) => {
            info!("Talker exited after publishing {published} messages");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Talker failed: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run_on<T, F>(context: Context<T>, settings: &Settings, shutdown: F) -> Result<u64>
where
    T: Transport,
    F: Future<Output = ()>,
{
    let mut talker = match Talker::start(&context, settings) {
        Ok(talker) => talker,
        Err(e) => {
            let _ = context.shutdown().await;
            return Err(e);
        }
    };

    let spun = talker.spin(shutdown).await;
    let closed = talker.shutdown().await;

    let published = spun?;
    closed?;
    Ok(published)
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

async fn log_frames(mut frames: UnboundedReceiver<ClientMessage>) {
    while let Some(frame) = frames.recv().await {
        if let ClientMessage::Publish { topic, payload, .. } = frame {
            debug!("[loopback] {topic}: {payload}");
        }
    }
}
