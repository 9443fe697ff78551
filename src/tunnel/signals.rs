// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Turns SIGINT/SIGTERM into a cancelled stop token.

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Spawn the task that cancels `stop` on the first interrupt or termination signal.
///
/// The task ends on its own once `stop` is cancelled from elsewhere.
pub fn spawn_shutdown_listener(stop: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = stop.cancelled() => {}
            received = wait_for_signal() => match received {
                Ok(name) => {
                    info!("{} received, closing tunnel", name);
                    stop.cancel();
                }
                Err(e) => warn!("Failed to listen for shutdown signals: {}", e),
            },
        }
    })
}

#[cfg(unix)]
async fn wait_for_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;

    tokio::select! {
        received = tokio::signal::ctrl_c() => received.map(|_| "SIGINT"),
        _ = sigterm.recv() => Ok("SIGTERM"),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await.map(|_| "Ctrl+C")
}
