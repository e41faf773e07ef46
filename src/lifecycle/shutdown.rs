//! Shutdown coordination for a run.

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Coordinator for graceful shutdown.
///
/// Hands out clones of one cancellation token; the controller and the batch
/// in flight observe it.
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    token: CancellationToken,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token to pass to long-running tasks.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        self.token.cancel();
    }

    /// Trigger shutdown on the first Ctrl+C.
    pub fn listen_for_ctrl_c(&self) -> JoinHandle<()> {
        let token = self.token.clone();
        tokio::spawn(async move {
            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    match result {
                        Ok(()) => tracing::info!("Shutdown signal received, cancelling current batch"),
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
                            return;
                        }
                    }
                    token.cancel();
                }
                _ = token.cancelled() => {}
            }
        })
    }
}
