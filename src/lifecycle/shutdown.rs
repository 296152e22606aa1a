//! Signal handling for clean interruption
//!
//! An arbitration session interrupted by SIGTERM or SIGINT must still remove
//! the advisory marker before the process exits. The entry point races the
//! session against this signal; when the signal wins, the session future is
//! dropped and its lock guard runs.

use tokio::signal::unix::{signal, SignalKind};
use tracing::{debug, warn};

/// Resolves when the host or operator asks the hook to stop
pub struct ShutdownSignal;

impl ShutdownSignal {
    pub fn new() -> Self {
        Self
    }

    /// Wait for SIGTERM or SIGINT.
    pub async fn wait(&self) {
        match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => {
                        debug!("received SIGTERM");
                    }
                    _ = sigint.recv() => {
                        debug!("received SIGINT");
                    }
                }
            }
            _ => {
                // With no handlers registered the default disposition kills
                // the process anyway; waiting forever keeps the race in the
                // entry point well-defined.
                warn!("failed to register signal handlers");
                std::future::pending::<()>().await;
            }
        }
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}
