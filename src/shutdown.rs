//! Graceful shutdown coordinator.
//!
//! Listens for SIGINT (Ctrl+C), SIGTERM and SIGHUP, then cancels a
//! [`CancellationToken`] so the catalog fetch or the download loop stops
//! at its next checkpoint. A second signal force-exits.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

/// Exit status used when the user insists on stopping immediately.
const FORCE_EXIT_CODE: i32 = 130;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SignalAction {
    Cancel,
    ForceExit,
}

/// Counts delivered signals; the first cancels, any later one forces exit.
#[derive(Debug, Clone)]
struct SignalLatch {
    count: Arc<AtomicU32>,
    token: CancellationToken,
}

impl SignalLatch {
    fn new(token: CancellationToken) -> Self {
        Self {
            count: Arc::new(AtomicU32::new(0)),
            token,
        }
    }

    fn on_signal(&self) -> SignalAction {
        if self.count.fetch_add(1, Ordering::SeqCst) == 0 {
            self.token.cancel();
            SignalAction::Cancel
        } else {
            SignalAction::ForceExit
        }
    }
}

/// Wait for the next shutdown signal of any supported kind.
#[cfg(unix)]
async fn next_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match (
        signal(SignalKind::terminate()),
        signal(SignalKind::hangup()),
    ) {
        (Ok(mut sigterm), Ok(mut sighup)) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = sigterm.recv() => {}
                _ = sighup.recv() => {}
            }
        }
        _ => {
            tracing::debug!("SIGTERM/SIGHUP unavailable, listening for Ctrl+C only");
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn next_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

/// Install signal handlers and return a [`CancellationToken`] that is
/// cancelled on the first SIGINT / SIGTERM / SIGHUP.
pub(crate) fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let latch = SignalLatch::new(token.clone());

    tokio::spawn(async move {
        loop {
            next_signal().await;
            match latch.on_signal() {
                SignalAction::Cancel => {
                    tracing::info!("Received shutdown signal, finishing the current song...");
                    tracing::info!("Press Ctrl+C again to force exit");
                }
                SignalAction::ForceExit => {
                    tracing::warn!("Force exit requested");
                    std::process::exit(FORCE_EXIT_CODE);
                }
            }
        }
    });

    token
}
