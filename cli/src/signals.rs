//! Process signals
//!
//! The first Ctrl-C or SIGTERM cancels the root token; a second one during
//! shutdown exits immediately with status 130.

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub const FORCED_EXIT_CODE: i32 = 130;

pub async fn watch(cancel: CancellationToken) {
    tokio::select! {
        _ = wait_for_signal() => {
            info!("Shutdown signal received");
            cancel.cancel();
        }
        _ = cancel.cancelled() => {}
    }

    wait_for_signal().await;
    warn!("Second signal received, exiting immediately");
    std::process::exit(FORCED_EXIT_CODE);
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut terminate) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = terminate.recv() => {}
            }
        }
        Err(e) => {
            warn!(error = %e, "Cannot listen for SIGTERM, Ctrl-C only");
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
