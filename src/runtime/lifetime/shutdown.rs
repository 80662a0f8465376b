use std::time::Duration;

use tokio::signal;
use tracing::{info, warn};

use crate::services::SweeperHandle;

/// 等待 Ctrl+C 信号
pub async fn wait_for_ctrl_c() {
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received");
        }
        Err(e) => {
            warn!(
                "Failed to listen for Ctrl+C: {}. Proceeding with shutdown anyway.",
                e
            );
        }
    }
}

/// Stop the background sweeper, waiting at most `grace` for a running tick.
pub async fn perform_shutdown_tasks(sweeper: SweeperHandle, grace: Duration) {
    if sweeper.shutdown(grace).await {
        info!("All shutdown tasks completed successfully");
    } else {
        warn!(
            "Shutdown tasks did not finish within {} seconds",
            grace.as_secs()
        );
    }
}
