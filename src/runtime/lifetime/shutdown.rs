use std::time::Duration;

use tokio::signal;
use tracing::{info, warn};

use crate::services::BackgroundTasks;

/// 等待 Ctrl+C 或 SIGTERM
pub async fn listen_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(
                "Failed to listen for Ctrl+C: {}. Proceeding with shutdown anyway.",
                e
            );
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
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

    info!("Shutdown signal received");
}

/// 停止接收后台任务并在 `grace` 内等待排空
pub async fn drain_background(background: &BackgroundTasks, grace: Duration) {
    info!("Draining background tasks (grace period {:?})...", grace);

    if !background.shutdown(grace).await {
        warn!("Some background tasks were abandoned during shutdown");
    }

    let dropped = background.dropped();
    if dropped > 0 {
        warn!("{} background task(s) were dropped during this run", dropped);
    }
}
