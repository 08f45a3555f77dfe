//! Shutdown coordination.

use crate::error::Result;
use crate::types::Event;

use super::VideoDownloader;

/// Bound on how long shutdown waits for in-flight jobs
const DRAIN_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

impl VideoDownloader {
    /// Gracefully shut down the downloader
    ///
    /// Sequence:
    /// 1. Stop accepting new jobs (`submit` returns `ShuttingDown`)
    /// 2. Stop the retention sweeper
    /// 3. Drain in-flight job tasks, bounded by a 30 second timeout
    /// 4. Emit the shutdown event
    ///
    /// Jobs are never cancelled midway; they run to their terminal state or
    /// are abandoned when the drain timeout expires.
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Initiating graceful shutdown");

        self.job_state
            .accepting_new
            .store(false, std::sync::atomic::Ordering::SeqCst);
        tracing::info!("Stopped accepting new jobs");

        self.job_state.sweeper_token.cancel();

        let wait_result = tokio::time::timeout(DRAIN_TIMEOUT, self.drain_active_jobs()).await;
        match wait_result {
            Ok(drained) => {
                tracing::info!(jobs = drained, "All in-flight jobs reached a terminal state");
            }
            Err(_) => {
                tracing::warn!("Timeout waiting for jobs to complete, proceeding with shutdown");
            }
        }

        self.emit_event(Event::Shutdown);
        tracing::info!("Graceful shutdown complete");
        Ok(())
    }

    /// Await every tracked job task; returns how many were drained
    async fn drain_active_jobs(&self) -> usize {
        let handles: Vec<_> = {
            let mut jobs = self.job_state.active_jobs.lock().await;
            jobs.drain().collect()
        };

        let count = handles.len();
        for (id, handle) in handles {
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    tracing::warn!(job_id = %id, error = %e, "Job task ended abnormally");
                }
            }
        }
        count
    }
}
