//! Background service starters — retention sweeping.

use super::VideoDownloader;

impl VideoDownloader {
    /// Start the retention sweeper background task
    ///
    /// On each sweep interval, terminal jobs whose completion is older than
    /// `download.job_retention_secs` are dropped from the registry along
    /// with any artifact nobody claimed. The task stops when shutdown
    /// cancels its token.
    pub fn start_retention_sweeper(&self) -> tokio::task::JoinHandle<()> {
        let downloader = self.clone();
        let token = self.job_state.sweeper_token.clone();
        let retention = downloader.config.download.job_retention();
        let sweep_interval = downloader.config.download.sweep_interval();

        tracing::info!(
            retention_secs = retention.as_secs(),
            sweep_interval_secs = sweep_interval.as_secs(),
            "Retention sweeper started"
        );

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(sweep_interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        tracing::debug!("Retention sweeper stopped");
                        return;
                    }
                    _ = interval.tick() => {
                        downloader.sweep_expired(retention).await;
                    }
                }
            }
        })
    }

    /// Drop expired terminal jobs and their unclaimed artifacts
    pub(crate) async fn sweep_expired(&self, retention: std::time::Duration) {
        for id in self.store.expired(retention) {
            match self.artifacts.remove(&id).await {
                Ok(removed) => {
                    if removed {
                        tracing::info!(job_id = %id, "Reclaimed unclaimed artifact");
                    }
                }
                Err(e) => {
                    tracing::warn!(job_id = %id, error = %e, "Failed to remove expired artifact");
                }
            }
            self.store.remove(&id);
            tracing::debug!(job_id = %id, "Expired job dropped from registry");
        }
    }
}
