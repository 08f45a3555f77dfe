//! Core downloader implementation split into focused submodules.
//!
//! The `VideoDownloader` struct and its methods are organized by domain:
//! - [`job_task`] - Per-job pipeline execution
//! - [`lifecycle`] - Shutdown coordination
//! - [`services`] - Retention sweeper background service

mod job_task;
mod lifecycle;
mod services;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use crate::artifact::{ArtifactStore, ArtifactStream};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::muxer::{FfmpegMuxer, Muxer, NoOpMuxer};
use crate::progress::ProgressPublisher;
use crate::provider::{HttpStreamProvider, StreamProvider};
use crate::store::JobStore;
use crate::types::{Capabilities, Event, Job, JobId, JobStatus, Quality};

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, Semaphore, broadcast};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Job execution state shared across facade clones
#[derive(Clone)]
pub(crate) struct JobState {
    /// Supervised handles of spawned job tasks, so tests can await
    /// completion and shutdown can drain in-flight work
    pub(crate) active_jobs: Arc<Mutex<HashMap<JobId, JoinHandle<()>>>>,
    /// Semaphore bounding concurrent job execution
    /// (respects max_concurrent_jobs config)
    pub(crate) concurrent_limit: Arc<Semaphore>,
    /// Flag cleared during shutdown so new submissions are rejected
    pub(crate) accepting_new: Arc<AtomicBool>,
    /// Token stopping the retention sweeper on shutdown
    pub(crate) sweeper_token: CancellationToken,
}

/// Main downloader instance (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct VideoDownloader {
    /// Job registry. Public for integration tests to query job status
    pub store: JobStore,
    /// Artifact lifecycle manager
    pub(crate) artifacts: ArtifactStore,
    /// Stream enumeration and retrieval collaborator
    pub(crate) provider: Arc<dyn StreamProvider>,
    /// Stream merging collaborator
    pub(crate) muxer: Arc<dyn Muxer>,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: broadcast::Sender<Event>,
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Job execution state
    pub(crate) job_state: JobState,
    /// Status snapshot publisher for progress subscriptions
    pub(crate) publisher: ProgressPublisher,
}

impl VideoDownloader {
    /// Create a new VideoDownloader instance with real collaborators
    ///
    /// The stream provider talks plain HTTP; the muxer is resolved from the
    /// tools config: an explicit `ffmpeg_path` wins, otherwise PATH is
    /// searched when `search_path` is set, otherwise merging is reported
    /// unavailable and merge-path jobs fail fast.
    pub async fn new(config: Config) -> Result<Self> {
        let provider: Arc<dyn StreamProvider> = Arc::new(HttpStreamProvider::new()?);

        let muxer: Arc<dyn Muxer> = if let Some(ref ffmpeg_path) = config.tools.ffmpeg_path {
            Arc::new(FfmpegMuxer::new(ffmpeg_path.clone()))
        } else if config.tools.search_path {
            FfmpegMuxer::from_path()
                .map(|m| Arc::new(m) as Arc<dyn Muxer>)
                .unwrap_or_else(|| Arc::new(NoOpMuxer))
        } else {
            Arc::new(NoOpMuxer)
        };

        Self::with_collaborators(config, provider, muxer).await
    }

    /// Create a VideoDownloader with injected collaborators
    ///
    /// This is the seam tests and embedders use to substitute the stream
    /// provider or muxer.
    pub async fn with_collaborators(
        config: Config,
        provider: Arc<dyn StreamProvider>,
        muxer: Arc<dyn Muxer>,
    ) -> Result<Self> {
        // Ensure artifact and temp directories exist
        tokio::fs::create_dir_all(&config.download.artifact_dir)
            .await
            .map_err(|e| {
                Error::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create artifact directory '{}': {}",
                        config.download.artifact_dir.display(),
                        e
                    ),
                ))
            })?;
        tokio::fs::create_dir_all(&config.download.temp_dir)
            .await
            .map_err(|e| {
                Error::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create temp directory '{}': {}",
                        config.download.temp_dir.display(),
                        e
                    ),
                ))
            })?;

        // Create broadcast channel with buffer size of 1000 events
        // This allows multiple subscribers to receive all events independently
        let (event_tx, _rx) = broadcast::channel(1000);

        let store = JobStore::new();
        let artifacts = ArtifactStore::new(config.download.artifact_dir.clone());
        let publisher = ProgressPublisher::new(store.clone(), config.progress.poll_interval());

        let job_state = JobState {
            active_jobs: Arc::new(Mutex::new(HashMap::new())),
            concurrent_limit: Arc::new(Semaphore::new(config.download.max_concurrent_jobs)),
            accepting_new: Arc::new(AtomicBool::new(true)),
            sweeper_token: CancellationToken::new(),
        };

        tracing::info!(
            muxer = muxer.name(),
            provider = provider.name(),
            can_mux = muxer.capabilities().can_mux,
            "Downloader initialized"
        );

        Ok(Self {
            store,
            artifacts,
            provider,
            muxer,
            event_tx,
            config: Arc::new(config),
            job_state,
            publisher,
        })
    }

    /// Submit a new job
    ///
    /// Validates the locator, registers a pending job record, launches the
    /// job task, and returns the id immediately; the caller observes
    /// progress through [`VideoDownloader::progress_stream`].
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` for an unparsable source URL and
    /// `Error::ShuttingDown` once shutdown has begun.
    pub async fn submit(&self, source_url: &str, quality: Quality) -> Result<JobId> {
        if !self.job_state.accepting_new.load(Ordering::SeqCst) {
            return Err(Error::ShuttingDown);
        }

        url::Url::parse(source_url)
            .map_err(|e| Error::Validation(format!("invalid source URL '{}': {}", source_url, e)))?;

        let id = JobId::generate();
        self.store
            .create(id.clone(), quality.clone(), source_url)
            .ok_or_else(|| Error::Other(format!("job id collision: {}", id)))?;

        tracing::info!(job_id = %id, quality = %quality, url = %source_url, "Job submitted");
        self.emit_event(Event::Queued {
            id: id.clone(),
            quality: quality.to_string(),
        });

        let ctx = job_task::JobTaskContext {
            id: id.clone(),
            store: self.store.clone(),
            artifacts: self.artifacts.clone(),
            provider: self.provider.clone(),
            muxer: self.muxer.clone(),
            event_tx: self.event_tx.clone(),
            config: self.config.clone(),
            concurrent_limit: self.job_state.concurrent_limit.clone(),
        };

        // Hold the map lock across spawn + insert so the task's own removal
        // (which takes the same lock) cannot run before the insert
        let active_jobs = self.job_state.active_jobs.clone();
        let mut jobs = self.job_state.active_jobs.lock().await;
        let task_id = id.clone();
        let handle = tokio::spawn(async move {
            job_task::run_job_task(ctx).await;
            active_jobs.lock().await.remove(&task_id);
        });
        jobs.insert(id.clone(), handle);
        drop(jobs);

        Ok(id)
    }

    /// Look up a job snapshot by id
    pub fn job(&self, id: &JobId) -> Option<Job> {
        self.store.get(id)
    }

    /// Snapshot all tracked jobs, newest first
    pub fn list_jobs(&self) -> Vec<Job> {
        self.store.list()
    }

    /// Subscribe to a job's status snapshots
    ///
    /// The stream ends after the terminal snapshot; see
    /// [`ProgressPublisher::subscribe`] for the exact contract. Callers
    /// needing existence errors check [`VideoDownloader::job`] first.
    pub fn progress_stream(
        &self,
        id: JobId,
    ) -> impl futures::Stream<Item = JobStatus> + Send + 'static {
        self.publisher.subscribe(id)
    }

    /// Whether a finished, unclaimed artifact exists for `id`
    pub fn has_artifact(&self, id: &JobId) -> bool {
        matches!(
            self.store.status(id),
            Some(JobStatus::Done)
        ) && self.artifacts.exists(id)
    }

    /// Retrieve a finished artifact as a byte stream
    ///
    /// Hands ownership of the file to the returned stream: the job record is
    /// dropped from the registry and the file is deleted when the stream is,
    /// so retrieval succeeds at most once per job.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the job is unknown, not yet `Done`, or
    /// its artifact was already claimed.
    pub async fn retrieve_artifact(&self, id: &JobId) -> Result<ArtifactStream> {
        match self.store.status(id) {
            Some(JobStatus::Done) => {}
            _ => return Err(Error::NotFound(format!("artifact for job {}", id))),
        }

        let stream = self.artifacts.retrieve(id).await?;

        // GC after retrieval: the job is never referenced again
        self.store.remove(id);
        self.emit_event(Event::ArtifactRetrieved { id: id.clone() });
        tracing::info!(job_id = %id, "Artifact handed out");

        Ok(stream)
    }

    /// Await completion of a job's task
    ///
    /// Returns immediately if the task already finished. Primarily a test
    /// and shutdown aid; jobs always run to a terminal state on their own.
    pub async fn wait_for_job(&self, id: &JobId) {
        let handle = self.job_state.active_jobs.lock().await.remove(id);
        if let Some(handle) = handle {
            handle.await.ok();
        }
    }

    /// Subscribe to job lifecycle events
    ///
    /// Multiple subscribers are supported. Each subscriber receives all
    /// events independently; a subscriber lagging more than 1000 events
    /// behind receives `RecvError::Lagged`.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Get the current configuration
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Query the current system capabilities
    ///
    /// Reports whether merging is available in this environment, so clients
    /// can anticipate `MergeUnavailable` failures before submitting.
    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            can_mux: self.muxer.capabilities().can_mux,
            muxer: self.muxer.name().to_string(),
            provider: self.provider.name().to_string(),
            video_only_fallback: self.config.download.video_only_fallback,
        }
    }

    /// Emit an event to all subscribers
    ///
    /// If there are no active subscribers the event is dropped.
    pub(crate) fn emit_event(&self, event: Event) {
        self.event_tx.send(event).ok();
    }

    /// Spawn the REST API server in a background task
    ///
    /// The server runs concurrently with job processing and listens on the
    /// configured bind address (default: 127.0.0.1:6790).
    pub fn spawn_api_server(self: &Arc<Self>) -> JoinHandle<Result<()>> {
        let downloader = self.clone();
        let config = self.config.clone();

        tokio::spawn(async move { crate::api::start_api_server(downloader, config).await })
    }
}
