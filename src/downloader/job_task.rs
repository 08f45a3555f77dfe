//! Job task execution — the per-job pipeline from `Pending` to a terminal
//! state.
//!
//! Phases:
//! 1. Resolve the available streams for the job's source locator
//! 2. Run the selection policy
//! 3. No-merge path: fetch the single stream straight to the artifact path
//! 4. Merge path: fetch video and audio concurrently to job-scoped temp
//!    files, then mux into the artifact path
//! 5. Remove temporary files on every path, success or failure
//!
//! Every failure is folded into a terminal `Failed` status at the task
//! boundary; nothing escapes to crash the process.

use crate::artifact::ArtifactStore;
use crate::config::Config;
use crate::error::JobError;
use crate::muxer::Muxer;
use crate::progress::{JobProgressSink, MuxProgress};
use crate::provider::{ProgressSink, StreamDescriptor, StreamProvider};
use crate::selector::{StreamSelection, select_streams};
use crate::store::JobStore;
use crate::types::{Event, JobId, JobStatus};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Semaphore, broadcast};

/// Everything a job task needs, cloned out of the facade at submission
pub(crate) struct JobTaskContext {
    pub(crate) id: JobId,
    pub(crate) store: JobStore,
    pub(crate) artifacts: ArtifactStore,
    pub(crate) provider: Arc<dyn StreamProvider>,
    pub(crate) muxer: Arc<dyn Muxer>,
    pub(crate) event_tx: broadcast::Sender<Event>,
    pub(crate) config: Arc<Config>,
    pub(crate) concurrent_limit: Arc<Semaphore>,
}

/// Drive one job to its terminal state
pub(crate) async fn run_job_task(ctx: JobTaskContext) {
    let id = ctx.id.clone();

    // Bound concurrent execution; the job stays Pending while it waits
    let _permit = match ctx.concurrent_limit.clone().acquire_owned().await {
        Ok(permit) => permit,
        Err(_) => return, // semaphore closed, shutdown already underway
    };

    match execute(&ctx).await {
        Ok(()) => {
            ctx.store.update(&id, JobStatus::Done);
            tracing::info!(job_id = %id, "Job complete");
            ctx.event_tx.send(Event::Done { id }).ok();
        }
        Err(err) => {
            tracing::warn!(job_id = %id, error = %err, "Job failed");
            ctx.store.update(&id, JobStatus::failed(&err));
            ctx.event_tx
                .send(Event::Failed {
                    id,
                    message: err.to_string(),
                })
                .ok();
        }
    }
}

/// The pipeline proper; any error becomes the job's failure reason
async fn execute(ctx: &JobTaskContext) -> Result<(), JobError> {
    let job = ctx
        .store
        .get(&ctx.id)
        .ok_or_else(|| JobError::Unexpected("job record missing".to_string()))?;

    let descriptors = ctx
        .provider
        .resolve(&job.source_locator)
        .await
        .map_err(|e| JobError::SourceUnavailable(e.to_string()))?;

    let selection = select_streams(&job.requested_quality, &descriptors)?;

    match selection {
        StreamSelection::Progressive(stream) => {
            tracing::debug!(job_id = %ctx.id, stream_id = %stream.id, "No-merge path");
            fetch_to_artifact(ctx, &stream).await
        }
        StreamSelection::MuxPair { video, audio } => {
            if !ctx.muxer.capabilities().can_mux {
                if ctx.config.download.video_only_fallback {
                    // Explicitly configured degradation: keep the video-only
                    // stream without audio
                    tracing::warn!(
                        job_id = %ctx.id,
                        "Muxer unavailable, keeping video-only stream"
                    );
                    return fetch_to_artifact(ctx, &video).await;
                }
                // Fail before any fetch; no bytes wasted on a job that
                // cannot finish
                return Err(JobError::MergeUnavailable);
            }
            tracing::debug!(
                job_id = %ctx.id,
                video_id = %video.id,
                audio_id = %audio.id,
                "Merge path"
            );
            fetch_and_mux(ctx, &video, &audio).await
        }
    }
}

/// No-merge path: one stream straight to the artifact path
async fn fetch_to_artifact(
    ctx: &JobTaskContext,
    stream: &StreamDescriptor,
) -> Result<(), JobError> {
    let dest = ctx.artifacts.path_for(&ctx.id);
    let sink = JobProgressSink::new(ctx.id.clone(), ctx.store.clone(), ctx.event_tx.clone());

    let result = fetch_with_timeout(ctx, stream, &dest, &sink).await;
    if result.is_err() {
        remove_file_if_present(&dest).await;
    }
    result
}

/// Merge path: concurrent fetches to job-scoped temp files, then mux
async fn fetch_and_mux(
    ctx: &JobTaskContext,
    video: &StreamDescriptor,
    audio: &StreamDescriptor,
) -> Result<(), JobError> {
    let video_path = temp_path(ctx, "video");
    let audio_path = temp_path(ctx, "audio");

    let progress = MuxProgress::new(ctx.id.clone(), ctx.store.clone(), ctx.event_tx.clone());
    let video_sink = progress.video_sink();
    let audio_sink = progress.audio_sink();

    let (video_result, audio_result) = tokio::join!(
        fetch_with_timeout(ctx, video, &video_path, &video_sink),
        fetch_with_timeout(ctx, audio, &audio_path, &audio_sink),
    );

    if let Err(err) = video_result.and(audio_result) {
        // Partially-downloaded temp files must never outlive the job
        remove_file_if_present(&video_path).await;
        remove_file_if_present(&audio_path).await;
        return Err(err);
    }

    let output = ctx.artifacts.path_for(&ctx.id);
    let mux_result = match tokio::time::timeout(
        ctx.config.download.merge_timeout(),
        ctx.muxer.mux(&video_path, &audio_path, &output),
    )
    .await
    {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(JobError::MergeFailed(e.to_string())),
        Err(_) => Err(JobError::MergeFailed("timeout".to_string())),
    };

    // Temp inputs are removed regardless of the merge outcome
    remove_file_if_present(&video_path).await;
    remove_file_if_present(&audio_path).await;

    if mux_result.is_err() {
        remove_file_if_present(&output).await;
    }
    mux_result
}

/// Fetch one stream with the configured timeout
async fn fetch_with_timeout(
    ctx: &JobTaskContext,
    stream: &StreamDescriptor,
    dest: &Path,
    sink: &dyn ProgressSink,
) -> Result<(), JobError> {
    match tokio::time::timeout(
        ctx.config.download.fetch_timeout(),
        ctx.provider.fetch(stream, dest, sink),
    )
    .await
    {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(JobError::FetchFailed(e.to_string())),
        Err(_) => Err(JobError::FetchFailed("timeout".to_string())),
    }
}

/// Temp file path scoped by job id, so concurrent jobs never collide
fn temp_path(ctx: &JobTaskContext, prefix: &str) -> PathBuf {
    ctx.config
        .download
        .temp_dir
        .join(format!("{}_{}.mp4", prefix, ctx.id))
}

async fn remove_file_if_present(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove file");
        }
    }
}
