//! Shared fixtures for downloader and API tests.

use crate::config::Config;
use crate::downloader::VideoDownloader;
use crate::error::Error;
use crate::muxer::{Muxer, MuxerCapabilities};
use crate::provider::{ProgressSink, StreamDescriptor, StreamKind, StreamProvider};
use crate::types::{JobId, JobStatus};

use async_trait::async_trait;
use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

/// Chunks written per fake stream, so sinks see intermediate progress
const FAKE_CHUNKS: usize = 4;

pub(crate) fn progressive(id: &str, resolution: &str) -> StreamDescriptor {
    StreamDescriptor {
        id: id.to_string(),
        container: "mp4".to_string(),
        resolution: Some(resolution.to_string()),
        kind: StreamKind::Progressive,
        size_bytes: Some(64),
        source_url: format!("fake://stream/{}", id),
    }
}

pub(crate) fn video_only(id: &str, resolution: &str) -> StreamDescriptor {
    StreamDescriptor {
        id: id.to_string(),
        container: "mp4".to_string(),
        resolution: Some(resolution.to_string()),
        kind: StreamKind::VideoOnly,
        size_bytes: Some(64),
        source_url: format!("fake://stream/{}", id),
    }
}

pub(crate) fn audio_only(id: &str) -> StreamDescriptor {
    StreamDescriptor {
        id: id.to_string(),
        container: "mp4".to_string(),
        resolution: None,
        kind: StreamKind::AudioOnly,
        size_bytes: Some(64),
        source_url: format!("fake://stream/{}", id),
    }
}

/// In-memory stream provider with scriptable failures and jitter
pub(crate) struct FakeStreamProvider {
    descriptors: Vec<StreamDescriptor>,
    resolve_error: Option<String>,
    fail_fetch_of: Option<String>,
    max_jitter: Duration,
    hasher: RandomState,
    fetches: Mutex<Vec<String>>,
}

impl FakeStreamProvider {
    pub(crate) fn new(descriptors: Vec<StreamDescriptor>) -> Self {
        Self {
            descriptors,
            resolve_error: None,
            fail_fetch_of: None,
            max_jitter: Duration::ZERO,
            hasher: RandomState::new(),
            fetches: Mutex::new(Vec::new()),
        }
    }

    /// Make `resolve` fail with `message`
    pub(crate) fn failing_resolve(message: &str) -> Self {
        let mut provider = Self::new(Vec::new());
        provider.resolve_error = Some(message.to_string());
        provider
    }

    /// Make fetching the stream with this id fail
    pub(crate) fn with_fetch_error(mut self, stream_id: &str) -> Self {
        self.fail_fetch_of = Some(stream_id.to_string());
        self
    }

    /// Sleep a pseudo-random amount (bounded by `max`) before each fetch
    pub(crate) fn with_jitter(mut self, max: Duration) -> Self {
        self.max_jitter = max;
        self
    }

    /// Stream ids fetched so far, in call order
    pub(crate) fn fetched(&self) -> Vec<String> {
        self.fetches.lock().unwrap().clone()
    }
}

#[async_trait]
impl StreamProvider for FakeStreamProvider {
    async fn resolve(&self, _locator: &str) -> crate::Result<Vec<StreamDescriptor>> {
        if let Some(ref message) = self.resolve_error {
            return Err(Error::Other(message.clone()));
        }
        Ok(self.descriptors.clone())
    }

    async fn fetch(
        &self,
        descriptor: &StreamDescriptor,
        dest: &Path,
        sink: &dyn ProgressSink,
    ) -> crate::Result<()> {
        if !self.max_jitter.is_zero() {
            let mut hasher = self.hasher.build_hasher();
            descriptor.id.hash(&mut hasher);
            dest.hash(&mut hasher);
            let jitter_ms = hasher.finish() % (self.max_jitter.as_millis().max(1) as u64);
            tokio::time::sleep(Duration::from_millis(jitter_ms)).await;
        }

        self.fetches.lock().unwrap().push(descriptor.id.clone());

        if self.fail_fetch_of.as_deref() == Some(descriptor.id.as_str()) {
            // Leave a partial file behind, exactly like an interrupted
            // transfer would
            tokio::fs::write(dest, b"partial").await?;
            return Err(Error::Other(format!(
                "connection reset while fetching {}",
                descriptor.id
            )));
        }

        let total = descriptor.size_bytes.unwrap_or(64);
        let chunk = vec![0xAB_u8; (total as usize) / FAKE_CHUNKS];
        let mut written: u64 = 0;
        let mut file = Vec::new();
        for _ in 0..FAKE_CHUNKS {
            file.extend_from_slice(&chunk);
            written += chunk.len() as u64;
            sink.report(written, Some(total));
            tokio::task::yield_now().await;
        }
        tokio::fs::write(dest, &file).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// Muxer double that records invocations and optionally fails or is absent
pub(crate) struct RecordingMuxer {
    calls: Mutex<Vec<(PathBuf, PathBuf, PathBuf)>>,
    fail_with: Option<String>,
    available: bool,
}

impl RecordingMuxer {
    pub(crate) fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_with: None,
            available: true,
        }
    }

    /// Simulate a muxer that exits nonzero with this diagnostic
    pub(crate) fn failing(diagnostic: &str) -> Self {
        let mut muxer = Self::new();
        muxer.fail_with = Some(diagnostic.to_string());
        muxer
    }

    /// Simulate an environment without any muxer
    pub(crate) fn unavailable() -> Self {
        let mut muxer = Self::new();
        muxer.available = false;
        muxer
    }

    pub(crate) fn calls(&self) -> Vec<(PathBuf, PathBuf, PathBuf)> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Muxer for RecordingMuxer {
    async fn mux(&self, video: &Path, audio: &Path, output: &Path) -> crate::Result<()> {
        self.calls.lock().unwrap().push((
            video.to_path_buf(),
            audio.to_path_buf(),
            output.to_path_buf(),
        ));

        if let Some(ref diagnostic) = self.fail_with {
            return Err(Error::ExternalTool(diagnostic.clone()));
        }

        let video_bytes = tokio::fs::read(video).await?;
        let audio_bytes = tokio::fs::read(audio).await?;
        let mut muxed = video_bytes;
        muxed.extend_from_slice(&audio_bytes);
        tokio::fs::write(output, muxed).await?;
        Ok(())
    }

    fn capabilities(&self) -> MuxerCapabilities {
        MuxerCapabilities {
            can_mux: self.available,
        }
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// Config pointing all directories into a scratch dir, with fast polling
pub(crate) fn test_config(temp_dir: &tempfile::TempDir) -> Config {
    let mut config = Config::default();
    config.download.artifact_dir = temp_dir.path().join("artifacts");
    config.download.temp_dir = temp_dir.path().join("temp");
    config.download.fetch_timeout_secs = 10;
    config.download.merge_timeout_secs = 10;
    config.progress.poll_interval_ms = 5;
    config
}

/// Build a downloader over the given doubles, rooted in a fresh scratch dir
pub(crate) async fn create_test_downloader(
    provider: Arc<FakeStreamProvider>,
    muxer: Arc<RecordingMuxer>,
) -> (VideoDownloader, tempfile::TempDir) {
    let temp_dir = tempfile::tempdir().expect("failed to create scratch dir");
    let config = test_config(&temp_dir);
    let downloader = VideoDownloader::with_collaborators(config, provider, muxer)
        .await
        .expect("failed to build downloader");
    (downloader, temp_dir)
}

/// Await the job task and return its terminal status
pub(crate) async fn wait_terminal(downloader: &VideoDownloader, id: &JobId) -> JobStatus {
    downloader.wait_for_job(id).await;
    downloader
        .store
        .status(id)
        .expect("job vanished before its status could be read")
}

/// Every entry left in the temp dir (ignoring the artifact dir)
pub(crate) fn leftover_temp_files(downloader: &VideoDownloader) -> Vec<PathBuf> {
    let temp_dir = &downloader.get_config().download.temp_dir;
    match std::fs::read_dir(temp_dir) {
        Ok(entries) => entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .collect(),
        Err(_) => Vec::new(),
    }
}
