//! Stream provider traits and types
//!
//! The provider is the external collaborator that knows how to enumerate the
//! streams available for a source locator and how to download one of them to
//! local storage while reporting byte-level progress. The core treats it as
//! opaque; [`HttpStreamProvider`] is the bundled implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use utoipa::ToSchema;

mod http;

pub use http::HttpStreamProvider;

/// What a stream carries
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    /// Video and audio already combined in one container
    Progressive,
    /// Video elementary stream only
    VideoOnly,
    /// Audio elementary stream only
    AudioOnly,
}

/// One downloadable stream offered by a source
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StreamDescriptor {
    /// Provider-scoped stream identifier
    pub id: String,
    /// Container format (e.g., "mp4")
    pub container: String,
    /// Resolution label (e.g., "720p"); `None` for audio-only streams
    pub resolution: Option<String>,
    /// What the stream carries
    pub kind: StreamKind,
    /// Byte size, when the source declares it
    pub size_bytes: Option<u64>,
    /// Where the stream's bytes live
    pub source_url: String,
}

impl StreamDescriptor {
    /// Whether video and audio are already combined
    pub fn is_progressive(&self) -> bool {
        self.kind == StreamKind::Progressive
    }

    /// Whether this is a video-only elementary stream
    pub fn is_video_only(&self) -> bool {
        self.kind == StreamKind::VideoOnly
    }

    /// Whether this is an audio-only elementary stream
    pub fn is_audio_only(&self) -> bool {
        self.kind == StreamKind::AudioOnly
    }
}

/// Capability that receives byte-level transfer progress
///
/// Passed into [`StreamProvider::fetch`] so the provider's I/O loop stays
/// decoupled from the job store's concurrency discipline. Implementations
/// must be cheap and non-blocking; they are called once per received chunk.
pub trait ProgressSink: Send + Sync {
    /// Report cumulative transferred bytes against the total, when known
    fn report(&self, bytes_transferred: u64, total_bytes: Option<u64>);
}

/// No-op sink for fetches whose progress nobody observes
pub struct NullProgressSink;

impl ProgressSink for NullProgressSink {
    fn report(&self, _bytes_transferred: u64, _total_bytes: Option<u64>) {}
}

/// Trait for stream enumeration and retrieval
///
/// Implementations resolve a source locator into the set of streams the
/// source offers and download individual streams to local paths.
///
/// # Examples
///
/// ```no_run
/// use vidmux_dl::provider::{HttpStreamProvider, NullProgressSink, StreamProvider};
/// use std::path::Path;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let provider = HttpStreamProvider::new()?;
/// let streams = provider.resolve("https://example.com/video1.json").await?;
/// provider
///     .fetch(&streams[0], Path::new("/tmp/out.mp4"), &NullProgressSink)
///     .await?;
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait StreamProvider: Send + Sync {
    /// Enumerate the streams available for a source locator
    ///
    /// # Errors
    ///
    /// Returns an error if the locator is invalid, the source is
    /// unreachable, or its stream manifest cannot be parsed. The job
    /// pipeline folds any such error into `SourceUnavailable`.
    async fn resolve(&self, locator: &str) -> crate::Result<Vec<StreamDescriptor>>;

    /// Download one stream to `dest`, reporting progress through `sink`
    ///
    /// # Errors
    ///
    /// Returns an error on network or storage failure. The job pipeline
    /// folds any such error into `FetchFailed`; `dest` may contain partial
    /// data, which the caller is responsible for removing.
    async fn fetch(
        &self,
        descriptor: &StreamDescriptor,
        dest: &Path,
        sink: &dyn ProgressSink,
    ) -> crate::Result<()>;

    /// Human-readable name for logging and capability reporting
    fn name(&self) -> &'static str;
}
