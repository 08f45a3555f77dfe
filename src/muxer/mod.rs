//! Muxer traits and implementations
//!
//! Combining separately fetched video and audio elementary streams into one
//! container is delegated to an external tool. The trait keeps the pipeline
//! testable and lets the system degrade gracefully when no tool is present.

mod cli;
mod noop;

pub use cli::FfmpegMuxer;
pub use noop::NoOpMuxer;

use async_trait::async_trait;
use std::path::Path;

/// Capabilities of a muxer implementation
#[derive(Debug, Clone, Copy)]
pub struct MuxerCapabilities {
    /// Can combine a video-only and an audio-only stream into one file
    pub can_mux: bool,
}

/// Trait for merging elementary streams into a single container file
///
/// Implementations either produce the output file or fail; they never
/// re-encode. The job pipeline checks [`Muxer::capabilities`] before
/// fetching anything, so a merge-path job against an unavailable muxer
/// fails cheaply.
///
/// # Examples
///
/// ```no_run
/// use vidmux_dl::muxer::{FfmpegMuxer, Muxer};
/// use std::path::Path;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let muxer = FfmpegMuxer::from_path().expect("ffmpeg not found");
/// muxer
///     .mux(
///         Path::new("video_1.mp4"),
///         Path::new("audio_1.mp4"),
///         Path::new("output_1.mp4"),
///     )
///     .await?;
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait Muxer: Send + Sync {
    /// Mux `video` and `audio` into `output`
    ///
    /// # Errors
    ///
    /// Returns an error if the external tool cannot be executed, exits
    /// nonzero, or the operation is not supported. The diagnostic text
    /// includes the tool's exit code and stderr tail.
    async fn mux(&self, video: &Path, audio: &Path, output: &Path) -> crate::Result<()>;

    /// Query capabilities of this muxer
    fn capabilities(&self) -> MuxerCapabilities;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
