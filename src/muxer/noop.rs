//! No-op muxer for graceful degradation

use super::{Muxer, MuxerCapabilities};
use async_trait::async_trait;
use std::path::Path;

/// No-op muxer used when no external ffmpeg binary is available
///
/// Reports `can_mux: false` so the job pipeline can fail merge-path jobs
/// before fetching anything (or degrade to video-only output when that is
/// explicitly configured). Calling [`Muxer::mux`] on it returns
/// `Error::NotSupported`.
///
/// # Examples
///
/// ```
/// use vidmux_dl::muxer::{Muxer, NoOpMuxer};
/// use std::path::Path;
///
/// # #[tokio::main]
/// # async fn main() {
/// let muxer = NoOpMuxer;
/// assert!(!muxer.capabilities().can_mux);
///
/// let result = muxer
///     .mux(Path::new("v.mp4"), Path::new("a.mp4"), Path::new("o.mp4"))
///     .await;
/// assert!(result.is_err());
/// # }
/// ```
pub struct NoOpMuxer;

#[async_trait]
impl Muxer for NoOpMuxer {
    async fn mux(&self, _video: &Path, _audio: &Path, _output: &Path) -> crate::Result<()> {
        Err(crate::Error::NotSupported(
            "stream merging requires an external ffmpeg binary. \
             Configure ffmpeg_path in config or ensure ffmpeg is in PATH."
                .into(),
        ))
    }

    fn capabilities(&self) -> MuxerCapabilities {
        MuxerCapabilities { can_mux: false }
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}
