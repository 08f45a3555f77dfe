//! CLI-based muxer using an external ffmpeg binary

use super::{Muxer, MuxerCapabilities};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// How much stderr to keep in merge diagnostics
const STDERR_TAIL_BYTES: usize = 512;

/// CLI-based muxer executing the external `ffmpeg` binary
///
/// Streams are copied, not re-encoded: the video track is passed through
/// (`-c:v copy`) and the audio track is written as AAC.
///
/// # Examples
///
/// ```no_run
/// use vidmux_dl::muxer::FfmpegMuxer;
/// use std::path::PathBuf;
///
/// // Create with explicit path
/// let muxer = FfmpegMuxer::new(PathBuf::from("/usr/bin/ffmpeg"));
///
/// // Or auto-discover from PATH
/// let muxer = FfmpegMuxer::from_path().expect("ffmpeg not found in PATH");
/// ```
pub struct FfmpegMuxer {
    binary_path: PathBuf,
}

impl FfmpegMuxer {
    /// Create a new muxer with an explicit binary path
    pub fn new(binary_path: PathBuf) -> Self {
        Self { binary_path }
    }

    /// Attempt to find ffmpeg in PATH
    ///
    /// Uses the `which` crate to search the system PATH.
    ///
    /// # Returns
    ///
    /// `Some(FfmpegMuxer)` if the binary is found, `None` otherwise.
    pub fn from_path() -> Option<Self> {
        which::which("ffmpeg").ok().map(Self::new)
    }
}

#[async_trait]
impl Muxer for FfmpegMuxer {
    async fn mux(&self, video: &Path, audio: &Path, output: &Path) -> crate::Result<()> {
        let result = Command::new(&self.binary_path)
            .arg("-y")
            .arg("-nostdin")
            .arg("-i")
            .arg(video)
            .arg("-i")
            .arg(audio)
            .arg("-c:v")
            .arg("copy")
            .arg("-c:a")
            .arg("aac")
            .arg(output)
            .output()
            .await
            .map_err(|e| {
                crate::Error::ExternalTool(format!("failed to execute ffmpeg: {}", e))
            })?;

        if !result.status.success() {
            // Keep only the stderr tail; ffmpeg front-loads banner noise
            let tail_start = result.stderr.len().saturating_sub(STDERR_TAIL_BYTES);
            let stderr = String::from_utf8_lossy(&result.stderr[tail_start..]);
            let detail = format!(
                "ffmpeg exited with {}: {}",
                result
                    .status
                    .code()
                    .map_or_else(|| "signal".to_string(), |c| c.to_string()),
                stderr.trim()
            );
            return Err(crate::Error::ExternalTool(detail));
        }

        tracing::debug!(
            video = %video.display(),
            audio = %audio.display(),
            output = %output.display(),
            "Streams muxed"
        );

        Ok(())
    }

    fn capabilities(&self) -> MuxerCapabilities {
        MuxerCapabilities { can_mux: true }
    }

    fn name(&self) -> &'static str {
        "cli-ffmpeg"
    }
}
