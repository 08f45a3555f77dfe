//! # vidmux-dl
//!
//! Backend library for video download-and-merge services.
//!
//! A submitted job names a remote video resource and a desired quality
//! level. The library resolves the streams the source offers, fetches the
//! right ones, and — when video and audio arrive as separate elementary
//! streams — muxes them into one playable file with an external tool.
//! Progress is observable in real time, and the finished artifact is
//! retrievable exactly once, after which its disk space is reclaimed.
//!
//! ## Design Philosophy
//!
//! vidmux-dl is designed to be:
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Event-driven** - Consumers subscribe to job events, no polling required
//! - **Ephemeral** - Jobs and artifacts live only as long as the process
//! - **Degradable** - A missing muxer fails merge jobs fast instead of late
//!
//! ## Quick Start
//!
//! ```no_run
//! use vidmux_dl::{Config, Quality, VideoDownloader};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let downloader = VideoDownloader::new(Config::default()).await?;
//!
//!     // Subscribe to events
//!     let mut events = downloader.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let id = downloader
//!         .submit("https://example.com/video1.json", Quality::parse("720p"))
//!         .await?;
//!     downloader.wait_for_job(&id).await;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Artifact lifecycle management
pub mod artifact;
/// Configuration types
pub mod config;
/// Core downloader implementation (decomposed into focused submodules)
pub mod downloader;
/// Error types
pub mod error;
/// Muxer trait and implementations
pub mod muxer;
/// Progress sinks and the status publisher
pub mod progress;
/// Stream provider trait and implementations
pub mod provider;
/// Stream selection policy
pub mod selector;
/// Concurrent job registry
pub mod store;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use artifact::{ArtifactStore, ArtifactStream};
pub use config::{ApiConfig, Config, DownloadConfig, ProgressConfig, ToolsConfig};
pub use downloader::VideoDownloader;
pub use error::{ApiError, Error, ErrorDetail, JobError, Result, ToHttpStatus};
pub use muxer::{FfmpegMuxer, Muxer, MuxerCapabilities, NoOpMuxer};
pub use progress::ProgressPublisher;
pub use provider::{
    HttpStreamProvider, ProgressSink, StreamDescriptor, StreamKind, StreamProvider,
};
pub use selector::{StreamSelection, select_streams};
pub use store::JobStore;
pub use types::{Capabilities, Event, Job, JobId, JobStatus, Quality};

/// Helper function to run the downloader with graceful signal handling.
///
/// Waits for a termination signal and then calls the downloader's
/// `shutdown()` method.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with a fallback if signal
///   registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use vidmux_dl::{Config, VideoDownloader, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let downloader = VideoDownloader::new(Config::default()).await?;
///
///     // Run with automatic signal handling
///     run_with_shutdown(downloader).await?;
///
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(downloader: VideoDownloader) -> Result<()> {
    wait_for_signal().await;
    downloader.shutdown().await
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Signal registration may fail in restricted environments (containers, tests)
    match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        _ => {
            tracing::warn!("Could not register unix signal handlers, using ctrl_c fallback");
            tokio::signal::ctrl_c().await.ok();
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
