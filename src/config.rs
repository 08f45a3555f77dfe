//! Configuration types for vidmux-dl

use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::PathBuf, time::Duration};
use utoipa::ToSchema;

/// Download behavior configuration (directories, concurrency, timeouts)
///
/// Groups settings related to how streams are fetched, merged, and stored.
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct DownloadConfig {
    /// Directory for finished artifacts (default: "./artifacts")
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: PathBuf,

    /// Directory for in-flight temporary stream files (default: "./temp")
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,

    /// Maximum concurrent jobs (default: 4)
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_jobs: usize,

    /// Per-stream fetch timeout in seconds (default: 600)
    ///
    /// Fetches exceeding this bound fail the job with `fetch error: timeout`.
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// Merge step timeout in seconds (default: 300)
    ///
    /// Muxer invocations exceeding this bound fail the job with
    /// `merge error: timeout`.
    #[serde(default = "default_merge_timeout_secs")]
    pub merge_timeout_secs: u64,

    /// Keep the video-only stream as the artifact when a merge is required
    /// but no muxer is available (default: false)
    ///
    /// When false, such jobs fail fast with `MergeUnavailable` before any
    /// bytes are fetched. Degraded audio-less output is an explicit opt-in,
    /// never a silent default.
    #[serde(default)]
    pub video_only_fallback: bool,

    /// How long terminal jobs and unclaimed artifacts are retained, in
    /// seconds (default: 3600)
    #[serde(default = "default_job_retention_secs")]
    pub job_retention_secs: u64,

    /// Retention sweep interval in seconds (default: 60)
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl DownloadConfig {
    /// Per-stream fetch timeout as a [`Duration`]
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Merge step timeout as a [`Duration`]
    pub fn merge_timeout(&self) -> Duration {
        Duration::from_secs(self.merge_timeout_secs)
    }

    /// Retention period as a [`Duration`]
    pub fn job_retention(&self) -> Duration {
        Duration::from_secs(self.job_retention_secs)
    }

    /// Sweep interval as a [`Duration`]
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            artifact_dir: default_artifact_dir(),
            temp_dir: default_temp_dir(),
            max_concurrent_jobs: default_max_concurrent(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            merge_timeout_secs: default_merge_timeout_secs(),
            video_only_fallback: false,
            job_retention_secs: default_job_retention_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

/// External tool configuration (ffmpeg discovery)
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ToolsConfig {
    /// Explicit path to the ffmpeg binary
    ///
    /// When unset and `search_path` is true, PATH is searched instead.
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    /// Search PATH for ffmpeg when no explicit path is configured
    /// (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            search_path: default_true(),
        }
    }
}

/// Progress reporting configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ProgressConfig {
    /// Interval between status polls on a progress subscription, in
    /// milliseconds (default: 100)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl ProgressConfig {
    /// Poll interval as a [`Duration`]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Bind address for the API server (default: 127.0.0.1:6790)
    #[serde(default = "default_bind_address")]
    #[schema(value_type = String)]
    pub bind_address: SocketAddr,

    /// Enable CORS middleware (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins; "*" allows any (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Serve the interactive Swagger UI at /swagger-ui (default: false)
    #[serde(default)]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: false,
        }
    }
}

/// Server configuration wrapper
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct ServerConfig {
    /// REST API settings
    #[serde(default)]
    pub api: ApiConfig,
}

/// Top-level configuration for [`crate::VideoDownloader`]
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// Download behavior settings
    #[serde(default)]
    pub download: DownloadConfig,

    /// External tool settings
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Progress reporting settings
    #[serde(default)]
    pub progress: ProgressConfig,

    /// Server settings
    #[serde(default)]
    pub server: ServerConfig,
}

fn default_artifact_dir() -> PathBuf {
    PathBuf::from("./artifacts")
}

fn default_temp_dir() -> PathBuf {
    PathBuf::from("./temp")
}

fn default_max_concurrent() -> usize {
    4
}

fn default_fetch_timeout_secs() -> u64 {
    600
}

fn default_merge_timeout_secs() -> u64 {
    300
}

fn default_job_retention_secs() -> u64 {
    3600
}

fn default_sweep_interval_secs() -> u64 {
    60
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_bind_address() -> SocketAddr {
    "127.0.0.1:6790"
        .parse()
        .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], 6790)))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_true() -> bool {
    true
}
