//! Core types for vidmux-dl

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use utoipa::ToSchema;

/// Unique identifier for a job
///
/// Generated at submission time from the current unix-millisecond timestamp
/// plus a process-wide counter, so concurrently created jobs never collide.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

/// Process-wide sequence counter for id generation
static JOB_SEQ: AtomicU64 = AtomicU64::new(0);

impl JobId {
    /// Create a JobId from an existing string
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh JobId for a new submission
    pub fn generate() -> Self {
        let millis = Utc::now().timestamp_millis();
        let seq = JOB_SEQ.fetch_add(1, Ordering::Relaxed);
        Self(format!("{}-{:04}", millis, seq))
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for JobId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Job status
///
/// A job starts `Pending`, moves through `InProgress` while its streams are
/// fetched, and ends in exactly one of the terminal states `Done` or
/// `Failed`. Transitions are monotonic; the store refuses updates once a job
/// is terminal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum JobStatus {
    /// Created, no bytes fetched yet (0%)
    Pending,
    /// Actively fetching streams
    InProgress {
        /// Download progress percentage (0 to 100)
        percent: u8,
    },
    /// Artifact ready for retrieval
    Done,
    /// Terminal failure with a user-visible reason
    Failed {
        /// The failure reason, suitable for display
        message: String,
    },
}

impl JobStatus {
    /// Build a `Failed` status from any displayable reason
    pub fn failed(reason: impl std::fmt::Display) -> Self {
        Self::Failed {
            message: reason.to_string(),
        }
    }

    /// Whether this status is terminal (`Done` or `Failed`)
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Failed { .. })
    }

    /// Current progress percentage, if the job is still running
    pub fn percent(&self) -> Option<u8> {
        match self {
            JobStatus::Pending => Some(0),
            JobStatus::InProgress { percent } => Some(*percent),
            JobStatus::Done | JobStatus::Failed { .. } => None,
        }
    }

    /// Render the legacy wire form used by the progress stream
    ///
    /// Numeric percentages as `"0"`..`"100"`, `"done"`, or
    /// `"error: <message>"`. Only the SSE edge uses this; the core keeps the
    /// tagged representation.
    pub fn wire(&self) -> String {
        match self {
            JobStatus::Pending => "0".to_string(),
            JobStatus::InProgress { percent } => percent.to_string(),
            JobStatus::Done => "done".to_string(),
            JobStatus::Failed { message } => format!("error: {}", message),
        }
    }
}

/// Requested quality for a job
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    /// The highest resolution the source offers
    Highest,
    /// A specific resolution label such as "720p"
    #[serde(untagged)]
    Resolution(String),
}

impl Quality {
    /// Parse a request label into a Quality
    pub fn parse(label: &str) -> Self {
        if label.eq_ignore_ascii_case("highest") {
            Quality::Highest
        } else {
            Quality::Resolution(label.to_string())
        }
    }
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Quality::Highest => write!(f, "highest"),
            Quality::Resolution(label) => write!(f, "{}", label),
        }
    }
}

/// One submitted download-and-prepare request, tracked from submission to
/// terminal state
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct Job {
    /// Unique job identifier
    pub id: JobId,
    /// Current status
    pub status: JobStatus,
    /// Requested quality label
    #[schema(value_type = String)]
    pub requested_quality: Quality,
    /// Source resource URL, immutable once set
    pub source_locator: String,
    /// Submission time
    pub created_at: DateTime<Utc>,
    /// Time the job reached a terminal state (drives retention)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Create a new pending job
    pub fn new(id: JobId, quality: Quality, locator: impl Into<String>) -> Self {
        Self {
            id,
            status: JobStatus::Pending,
            requested_quality: quality,
            source_locator: locator.into(),
            created_at: Utc::now(),
            completed_at: None,
        }
    }
}

/// Event emitted during the job lifecycle
///
/// Consumers subscribe via [`crate::VideoDownloader::subscribe`]; the API
/// mirrors the stream on the `/events` SSE endpoint.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Job accepted and queued
    Queued {
        /// Job ID
        id: JobId,
        /// Requested quality label
        quality: String,
    },

    /// Job progress update
    Progress {
        /// Job ID
        id: JobId,
        /// Progress percentage (0 to 100)
        percent: u8,
    },

    /// Job finished; artifact ready for retrieval
    Done {
        /// Job ID
        id: JobId,
    },

    /// Job failed
    Failed {
        /// Job ID
        id: JobId,
        /// The failure reason
        message: String,
    },

    /// Artifact handed out and reclaimed
    ArtifactRetrieved {
        /// Job ID
        id: JobId,
    },

    /// The downloader is shutting down
    Shutdown,
}

/// Current system capabilities
///
/// Reports what the running environment can do, so clients can detect a
/// missing muxer before submitting merge-path work.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct Capabilities {
    /// Whether separate video and audio streams can be merged
    pub can_mux: bool,
    /// Name of the active muxer implementation
    pub muxer: String,
    /// Name of the active stream provider implementation
    pub provider: String,
    /// Whether degraded video-only output is enabled when the muxer is absent
    pub video_only_fallback: bool,
}
