//! Error types for vidmux-dl
//!
//! This module provides comprehensive error handling for the library, including:
//! - The job pipeline failure taxonomy ([`JobError`])
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for vidmux-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for vidmux-dl
///
/// This is the primary error type used throughout the library. Each variant includes
/// contextual information to help diagnose issues.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "artifact_dir")
        key: Option<String>,
    },

    /// Job pipeline error
    #[error("job error: {0}")]
    Job(#[from] JobError),

    /// Request validation error (bad source URL, empty quality label, etc.)
    #[error("validation error: {0}")]
    Validation(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Job or artifact not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Shutdown in progress - not accepting new jobs
    #[error("shutdown in progress: not accepting new jobs")]
    ShuttingDown,

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// External tool execution failed (ffmpeg)
    #[error("external tool error: {0}")]
    ExternalTool(String),

    /// Operation not supported (missing binary, not implemented, etc.)
    #[error("not supported: {0}")]
    NotSupported(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Failure taxonomy for the job pipeline
///
/// Every failure inside a job task is folded into one of these variants; the
/// `Display` form is the user-visible failure reason carried by the job's
/// terminal `Failed` status and surfaced over the progress stream.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum JobError {
    /// Source locator invalid or fetching stream metadata failed
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    /// Selection policy found nothing usable for the requested quality
    #[error("no suitable stream")]
    NoSuitableStream,

    /// A merge was required but the merge capability is absent
    #[error("merge unavailable: external muxer not found")]
    MergeUnavailable,

    /// Network or storage error while downloading a stream
    #[error("fetch error: {0}")]
    FetchFailed(String),

    /// The external muxer returned nonzero or crashed
    #[error("merge error: {0}")]
    MergeFailed(String),

    /// Anything uncaught
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

/// API error response format
///
/// This structure is returned by API endpoints when an error occurs.
/// It follows a standard format with machine-readable error codes,
/// human-readable messages, and optional contextual details.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "not_found",
///     "message": "job 1712000000000-0001 not found",
///     "details": {
///       "job_id": "1712000000000-0001"
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "not_found", "validation_error")
    ///
    /// Clients can use this for programmatic error handling.
    pub code: String,

    /// Human-readable error message
    ///
    /// This is suitable for displaying to end users.
    pub message: String,

    /// Optional additional context about the error
    ///
    /// This can include fields like job_id, file paths, validation errors, etc.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create an API error with additional details
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    /// Create a "not found" error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new("not_found", format!("{} not found", resource.into()))
    }

    /// Create a "validation error" error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new("validation_error", message)
    }

    /// Create an "internal server error"
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }

    /// Create a "service unavailable" error
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new("service_unavailable", message)
    }
}

/// Convert errors to HTTP status codes for API responses
///
/// This trait maps domain errors to appropriate HTTP status codes.
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - Client error (invalid input)
            Error::Config { .. } => 400,
            Error::Validation(_) => 400,

            // 404 Not Found
            Error::NotFound(_) => 404,

            // 503 Service Unavailable
            Error::ShuttingDown => 503,

            // 501 Not Implemented - Missing capability
            Error::NotSupported(_) => 501,

            // Job pipeline errors only reach the API through a job's terminal
            // status, never as a transport error; if one does, it is a server
            // fault.
            Error::Job(_) => 500,

            // 500 Internal Server Error - Everything else
            Error::Io(_)
            | Error::Network(_)
            | Error::Serialization(_)
            | Error::ApiServerError(_)
            | Error::ExternalTool(_)
            | Error::Other(_) => 500,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Validation(_) => "validation_error",
            Error::NotFound(_) => "not_found",
            Error::ShuttingDown => "shutting_down",
            Error::NotSupported(_) => "not_supported",
            Error::Job(job) => match job {
                JobError::SourceUnavailable(_) => "source_unavailable",
                JobError::NoSuitableStream => "no_suitable_stream",
                JobError::MergeUnavailable => "merge_unavailable",
                JobError::FetchFailed(_) => "fetch_failed",
                JobError::MergeFailed(_) => "merge_failed",
                JobError::Unexpected(_) => "unexpected",
            },
            Error::Io(_) => "io_error",
            Error::Network(_) => "network_error",
            Error::Serialization(_) => "serialization_error",
            Error::ApiServerError(_) => "api_server_error",
            Error::ExternalTool(_) => "external_tool_error",
            Error::Other(_) => "internal_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        let details = match &error {
            Error::Config { key: Some(key), .. } => {
                Some(serde_json::json!({ "config_key": key }))
            }
            Error::NotFound(resource) => Some(serde_json::json!({ "resource": resource })),
            _ => None,
        };

        Self {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}
