//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`jobs`] — Job submission, progress, artifact retrieval
//! - [`system`] — Health, capabilities, events, OpenAPI, shutdown

use serde::{Deserialize, Serialize};

mod jobs;
mod system;

// Re-export all handlers so `routes::function_name` continues to work
pub use jobs::*;
pub use system::*;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for POST /jobs
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct SubmitJobRequest {
    /// Source resource URL
    pub source_url: String,
    /// Requested quality label, e.g. "720p" or "highest"
    pub quality: String,
}

/// Response body for POST /jobs
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct SubmitJobResponse {
    /// Identifier of the created job
    pub job_id: String,
}
