//! OpenAPI documentation and schema generation
//!
//! This module defines the OpenAPI specification for the vidmux-dl REST API
//! using utoipa for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the vidmux-dl REST API
///
/// This struct is used to generate the OpenAPI 3.1 specification that describes
/// all available endpoints, request/response types, and API behavior.
///
/// The spec can be accessed via:
/// - `/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation (if enabled)
#[derive(OpenApi)]
#[openapi(
    info(
        title = "vidmux-dl REST API",
        version = "0.1.0",
        description = "REST API for submitting video download-and-merge jobs, watching their progress, and retrieving finished artifacts",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:6790", description = "Local development server")
    ),
    paths(
        // Jobs
        crate::api::routes::submit_job,
        crate::api::routes::list_jobs,
        crate::api::routes::get_job,
        crate::api::routes::job_progress,
        crate::api::routes::fetch_artifact,

        // System
        crate::api::routes::health_check,
        crate::api::routes::get_capabilities,
        crate::api::routes::openapi_spec,
        crate::api::routes::event_stream,
        crate::api::routes::shutdown,
    ),
    components(
        schemas(
            crate::api::routes::SubmitJobRequest,
            crate::api::routes::SubmitJobResponse,
            crate::types::Job,
            crate::types::JobId,
            crate::types::JobStatus,
            crate::types::Event,
            crate::types::Capabilities,
            crate::error::ApiError,
            crate::error::ErrorDetail,
        )
    ),
    tags(
        (name = "jobs", description = "Job submission, progress, and artifact retrieval"),
        (name = "system", description = "Health, capabilities, events, and lifecycle")
    )
)]
pub struct ApiDoc;
