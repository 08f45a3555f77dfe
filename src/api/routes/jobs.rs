//! Job management handlers.

use super::{SubmitJobRequest, SubmitJobResponse};
use crate::api::AppState;
use crate::error::ApiError;
use crate::types::{JobId, Quality};
use axum::{
    Json,
    body::Body,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{
        IntoResponse, Response,
        sse::{Event as SseEvent, KeepAlive, Sse},
    },
};
use serde_json::json;
use tokio_stream::StreamExt;

/// POST /jobs - Submit a download job
#[utoipa::path(
    post,
    path = "/jobs",
    tag = "jobs",
    request_body = SubmitJobRequest,
    responses(
        (status = 200, description = "Job accepted", body = SubmitJobResponse),
        (status = 400, description = "Missing or invalid fields", body = crate::error::ApiError),
        (status = 503, description = "Shutting down, not accepting jobs", body = crate::error::ApiError)
    )
)]
pub async fn submit_job(
    State(state): State<AppState>,
    Json(request): Json<SubmitJobRequest>,
) -> Response {
    if request.source_url.trim().is_empty() {
        return crate::error::Error::Validation("source_url must not be empty".to_string())
            .into_response();
    }
    if request.quality.trim().is_empty() {
        return crate::error::Error::Validation("quality must not be empty".to_string())
            .into_response();
    }

    let quality = Quality::parse(request.quality.trim());
    match state.downloader.submit(&request.source_url, quality).await {
        Ok(id) => (
            StatusCode::OK,
            Json(SubmitJobResponse {
                job_id: id.to_string(),
            }),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// GET /jobs - List all jobs
#[utoipa::path(
    get,
    path = "/jobs",
    tag = "jobs",
    responses(
        (status = 200, description = "List of all tracked jobs", body = Vec<crate::types::Job>)
    )
)]
pub async fn list_jobs(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.downloader.list_jobs())
}

/// GET /jobs/:id - Get single job
#[utoipa::path(
    get,
    path = "/jobs/{id}",
    tag = "jobs",
    params(
        ("id" = String, Path, description = "Job ID")
    ),
    responses(
        (status = 200, description = "Job snapshot", body = crate::types::Job),
        (status = 404, description = "Job not found", body = crate::error::ApiError)
    )
)]
pub async fn get_job(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let id = JobId::new(id);
    match state.downloader.job(&id) {
        Some(job) => (StatusCode::OK, Json(job)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ApiError::not_found(format!("job {}", id))),
        )
            .into_response(),
    }
}

/// GET /jobs/:id/progress - Server-sent progress stream for one job
///
/// Emits one `progress` event per observed status change, with the legacy
/// payload shape `{"progress": "<0-100 | done | error: ...>"}`, and closes
/// the stream after the terminal event.
#[utoipa::path(
    get,
    path = "/jobs/{id}/progress",
    tag = "jobs",
    params(
        ("id" = String, Path, description = "Job ID")
    ),
    responses(
        (status = 200, description = "Progress event stream (text/event-stream)", content_type = "text/event-stream"),
        (status = 404, description = "Job not found", body = crate::error::ApiError)
    )
)]
pub async fn job_progress(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let id = JobId::new(id);
    if state.downloader.job(&id).is_none() {
        return (
            StatusCode::NOT_FOUND,
            Json(ApiError::not_found(format!("job {}", id))),
        )
            .into_response();
    }

    let stream = state.downloader.progress_stream(id).map(|status| {
        Ok::<SseEvent, std::convert::Infallible>(
            SseEvent::default()
                .event("progress")
                .data(json!({ "progress": status.wire() }).to_string()),
        )
    });

    Sse::new(stream)
        .keep_alive(KeepAlive::default())
        .into_response()
}

/// GET /jobs/:id/file - Fetch the finished artifact
///
/// Streams the file as an attachment and deletes it server-side once the
/// response stream is dropped; a second request observes 404.
#[utoipa::path(
    get,
    path = "/jobs/{id}/file",
    tag = "jobs",
    params(
        ("id" = String, Path, description = "Job ID")
    ),
    responses(
        (status = 200, description = "Artifact bytes (video/mp4 attachment)", content_type = "video/mp4"),
        (status = 404, description = "Artifact not found", body = crate::error::ApiError)
    )
)]
pub async fn fetch_artifact(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let id = JobId::new(id);
    match state.downloader.retrieve_artifact(&id).await {
        Ok(stream) => {
            let headers = [
                (header::CONTENT_TYPE, "video/mp4".to_string()),
                (header::CONTENT_LENGTH, stream.size_bytes().to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"video_{}.mp4\"", id),
                ),
            ];
            (headers, Body::from_stream(stream)).into_response()
        }
        Err(e) => e.into_response(),
    }
}
