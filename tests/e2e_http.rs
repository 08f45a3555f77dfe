//! End-to-end tests over a mock HTTP source.
//!
//! These exercise the real `HttpStreamProvider` (manifest resolution plus
//! chunked fetching) and the full router, with wiremock standing in for the
//! remote source and a concatenating muxer double for ffmpeg.

mod common;

use common::{ConcatMuxer, mount_manifest, mount_media, test_config};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt; // for oneshot()
use vidmux_dl::api::create_router;
use vidmux_dl::{HttpStreamProvider, JobStatus, Quality, VideoDownloader};
use wiremock::MockServer;

const VIDEO_BYTES: &[u8] = b"VIDEO-ELEMENTARY-STREAM-BYTES";
const AUDIO_BYTES: &[u8] = b"AUDIO-BYTES";

async fn build_downloader(muxer: Arc<ConcatMuxer>) -> (Arc<VideoDownloader>, tempfile::TempDir) {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = test_config(&temp_dir);
    let provider = Arc::new(HttpStreamProvider::new().unwrap());
    let downloader = VideoDownloader::with_collaborators(config, provider, muxer)
        .await
        .unwrap();
    (Arc::new(downloader), temp_dir)
}

async fn wait_done(downloader: &VideoDownloader, id: &vidmux_dl::JobId) -> JobStatus {
    downloader.wait_for_job(id).await;
    downloader.job(id).expect("job should still be tracked").status
}

#[tokio::test]
async fn test_progressive_download_end_to_end() {
    let server = MockServer::start().await;
    mount_media(&server, "/media/p720.mp4", VIDEO_BYTES).await;
    let manifest_url = mount_manifest(
        &server,
        serde_json::json!([{
            "id": "p720",
            "container": "mp4",
            "resolution": "720p",
            "kind": "progressive",
            "url": format!("{}/media/p720.mp4", server.uri())
        }]),
    )
    .await;

    let muxer = Arc::new(ConcatMuxer::new());
    let (downloader, _temp) = build_downloader(muxer.clone()).await;

    let id = downloader
        .submit(&manifest_url, Quality::parse("720p"))
        .await
        .unwrap();

    assert_eq!(wait_done(&downloader, &id).await, JobStatus::Done);
    assert_eq!(muxer.call_count(), 0, "progressive path must not mux");

    // Retrieve through the API: attachment once, 404 afterward
    let app = create_router(downloader.clone(), downloader.get_config());
    let response = app
        .clone()
        .oneshot(
            axum::http::Request::builder()
                .uri(format!("/jobs/{}/file", id))
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), axum::http::StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], VIDEO_BYTES);

    let second = app
        .oneshot(
            axum::http::Request::builder()
                .uri(format!("/jobs/{}/file", id))
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(second.status(), axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_merge_download_end_to_end() {
    let server = MockServer::start().await;
    mount_media(&server, "/media/v720.mp4", VIDEO_BYTES).await;
    mount_media(&server, "/media/audio.m4a", AUDIO_BYTES).await;
    let manifest_url = mount_manifest(
        &server,
        serde_json::json!([
            {
                "id": "v720",
                "container": "mp4",
                "resolution": "720p",
                "kind": "video_only",
                "url": format!("{}/media/v720.mp4", server.uri())
            },
            {
                "id": "a1",
                "container": "mp4",
                "kind": "audio_only",
                "url": format!("{}/media/audio.m4a", server.uri())
            }
        ]),
    )
    .await;

    let muxer = Arc::new(ConcatMuxer::new());
    let (downloader, _temp) = build_downloader(muxer.clone()).await;

    let id = downloader
        .submit(&manifest_url, Quality::parse("720p"))
        .await
        .unwrap();

    assert_eq!(wait_done(&downloader, &id).await, JobStatus::Done);
    assert_eq!(muxer.call_count(), 1);

    // The muxed artifact carries both legs
    let mut stream = downloader.retrieve_artifact(&id).await.unwrap();
    let mut muxed = Vec::new();
    use futures::StreamExt;
    while let Some(chunk) = stream.next().await {
        muxed.extend_from_slice(&chunk.unwrap());
    }
    let mut expected = VIDEO_BYTES.to_vec();
    expected.extend_from_slice(AUDIO_BYTES);
    assert_eq!(muxed, expected);
}

#[tokio::test]
async fn test_unreachable_media_fails_the_job() {
    let server = MockServer::start().await;
    // Manifest resolves, but the media URL 404s
    let manifest_url = mount_manifest(
        &server,
        serde_json::json!([{
            "id": "p720",
            "container": "mp4",
            "resolution": "720p",
            "kind": "progressive",
            "url": format!("{}/media/missing.mp4", server.uri())
        }]),
    )
    .await;

    let muxer = Arc::new(ConcatMuxer::new());
    let (downloader, _temp) = build_downloader(muxer).await;

    let id = downloader
        .submit(&manifest_url, Quality::parse("720p"))
        .await
        .unwrap();

    match wait_done(&downloader, &id).await {
        JobStatus::Failed { message } => {
            assert!(message.starts_with("fetch error:"), "got: {}", message);
        }
        other => panic!("expected failed status, got: {:?}", other),
    }
}

#[tokio::test]
async fn test_unresolvable_manifest_fails_the_job() {
    let server = MockServer::start().await;
    // Nothing mounted: the manifest request 404s

    let muxer = Arc::new(ConcatMuxer::new());
    let (downloader, _temp) = build_downloader(muxer).await;

    let id = downloader
        .submit(&format!("{}/manifest.json", server.uri()), Quality::parse("720p"))
        .await
        .unwrap();

    match wait_done(&downloader, &id).await {
        JobStatus::Failed { message } => {
            assert!(
                message.starts_with("source unavailable:"),
                "got: {}",
                message
            );
        }
        other => panic!("expected failed status, got: {:?}", other),
    }
}

#[tokio::test]
async fn test_progress_stream_over_http() {
    let server = MockServer::start().await;
    mount_media(&server, "/media/p720.mp4", VIDEO_BYTES).await;
    let manifest_url = mount_manifest(
        &server,
        serde_json::json!([{
            "id": "p720",
            "container": "mp4",
            "resolution": "720p",
            "kind": "progressive",
            "url": format!("{}/media/p720.mp4", server.uri())
        }]),
    )
    .await;

    let muxer = Arc::new(ConcatMuxer::new());
    let (downloader, _temp) = build_downloader(muxer).await;

    let id = downloader
        .submit(&manifest_url, Quality::parse("720p"))
        .await
        .unwrap();
    downloader.wait_for_job(&id).await;

    // The job is terminal, so the SSE body closes after the final event
    let app = create_router(downloader.clone(), downloader.get_config());
    let response = tokio::time::timeout(
        Duration::from_secs(10),
        app.oneshot(
            axum::http::Request::builder()
                .uri(format!("/jobs/{}/progress", id))
                .body(axum::body::Body::empty())
                .unwrap(),
        ),
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(response.status(), axum::http::StatusCode::OK);

    let body = tokio::time::timeout(
        Duration::from_secs(10),
        axum::body::to_bytes(response.into_body(), usize::MAX),
    )
    .await
    .unwrap()
    .unwrap();
    let text = String::from_utf8_lossy(&body);
    assert!(
        text.contains(r#"{"progress":"done"}"#),
        "terminal element must be delivered, got: {}",
        text
    );
}
