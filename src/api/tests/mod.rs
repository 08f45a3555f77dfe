use super::*;
use crate::downloader::test_helpers::{
    FakeStreamProvider, RecordingMuxer, progressive, test_config, video_only,
};
use std::time::Duration;


/// Helper to create a test VideoDownloader over fakes, wrapped in Arc
async fn create_test_downloader(
    provider: FakeStreamProvider,
    muxer: RecordingMuxer,
) -> (Arc<VideoDownloader>, tempfile::TempDir) {
    let temp_dir = tempfile::tempdir().expect("failed to create scratch dir");
    let config = test_config(&temp_dir);
    let downloader =
        VideoDownloader::with_collaborators(config, Arc::new(provider), Arc::new(muxer))
            .await
            .expect("failed to build downloader");
    (Arc::new(downloader), temp_dir)
}

/// A provider offering only a progressive 720p stream
fn progressive_provider() -> FakeStreamProvider {
    FakeStreamProvider::new(vec![progressive("p720", "720p")])
}

#[tokio::test]
async fn test_api_server_spawns() {
    let (downloader, _temp_dir) = create_test_downloader(
        progressive_provider(),
        RecordingMuxer::new(),
    )
    .await;

    // Use a random available port for testing
    let mut config = (*downloader.get_config()).clone();
    config.server.api.bind_address = "127.0.0.1:0".parse().unwrap();
    let config = Arc::new(config);

    let api_handle = tokio::spawn({
        let downloader = downloader.clone();
        let config = config.clone();
        async move { start_api_server(downloader, config).await }
    });

    // Give it a moment to start
    tokio::time::sleep(Duration::from_millis(100)).await;

    api_handle.abort();
}

#[tokio::test]
async fn test_cors_enabled() {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt; // for oneshot()

    let (downloader, _temp_dir) = create_test_downloader(
        progressive_provider(),
        RecordingMuxer::new(),
    )
    .await;

    let mut config = (*downloader.get_config()).clone();
    config.server.api.cors_enabled = true;
    config.server.api.cors_origins = vec!["*".to_string()];
    let config = Arc::new(config);

    let app = create_router(downloader, config);

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers().contains_key("access-control-allow-origin"),
        "CORS header should be present when CORS is enabled"
    );
}

#[tokio::test]
async fn test_spawn_api_server_method() {
    let (downloader, _temp_dir) = create_test_downloader(
        progressive_provider(),
        RecordingMuxer::new(),
    )
    .await;

    let mut config = (*downloader.get_config()).clone();
    config.server.api.bind_address = "127.0.0.1:0".parse().unwrap();
    let downloader = Arc::new(
        VideoDownloader::with_collaborators(
            config,
            Arc::new(progressive_provider()),
            Arc::new(RecordingMuxer::new()),
        )
        .await
        .unwrap(),
    );

    let api_handle = downloader.spawn_api_server();
    tokio::time::sleep(Duration::from_millis(100)).await;
    api_handle.abort();
}
