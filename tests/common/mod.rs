//! Shared fixtures for integration tests.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use vidmux_dl::{Config, Muxer, MuxerCapabilities};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Muxer double that concatenates the two inputs and records invocations
pub struct ConcatMuxer {
    calls: Mutex<Vec<(PathBuf, PathBuf, PathBuf)>>,
}

impl ConcatMuxer {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Muxer for ConcatMuxer {
    async fn mux(&self, video: &Path, audio: &Path, output: &Path) -> vidmux_dl::Result<()> {
        self.calls.lock().unwrap().push((
            video.to_path_buf(),
            audio.to_path_buf(),
            output.to_path_buf(),
        ));
        let mut muxed = tokio::fs::read(video).await?;
        muxed.extend_from_slice(&tokio::fs::read(audio).await?);
        tokio::fs::write(output, muxed).await?;
        Ok(())
    }

    fn capabilities(&self) -> MuxerCapabilities {
        MuxerCapabilities { can_mux: true }
    }

    fn name(&self) -> &'static str {
        "concat"
    }
}

/// Config pointing all directories into a scratch dir, with fast polling
pub fn test_config(temp_dir: &tempfile::TempDir) -> Config {
    let mut config = Config::default();
    config.download.artifact_dir = temp_dir.path().join("artifacts");
    config.download.temp_dir = temp_dir.path().join("temp");
    config.download.fetch_timeout_secs = 10;
    config.download.merge_timeout_secs = 10;
    config.progress.poll_interval_ms = 5;
    config
}

/// Mount a media file at `route` returning `bytes`
pub async fn mount_media(server: &MockServer, route: &str, bytes: &[u8]) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(bytes.to_vec()))
        .mount(server)
        .await;
}

/// Mount a stream manifest at `/manifest.json` and return its URL
pub async fn mount_manifest(server: &MockServer, streams: serde_json::Value) -> String {
    Mock::given(method("GET"))
        .and(path("/manifest.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "streams": streams
        })))
        .mount(server)
        .await;
    format!("{}/manifest.json", server.uri())
}
