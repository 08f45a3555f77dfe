//! HTTP stream provider — manifest resolution and streamed fetching

use super::{ProgressSink, StreamDescriptor, StreamProvider};
use crate::error::Error;
use async_trait::async_trait;
use futures::StreamExt;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;

/// Stream manifest served by an HTTP source
///
/// `resolve` expects the locator to answer with this JSON shape:
///
/// ```json
/// {
///   "streams": [
///     {
///       "id": "v720",
///       "container": "mp4",
///       "resolution": "720p",
///       "kind": "video_only",
///       "size_bytes": 10485760,
///       "url": "https://cdn.example.com/v720.mp4"
///     }
///   ]
/// }
/// ```
#[derive(Debug, Deserialize)]
struct Manifest {
    streams: Vec<ManifestStream>,
}

#[derive(Debug, Deserialize)]
struct ManifestStream {
    id: String,
    container: String,
    #[serde(default)]
    resolution: Option<String>,
    kind: super::StreamKind,
    #[serde(default)]
    size_bytes: Option<u64>,
    url: String,
}

impl From<ManifestStream> for StreamDescriptor {
    fn from(s: ManifestStream) -> Self {
        StreamDescriptor {
            id: s.id,
            container: s.container,
            resolution: s.resolution,
            kind: s.kind,
            size_bytes: s.size_bytes,
            source_url: s.url,
        }
    }
}

/// Stream provider over plain HTTP
///
/// Resolves a locator by fetching its JSON stream manifest and downloads
/// streams with chunked transfers, reporting byte progress against the
/// response `Content-Length` (falling back to the manifest-declared size).
pub struct HttpStreamProvider {
    client: reqwest::Client,
}

/// Connect timeout for manifest and stream requests
const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

impl HttpStreamProvider {
    /// Create a provider with a default HTTP client
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new() -> crate::Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(Error::Network)?;
        Ok(Self { client })
    }

    /// Create a provider with a caller-supplied HTTP client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StreamProvider for HttpStreamProvider {
    async fn resolve(&self, locator: &str) -> crate::Result<Vec<StreamDescriptor>> {
        let url = url::Url::parse(locator)
            .map_err(|e| Error::Validation(format!("invalid source URL '{}': {}", locator, e)))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(Error::Network)?
            .error_for_status()
            .map_err(Error::Network)?;

        let manifest: Manifest = response.json().await.map_err(Error::Network)?;

        tracing::debug!(
            locator = %locator,
            stream_count = manifest.streams.len(),
            "Resolved stream manifest"
        );

        Ok(manifest.streams.into_iter().map(Into::into).collect())
    }

    async fn fetch(
        &self,
        descriptor: &StreamDescriptor,
        dest: &Path,
        sink: &dyn ProgressSink,
    ) -> crate::Result<()> {
        let response = self
            .client
            .get(&descriptor.source_url)
            .send()
            .await
            .map_err(Error::Network)?
            .error_for_status()
            .map_err(Error::Network)?;

        let total_bytes = response.content_length().or(descriptor.size_bytes);

        let mut file = tokio::fs::File::create(dest).await?;
        let mut body = response.bytes_stream();
        let mut transferred: u64 = 0;

        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(Error::Network)?;
            file.write_all(&chunk).await?;
            transferred += chunk.len() as u64;
            sink.report(transferred, total_bytes);
        }

        file.flush().await?;

        tracing::debug!(
            stream_id = %descriptor.id,
            bytes = transferred,
            dest = %dest.display(),
            "Stream fetched"
        );

        Ok(())
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
