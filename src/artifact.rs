//! Artifact lifecycle management
//!
//! A finished job leaves exactly one file in the artifact directory. The
//! store hands it out once as a byte stream and reclaims the disk space when
//! that stream is dropped, whether the client read it to the end or
//! disconnected midway.

use crate::error::Error;
use crate::types::JobId;
use futures::Stream;
use std::path::PathBuf;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::fs::File;
use tokio_util::io::ReaderStream;

/// Manages finished output files on disk
#[derive(Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    /// Create a store rooted at `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the artifact for job `id`
    ///
    /// Paths are scoped by job id so concurrent jobs never collide.
    pub fn path_for(&self, id: &JobId) -> PathBuf {
        self.dir.join(format!("artifact_{}.mp4", id))
    }

    /// Whether an unclaimed artifact exists for `id`
    pub fn exists(&self, id: &JobId) -> bool {
        self.path_for(id).is_file()
    }

    /// Open the artifact for streaming retrieval
    ///
    /// The returned stream deletes the backing file exactly once when it is
    /// dropped. Concurrent retrieval of the same id is not supported: the
    /// second caller may observe `NotFound` after the first caller's stream
    /// deletes the file. That race is accepted, not hidden.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` when no artifact exists for `id`.
    pub async fn retrieve(&self, id: &JobId) -> crate::Result<ArtifactStream> {
        let path = self.path_for(id);
        let file = match File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::NotFound(format!("artifact for job {}", id)));
            }
            Err(e) => return Err(Error::Io(e)),
        };
        let size_bytes = file.metadata().await?.len();

        Ok(ArtifactStream {
            inner: ReaderStream::new(file),
            _guard: DeleteOnDrop { path },
            size_bytes,
        })
    }

    /// Delete the artifact for `id`, if present
    ///
    /// Used by the retention sweeper for artifacts nobody claimed.
    pub async fn remove(&self, id: &JobId) -> crate::Result<bool> {
        match tokio::fs::remove_file(self.path_for(id)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::Io(e)),
        }
    }
}

/// Removes the artifact file when dropped
struct DeleteOnDrop {
    path: PathBuf,
}

impl Drop for DeleteOnDrop {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to reclaim artifact file"
            );
        }
    }
}

/// Byte stream over an artifact file
///
/// Deletes the backing file when dropped; see [`ArtifactStore::retrieve`].
pub struct ArtifactStream {
    inner: ReaderStream<File>,
    _guard: DeleteOnDrop,
    size_bytes: u64,
}

impl ArtifactStream {
    /// Size of the artifact in bytes (for Content-Length)
    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }
}

impl Stream for ArtifactStream {
    type Item = std::io::Result<bytes::Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
