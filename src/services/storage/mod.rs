//! Blob storage abstraction.
//!
//! Attachments and templates are both kept as blobs addressed by a
//! `container/name` path. Each blob carries a flat string metadata map.

mod filesystem;
mod memory;

pub use filesystem::FilesystemBlobStorage;
pub use memory::MemoryBlobStorage;

use std::collections::HashMap;
use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::config::{StorageBackend, StorageConfig};

/// Owned byte stream handed to and returned from a blob store
pub type BlobStream = Box<dyn AsyncRead + Send + Unpin>;

/// Flat string metadata stored alongside a blob
pub type BlobMetadata = HashMap<String, String>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid blob path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("I/O error on blob '{path}'")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Corrupt metadata for blob '{path}'")]
    Metadata {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl StorageError {
    pub(crate) fn io(path: &str, source: io::Error) -> Self {
        StorageError::Io {
            path: path.to_string(),
            source,
        }
    }
}

/// Storage backend for binary blobs.
///
/// `get_metadata` and `download` return `Ok(None)` for a blob that does not
/// exist. `upload` is all-or-nothing: when it fails, `exists` keeps
/// reporting the previous state of the path.
#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Backend name for logging
    fn name(&self) -> &'static str;

    async fn exists(&self, path: &str) -> Result<bool, StorageError>;

    async fn get_metadata(&self, path: &str) -> Result<Option<BlobMetadata>, StorageError>;

    async fn download(&self, path: &str) -> Result<Option<BlobStream>, StorageError>;

    /// Stores the full stream under `path`, returning the number of bytes written.
    async fn upload(
        &self,
        path: &str,
        content: BlobStream,
        metadata: BlobMetadata,
    ) -> Result<u64, StorageError>;
}

/// Builds the backend selected in configuration.
pub fn from_config(config: &StorageConfig) -> Arc<dyn BlobStorage> {
    match config.backend {
        StorageBackend::Memory => Arc::new(MemoryBlobStorage::new()),
        StorageBackend::Filesystem => Arc::new(FilesystemBlobStorage::new(&config.root)),
    }
}

/// Wraps in-memory bytes as a [`BlobStream`].
pub fn stream_from_bytes<B>(bytes: B) -> BlobStream
where
    B: AsRef<[u8]> + Send + Unpin + 'static,
{
    Box::new(io::Cursor::new(bytes))
}

/// Drains a stream into memory.
pub async fn read_all(mut stream: BlobStream) -> io::Result<Vec<u8>> {
    let mut buffer = Vec::new();
    stream.read_to_end(&mut buffer).await?;
    Ok(buffer)
}

/// Rejects empty paths, absolute paths and `.`/`..` segments.
pub(crate) fn validate_path(path: &str) -> Result<(), StorageError> {
    let invalid = |reason: &str| StorageError::InvalidPath {
        path: path.to_string(),
        reason: reason.to_string(),
    };

    if path.is_empty() {
        return Err(invalid("path is empty"));
    }
    if path.starts_with('/') || path.contains('\\') {
        return Err(invalid("path must be relative and use '/' separators"));
    }
    if path
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(invalid("path contains an empty or relative segment"));
    }

    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use tokio::io::{AsyncRead, ReadBuf};

    use super::BlobStream;

    /// Yields a few bytes, then fails like a dropped client connection.
    pub(crate) struct FailingReader {
        sent: bool,
    }

    impl AsyncRead for FailingReader {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            if self.sent {
                Poll::Ready(Err(io::Error::new(
                    io::ErrorKind::ConnectionReset,
                    "client went away",
                )))
            } else {
                self.sent = true;
                buf.put_slice(b"partial");
                Poll::Ready(Ok(()))
            }
        }
    }

    pub(crate) fn failing_stream() -> BlobStream {
        Box::new(FailingReader { sent: false })
    }
}
