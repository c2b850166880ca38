//! Process-local blob storage backed by `DashMap`.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::io::AsyncReadExt;

use super::{BlobMetadata, BlobStorage, BlobStream, StorageError, stream_from_bytes, validate_path};

#[derive(Debug, Clone)]
struct StoredBlob {
    data: Arc<[u8]>,
    metadata: BlobMetadata,
}

/// Concurrent in-memory blob store.
///
/// Blobs are inserted only after the whole upload stream has been read, so
/// readers never observe a partial blob.
#[derive(Debug, Default, Clone)]
pub struct MemoryBlobStorage {
    blobs: Arc<DashMap<String, StoredBlob>>,
}

impl MemoryBlobStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

#[async_trait]
impl BlobStorage for MemoryBlobStorage {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn exists(&self, path: &str) -> Result<bool, StorageError> {
        validate_path(path)?;
        Ok(self.blobs.contains_key(path))
    }

    async fn get_metadata(&self, path: &str) -> Result<Option<BlobMetadata>, StorageError> {
        validate_path(path)?;
        Ok(self.blobs.get(path).map(|blob| blob.metadata.clone()))
    }

    async fn download(&self, path: &str) -> Result<Option<BlobStream>, StorageError> {
        validate_path(path)?;
        // Clone the Arc out so the shard lock is released before returning.
        let data = self.blobs.get(path).map(|blob| Arc::clone(&blob.data));
        Ok(data.map(stream_from_bytes))
    }

    async fn upload(
        &self,
        path: &str,
        mut content: BlobStream,
        metadata: BlobMetadata,
    ) -> Result<u64, StorageError> {
        validate_path(path)?;

        let mut buffer = Vec::new();
        content
            .read_to_end(&mut buffer)
            .await
            .map_err(|e| StorageError::io(path, e))?;

        let size = buffer.len() as u64;
        self.blobs.insert(
            path.to_string(),
            StoredBlob {
                data: Arc::from(buffer),
                metadata,
            },
        );

        tracing::debug!(path = %path, size, "Blob stored in memory");
        Ok(size)
    }
}
