//! Directory-backed blob storage.
//!
//! Each blob is a data file under the root plus a `<name>.meta.json` sidecar
//! holding its metadata. Uploads are written to temporary files in the
//! target directory and renamed into place.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use super::{BlobMetadata, BlobStorage, BlobStream, StorageError, validate_path};

const METADATA_SUFFIX: &str = ".meta.json";

#[derive(Debug, Clone)]
pub struct FilesystemBlobStorage {
    root: PathBuf,
}

impl FilesystemBlobStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn data_path(&self, path: &str) -> Result<PathBuf, StorageError> {
        validate_path(path)?;
        if path.ends_with(METADATA_SUFFIX) {
            return Err(StorageError::InvalidPath {
                path: path.to_string(),
                reason: format!("names ending in '{}' are reserved", METADATA_SUFFIX),
            });
        }
        Ok(self.root.join(path))
    }

    fn metadata_path(data_path: &Path) -> PathBuf {
        let mut name = data_path.as_os_str().to_os_string();
        name.push(METADATA_SUFFIX);
        PathBuf::from(name)
    }

    fn temp_path(data_path: &Path) -> PathBuf {
        let name = data_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        data_path.with_file_name(format!(".{}.{}.tmp", name, Uuid::new_v4().simple()))
    }

    async fn write_data(
        path: &str,
        temp: &Path,
        mut content: BlobStream,
    ) -> Result<u64, StorageError> {
        let mut file = fs::File::create(temp)
            .await
            .map_err(|e| StorageError::io(path, e))?;
        let written = tokio::io::copy(&mut content, &mut file)
            .await
            .map_err(|e| StorageError::io(path, e))?;
        file.flush().await.map_err(|e| StorageError::io(path, e))?;
        file.sync_all().await.map_err(|e| StorageError::io(path, e))?;
        Ok(written)
    }

    async fn remove_quietly(path: &Path) {
        match fs::remove_file(path).await {
            Err(e) if e.kind() != io::ErrorKind::NotFound => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Failed to remove temporary blob file"
                );
            }
            _ => {}
        }
    }
}

#[async_trait]
impl BlobStorage for FilesystemBlobStorage {
    fn name(&self) -> &'static str {
        "filesystem"
    }

    async fn exists(&self, path: &str) -> Result<bool, StorageError> {
        let data_path = self.data_path(path)?;
        match fs::metadata(&data_path).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::io(path, e)),
        }
    }

    async fn get_metadata(&self, path: &str) -> Result<Option<BlobMetadata>, StorageError> {
        if !self.exists(path).await? {
            return Ok(None);
        }

        let sidecar = Self::metadata_path(&self.data_path(path)?);
        match fs::read(&sidecar).await {
            Ok(raw) => serde_json::from_slice(&raw)
                .map(Some)
                .map_err(|source| StorageError::Metadata {
                    path: path.to_string(),
                    source,
                }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Some(BlobMetadata::new())),
            Err(e) => Err(StorageError::io(path, e)),
        }
    }

    async fn download(&self, path: &str) -> Result<Option<BlobStream>, StorageError> {
        let data_path = self.data_path(path)?;
        match fs::File::open(&data_path).await {
            Ok(file) => Ok(Some(Box::new(file))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::io(path, e)),
        }
    }

    async fn upload(
        &self,
        path: &str,
        content: BlobStream,
        metadata: BlobMetadata,
    ) -> Result<u64, StorageError> {
        let data_path = self.data_path(path)?;
        if let Some(parent) = data_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::io(path, e))?;
        }

        let encoded = serde_json::to_vec(&metadata).map_err(|source| StorageError::Metadata {
            path: path.to_string(),
            source,
        })?;

        let data_temp = Self::temp_path(&data_path);
        let written = match Self::write_data(path, &data_temp, content).await {
            Ok(written) => written,
            Err(e) => {
                Self::remove_quietly(&data_temp).await;
                return Err(e);
            }
        };

        // Sidecar lands first; the blob only becomes visible once the data
        // file is renamed.
        let sidecar = Self::metadata_path(&data_path);
        let sidecar_temp = Self::temp_path(&sidecar);
        let sidecar_result = async {
            fs::write(&sidecar_temp, &encoded).await?;
            fs::rename(&sidecar_temp, &sidecar).await
        }
        .await;
        if let Err(e) = sidecar_result {
            Self::remove_quietly(&sidecar_temp).await;
            Self::remove_quietly(&data_temp).await;
            return Err(StorageError::io(path, e));
        }

        if let Err(e) = fs::rename(&data_temp, &data_path).await {
            Self::remove_quietly(&data_temp).await;
            Self::remove_quietly(&sidecar).await;
            return Err(StorageError::io(path, e));
        }

        tracing::debug!(path = %path, size = written, "Blob stored on disk");
        Ok(written)
    }
}
