//! Filesystem blob store.
//!
//! Uploads land at `{base_path}/{bucket}/{generated_path}` and are served
//! from `{public_base_url}/{bucket}/{generated_path}`. Writes are atomic
//! (temp file + rename).
//!
//! ## Example
//!
//! ```rust,ignore
//! use wip_store::FilesystemBlobStore;
//!
//! let blobs = FilesystemBlobStore::new("/var/lib/wip/blobs", "https://wip.example.com/media");
//! blobs.validate().await?;
//! let stored = blobs.upload(&file).await?;
//! ```

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use wip_core::defaults::STORAGE_BUCKET;
use wip_core::{generate_file_path, BlobStore, Error, LocalFile, Result, StoredBlob};

/// Blob store writing to a local directory.
pub struct FilesystemBlobStore {
    base_path: PathBuf,
    public_base_url: String,
    bucket: String,
}

impl FilesystemBlobStore {
    /// Create a store rooted at `base_path`, publishing under `public_base_url`.
    pub fn new(base_path: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
            bucket: STORAGE_BUCKET.to_string(),
        }
    }

    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = bucket.into();
        self
    }

    pub fn base_path(&self) -> &PathBuf {
        &self.base_path
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn full_path(&self, path: &str) -> Result<PathBuf> {
        if path.is_empty() || path.contains('/') || path.contains('\\') || path.starts_with('.') {
            return Err(Error::InvalidInput(format!("invalid blob path: {}", path)));
        }
        Ok(self.base_path.join(&self.bucket).join(path))
    }

    /// Public URL of a stored path.
    pub fn public_url(&self, path: &str) -> String {
        format!("{}/{}/{}", self.public_base_url, self.bucket, path)
    }

    /// Validate that the store can write, read, and delete files.
    ///
    /// Performs a full round-trip at startup to catch permission errors and
    /// missing directories early.
    pub async fn validate(&self) -> std::result::Result<(), String> {
        let test_dir = self.base_path.join(".health-check");
        let test_file = test_dir.join("test.bin");

        fs::create_dir_all(&test_dir)
            .await
            .map_err(|e| format!("create_dir_all({:?}): {}", test_dir, e))?;

        let data = b"storage-health-check";
        fs::write(&test_file, data)
            .await
            .map_err(|e| format!("write({:?}): {}", test_file, e))?;

        let read_data = fs::read(&test_file)
            .await
            .map_err(|e| format!("read({:?}): {}", test_file, e))?;
        if read_data != data {
            return Err("read-back mismatch".to_string());
        }

        fs::remove_file(&test_file)
            .await
            .map_err(|e| format!("remove_file({:?}): {}", test_file, e))?;
        let _ = fs::remove_dir(&test_dir).await;

        Ok(())
    }

    /// Write `data` under `path` inside the bucket.
    pub async fn write(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.full_path(path)?;
        debug!(storage_path = %path, full_path = %full_path.display(), size = data.len(), "blob_store: write");

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                warn!(parent = %parent.display(), error = %e, "blob_store: create_dir_all failed");
                e
            })?;
        }

        let temp_path = full_path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await.map_err(|e| {
            warn!(temp_path = %temp_path.display(), error = %e, "blob_store: File::create failed");
            e
        })?;
        file.write_all(data).await.map_err(|e| {
            warn!(error = %e, "blob_store: write_all failed");
            e
        })?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, &full_path).await.map_err(|e| {
            warn!(from = %temp_path.display(), to = %full_path.display(), error = %e, "blob_store: rename failed");
            e
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&full_path, std::fs::Permissions::from_mode(0o644)).await?;
        }

        Ok(())
    }

    pub async fn read(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = self.full_path(path)?;
        match fs::read(&full_path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::NotFound(format!("blob {}", path)))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn exists(&self, path: &str) -> Result<bool> {
        let full_path = self.full_path(path)?;
        Ok(fs::try_exists(full_path).await?)
    }
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    async fn upload(&self, file: &LocalFile) -> Result<StoredBlob> {
        let path = generate_file_path(&file.name);
        self.write(&path, &file.data)
            .await
            .map_err(|e| Error::Upload(format!("{}: {}", file.name, e)))?;
        debug!(file = %file.name, storage_path = %path, "blob_store: uploaded");
        Ok(StoredBlob {
            url: self.public_url(&path),
            path,
        })
    }
}
