//! HTTP blob store: `POST /upload` with a multipart `files` field.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use tracing::{debug, warn};

use wip_core::{BlobStore, Error, LocalFile, Result, StoredBlob, UploadResponse};

use crate::client::ApiClient;
use crate::config::ClientConfig;

/// Blob store backed by the wip HTTP API.
#[derive(Debug, Clone)]
pub struct HttpBlobStore {
    api: ApiClient,
}

impl HttpBlobStore {
    pub fn new(config: ClientConfig) -> Result<Self> {
        Ok(Self {
            api: ApiClient::new(&config)?,
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env())
    }

    /// Upload several files in one request.
    ///
    /// Per-file rejections come back in `errors`; the request itself only
    /// fails when nothing could be processed.
    pub async fn upload_many(&self, files: &[LocalFile]) -> Result<UploadResponse> {
        let mut form = Form::new();
        for file in files {
            let part = Part::bytes(file.data.to_vec())
                .file_name(file.name.clone())
                .mime_str(&file.mime_type)?;
            form = form.part("files", part);
        }

        let response = self
            .api
            .http()
            .post(self.api.url("upload")?)
            .multipart(form)
            .send()
            .await?;
        let body: UploadResponse = self.api.check("POST /upload", response).await?.json().await?;
        debug!(
            uploaded = body.files.len(),
            rejected = body.errors.as_ref().map_or(0, Vec::len),
            "Upload finished"
        );
        Ok(body)
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn upload(&self, file: &LocalFile) -> Result<StoredBlob> {
        let body = self
            .upload_many(std::slice::from_ref(file))
            .await
            .map_err(|e| Error::Upload(format!("{}: {}", file.name, e)))?;

        if let Some(failure) = body.errors.into_iter().flatten().next() {
            warn!(file = %failure.file, error = %failure.error, "Upload rejected");
            return Err(Error::Upload(format!("{}: {}", failure.file, failure.error)));
        }

        body.files
            .into_iter()
            .next()
            .map(|f| StoredBlob {
                url: f.url,
                path: f.path,
            })
            .ok_or_else(|| Error::Upload(format!("{}: empty upload response", file.name)))
    }
}
