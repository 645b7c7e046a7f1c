//! Media hosting boundary.
//!
//! Uploaded files arrive as local paths staged by the request layer. The core
//! hands each path to a [`MediaStore`] and only keeps the returned URL.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::uuid::new_object_id;

/// Media errors.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Upload failed: {0}")]
    Upload(String),
}

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedMedia {
    pub url: String,
}

/// File storage collaborator.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Upload the file at `local_path`, returning where it is served from.
    async fn upload(&self, local_path: &Path) -> Result<UploadedMedia, MediaError>;
}

/// Media store that moves staged files into a directory served under
/// `base_url`.
#[derive(Debug, Clone)]
pub struct LocalMediaStore {
    root: PathBuf,
    base_url: String,
}

impl LocalMediaStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn upload(&self, local_path: &Path) -> Result<UploadedMedia, MediaError> {
        if !tokio::fs::try_exists(local_path).await.unwrap_or(false) {
            return Err(MediaError::NotFound(local_path.display().to_string()));
        }

        let file_name = match local_path.extension().and_then(|e| e.to_str()) {
            Some(ext) => format!("{}.{ext}", new_object_id()),
            None => new_object_id(),
        };
        let target = self.root.join(&file_name);

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| MediaError::Upload(format!("create {}: {e}", self.root.display())))?;
        tokio::fs::copy(local_path, &target)
            .await
            .map_err(|e| MediaError::Upload(format!("copy to {}: {e}", target.display())))?;

        // The staged file is ours to clean up, whatever happens next.
        if let Err(e) = tokio::fs::remove_file(local_path).await {
            warn!(path = %local_path.display(), error = %e, "failed to remove staged upload");
        }

        let url = format!("{}/{file_name}", self.base_url);
        info!(%url, "media stored");
        Ok(UploadedMedia { url })
    }
}
