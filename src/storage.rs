//! Image storage.
//!
//! Uploaded image bytes are written under a single uploads directory with a
//! generated name; the store hands back the public URL that gets persisted
//! verbatim as the record's `imageUrl` and served by the uploads route.

use anyhow::Context;
use std::path::PathBuf;

pub const URL_PREFIX: &str = "/uploads";

#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map an image content type to the stored file extension. Anything
    /// outside this list is rejected before reaching disk.
    pub fn extension_for(content_type: &str) -> Option<&'static str> {
        match content_type {
            "image/jpeg" => Some("jpg"),
            "image/png" => Some("png"),
            "image/gif" => Some("gif"),
            "image/webp" => Some("webp"),
            _ => None,
        }
    }

    /// Persist image bytes and return the public URL.
    pub async fn save(&self, data: &[u8], content_type: &str) -> anyhow::Result<String> {
        let ext = Self::extension_for(content_type)
            .with_context(|| format!("unsupported image type {}", content_type))?;

        tokio::fs::create_dir_all(&self.root)
            .await
            .context("failed to create uploads directory")?;

        let file_name = format!("{}.{}", uuid::Uuid::now_v7(), ext);
        let path = self.root.join(&file_name);
        tokio::fs::write(&path, data)
            .await
            .with_context(|| format!("failed to write upload {}", path.display()))?;

        Ok(format!("{}/{}", URL_PREFIX, file_name))
    }

    /// Resolve a stored file name to its on-disk path. Rejects anything
    /// that is not a bare file name, so the serving route cannot traverse
    /// out of the uploads directory.
    pub fn resolve(&self, file_name: &str) -> Option<PathBuf> {
        if file_name.is_empty()
            || file_name.contains('/')
            || file_name.contains('\\')
            || file_name.contains("..")
        {
            return None;
        }
        Some(self.root.join(file_name))
    }

    /// Best-effort removal of a previously stored image by its public URL.
    /// Failures are logged and swallowed: a leftover file never fails the
    /// request that replaced or deleted the record.
    pub async fn remove_by_url(&self, url: &str) {
        let Some(file_name) = url.strip_prefix(&format!("{}/", URL_PREFIX)) else {
            return;
        };
        let Some(path) = self.resolve(file_name) else {
            return;
        };
        if let Err(e) = tokio::fs::remove_file(&path).await {
            tracing::debug!("could not remove upload {}: {}", path.display(), e);
        }
    }
}
