use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::info;
use nanoid::nanoid;
use tokio::{fs::OpenOptions, io::AsyncWriteExt};

use super::{util::sanitize_filename, BlobError, BlobStore, MediaUpload, UploadedMedia, FILENAME_REGEX};

/// Stores uploads on the local filesystem, served back by the `/media` route.
///
/// Files live at `{root}/{folder}/{id}_{filename}` and are linked as
/// `{public_url}/media/{folder}/{id}/{filename}`.
pub struct LocalBlobStore {
    root: PathBuf,
    public_url: String,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>, public_url: &str) -> Self {
        Self {
            root: root.into(),
            public_url: public_url.trim_end_matches('/').to_owned(),
        }
    }

    /// Where a stored file lives on disk, or `None` if any component could
    /// escape the media directory.
    pub fn path_for(&self, folder: &str, id: &str, filename: &str) -> Option<PathBuf> {
        let stored = format!("{}_{}", id, filename);

        // path traversal prevention
        if !FILENAME_REGEX.is_match(folder) || !FILENAME_REGEX.is_match(&stored) {
            return None;
        }
        if folder.starts_with('.') || stored.starts_with('.') {
            return None;
        }

        Some(self.root.join(folder).join(stored))
    }
}

async fn save_file(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut file = OpenOptions::new()
        .create_new(true)
        .write(true)
        .open(path)
        .await?;

    file.write_all(bytes).await?;
    file.flush().await
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn upload(&self, media: MediaUpload) -> Result<UploadedMedia, BlobError> {
        let id = nanoid!();
        let filename = sanitize_filename(&media.filename);

        let path = self
            .path_for(media.folder, &id, &filename)
            .ok_or(BlobError::InvalidName)?;

        save_file(&path, &media.bytes).await?;
        info!("stored `{}` ({} bytes)", path.display(), media.bytes.len());

        Ok(UploadedMedia {
            url: format!("{}/media/{}/{}/{}", self.public_url, media.folder, id, filename),
        })
    }
}
