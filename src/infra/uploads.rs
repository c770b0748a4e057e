//! Filesystem storage for uploaded media.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use slug::slugify;
use thiserror::Error;
use tokio::{fs, io::AsyncWriteExt};
use uuid::Uuid;

use crate::application::media::{MediaError, MediaStore};

#[derive(Debug, Error)]
pub enum UploadStorageError {
    #[error("invalid stored path")]
    InvalidPath,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("uploaded file is empty")]
    EmptyPayload,
}

/// Media files stored below a single root directory.
#[derive(Debug)]
pub struct UploadStorage {
    root: PathBuf,
}

impl UploadStorage {
    /// Initialise storage rooted at the provided directory, creating it if necessary.
    pub fn new(root: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `data` to `<prefix>/<yyyy>/<mm>/<dd>/<uuid>-<name>` and return that relative path.
    pub async fn write(
        &self,
        prefix: &str,
        original_name: &str,
        data: Bytes,
    ) -> Result<String, UploadStorageError> {
        if data.is_empty() {
            return Err(UploadStorageError::EmptyPayload);
        }

        let stored_path = build_stored_path(prefix, original_name);
        let absolute = self.resolve(&stored_path)?;
        if let Some(parent) = absolute.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::File::create(&absolute).await?;
        if let Err(err) = file.write_all(&data).await {
            drop(file);
            let _ = fs::remove_file(&absolute).await;
            return Err(err.into());
        }
        file.flush().await?;

        Ok(stored_path)
    }

    pub async fn read_file(&self, stored_path: &str) -> Result<Bytes, UploadStorageError> {
        let absolute = self.resolve(stored_path)?;
        let data = fs::read(absolute).await?;
        Ok(Bytes::from(data))
    }

    /// Remove a stored file. Missing files are treated as success.
    pub async fn remove(&self, stored_path: &str) -> Result<(), UploadStorageError> {
        let absolute = self.resolve(stored_path)?;
        match fs::remove_file(&absolute).await {
            Ok(_) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(UploadStorageError::Io(err)),
        }
    }

    fn resolve(&self, stored_path: &str) -> Result<PathBuf, UploadStorageError> {
        let relative = Path::new(stored_path);
        if stored_path.is_empty()
            || relative.is_absolute()
            || relative.components().any(|component| {
                matches!(
                    component,
                    Component::ParentDir | Component::Prefix(_) | Component::RootDir
                )
            })
        {
            return Err(UploadStorageError::InvalidPath);
        }

        Ok(self.root.join(relative))
    }
}

fn build_stored_path(prefix: &str, original_name: &str) -> String {
    let (year, month, day) = time::OffsetDateTime::now_utc().to_calendar_date();
    let identifier = Uuid::new_v4().simple();
    let filename = sanitize_filename(original_name);
    let prefix = prefix.trim_matches('/');
    format!("{prefix}/{year}/{:02}/{day:02}/{identifier}-{filename}", month as u8)
}

fn sanitize_filename(original: &str) -> String {
    let path = Path::new(original);
    let stem = path
        .file_stem()
        .and_then(|value| value.to_str())
        .unwrap_or("upload");
    let mut base = slugify(stem);
    if base.is_empty() {
        base = "upload".to_string();
    }

    let extension = path
        .extension()
        .and_then(|value| value.to_str())
        .map(|value| value.trim_matches('.').to_ascii_lowercase())
        .filter(|value| !value.is_empty());

    match extension {
        Some(ext) => format!("{base}.{ext}"),
        None => base,
    }
}

impl From<UploadStorageError> for MediaError {
    fn from(err: UploadStorageError) -> Self {
        match err {
            UploadStorageError::InvalidPath => MediaError::InvalidPath(String::new()),
            UploadStorageError::EmptyPayload => MediaError::EmptyPayload,
            UploadStorageError::Io(err) => MediaError::Io(err),
        }
    }
}

#[async_trait]
impl MediaStore for UploadStorage {
    async fn store(&self, prefix: &str, filename: &str, data: Bytes) -> Result<String, MediaError> {
        Ok(self.write(prefix, filename, data).await?)
    }

    async fn read(&self, stored_path: &str) -> Result<Bytes, MediaError> {
        match self.read_file(stored_path).await {
            Ok(data) => Ok(data),
            Err(UploadStorageError::InvalidPath) => {
                Err(MediaError::InvalidPath(stored_path.to_string()))
            }
            Err(UploadStorageError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(MediaError::NotFound(stored_path.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn delete(&self, stored_path: &str) -> Result<(), MediaError> {
        Ok(self.remove(stored_path).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_filename_slugifies_stem() {
        assert_eq!(sanitize_filename("My Cat Photo.JPG"), "my-cat-photo.jpg");
        assert_eq!(sanitize_filename("???"), "upload");
        assert_eq!(sanitize_filename("noext"), "noext");
    }

    #[test]
    fn stored_path_is_bucketed_under_prefix() {
        let path = build_stored_path("posts", "small.gif");
        let parts: Vec<&str> = path.split('/').collect();
        assert_eq!(parts.len(), 5);
        assert_eq!(parts[0], "posts");
        assert!(parts[4].ends_with("-small.gif"));
    }

    #[tokio::test]
    async fn write_read_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let storage = UploadStorage::new(dir.path().to_path_buf()).unwrap();

        let stored = storage
            .write("posts", "a.gif", Bytes::from_static(b"GIF89a"))
            .await
            .unwrap();
        assert!(storage.root().join(&stored).exists());
        assert_eq!(storage.read_file(&stored).await.unwrap(), &b"GIF89a"[..]);

        storage.remove(&stored).await.unwrap();
        assert!(!storage.root().join(&stored).exists());
        storage.remove(&stored).await.unwrap();
    }

    #[tokio::test]
    async fn rejects_escaping_paths() {
        let dir = tempfile::tempdir().unwrap();
        let storage = UploadStorage::new(dir.path().to_path_buf()).unwrap();

        assert!(matches!(
            storage.read_file("../secret").await,
            Err(UploadStorageError::InvalidPath)
        ));
        assert!(matches!(
            storage.read_file("/etc/passwd").await,
            Err(UploadStorageError::InvalidPath)
        ));
        assert!(matches!(
            MediaStore::read(&storage, "posts/missing.gif").await,
            Err(MediaError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn empty_payload_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let storage = UploadStorage::new(dir.path().to_path_buf()).unwrap();
        assert!(matches!(
            storage.write("posts", "a.gif", Bytes::new()).await,
            Err(UploadStorageError::EmptyPayload)
        ));
    }
}
