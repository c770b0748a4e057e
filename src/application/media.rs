//! Storage port for uploaded media files.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("media path `{0}` is outside the media root")]
    InvalidPath(String),
    #[error("media file `{0}` not found")]
    NotFound(String),
    #[error("upload payload is empty")]
    EmptyPayload,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Persist `data` below `prefix` and return the path relative to the media root.
    async fn store(&self, prefix: &str, filename: &str, data: Bytes) -> Result<String, MediaError>;

    async fn read(&self, stored_path: &str) -> Result<Bytes, MediaError>;

    async fn delete(&self, stored_path: &str) -> Result<(), MediaError>;
}
