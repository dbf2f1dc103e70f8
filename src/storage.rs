// src/storage.rs

//! Blueprint image storage: upload-by-name returning a public URL.

use std::io;
use std::path::PathBuf;

use async_trait::async_trait;

/// Bucket that holds exam blueprints.
pub const BLUEPRINT_BUCKET: &str = "blueprints";

/// Mount point for stored files on the HTTP server.
pub const FILES_ROUTE: &str = "/files";

pub const MAX_BLUEPRINT_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    #[error("invalid file name: {0}")]
    InvalidName(String),

    #[error("file already exists: {0}")]
    AlreadyExists(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores `bytes` under `name` in `bucket` and returns the public URL.
    /// Without `upsert`, an existing object is left alone and the call fails.
    async fn upload(&self, bucket: &str, name: &str, bytes: &[u8], upsert: bool) -> Result<String, BlobError>;
}

/// Names are a single path segment of letters, digits, `.`, `_` and `-`,
/// not starting with a dot.
pub fn validate_name(name: &str) -> Result<(), BlobError> {
    let ok = !name.is_empty()
        && name.len() <= 200
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if ok {
        Ok(())
    } else {
        Err(BlobError::InvalidName(name.to_string()))
    }
}

/// Files under `<root>/<bucket>/<name>`, served at
/// `<public_base_url>/files/<bucket>/<name>`.
pub struct LocalBlobStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into(),
        }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    pub fn public_url(&self, bucket: &str, name: &str) -> String {
        format!("{}{}/{}/{}", self.public_base_url, FILES_ROUTE, bucket, name)
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn upload(&self, bucket: &str, name: &str, bytes: &[u8], upsert: bool) -> Result<String, BlobError> {
        validate_name(bucket)?;
        validate_name(name)?;

        let dir = self.root.join(bucket);
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join(name);

        if upsert {
            tokio::fs::write(&path, bytes).await?;
        } else {
            use tokio::io::AsyncWriteExt;
            let mut file = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
                .map_err(|e| match e.kind() {
                    io::ErrorKind::AlreadyExists => BlobError::AlreadyExists(name.to_string()),
                    _ => BlobError::Io(e),
                })?;
            file.write_all(bytes).await?;
            file.flush().await?;
        }

        tracing::info!("Stored {}/{} ({} bytes)", bucket, name, bytes.len());
        Ok(self.public_url(bucket, name))
    }
}
