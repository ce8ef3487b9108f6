//! File-system capability used by the download orchestrator.

use std::io;
use std::path::Path;

use async_trait::async_trait;
use tokio::io::AsyncWrite;

/// Writable byte sink returned by [`Storage::create`].
pub type FileSink = Box<dyn AsyncWrite + Send + Unpin>;

/// The handful of file operations the orchestrator needs. Paths are
/// absolute or relative to the process working directory.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn exists(&self, path: &Path) -> bool;

    async fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Create or truncate `path` for writing.
    async fn create(&self, path: &Path) -> io::Result<FileSink>;

    async fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    async fn remove_file(&self, path: &Path) -> io::Result<()>;
}

/// [`Storage`] backed by the local disk via `tokio::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorage;

#[async_trait]
impl Storage for LocalStorage {
    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }

    async fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        tokio::fs::create_dir_all(path).await
    }

    async fn create(&self, path: &Path) -> io::Result<FileSink> {
        let file = tokio::fs::File::create(path).await?;
        Ok(Box::new(file))
    }

    async fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        tokio::fs::rename(from, to).await
    }

    async fn remove_file(&self, path: &Path) -> io::Result<()> {
        tokio::fs::remove_file(path).await
    }
}
