//! File System Access Implementation using Tokio

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::{FileMetadata, FileSystemAccess},
};
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Tokio-based file system implementation
///
/// Backs the triage folders with the local disk using `tokio::fs`. Display
/// references are plain `file://` URIs, which desktop webviews and image
/// widgets load directly.
#[derive(Debug, Default, Clone)]
pub struct TokioFileSystem;

impl TokioFileSystem {
    pub fn new() -> Self {
        Self
    }

    /// Convert std::io::Error to BridgeError
    fn map_io_error(e: std::io::Error) -> BridgeError {
        BridgeError::Io(e)
    }
}

#[async_trait]
impl FileSystemAccess for TokioFileSystem {
    async fn exists(&self, path: &Path) -> Result<bool> {
        Ok(fs::try_exists(path).await.map_err(Self::map_io_error)?)
    }

    async fn metadata(&self, path: &Path) -> Result<FileMetadata> {
        let metadata = fs::metadata(path).await.map_err(Self::map_io_error)?;

        Ok(FileMetadata {
            size: metadata.len(),
            modified_at: metadata
                .modified()
                .ok()
                .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
                .map(|d| d.as_millis() as i64),
            is_directory: metadata.is_dir(),
        })
    }

    async fn create_dir_all(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path).await.map_err(Self::map_io_error)?;
        debug!(path = ?path, "Created directory");
        Ok(())
    }

    async fn list_directory(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let mut entries = Vec::new();
        let mut read_dir = fs::read_dir(path).await.map_err(Self::map_io_error)?;

        while let Some(entry) = read_dir.next_entry().await.map_err(Self::map_io_error)? {
            entries.push(entry.path());
        }

        debug!(path = ?path, count = entries.len(), "Listed directory");
        Ok(entries)
    }

    async fn read_file(&self, path: &Path) -> Result<Bytes> {
        let data = fs::read(path).await.map_err(Self::map_io_error)?;
        debug!(path = ?path, size = data.len(), "Read file");
        Ok(Bytes::from(data))
    }

    async fn write_file(&self, path: &Path, data: Bytes) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            self.create_dir_all(parent).await?;
        }

        fs::write(path, data.as_ref())
            .await
            .map_err(Self::map_io_error)?;
        debug!(path = ?path, size = data.len(), "Wrote file");
        Ok(())
    }

    async fn copy_file(&self, from: &Path, to: &Path) -> Result<()> {
        if let Some(parent) = to.parent() {
            self.create_dir_all(parent).await?;
        }

        let copied = fs::copy(from, to).await.map_err(Self::map_io_error)?;
        debug!(from = ?from, to = ?to, size = copied, "Copied file");
        Ok(())
    }

    async fn delete_file(&self, path: &Path) -> Result<()> {
        fs::remove_file(path).await.map_err(Self::map_io_error)?;
        debug!(path = ?path, "Deleted file");
        Ok(())
    }

    fn resolve_display_uri(&self, path: &Path) -> String {
        format!("file://{}", path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_read_delete() {
        let dir = TempDir::new().unwrap();
        let fs = TokioFileSystem::new();
        let file = dir.path().join("test-file.txt");

        let data = Bytes::from("Hello, World!");
        fs.write_file(&file, data.clone()).await.unwrap();

        let read_data = fs.read_file(&file).await.unwrap();
        assert_eq!(data, read_data);

        fs.delete_file(&file).await.unwrap();
        assert!(!fs.exists(&file).await.unwrap());
    }

    #[tokio::test]
    async fn test_copy_creates_parent() {
        let dir = TempDir::new().unwrap();
        let fs = TokioFileSystem::new();
        let src = dir.path().join("src.jpg");
        let dst = dir.path().join("nested").join("dst.jpg");

        fs.write_file(&src, Bytes::from_static(b"jpeg")).await.unwrap();
        fs.copy_file(&src, &dst).await.unwrap();

        assert_eq!(fs.read_file(&dst).await.unwrap(), Bytes::from_static(b"jpeg"));
        // Source is untouched by a copy
        assert!(fs.exists(&src).await.unwrap());
    }

    #[tokio::test]
    async fn test_metadata_reports_size_and_mtime() {
        let dir = TempDir::new().unwrap();
        let fs = TokioFileSystem::new();
        let file = dir.path().join("sized.bin");

        fs.write_file(&file, Bytes::from(vec![0u8; 64])).await.unwrap();

        let meta = fs.metadata(&file).await.unwrap();
        assert_eq!(meta.size, 64);
        assert!(meta.modified_at.unwrap_or(0) > 0);
        assert!(!meta.is_directory);
    }

    #[tokio::test]
    async fn test_list_missing_directory_errors() {
        let dir = TempDir::new().unwrap();
        let fs = TokioFileSystem::new();
        let missing = dir.path().join("nope");

        assert!(fs.list_directory(&missing).await.is_err());
    }

    #[test]
    fn test_display_uri() {
        let fs = TokioFileSystem::new();
        let uri = fs.resolve_display_uri(Path::new("/dcim/IMG_1.jpg"));
        assert_eq!(uri, "file:///dcim/IMG_1.jpg");
    }
}
