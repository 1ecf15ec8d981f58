//! File System Abstraction
//!
//! Platform-agnostic trait for the file operations the triage core performs:
//! listing the three triage folders, stat, copy, delete, whole-file read and
//! write, and resolution of a host-displayable reference for a path.

use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// File metadata information
#[derive(Debug, Clone)]
pub struct FileMetadata {
    pub size: u64,
    /// Unix milliseconds, when the platform reports one.
    pub modified_at: Option<i64>,
    pub is_directory: bool,
}

/// File system access trait
///
/// Abstracts file I/O so the core runs unchanged against a desktop disk, a
/// sandboxed mobile storage root, or an in-memory fake in tests. Every method
/// is an async suspension point; none blocks the caller for the duration of
/// the underlying I/O.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::FileSystemAccess;
///
/// async fn promote(fs: &dyn FileSystemAccess, src: &Path, dst: &Path) -> Result<()> {
///     fs.create_dir_all(dst.parent().unwrap()).await?;
///     fs.copy_file(src, dst).await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait FileSystemAccess: Send + Sync {
    /// Check if a file or directory exists
    async fn exists(&self, path: &Path) -> Result<bool>;

    /// Get metadata for a file or directory
    async fn metadata(&self, path: &Path) -> Result<FileMetadata>;

    /// Create a directory and all parent directories if they don't exist
    async fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// List all entries in a directory
    async fn list_directory(&self, path: &Path) -> Result<Vec<PathBuf>>;

    /// Read entire file contents into memory
    async fn read_file(&self, path: &Path) -> Result<Bytes>;

    /// Write data to a file, creating it if it doesn't exist
    async fn write_file(&self, path: &Path, data: Bytes) -> Result<()>;

    /// Copy a file, overwriting the destination if present
    async fn copy_file(&self, from: &Path, to: &Path) -> Result<()>;

    /// Delete a file
    async fn delete_file(&self, path: &Path) -> Result<()>;

    /// Resolve a reference the host UI can render for this path.
    ///
    /// Desktop implementations return a `file://` URI; mobile webview hosts
    /// translate into whatever scheme their asset loader expects.
    fn resolve_display_uri(&self, path: &Path) -> String;
}
