//! Directory scanner for the triage folders.
//!
//! Lists the supported media filenames in one folder. Read failures are
//! deliberately swallowed: a folder may legitimately not exist yet on first
//! run, and a transient I/O error should degrade to "nothing here" rather
//! than abort the surrounding reconciliation pass.

use bridge_traits::storage::FileSystemAccess;
use core_library::models::is_supported_extension;
use core_library::naming;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Lists supported media filenames in a single folder.
#[derive(Clone)]
pub struct DirectoryScanner {
    filesystem: Arc<dyn FileSystemAccess>,
}

impl DirectoryScanner {
    pub fn new(filesystem: Arc<dyn FileSystemAccess>) -> Self {
        Self { filesystem }
    }

    /// Return the media filenames in `folder`, unsorted.
    ///
    /// Entries whose extension is not in the fixed allow-list are dropped.
    /// On any listing failure the folder is treated as empty and a warning
    /// is logged; the failure never propagates.
    pub async fn list(&self, folder: &Path) -> Vec<String> {
        let entries = match self.filesystem.list_directory(folder).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(folder = ?folder, error = %e, "Folder listing failed; treating as empty");
                return Vec::new();
            }
        };

        let names: Vec<String> = entries
            .into_iter()
            .filter_map(|path| {
                path.file_name()
                    .map(|name| name.to_string_lossy().into_owned())
            })
            .filter(|name| is_supported_extension(&naming::extension_of(name)))
            .collect();

        debug!(folder = ?folder, count = names.len(), "Scanned folder");
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_desktop::TokioFileSystem;
    use bytes::Bytes;
    use tempfile::TempDir;

    async fn scanner_over(dir: &TempDir, files: &[&str]) -> DirectoryScanner {
        let fs = TokioFileSystem::new();
        for name in files {
            fs.write_file(&dir.path().join(name), Bytes::from_static(b"x"))
                .await
                .unwrap();
        }
        DirectoryScanner::new(Arc::new(fs))
    }

    #[tokio::test]
    async fn test_filters_to_media_extensions() {
        let dir = TempDir::new().unwrap();
        let scanner = scanner_over(&dir, &["IMG_1.jpg", "CLIP.mp4", "notes.txt", "IMG_2.HEIC"]).await;

        let mut names = scanner.list(dir.path()).await;
        names.sort();
        assert_eq!(names, vec!["CLIP.mp4", "IMG_1.jpg", "IMG_2.HEIC"]);
    }

    #[tokio::test]
    async fn test_missing_folder_is_empty() {
        let dir = TempDir::new().unwrap();
        let scanner = scanner_over(&dir, &[]).await;

        let names = scanner.list(&dir.path().join("does-not-exist")).await;
        assert!(names.is_empty());
    }

    #[tokio::test]
    async fn test_versioned_names_pass_filter() {
        let dir = TempDir::new().unwrap();
        let scanner = scanner_over(&dir, &["IMG_1~2.jpg"]).await;

        let names = scanner.list(dir.path()).await;
        assert_eq!(names, vec!["IMG_1~2.jpg"]);
    }
}
