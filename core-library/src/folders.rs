//! Triage folder layout.
//!
//! Three fixed locations: a read-only camera source folder and two writable
//! working folders. The writable folders are created lazily (idempotent
//! "create if absent"), so a fresh install needs no setup step.

use std::path::{Path, PathBuf};

use bridge_traits::storage::FileSystemAccess;

/// The three physical locations a record can live in.
#[derive(Debug, Clone)]
pub struct FolderLayout {
    /// Read-only source folder; the core never writes or deletes here.
    pub camera: PathBuf,
    /// Working folder for files being edited; the only place version
    /// suffixes are valid.
    pub pending: PathBuf,
    /// Destination folder for finished files.
    pub completed: PathBuf,
}

impl FolderLayout {
    pub fn new(
        camera: impl Into<PathBuf>,
        pending: impl Into<PathBuf>,
        completed: impl Into<PathBuf>,
    ) -> Self {
        Self {
            camera: camera.into(),
            pending: pending.into(),
            completed: completed.into(),
        }
    }

    pub fn camera_file(&self, name: &str) -> PathBuf {
        self.camera.join(name)
    }

    pub fn pending_file(&self, name: &str) -> PathBuf {
        self.pending.join(name)
    }

    pub fn completed_file(&self, name: &str) -> PathBuf {
        self.completed.join(name)
    }

    /// Create the two writable folders if absent. The camera folder is left
    /// alone; it belongs to the platform.
    pub async fn ensure_writable(
        &self,
        filesystem: &dyn FileSystemAccess,
    ) -> bridge_traits::error::Result<()> {
        filesystem.create_dir_all(&self.pending).await?;
        filesystem.create_dir_all(&self.completed).await?;
        Ok(())
    }
}

/// Convenience for tests and single-root hosts: `<root>/camera`,
/// `<root>/pending`, `<root>/completed`.
impl From<&Path> for FolderLayout {
    fn from(root: &Path) -> Self {
        Self::new(
            root.join("camera"),
            root.join("pending"),
            root.join("completed"),
        )
    }
}
