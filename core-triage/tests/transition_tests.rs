//! Integration tests for the transition engine over a real temporary
//! filesystem, with fault injection at the filesystem port.

use async_trait::async_trait;
use bridge_desktop::{LoggingMediaIndex, StaticStorageGate, TokioFileSystem};
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::permission::PermissionState;
use bridge_traits::storage::{FileMetadata, FileSystemAccess};
use bytes::Bytes;
use core_library::store::RecordStore;
use core_library::{FolderLayout, InMemoryRecordStore, MediaId, MediaRecord, MediaStatus};
use core_runtime::events::EventBus;
use core_triage::TransitionEngine;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Filesystem decorator counting mutating operations and failing selected
/// copies/deletes by destination path.
struct FaultyFileSystem {
    inner: TokioFileSystem,
    copies: AtomicUsize,
    deletes: AtomicUsize,
    fail_copies_to: Mutex<HashSet<PathBuf>>,
    fail_deletes_of: Mutex<HashSet<PathBuf>>,
}

impl FaultyFileSystem {
    fn new() -> Self {
        Self {
            inner: TokioFileSystem::new(),
            copies: AtomicUsize::new(0),
            deletes: AtomicUsize::new(0),
            fail_copies_to: Mutex::new(HashSet::new()),
            fail_deletes_of: Mutex::new(HashSet::new()),
        }
    }

    fn fail_copy_to(&self, path: impl Into<PathBuf>) {
        self.fail_copies_to.lock().unwrap().insert(path.into());
    }

    fn fail_delete_of(&self, path: impl Into<PathBuf>) {
        self.fail_deletes_of.lock().unwrap().insert(path.into());
    }

    /// Mutating file operations attempted so far.
    fn mutations(&self) -> usize {
        self.copies.load(Ordering::SeqCst) + self.deletes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FileSystemAccess for FaultyFileSystem {
    async fn exists(&self, path: &Path) -> BridgeResult<bool> {
        self.inner.exists(path).await
    }

    async fn metadata(&self, path: &Path) -> BridgeResult<FileMetadata> {
        self.inner.metadata(path).await
    }

    async fn create_dir_all(&self, path: &Path) -> BridgeResult<()> {
        self.inner.create_dir_all(path).await
    }

    async fn list_directory(&self, path: &Path) -> BridgeResult<Vec<PathBuf>> {
        self.inner.list_directory(path).await
    }

    async fn read_file(&self, path: &Path) -> BridgeResult<Bytes> {
        self.inner.read_file(path).await
    }

    async fn write_file(&self, path: &Path, data: Bytes) -> BridgeResult<()> {
        self.inner.write_file(path, data).await
    }

    async fn copy_file(&self, from: &Path, to: &Path) -> BridgeResult<()> {
        self.copies.fetch_add(1, Ordering::SeqCst);
        if self.fail_copies_to.lock().unwrap().contains(to) {
            return Err(BridgeError::OperationFailed(format!(
                "injected copy failure: {}",
                to.display()
            )));
        }
        self.inner.copy_file(from, to).await
    }

    async fn delete_file(&self, path: &Path) -> BridgeResult<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        if self.fail_deletes_of.lock().unwrap().contains(path) {
            return Err(BridgeError::OperationFailed(format!(
                "injected delete failure: {}",
                path.display()
            )));
        }
        self.inner.delete_file(path).await
    }

    fn resolve_display_uri(&self, path: &Path) -> String {
        self.inner.resolve_display_uri(path)
    }
}

struct Fixture {
    _dir: TempDir,
    layout: FolderLayout,
    fs: Arc<FaultyFileSystem>,
    store: Arc<InMemoryRecordStore>,
    engine: TransitionEngine,
}

impl Fixture {
    async fn new() -> Self {
        Self::with_gate(PermissionState::Granted).await
    }

    async fn with_gate(state: PermissionState) -> Self {
        let dir = TempDir::new().unwrap();
        let layout = FolderLayout::from(dir.path());
        let fs = Arc::new(FaultyFileSystem::new());
        let store = Arc::new(InMemoryRecordStore::new());

        for folder in [&layout.camera, &layout.pending, &layout.completed] {
            fs.create_dir_all(folder).await.unwrap();
        }

        let engine = TransitionEngine::new(
            layout.clone(),
            fs.clone(),
            Arc::new(StaticStorageGate::new(state)),
            Arc::new(LoggingMediaIndex::new()),
            store.clone(),
            EventBus::new(64),
        );

        Self {
            _dir: dir,
            layout,
            fs,
            store,
            engine,
        }
    }

    async fn write(&self, path: &Path, contents: &str) {
        self.fs
            .write_file(path, Bytes::from(contents.to_string()))
            .await
            .unwrap();
    }

    async fn read(&self, path: &Path) -> String {
        String::from_utf8(self.fs.read_file(path).await.unwrap().to_vec()).unwrap()
    }

    async fn exists(&self, path: &Path) -> bool {
        self.fs.exists(path).await.unwrap()
    }

    fn base_record(&self, name: &str) -> MediaRecord {
        let camera_path = self.layout.camera_file(name);
        MediaRecord::new(
            name,
            camera_path.to_string_lossy().into_owned(),
            format!("file://{}", camera_path.display()),
        )
    }

    async fn seed_camera(&self, name: &str, contents: &str) -> MediaId {
        self.write(&self.layout.camera_file(name), contents).await;
        let record = self.base_record(name);
        let id = record.id.clone();
        self.store.insert(record).await.unwrap();
        id
    }

    async fn seed_pending(&self, name: &str, contents: &str) -> MediaId {
        self.write(&self.layout.pending_file(name), contents).await;
        let mut record = self.base_record(name);
        record.status = MediaStatus::Pending;
        record.pending_path = Some(
            self.layout
                .pending_file(name)
                .to_string_lossy()
                .into_owned(),
        );
        let id = record.id.clone();
        self.store.insert(record).await.unwrap();
        id
    }

    async fn seed_completed(&self, name: &str, contents: &str) -> MediaId {
        self.write(&self.layout.completed_file(name), contents).await;
        let mut record = self.base_record(name);
        record.status = MediaStatus::Completed;
        record.completed_path = Some(
            self.layout
                .completed_file(name)
                .to_string_lossy()
                .into_owned(),
        );
        let id = record.id.clone();
        self.store.insert(record).await.unwrap();
        id
    }

    async fn record(&self, id: &MediaId) -> MediaRecord {
        self.store.get(id).await.unwrap().unwrap()
    }
}

#[tokio::test]
async fn camera_to_pending_copies_under_canonical_name() {
    let fx = Fixture::new().await;
    let id = fx.seed_camera("IMG_1.jpg", "camera bytes").await;

    let result = fx.engine.camera_to_pending(&id).await;
    assert!(result.success, "{:?}", result.error);

    let pending = fx.layout.pending_file("IMG_1.jpg");
    assert_eq!(fx.read(&pending).await, "camera bytes");
    // The camera source is read-only; a copy must leave it behind.
    assert!(fx.exists(&fx.layout.camera_file("IMG_1.jpg")).await);

    let record = fx.record(&id).await;
    assert_eq!(record.status, MediaStatus::Pending);
    assert_eq!(
        record.pending_path.as_deref(),
        Some(pending.to_string_lossy().as_ref())
    );
    assert_eq!(record.display_uri, format!("file://{}", pending.display()));
}

#[tokio::test]
async fn camera_to_completed_copies_directly() {
    let fx = Fixture::new().await;
    let id = fx.seed_camera("IMG_2.jpg", "keeper").await;

    let result = fx.engine.camera_to_completed(&id).await;
    assert!(result.success);

    assert_eq!(
        fx.read(&fx.layout.completed_file("IMG_2.jpg")).await,
        "keeper"
    );
    let record = fx.record(&id).await;
    assert_eq!(record.status, MediaStatus::Completed);
    assert!(record.completed_path.is_some());
}

#[tokio::test]
async fn pending_to_completed_promotes_latest_version() {
    let fx = Fixture::new().await;
    let id = fx.seed_pending("IMG_1.jpg", "v0").await;
    fx.write(&fx.layout.pending_file("IMG_1~1.jpg"), "v1").await;
    fx.write(&fx.layout.pending_file("IMG_1~3.jpg"), "v3").await;
    fx.write(&fx.layout.pending_file("IMG_1~2.jpg"), "v2").await;

    let result = fx.engine.pending_to_completed(&id).await;
    assert!(result.success, "{:?}", result.error);

    // Content of the highest revision lands under the canonical name.
    assert_eq!(fx.read(&fx.layout.completed_file("IMG_1.jpg")).await, "v3");

    // Every working copy is gone.
    for name in ["IMG_1.jpg", "IMG_1~1.jpg", "IMG_1~2.jpg", "IMG_1~3.jpg"] {
        assert!(
            !fx.exists(&fx.layout.pending_file(name)).await,
            "{} should be deleted",
            name
        );
    }

    let record = fx.record(&id).await;
    assert_eq!(record.status, MediaStatus::Completed);
    assert_eq!(record.pending_path, None);
}

#[tokio::test]
async fn transition_to_current_status_is_noop() {
    let fx = Fixture::new().await;
    let id = fx.seed_completed("IMG_1.jpg", "done").await;

    let result = fx.engine.pending_to_completed(&id).await;
    assert!(result.success);
    assert_eq!(result.error, None);
    assert_eq!(fx.fs.mutations(), 0, "no file I/O on a no-op transition");
}

#[tokio::test]
async fn copy_failure_rolls_back_record() {
    let fx = Fixture::new().await;
    let id = fx.seed_pending("IMG_1.jpg", "edit").await;
    let before = fx.record(&id).await;

    fx.fs.fail_copy_to(fx.layout.completed_file("IMG_1.jpg"));

    let result = fx.engine.pending_to_completed(&id).await;
    assert!(!result.success);
    assert!(!result.error.as_deref().unwrap_or("").is_empty());

    let after = fx.record(&id).await;
    assert_eq!(after.status, before.status);
    assert_eq!(after.pending_path, before.pending_path);
    assert_eq!(after.completed_path, before.completed_path);
    assert_eq!(after.display_uri, before.display_uri);

    // The copy failed before anything was deleted.
    assert_eq!(fx.fs.deletes.load(Ordering::SeqCst), 0);
    assert!(fx.exists(&fx.layout.pending_file("IMG_1.jpg")).await);
}

#[tokio::test]
async fn delete_failure_rolls_back_but_keeps_orphan_copy() {
    let fx = Fixture::new().await;
    let id = fx.seed_pending("IMG_1.jpg", "edit").await;

    fx.fs.fail_delete_of(fx.layout.pending_file("IMG_1.jpg"));

    let result = fx.engine.pending_to_completed(&id).await;
    assert!(!result.success);

    let record = fx.record(&id).await;
    assert_eq!(record.status, MediaStatus::Pending);

    // The completed copy landed before the delete failed; it is not cleaned
    // up automatically.
    assert!(fx.exists(&fx.layout.completed_file("IMG_1.jpg")).await);
    assert!(fx.exists(&fx.layout.pending_file("IMG_1.jpg")).await);
}

#[tokio::test]
async fn missing_pending_path_rejected_before_io() {
    let fx = Fixture::new().await;
    let mut record = fx.base_record("IMG_1.jpg");
    record.status = MediaStatus::Pending;
    // pending_path deliberately absent
    let id = record.id.clone();
    fx.store.insert(record).await.unwrap();

    let result = fx.engine.pending_to_completed(&id).await;
    assert!(!result.success);
    assert_eq!(fx.fs.copies.load(Ordering::SeqCst), 0);
    assert_eq!(fx.fs.deletes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn pending_to_camera_discards_all_working_copies() {
    let fx = Fixture::new().await;
    fx.write(&fx.layout.camera_file("IMG_1.jpg"), "original").await;
    let id = fx.seed_pending("IMG_1.jpg", "edit").await;
    fx.write(&fx.layout.pending_file("IMG_1~1.jpg"), "edit v1").await;

    let result = fx.engine.pending_to_camera(&id).await;
    assert!(result.success, "{:?}", result.error);

    assert!(!fx.exists(&fx.layout.pending_file("IMG_1.jpg")).await);
    assert!(!fx.exists(&fx.layout.pending_file("IMG_1~1.jpg")).await);
    assert!(fx.exists(&fx.layout.camera_file("IMG_1.jpg")).await);

    let record = fx.record(&id).await;
    assert_eq!(record.status, MediaStatus::Camera);
    assert_eq!(record.pending_path, None);
    assert_eq!(
        record.display_uri,
        format!("file://{}", fx.layout.camera_file("IMG_1.jpg").display())
    );
}

#[tokio::test]
async fn completed_to_pending_moves_file_back() {
    let fx = Fixture::new().await;
    let id = fx.seed_completed("IMG_1.jpg", "done").await;

    let result = fx.engine.completed_to_pending(&id).await;
    assert!(result.success, "{:?}", result.error);

    assert_eq!(fx.read(&fx.layout.pending_file("IMG_1.jpg")).await, "done");
    assert!(!fx.exists(&fx.layout.completed_file("IMG_1.jpg")).await);

    let record = fx.record(&id).await;
    assert_eq!(record.status, MediaStatus::Pending);
    assert_eq!(record.completed_path, None);
    assert!(record.pending_path.is_some());
}

#[tokio::test]
async fn completed_to_camera_deletes_completed_copy() {
    let fx = Fixture::new().await;
    fx.write(&fx.layout.camera_file("IMG_1.jpg"), "original").await;
    let id = fx.seed_completed("IMG_1.jpg", "done").await;

    let result = fx.engine.completed_to_camera(&id).await;
    assert!(result.success);

    assert!(!fx.exists(&fx.layout.completed_file("IMG_1.jpg")).await);
    let record = fx.record(&id).await;
    assert_eq!(record.status, MediaStatus::Camera);
    assert_eq!(record.completed_path, None);
}

#[tokio::test]
async fn batch_continues_past_failures_and_reports_counts() {
    let fx = Fixture::new().await;
    let mut ids = Vec::new();
    for name in ["a.jpg", "b.jpg", "c.jpg", "d.jpg", "e.jpg"] {
        ids.push(fx.seed_pending(name, "edit").await);
    }
    for name in ["b.jpg", "c.jpg", "e.jpg"] {
        fx.fs.fail_copy_to(fx.layout.completed_file(name));
    }

    let outcome = fx.engine.complete_all_pending().await;
    assert!(!outcome.success);
    assert_eq!(outcome.completed, 2);
    assert_eq!(outcome.failed, 3);

    // Exactly the two unaffected records ended completed; failures kept
    // their prior status.
    for (id, name) in ids.iter().zip(["a.jpg", "b.jpg", "c.jpg", "d.jpg", "e.jpg"]) {
        let record = fx.record(id).await;
        let expected = if name == "a.jpg" || name == "d.jpg" {
            MediaStatus::Completed
        } else {
            MediaStatus::Pending
        };
        assert_eq!(record.status, expected, "{}", name);
    }
}

#[tokio::test]
async fn batch_over_empty_set_succeeds() {
    let fx = Fixture::new().await;
    let outcome = fx.engine.complete_all_pending().await;
    assert!(outcome.success);
    assert_eq!(outcome.completed, 0);
    assert_eq!(outcome.failed, 0);
}

#[tokio::test]
async fn non_granted_permission_blocks_transitions() {
    let fx = Fixture::with_gate(PermissionState::Denied).await;
    let id = fx.seed_camera("IMG_1.jpg", "camera").await;

    let result = fx.engine.camera_to_pending(&id).await;
    assert!(!result.success);
    assert_eq!(fx.fs.mutations(), 0);

    let record = fx.record(&id).await;
    assert_eq!(record.status, MediaStatus::Camera);
}

#[tokio::test]
async fn unknown_record_fails_cleanly() {
    let fx = Fixture::new().await;
    let result = fx.engine.camera_to_pending(&MediaId::new("ghost")).await;
    assert!(!result.success);
    assert!(result.error.unwrap().contains("ghost"));
}
