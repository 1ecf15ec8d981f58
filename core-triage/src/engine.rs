//! # Transition Engine
//!
//! Moves records between the camera, pending, and completed folders.
//!
//! ## Overview
//!
//! Six explicit transitions plus one best-effort batch. Every public
//! operation returns a [`TransitionResult`] (success flag plus optional
//! error text) and never propagates an error to the caller.
//!
//! ## Optimistic update and rollback
//!
//! A transition writes the new status and path fields to the record store
//! first, then performs its file operations. When any file operation fails,
//! the record is restored to its exact pre-transition `status`,
//! `pending_path`, `completed_path`, and `display_uri`, and the call returns
//! a failure result. Partial file state (a copy that landed before a later
//! delete failed) is left in place; a later reconciliation pass converges it.
//!
//! ## Latest-version resolution
//!
//! Completing a pending record re-scans the pending folder: among filenames
//! whose base and extension match the record, the highest `~<N>` revision
//! wins (ties keep the first in scan order; no suffixed sibling means the
//! unsuffixed original is latest). The winner's content is copied to the
//! completed folder under the canonical name, so revision suffixes never
//! leave the pending folder, and every sibling is deleted.

use bridge_traits::index::MediaIndex;
use bridge_traits::permission::StorageGate;
use bridge_traits::storage::FileSystemAccess;
use core_library::store::RecordStore;
use core_library::{naming, FolderLayout, MediaId, MediaRecord, MediaStatus};
use core_runtime::events::{CoreEvent, EventBus, TriageEvent};
use core_sync::DirectoryScanner;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::error::{Result, TriageError};

// =============================================================================
// Result Types
// =============================================================================

/// Outcome of a single transition, shaped for hosts: a success flag and an
/// error message instead of a thrown error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionResult {
    pub success: bool,
    pub error: Option<String>,
}

impl TransitionResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
        }
    }
}

/// Outcome of [`TransitionEngine::complete_all_pending`].
///
/// `success` is true only when every pending record completed. Items that
/// succeeded before a later failure stay completed; there is no batch-level
/// rollback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub success: bool,
    pub completed: usize,
    pub failed: usize,
}

// =============================================================================
// Engine
// =============================================================================

/// Executes status transitions against the record store and filesystem.
pub struct TransitionEngine {
    layout: FolderLayout,
    filesystem: Arc<dyn FileSystemAccess>,
    gate: Arc<dyn StorageGate>,
    media_index: Arc<dyn MediaIndex>,
    store: Arc<dyn RecordStore>,
    scanner: DirectoryScanner,
    event_bus: EventBus,
}

impl TransitionEngine {
    pub fn new(
        layout: FolderLayout,
        filesystem: Arc<dyn FileSystemAccess>,
        gate: Arc<dyn StorageGate>,
        media_index: Arc<dyn MediaIndex>,
        store: Arc<dyn RecordStore>,
        event_bus: EventBus,
    ) -> Self {
        let scanner = DirectoryScanner::new(filesystem.clone());
        Self {
            layout,
            filesystem,
            gate,
            media_index,
            store,
            scanner,
            event_bus,
        }
    }

    // -------------------------------------------------------------------------
    // The six transitions
    // -------------------------------------------------------------------------

    /// camera → pending: copy the camera file into the pending folder under
    /// its canonical name.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn camera_to_pending(&self, id: &MediaId) -> TransitionResult {
        match self.begin(id, MediaStatus::Pending).await {
            Ok(Some(snapshot)) => {
                let outcome = self.camera_to_pending_inner(id, &snapshot).await;
                self.finish(id, &snapshot, MediaStatus::Pending, outcome).await
            }
            Ok(None) => TransitionResult::ok(),
            Err(e) => TransitionResult::failed(e.to_string()),
        }
    }

    /// camera → completed: copy the camera file straight into the completed
    /// folder.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn camera_to_completed(&self, id: &MediaId) -> TransitionResult {
        match self.begin(id, MediaStatus::Completed).await {
            Ok(Some(snapshot)) => {
                let outcome = self.camera_to_completed_inner(id, &snapshot).await;
                self.finish(id, &snapshot, MediaStatus::Completed, outcome)
                    .await
            }
            Ok(None) => TransitionResult::ok(),
            Err(e) => TransitionResult::failed(e.to_string()),
        }
    }

    /// pending → completed: resolve the latest working copy, promote its
    /// content under the canonical name, delete every pending sibling.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn pending_to_completed(&self, id: &MediaId) -> TransitionResult {
        match self.begin(id, MediaStatus::Completed).await {
            Ok(Some(snapshot)) => {
                let outcome = self.pending_to_completed_inner(id, &snapshot).await;
                self.finish(id, &snapshot, MediaStatus::Completed, outcome)
                    .await
            }
            Ok(None) => TransitionResult::ok(),
            Err(e) => TransitionResult::failed(e.to_string()),
        }
    }

    /// pending → camera: discard the working copies; the camera original
    /// becomes live again.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn pending_to_camera(&self, id: &MediaId) -> TransitionResult {
        match self.begin(id, MediaStatus::Camera).await {
            Ok(Some(snapshot)) => {
                let outcome = self.pending_to_camera_inner(id, &snapshot).await;
                self.finish(id, &snapshot, MediaStatus::Camera, outcome).await
            }
            Ok(None) => TransitionResult::ok(),
            Err(e) => TransitionResult::failed(e.to_string()),
        }
    }

    /// completed → pending: reopen a finished file for editing.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn completed_to_pending(&self, id: &MediaId) -> TransitionResult {
        match self.begin(id, MediaStatus::Pending).await {
            Ok(Some(snapshot)) => {
                let outcome = self.completed_to_pending_inner(id, &snapshot).await;
                self.finish(id, &snapshot, MediaStatus::Pending, outcome).await
            }
            Ok(None) => TransitionResult::ok(),
            Err(e) => TransitionResult::failed(e.to_string()),
        }
    }

    /// completed → camera: discard the completed copy entirely.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn completed_to_camera(&self, id: &MediaId) -> TransitionResult {
        match self.begin(id, MediaStatus::Camera).await {
            Ok(Some(snapshot)) => {
                let outcome = self.completed_to_camera_inner(id, &snapshot).await;
                self.finish(id, &snapshot, MediaStatus::Camera, outcome).await
            }
            Ok(None) => TransitionResult::ok(),
            Err(e) => TransitionResult::failed(e.to_string()),
        }
    }

    // -------------------------------------------------------------------------
    // Batch
    // -------------------------------------------------------------------------

    /// Complete every pending record, best-effort.
    ///
    /// Runs sequentially and continues past individual failures. Non-atomic:
    /// records that completed before a later failure stay completed.
    #[instrument(skip(self))]
    pub async fn complete_all_pending(&self) -> BatchOutcome {
        let records = match self.store.list().await {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "Batch enumeration failed");
                return BatchOutcome {
                    success: false,
                    completed: 0,
                    failed: 0,
                };
            }
        };

        let mut completed = 0;
        let mut failed = 0;
        for record in records
            .into_iter()
            .filter(|r| r.status == MediaStatus::Pending)
        {
            let result = self.pending_to_completed(&record.id).await;
            if result.success {
                completed += 1;
            } else {
                warn!(id = %record.id, error = ?result.error, "Batch item failed; continuing");
                failed += 1;
            }
        }

        info!(completed, failed, "Batch completion finished");
        self.event_bus
            .emit(CoreEvent::Triage(TriageEvent::BatchCompleted {
                completed: completed as u64,
                failed: failed as u64,
            }))
            .ok();

        BatchOutcome {
            success: failed == 0,
            completed,
            failed,
        }
    }

    // -------------------------------------------------------------------------
    // Shared machinery
    // -------------------------------------------------------------------------

    /// Gate + lookup + idempotence check. `Ok(None)` means the record is
    /// already at the target: a no-op success with zero file I/O.
    async fn begin(&self, id: &MediaId, target: MediaStatus) -> Result<Option<MediaRecord>> {
        let granted = self
            .gate
            .check_status()
            .await
            .map(|state| state.is_granted())
            .unwrap_or(false);
        if !granted {
            return Err(TriageError::PermissionDenied);
        }

        let record = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| TriageError::RecordNotFound(id.to_string()))?;

        if record.status == target {
            debug!(id = %id, status = %target, "Already at target status; no-op");
            return Ok(None);
        }

        Ok(Some(record))
    }

    /// Convert an inner outcome into the public result, rolling back the
    /// optimistic record write on failure.
    async fn finish(
        &self,
        id: &MediaId,
        snapshot: &MediaRecord,
        target: MediaStatus,
        outcome: Result<()>,
    ) -> TransitionResult {
        match outcome {
            Ok(()) => {
                info!(id = %id, from = %snapshot.status, to = %target, "Transition applied");
                self.event_bus
                    .emit(CoreEvent::Triage(TriageEvent::StatusChanged {
                        id: id.to_string(),
                        from: snapshot.status.to_string(),
                        to: target.to_string(),
                    }))
                    .ok();
                TransitionResult::ok()
            }
            Err(e) => {
                // Invalid-state rejections happen before the optimistic
                // write; there is nothing to restore.
                if !matches!(e, TriageError::InvalidState(_)) {
                    self.rollback(id, snapshot).await;
                }
                warn!(id = %id, target = %target, error = %e, "Transition failed");
                self.event_bus
                    .emit(CoreEvent::Triage(TriageEvent::TransitionFailed {
                        id: id.to_string(),
                        target: target.to_string(),
                        message: e.to_string(),
                    }))
                    .ok();
                TransitionResult::failed(e.to_string())
            }
        }
    }

    async fn rollback(&self, id: &MediaId, snapshot: &MediaRecord) {
        let status = snapshot.status;
        let display_uri = snapshot.display_uri.clone();
        let pending_path = snapshot.pending_path.clone();
        let completed_path = snapshot.completed_path.clone();

        let restored = self
            .store
            .update(
                id,
                Box::new(move |record| {
                    record.status = status;
                    record.display_uri = display_uri;
                    record.pending_path = pending_path;
                    record.completed_path = completed_path;
                }),
            )
            .await;

        if let Err(e) = restored {
            warn!(id = %id, error = %e, "Rollback write failed; record may be inconsistent");
        }
    }

    async fn notify_index(&self, paths: &[PathBuf]) {
        for path in paths {
            if let Err(e) = self.media_index.scan_file(path).await {
                warn!(path = ?path, error = %e, "Media index notification failed");
            }
        }
    }

    /// Pending-folder files belonging to this record, from a fresh listing.
    async fn pending_siblings(&self, id: &MediaId, extension: &str) -> Vec<String> {
        self.scanner
            .list(&self.layout.pending)
            .await
            .into_iter()
            .filter(|name| {
                naming::base_of(name) == id.as_str() && naming::extension_of(name) == extension
            })
            .collect()
    }

    // -------------------------------------------------------------------------
    // Per-transition bodies (optimistic write, then file I/O)
    // -------------------------------------------------------------------------

    async fn camera_to_pending_inner(&self, id: &MediaId, snapshot: &MediaRecord) -> Result<()> {
        let destination = self.layout.pending_file(&snapshot.original_name);
        let destination_str = destination.to_string_lossy().into_owned();
        let display_uri = self.filesystem.resolve_display_uri(&destination);

        self.store
            .update(
                id,
                Box::new(move |record| {
                    record.status = MediaStatus::Pending;
                    record.pending_path = Some(destination_str);
                    record.display_uri = display_uri;
                }),
            )
            .await?;

        self.filesystem
            .copy_file(Path::new(&snapshot.camera_path), &destination)
            .await?;

        self.notify_index(std::slice::from_ref(&destination)).await;
        Ok(())
    }

    async fn camera_to_completed_inner(&self, id: &MediaId, snapshot: &MediaRecord) -> Result<()> {
        let destination = self.layout.completed_file(&snapshot.original_name);
        let destination_str = destination.to_string_lossy().into_owned();
        let display_uri = self.filesystem.resolve_display_uri(&destination);

        self.store
            .update(
                id,
                Box::new(move |record| {
                    record.status = MediaStatus::Completed;
                    record.completed_path = Some(destination_str);
                    record.display_uri = display_uri;
                }),
            )
            .await?;

        self.filesystem
            .copy_file(Path::new(&snapshot.camera_path), &destination)
            .await?;

        self.notify_index(std::slice::from_ref(&destination)).await;
        Ok(())
    }

    async fn pending_to_completed_inner(&self, id: &MediaId, snapshot: &MediaRecord) -> Result<()> {
        let pending_path = snapshot.pending_path.clone().ok_or_else(|| {
            TriageError::InvalidState(format!("Record {} has no pending path", id))
        })?;

        let siblings = self.pending_siblings(id, &snapshot.extension).await;
        let latest_name =
            latest_of(&siblings).unwrap_or_else(|| snapshot.original_name.clone());
        let source = self.layout.pending_file(&latest_name);
        let destination = self.layout.completed_file(&snapshot.original_name);
        debug!(id = %id, latest = %latest_name, "Resolved latest pending version");

        let destination_str = destination.to_string_lossy().into_owned();
        let display_uri = self.filesystem.resolve_display_uri(&destination);
        self.store
            .update(
                id,
                Box::new(move |record| {
                    record.status = MediaStatus::Completed;
                    record.completed_path = Some(destination_str);
                    record.pending_path = None;
                    record.display_uri = display_uri;
                }),
            )
            .await?;

        self.filesystem.copy_file(&source, &destination).await?;

        // Every sibling goes; the rescan may miss files (listing raced a
        // writer), so fall back to the recorded path.
        let doomed: Vec<PathBuf> = if siblings.is_empty() {
            vec![PathBuf::from(&pending_path)]
        } else {
            siblings
                .iter()
                .map(|name| self.layout.pending_file(name))
                .collect()
        };
        for path in &doomed {
            self.filesystem.delete_file(path).await?;
        }

        let mut touched = doomed;
        touched.push(destination);
        self.notify_index(&touched).await;
        Ok(())
    }

    async fn pending_to_camera_inner(&self, id: &MediaId, snapshot: &MediaRecord) -> Result<()> {
        let pending_path = snapshot.pending_path.clone().ok_or_else(|| {
            TriageError::InvalidState(format!("Record {} has no pending path", id))
        })?;

        let camera_path = PathBuf::from(&snapshot.camera_path);
        let display_uri = self.filesystem.resolve_display_uri(&camera_path);
        self.store
            .update(
                id,
                Box::new(move |record| {
                    record.status = MediaStatus::Camera;
                    record.pending_path = None;
                    record.display_uri = display_uri;
                }),
            )
            .await?;

        let siblings = self.pending_siblings(id, &snapshot.extension).await;
        let doomed: Vec<PathBuf> = if siblings.is_empty() {
            vec![PathBuf::from(&pending_path)]
        } else {
            siblings
                .iter()
                .map(|name| self.layout.pending_file(name))
                .collect()
        };
        for path in &doomed {
            self.filesystem.delete_file(path).await?;
        }

        self.notify_index(&doomed).await;
        Ok(())
    }

    async fn completed_to_pending_inner(&self, id: &MediaId, snapshot: &MediaRecord) -> Result<()> {
        let completed_path = snapshot.completed_path.clone().ok_or_else(|| {
            TriageError::InvalidState(format!("Record {} has no completed path", id))
        })?;

        let destination = self.layout.pending_file(&snapshot.original_name);
        let destination_str = destination.to_string_lossy().into_owned();
        let display_uri = self.filesystem.resolve_display_uri(&destination);
        self.store
            .update(
                id,
                Box::new(move |record| {
                    record.status = MediaStatus::Pending;
                    record.pending_path = Some(destination_str);
                    record.completed_path = None;
                    record.display_uri = display_uri;
                }),
            )
            .await?;

        let source = PathBuf::from(&completed_path);
        self.filesystem.copy_file(&source, &destination).await?;
        self.filesystem.delete_file(&source).await?;

        self.notify_index(&[destination, source]).await;
        Ok(())
    }

    async fn completed_to_camera_inner(&self, id: &MediaId, snapshot: &MediaRecord) -> Result<()> {
        let completed_path = snapshot.completed_path.clone().ok_or_else(|| {
            TriageError::InvalidState(format!("Record {} has no completed path", id))
        })?;

        let camera_path = PathBuf::from(&snapshot.camera_path);
        let display_uri = self.filesystem.resolve_display_uri(&camera_path);
        self.store
            .update(
                id,
                Box::new(move |record| {
                    record.status = MediaStatus::Camera;
                    record.completed_path = None;
                    record.display_uri = display_uri;
                }),
            )
            .await?;

        let doomed = PathBuf::from(&completed_path);
        self.filesystem.delete_file(&doomed).await?;

        self.notify_index(std::slice::from_ref(&doomed)).await;
        Ok(())
    }
}

/// Highest-revision sibling; ties keep the first in scan order.
fn latest_of(siblings: &[String]) -> Option<String> {
    let mut latest: Option<(&String, u32)> = None;
    for name in siblings {
        let version = naming::version_of(name);
        match latest {
            None => latest = Some((name, version)),
            Some((_, best)) if version > best => latest = Some((name, version)),
            _ => {}
        }
    }
    latest.map(|(name, _)| name.clone())
}
