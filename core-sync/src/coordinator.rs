//! # Scan Coordinator
//!
//! Drives one full reconciliation pass over the three triage folders.
//!
//! ## Workflow
//!
//! 1. Check the storage gate; anything but `Granted` blocks the pass
//! 2. Lazily create the writable folders (idempotent)
//! 3. Scan camera, pending, and completed concurrently; the listings are
//!    independent I/O
//! 4. Feed the listings through the [`Reconciler`](crate::Reconciler), which
//!    processes records strictly sequentially to preserve precedence
//! 5. Emit scan lifecycle events for the host UI
//!
//! ## Usage
//!
//! ```ignore
//! use core_sync::{ScanCoordinator, ScanOutcome};
//!
//! match coordinator.scan_all().await? {
//!     ScanOutcome::Completed(report) => println!("{} records", report.records),
//!     ScanOutcome::Blocked { state } => prompt_user(state),
//! }
//! ```

use bridge_traits::permission::{PermissionState, StorageGate};
use bridge_traits::storage::FileSystemAccess;
use bridge_traits::time::Clock;
use core_library::store::RecordStore;
use core_library::FolderLayout;
use core_runtime::events::{CoreEvent, EventBus, ScanEvent};
use core_thumbnail::ThumbnailPipeline;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::error::{Result, SyncError};
use crate::reconciler::Reconciler;
use crate::scanner::DirectoryScanner;

/// Result of a completed reconciliation pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    /// Camera entries surviving dedup.
    pub camera_files: usize,
    /// Pending entries surviving dedup.
    pub pending_files: usize,
    /// Completed entries.
    pub completed_files: usize,
    /// Records created by this pass.
    pub inserted: usize,
    /// Total records in the store after the pass.
    pub records: u64,
}

/// Outcome of a scan request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScanOutcome {
    /// The pass ran to completion.
    Completed(ScanReport),
    /// The storage gate is not granted; nothing was scanned.
    Blocked { state: PermissionState },
}

/// Orchestrates scans and reconciliation.
pub struct ScanCoordinator {
    layout: FolderLayout,
    filesystem: Arc<dyn FileSystemAccess>,
    gate: Arc<dyn StorageGate>,
    store: Arc<dyn RecordStore>,
    scanner: DirectoryScanner,
    reconciler: Reconciler,
    event_bus: EventBus,
}

impl ScanCoordinator {
    pub fn new(
        layout: FolderLayout,
        filesystem: Arc<dyn FileSystemAccess>,
        gate: Arc<dyn StorageGate>,
        store: Arc<dyn RecordStore>,
        clock: Arc<dyn Clock>,
        thumbnails: ThumbnailPipeline,
        event_bus: EventBus,
    ) -> Self {
        let scanner = DirectoryScanner::new(filesystem.clone());
        let reconciler = Reconciler::new(
            layout.clone(),
            filesystem.clone(),
            store.clone(),
            clock,
            thumbnails,
        );

        Self {
            layout,
            filesystem,
            gate,
            store,
            scanner,
            reconciler,
            event_bus,
        }
    }

    /// Run one full scan-and-reconcile pass.
    ///
    /// This is the only scan-driving entry point that can fail wholesale;
    /// callers retry the whole pass. Individual folder-read and stat failures
    /// degrade inside the pass and never reach here.
    #[instrument(skip(self))]
    pub async fn scan_all(&self) -> Result<ScanOutcome> {
        let state = self.permission_state().await;
        if !state.is_granted() {
            warn!(state = %state, "Scan blocked; storage permission not granted");
            self.event_bus
                .emit(CoreEvent::Scan(ScanEvent::Blocked {
                    state: state.to_string(),
                }))
                .ok();
            return Ok(ScanOutcome::Blocked { state });
        }

        self.event_bus.emit(CoreEvent::Scan(ScanEvent::Started)).ok();

        if let Err(e) = self.layout.ensure_writable(self.filesystem.as_ref()).await {
            self.emit_failed(&e.to_string());
            return Err(SyncError::Bridge(e));
        }

        // The three listings are independent I/O and may run concurrently;
        // record processing stays sequential inside the reconciler.
        let (camera, pending, completed) = tokio::join!(
            self.scanner.list(&self.layout.camera),
            self.scanner.list(&self.layout.pending),
            self.scanner.list(&self.layout.completed),
        );

        let stats = match self.reconciler.reconcile(camera, pending, completed).await {
            Ok(stats) => stats,
            Err(e) => {
                self.emit_failed(&e.to_string());
                return Err(e);
            }
        };

        let records = self.store.count().await.map_err(SyncError::from)? as u64;

        info!(
            camera = stats.camera_files,
            pending = stats.pending_files,
            completed = stats.completed_files,
            inserted = stats.inserted,
            records,
            "Scan completed"
        );
        self.event_bus
            .emit(CoreEvent::Scan(ScanEvent::Completed {
                camera_files: stats.camera_files as u64,
                pending_files: stats.pending_files as u64,
                completed_files: stats.completed_files as u64,
                records,
            }))
            .ok();

        Ok(ScanOutcome::Completed(ScanReport {
            camera_files: stats.camera_files,
            pending_files: stats.pending_files,
            completed_files: stats.completed_files,
            inserted: stats.inserted,
            records,
        }))
    }

    /// Check the gate, prompting the host once when it reports `Prompt`.
    pub async fn ensure_permission(&self) -> PermissionState {
        let state = self.permission_state().await;
        if state.is_granted() {
            return state;
        }

        match self.gate.request().await {
            Ok(state) => state,
            Err(e) => {
                warn!(error = %e, "Permission request failed; treating as denied");
                PermissionState::Denied
            }
        }
    }

    async fn permission_state(&self) -> PermissionState {
        match self.gate.check_status().await {
            Ok(state) => state,
            Err(e) => {
                warn!(error = %e, "Permission check failed; treating as denied");
                PermissionState::Denied
            }
        }
    }

    fn emit_failed(&self, message: &str) {
        self.event_bus
            .emit(CoreEvent::Scan(ScanEvent::Failed {
                message: message.to_string(),
            }))
            .ok();
    }
}
