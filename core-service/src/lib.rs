//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (filesystem, storage
//! gate, media index, record store, clock) into the triage core. Desktop apps
//! typically enable the `desktop-shims` feature (which depends on
//! `bridge-desktop`); mobile hosts inject their own adapters.
//!
//! ## Usage
//!
//! ```ignore
//! use core_library::FolderLayout;
//! use core_service::{TriageDependencies, TriageService};
//! use core_thumbnail::ThumbnailConfig;
//!
//! # async fn example() {
//! let layout = FolderLayout::new("/dcim/Camera", "/Pictures/Pending", "/Pictures/Completed");
//! let service = TriageService::new(
//!     layout,
//!     ThumbnailConfig::default(),
//!     TriageDependencies::desktop(),
//! );
//!
//! service.scan_all().await.ok();
//! let records = service.records().await.unwrap();
//! # }
//! ```

use std::sync::Arc;

use bridge_traits::{
    index::MediaIndex,
    permission::StorageGate,
    storage::FileSystemAccess,
    time::Clock,
};
use core_library::store::RecordStore;
use core_library::{FolderLayout, MediaRecord};
use core_runtime::events::{CoreEvent, EventBus, Receiver, DEFAULT_EVENT_BUFFER_SIZE};
use core_sync::{ScanCoordinator, ScanOutcome};
use core_thumbnail::{ThumbnailConfig, ThumbnailPipeline};
use core_triage::TransitionEngine;

/// Aggregated handle to all bridge dependencies the core requires.
pub struct TriageDependencies {
    pub filesystem: Arc<dyn FileSystemAccess>,
    pub gate: Arc<dyn StorageGate>,
    pub media_index: Arc<dyn MediaIndex>,
    pub store: Arc<dyn RecordStore>,
    pub clock: Arc<dyn Clock>,
}

impl TriageDependencies {
    /// Construct a dependency bundle from explicit bridge handles.
    pub fn new(
        filesystem: Arc<dyn FileSystemAccess>,
        gate: Arc<dyn StorageGate>,
        media_index: Arc<dyn MediaIndex>,
        store: Arc<dyn RecordStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            filesystem,
            gate,
            media_index,
            store,
            clock,
        }
    }

    /// Desktop bundle: local disk, always-granted gate, log-only media
    /// index, in-memory record store, system clock.
    #[cfg(feature = "desktop-shims")]
    pub fn desktop() -> Self {
        Self::new(
            Arc::new(bridge_desktop::TokioFileSystem::new()),
            Arc::new(bridge_desktop::StaticStorageGate::granted()),
            Arc::new(bridge_desktop::LoggingMediaIndex::new()),
            Arc::new(core_library::InMemoryRecordStore::new()),
            Arc::new(bridge_traits::time::SystemClock),
        )
    }
}

/// Primary façade exposed to host applications.
///
/// Owns the event bus and the thumbnail worker; construct it inside an async
/// runtime. Cloning is cheap and shares the same services.
#[derive(Clone)]
pub struct TriageService {
    deps: Arc<TriageDependencies>,
    event_bus: EventBus,
    coordinator: Arc<ScanCoordinator>,
    engine: Arc<TransitionEngine>,
    thumbnails: ThumbnailPipeline,
}

impl TriageService {
    /// Create a new service from the provided dependencies.
    pub fn new(
        layout: FolderLayout,
        thumbnail_config: ThumbnailConfig,
        deps: TriageDependencies,
    ) -> Self {
        let deps = Arc::new(deps);
        let event_bus = EventBus::new(DEFAULT_EVENT_BUFFER_SIZE);

        let thumbnails = ThumbnailPipeline::new(
            thumbnail_config,
            deps.filesystem.clone(),
            deps.store.clone(),
            event_bus.clone(),
        );

        let coordinator = Arc::new(ScanCoordinator::new(
            layout.clone(),
            deps.filesystem.clone(),
            deps.gate.clone(),
            deps.store.clone(),
            deps.clock.clone(),
            thumbnails.clone(),
            event_bus.clone(),
        ));

        let engine = Arc::new(TransitionEngine::new(
            layout,
            deps.filesystem.clone(),
            deps.gate.clone(),
            deps.media_index.clone(),
            deps.store.clone(),
            event_bus.clone(),
        ));

        Self {
            deps,
            event_bus,
            coordinator,
            engine,
            thumbnails,
        }
    }

    /// Access the bridge dependencies being used by the service.
    pub fn dependencies(&self) -> Arc<TriageDependencies> {
        Arc::clone(&self.deps)
    }

    /// Subscribe to scan, triage, and thumbnail events.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.event_bus.subscribe()
    }

    /// The scan coordinator (permission check, folder scans, reconcile).
    pub fn scans(&self) -> &ScanCoordinator {
        &self.coordinator
    }

    /// The transition engine (status changes, batch completion).
    pub fn transitions(&self) -> &TransitionEngine {
        &self.engine
    }

    /// The serialized thumbnail pipeline.
    pub fn thumbnails(&self) -> &ThumbnailPipeline {
        &self.thumbnails
    }

    /// Run one full scan-and-reconcile pass.
    pub async fn scan_all(&self) -> core_sync::Result<ScanOutcome> {
        self.coordinator.scan_all().await
    }

    /// Enumerate all records in the store.
    pub async fn records(&self) -> core_library::Result<Vec<MediaRecord>> {
        self.deps.store.list().await
    }
}
