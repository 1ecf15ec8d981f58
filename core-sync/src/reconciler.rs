//! # Reconciler
//!
//! Merges the three folder listings into one consistent record set.
//!
//! ## Precedence
//!
//! Completed beats pending beats camera, enforced twice:
//!
//! 1. On the raw listings, by exact filename string: a camera entry also
//!    present verbatim in pending or completed is dropped; a pending entry
//!    also present verbatim in completed is dropped.
//! 2. On the records, by processing order: camera entries are absorbed
//!    first, then pending, then completed, each insert-or-update overwriting
//!    the status a predecessor wrote for the same identity.
//!
//! Per-file processing within a pass is strictly sequential in that fixed
//! order; concurrent processing would make the overwrite order, and with it
//! the precedence guarantee, non-deterministic.
//!
//! Metadata is fetched for every absorbed file; a stat failure defaults to
//! `{size: 0, modified: now}` and never aborts the pass for other files.
//! Newly discovered camera/pending records and every observed pending entry
//! are handed to the thumbnail pipeline, so previews appear for new files
//! and refresh after edits.

use bridge_traits::storage::FileSystemAccess;
use bridge_traits::time::Clock;
use core_library::store::RecordStore;
use core_library::{naming, FolderLayout, MediaId, MediaRecord, MediaStatus};
use core_thumbnail::ThumbnailPipeline;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::error::Result;

/// Counts from one reconciliation pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReconcileStats {
    /// Camera entries surviving the exact-filename dedup.
    pub camera_files: usize,
    /// Pending entries surviving the exact-filename dedup.
    pub pending_files: usize,
    /// Completed entries (never deduped; they always win).
    pub completed_files: usize,
    /// Records created during the pass.
    pub inserted: usize,
}

/// Merges folder listings into the record store.
pub struct Reconciler {
    layout: FolderLayout,
    filesystem: Arc<dyn FileSystemAccess>,
    store: Arc<dyn RecordStore>,
    clock: Arc<dyn Clock>,
    thumbnails: ThumbnailPipeline,
}

impl Reconciler {
    pub fn new(
        layout: FolderLayout,
        filesystem: Arc<dyn FileSystemAccess>,
        store: Arc<dyn RecordStore>,
        clock: Arc<dyn Clock>,
        thumbnails: ThumbnailPipeline,
    ) -> Self {
        Self {
            layout,
            filesystem,
            store,
            clock,
            thumbnails,
        }
    }

    /// Run one pass over the three listings.
    ///
    /// Only store failures abort the pass; they surface to the caller so the
    /// whole scan can be retried.
    #[instrument(skip_all, fields(camera = camera.len(), pending = pending.len(), completed = completed.len()))]
    pub async fn reconcile(
        &self,
        camera: Vec<String>,
        pending: Vec<String>,
        completed: Vec<String>,
    ) -> Result<ReconcileStats> {
        // Listing-level precedence: dedup by exact filename string.
        let completed_names: HashSet<String> = completed.iter().cloned().collect();
        let pending_names: HashSet<String> = pending.iter().cloned().collect();

        let camera: Vec<String> = camera
            .into_iter()
            .filter(|name| !pending_names.contains(name) && !completed_names.contains(name))
            .collect();
        let pending: Vec<String> = pending
            .into_iter()
            .filter(|name| !completed_names.contains(name))
            .collect();

        let mut stats = ReconcileStats {
            camera_files: camera.len(),
            pending_files: pending.len(),
            completed_files: completed.len(),
            inserted: 0,
        };

        // Record-level precedence: fixed absorption order, later origins
        // overwrite earlier ones per identity.
        for name in &camera {
            stats.inserted += self.absorb(name, MediaStatus::Camera).await? as usize;
        }
        for name in &pending {
            stats.inserted += self.absorb(name, MediaStatus::Pending).await? as usize;
        }
        for name in &completed {
            stats.inserted += self.absorb(name, MediaStatus::Completed).await? as usize;
        }

        debug!(?stats, "Reconciliation pass finished");
        Ok(stats)
    }

    /// Insert or update the record for one observed filename. Returns whether
    /// a record was created.
    async fn absorb(&self, name: &str, origin: MediaStatus) -> Result<bool> {
        let observed_path = match origin {
            MediaStatus::Camera => self.layout.camera_file(name),
            MediaStatus::Pending => self.layout.pending_file(name),
            MediaStatus::Completed => self.layout.completed_file(name),
        };
        let display_uri = self.filesystem.resolve_display_uri(&observed_path);
        let (size, modified_time) = self.fetch_metadata(&observed_path).await;

        let id = MediaId::from_filename(name);
        let existing = self.store.get(&id).await?;
        let inserted = existing.is_none();

        match existing {
            Some(_) => {
                let path_string = observed_path.to_string_lossy().into_owned();
                let uri = display_uri.clone();
                self.store
                    .update(
                        &id,
                        Box::new(move |record| {
                            record.status = origin;
                            record.display_uri = uri;
                            match origin {
                                MediaStatus::Camera => record.camera_path = path_string,
                                MediaStatus::Pending => record.pending_path = Some(path_string),
                                MediaStatus::Completed => {
                                    record.completed_path = Some(path_string)
                                }
                            }
                            record.size = size;
                            record.modified_time = modified_time;
                        }),
                    )
                    .await?;
            }
            None => {
                // Identity comes from the canonical name; the observed file
                // may carry a revision suffix.
                let original_name =
                    naming::canonical_name(&naming::base_of(name), &naming::extension_of(name));
                let camera_path = self.layout.camera_file(&original_name);

                let mut record = MediaRecord::new(
                    original_name,
                    camera_path.to_string_lossy().into_owned(),
                    display_uri.clone(),
                );
                record.status = origin;
                record.size = size;
                record.modified_time = modified_time;
                let path_string = observed_path.to_string_lossy().into_owned();
                match origin {
                    MediaStatus::Camera => record.camera_path = path_string,
                    MediaStatus::Pending => record.pending_path = Some(path_string),
                    MediaStatus::Completed => record.completed_path = Some(path_string),
                }

                debug!(id = %record.id, origin = %origin, "Discovered new record");
                self.store.insert(record).await?;
            }
        }

        if self.should_enqueue_thumbnail(inserted, origin) {
            let is_video =
                core_library::models::is_video_extension(&naming::extension_of(name));
            // Fire-and-forget; the pipeline writes the preview back itself.
            drop(self.thumbnails.enqueue(id, observed_path, is_video));
        }

        Ok(inserted)
    }

    /// New camera/pending records get a first preview; every observed pending
    /// entry refreshes its preview after edits. Completed files keep whatever
    /// preview they already had.
    fn should_enqueue_thumbnail(&self, inserted: bool, origin: MediaStatus) -> bool {
        match origin {
            MediaStatus::Pending => true,
            MediaStatus::Camera => inserted,
            MediaStatus::Completed => false,
        }
    }

    async fn fetch_metadata(&self, path: &Path) -> (u64, i64) {
        match self.filesystem.metadata(path).await {
            Ok(meta) => (
                meta.size,
                meta.modified_at
                    .unwrap_or_else(|| self.clock.unix_timestamp_millis()),
            ),
            Err(e) => {
                debug!(path = ?path, error = %e, "Metadata fetch failed; using defaults");
                (0, self.clock.unix_timestamp_millis())
            }
        }
    }
}
