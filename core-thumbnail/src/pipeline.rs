//! # Thumbnail Pipeline
//!
//! Serialized preview generation for media records.
//!
//! ## Overview
//!
//! All enqueued jobs flow through one `mpsc` channel into a single worker
//! task: strict FIFO, one decode in flight at any instant. Serializing the
//! work bounds peak memory on constrained runtimes while staying fully
//! non-blocking: decodes run on the blocking pool, the worker only awaits.
//!
//! Each job carries its own `oneshot` result future. A failed decode (or a
//! video timeout) resolves that job to `None` and the worker advances to the
//! next job; nothing a job does can terminate the worker loop.
//!
//! Successful jobs write the preview back onto the corresponding record via
//! the store's update contract; failed jobs perform no write.
//!
//! ## Usage
//!
//! ```ignore
//! use core_thumbnail::{ThumbnailConfig, ThumbnailPipeline};
//!
//! let pipeline = ThumbnailPipeline::new(
//!     ThumbnailConfig::default(),
//!     filesystem,
//!     record_store,
//!     event_bus,
//! );
//!
//! let preview = pipeline
//!     .enqueue(record.id.clone(), "/camera/IMG_1.jpg", false)
//!     .await
//!     .unwrap_or(None);
//! ```

use async_trait::async_trait;
use bridge_traits::storage::FileSystemAccess;
use core_library::store::RecordStore;
use core_library::MediaId;
use core_runtime::events::{CoreEvent, EventBus, ThumbnailEvent};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::config::ThumbnailConfig;
use crate::decode;

// =============================================================================
// Renderer
// =============================================================================

/// Decode-and-encode step of a single job.
///
/// Split out as a trait so tests can observe the pipeline's scheduling
/// without decoding real media.
#[async_trait]
pub trait PreviewRenderer: Send + Sync {
    /// Produce an embeddable preview for the file, or `None` on any decode
    /// failure. Must not panic; must not block the async runtime.
    async fn render(&self, path: &Path, is_video: bool) -> Option<String>;
}

/// Production renderer: `image` crate for stills, ffmpeg frame capture for
/// videos, both on the blocking pool.
pub struct MediaPreviewRenderer {
    config: ThumbnailConfig,
    filesystem: Arc<dyn FileSystemAccess>,
}

impl MediaPreviewRenderer {
    pub fn new(config: ThumbnailConfig, filesystem: Arc<dyn FileSystemAccess>) -> Self {
        Self { config, filesystem }
    }

    async fn render_image(&self, path: &Path) -> Option<String> {
        let data = match self.filesystem.read_file(path).await {
            Ok(data) => data,
            Err(e) => {
                warn!(path = ?path, error = %e, "Failed to read image for preview");
                return None;
            }
        };

        let config = self.config.clone();
        match tokio::task::spawn_blocking(move || decode::render_image_preview(&data, &config))
            .await
        {
            Ok(Ok(preview)) => Some(preview),
            Ok(Err(e)) => {
                warn!(path = ?path, error = %e, "Image preview failed");
                None
            }
            Err(e) => {
                warn!(path = ?path, error = %e, "Image preview task panicked");
                None
            }
        }
    }

    async fn render_video(&self, path: &Path) -> Option<String> {
        let config = self.config.clone();
        let video_path = path.to_path_buf();
        let handle =
            tokio::task::spawn_blocking(move || decode::render_video_preview(&video_path, &config));

        match timeout(self.config.video_timeout, handle).await {
            Ok(Ok(Ok(preview))) => Some(preview),
            Ok(Ok(Err(e))) => {
                warn!(path = ?path, error = %e, "Video preview failed");
                None
            }
            Ok(Err(e)) => {
                warn!(path = ?path, error = %e, "Video preview task panicked");
                None
            }
            Err(_) => {
                warn!(
                    path = ?path,
                    timeout_secs = self.config.video_timeout.as_secs(),
                    "Video preview timed out"
                );
                None
            }
        }
    }
}

#[async_trait]
impl PreviewRenderer for MediaPreviewRenderer {
    async fn render(&self, path: &Path, is_video: bool) -> Option<String> {
        if is_video {
            self.render_video(path).await
        } else {
            self.render_image(path).await
        }
    }
}

// =============================================================================
// Pipeline
// =============================================================================

struct ThumbnailJob {
    id: MediaId,
    source_path: PathBuf,
    is_video: bool,
    reply: oneshot::Sender<Option<String>>,
}

/// Handle to the serialized thumbnail queue.
///
/// Cloning the handle shares the same worker. Dropping the last handle closes
/// the channel; the worker drains remaining jobs and exits.
#[derive(Clone)]
pub struct ThumbnailPipeline {
    sender: mpsc::UnboundedSender<ThumbnailJob>,
}

impl ThumbnailPipeline {
    /// Create a pipeline with the production renderer and spawn its worker.
    pub fn new(
        config: ThumbnailConfig,
        filesystem: Arc<dyn FileSystemAccess>,
        store: Arc<dyn RecordStore>,
        event_bus: EventBus,
    ) -> Self {
        let renderer = Arc::new(MediaPreviewRenderer::new(config, filesystem));
        Self::with_renderer(renderer, store, event_bus)
    }

    /// Create a pipeline over a custom renderer.
    pub fn with_renderer(
        renderer: Arc<dyn PreviewRenderer>,
        store: Arc<dyn RecordStore>,
        event_bus: EventBus,
    ) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        tokio::spawn(run_worker(receiver, renderer, store, event_bus));
        Self { sender }
    }

    /// Enqueue a preview job for a record.
    ///
    /// Returns a future resolving to the preview data URI, or `None` when the
    /// decode failed or timed out. The preview is also written to the record
    /// before the future resolves, so fire-and-forget callers may simply drop
    /// the receiver.
    pub fn enqueue(
        &self,
        id: MediaId,
        source_path: impl Into<PathBuf>,
        is_video: bool,
    ) -> oneshot::Receiver<Option<String>> {
        let (reply, receiver) = oneshot::channel();
        let job = ThumbnailJob {
            id,
            source_path: source_path.into(),
            is_video,
            reply,
        };

        if let Err(mpsc::error::SendError(job)) = self.sender.send(job) {
            warn!(id = %job.id, "Thumbnail worker gone; resolving job without preview");
            let _ = job.reply.send(None);
        }

        receiver
    }
}

async fn run_worker(
    mut receiver: mpsc::UnboundedReceiver<ThumbnailJob>,
    renderer: Arc<dyn PreviewRenderer>,
    store: Arc<dyn RecordStore>,
    event_bus: EventBus,
) {
    while let Some(job) = receiver.recv().await {
        debug!(id = %job.id, is_video = job.is_video, "Thumbnail job started");

        let preview = renderer.render(&job.source_path, job.is_video).await;

        match &preview {
            Some(data_uri) => {
                let thumbnail = data_uri.clone();
                match store
                    .update(&job.id, Box::new(move |r| r.thumbnail = Some(thumbnail)))
                    .await
                {
                    Ok(_) => {
                        debug!(id = %job.id, "Thumbnail stored");
                        event_bus
                            .emit(CoreEvent::Thumbnail(ThumbnailEvent::Generated {
                                id: job.id.to_string(),
                            }))
                            .ok();
                    }
                    Err(e) => {
                        warn!(id = %job.id, error = %e, "Preview generated but record write failed");
                    }
                }
            }
            None => {
                event_bus
                    .emit(CoreEvent::Thumbnail(ThumbnailEvent::Skipped {
                        id: job.id.to_string(),
                        reason: "decode failed or timed out".to_string(),
                    }))
                    .ok();
            }
        }

        let _ = job.reply.send(preview);
    }

    debug!("Thumbnail worker drained; channel closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_library::{InMemoryRecordStore, MediaRecord};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Renderer that tracks how many jobs run at once and in what order.
    struct ProbeRenderer {
        active: AtomicUsize,
        max_active: AtomicUsize,
        order: Mutex<Vec<String>>,
        fail_for: Option<String>,
    }

    impl ProbeRenderer {
        fn new(fail_for: Option<&str>) -> Self {
            Self {
                active: AtomicUsize::new(0),
                max_active: AtomicUsize::new(0),
                order: Mutex::new(Vec::new()),
                fail_for: fail_for.map(str::to_string),
            }
        }
    }

    #[async_trait]
    impl PreviewRenderer for ProbeRenderer {
        async fn render(&self, path: &Path, _is_video: bool) -> Option<String> {
            let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(now_active, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.active.fetch_sub(1, Ordering::SeqCst);

            let name = path.file_name().unwrap().to_string_lossy().to_string();
            self.order.lock().unwrap().push(name.clone());

            match &self.fail_for {
                Some(failing) if *failing == name => None,
                _ => Some(format!("data:image/jpeg;base64,{}", name)),
            }
        }
    }

    async fn store_with(names: &[&str]) -> Arc<InMemoryRecordStore> {
        let store = Arc::new(InMemoryRecordStore::new());
        for name in names {
            store
                .insert(MediaRecord::new(
                    *name,
                    format!("/camera/{}", name),
                    format!("file:///camera/{}", name),
                ))
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_jobs_are_serialized_fifo() {
        let renderer = Arc::new(ProbeRenderer::new(None));
        let store = store_with(&["a.jpg", "b.jpg", "c.jpg", "d.jpg", "e.jpg"]).await;
        let pipeline =
            ThumbnailPipeline::with_renderer(renderer.clone(), store.clone(), EventBus::new(16));

        let receivers: Vec<_> = ["a.jpg", "b.jpg", "c.jpg", "d.jpg", "e.jpg"]
            .iter()
            .map(|name| {
                pipeline.enqueue(
                    MediaId::from_filename(name),
                    format!("/camera/{}", name),
                    false,
                )
            })
            .collect();

        for receiver in receivers {
            receiver.await.unwrap();
        }

        // Never more than one decode in flight, and strict submission order.
        assert_eq!(renderer.max_active.load(Ordering::SeqCst), 1);
        assert_eq!(
            *renderer.order.lock().unwrap(),
            vec!["a.jpg", "b.jpg", "c.jpg", "d.jpg", "e.jpg"]
        );
    }

    #[tokio::test]
    async fn test_successful_job_writes_thumbnail() {
        let renderer = Arc::new(ProbeRenderer::new(None));
        let store = store_with(&["a.jpg"]).await;
        let pipeline =
            ThumbnailPipeline::with_renderer(renderer, store.clone(), EventBus::new(16));

        let preview = pipeline
            .enqueue(MediaId::new("a"), "/camera/a.jpg", false)
            .await
            .unwrap();

        assert!(preview.is_some());
        let record = store.get(&MediaId::new("a")).await.unwrap().unwrap();
        assert_eq!(record.thumbnail, preview);
    }

    #[tokio::test]
    async fn test_failed_job_resolves_none_and_worker_survives() {
        let renderer = Arc::new(ProbeRenderer::new(Some("a.jpg")));
        let store = store_with(&["a.jpg", "b.jpg"]).await;
        let pipeline =
            ThumbnailPipeline::with_renderer(renderer, store.clone(), EventBus::new(16));

        let failed = pipeline
            .enqueue(MediaId::new("a"), "/camera/a.jpg", false)
            .await
            .unwrap();
        let succeeded = pipeline
            .enqueue(MediaId::new("b"), "/camera/b.jpg", false)
            .await
            .unwrap();

        assert!(failed.is_none());
        assert!(succeeded.is_some());

        // No write for the failed job.
        let a = store.get(&MediaId::new("a")).await.unwrap().unwrap();
        assert!(a.thumbnail.is_none());
        let b = store.get(&MediaId::new("b")).await.unwrap().unwrap();
        assert!(b.thumbnail.is_some());
    }

    #[tokio::test]
    async fn test_events_emitted_per_outcome() {
        let renderer = Arc::new(ProbeRenderer::new(Some("bad.jpg")));
        let store = store_with(&["ok.jpg", "bad.jpg"]).await;
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        let pipeline = ThumbnailPipeline::with_renderer(renderer, store, bus);

        pipeline
            .enqueue(MediaId::new("ok"), "/camera/ok.jpg", false)
            .await
            .unwrap();
        pipeline
            .enqueue(MediaId::new("bad"), "/camera/bad.jpg", false)
            .await
            .unwrap();

        let first = rx.recv().await.unwrap();
        assert!(matches!(
            first,
            CoreEvent::Thumbnail(ThumbnailEvent::Generated { .. })
        ));
        let second = rx.recv().await.unwrap();
        assert!(matches!(
            second,
            CoreEvent::Thumbnail(ThumbnailEvent::Skipped { .. })
        ));
    }
}
