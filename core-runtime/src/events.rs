//! # Event Bus System
//!
//! Event-driven notifications for the triage core using
//! `tokio::sync::broadcast`. Hosts subscribe to learn about scan passes,
//! status transitions, and thumbnail completion without polling the record
//! store.
//!
//! ## Overview
//!
//! - **Event types**: strongly-typed enums per domain (scan, triage,
//!   thumbnail) wrapped in [`CoreEvent`]
//! - **[`EventBus`]**: central broadcast channel for publishing events
//! - **[`EventStream`]**: receiver wrapper with optional filtering
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{EventBus, CoreEvent, ScanEvent};
//!
//! let event_bus = EventBus::new(100);
//! let event = CoreEvent::Scan(ScanEvent::Completed {
//!     camera_files: 12,
//!     pending_files: 3,
//!     completed_files: 5,
//!     records: 20,
//! });
//! event_bus.emit(event).ok();
//! ```
//!
//! ## Error Handling
//!
//! `RecvError::Lagged(n)` means a slow subscriber missed `n` events and can
//! keep receiving; `RecvError::Closed` signals shutdown.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

// Re-export commonly used types
pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum encompassing all event categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Reconciliation-pass events
    Scan(ScanEvent),
    /// Status-transition events
    Triage(TriageEvent),
    /// Thumbnail-pipeline events
    Thumbnail(ThumbnailEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Scan(e) => e.description(),
            CoreEvent::Triage(e) => e.description(),
            CoreEvent::Thumbnail(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Scan(ScanEvent::Failed { .. }) => EventSeverity::Error,
            CoreEvent::Scan(ScanEvent::Blocked { .. }) => EventSeverity::Warning,
            CoreEvent::Triage(TriageEvent::TransitionFailed { .. }) => EventSeverity::Warning,
            CoreEvent::Scan(ScanEvent::Completed { .. }) => EventSeverity::Info,
            CoreEvent::Triage(TriageEvent::StatusChanged { .. }) => EventSeverity::Info,
            CoreEvent::Triage(TriageEvent::BatchCompleted { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    /// Debug-level events (verbose)
    Debug,
    /// Informational events
    Info,
    /// Warning events
    Warning,
    /// Error events
    Error,
}

// ============================================================================
// Scan Events
// ============================================================================

/// Events emitted around a reconciliation pass over the three folders.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum ScanEvent {
    /// A reconciliation pass started.
    Started,
    /// Pass finished; listing and record counts for the host UI.
    Completed {
        /// Files surviving the camera listing after dedup.
        camera_files: u64,
        /// Files surviving the pending listing after dedup.
        pending_files: u64,
        /// Files in the completed listing.
        completed_files: u64,
        /// Total records in the store after the pass.
        records: u64,
    },
    /// Storage permission is not granted; nothing was scanned.
    Blocked {
        /// Permission state reported by the gate ("denied" or "prompt").
        state: String,
    },
    /// The pass failed wholesale (e.g., the store rejected writes).
    Failed {
        /// Human-readable error message.
        message: String,
    },
}

impl ScanEvent {
    fn description(&self) -> &str {
        match self {
            ScanEvent::Started => "Scan started",
            ScanEvent::Completed { .. } => "Scan completed",
            ScanEvent::Blocked { .. } => "Scan blocked by permission",
            ScanEvent::Failed { .. } => "Scan failed",
        }
    }
}

// ============================================================================
// Triage Events
// ============================================================================

/// Events emitted by the transition engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum TriageEvent {
    /// A record moved between folders.
    StatusChanged {
        /// The record id.
        id: String,
        /// Previous status ("camera", "pending", "completed").
        from: String,
        /// New status.
        to: String,
    },
    /// A transition failed and was rolled back.
    TransitionFailed {
        /// The record id.
        id: String,
        /// The status the transition targeted.
        target: String,
        /// Human-readable error message.
        message: String,
    },
    /// A complete-all-pending batch finished.
    BatchCompleted {
        /// Records successfully completed.
        completed: u64,
        /// Records that failed and kept their prior status.
        failed: u64,
    },
}

impl TriageEvent {
    fn description(&self) -> &str {
        match self {
            TriageEvent::StatusChanged { .. } => "Record status changed",
            TriageEvent::TransitionFailed { .. } => "Transition failed",
            TriageEvent::BatchCompleted { .. } => "Batch completion finished",
        }
    }
}

// ============================================================================
// Thumbnail Events
// ============================================================================

/// Events emitted by the thumbnail pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum ThumbnailEvent {
    /// A preview was generated and written to the record.
    Generated {
        /// The record id.
        id: String,
    },
    /// A job resolved without a preview (decode error or timeout).
    Skipped {
        /// The record id.
        id: String,
        /// Why no preview was produced.
        reason: String,
    },
}

impl ThumbnailEvent {
    fn description(&self) -> &str {
        match self {
            ThumbnailEvent::Generated { .. } => "Thumbnail generated",
            ThumbnailEvent::Skipped { .. } => "Thumbnail skipped",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Uses `tokio::sync::broadcast` internally, which provides:
/// - Multiple producers (clone the `EventBus`)
/// - Multiple consumers (each `subscribe()` creates a new receiver)
/// - Non-blocking sends (events are cloned for each subscriber)
/// - Lagging detection (slow subscribers get `RecvError::Lagged`)
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// When a subscriber falls behind by more than `capacity` events it
    /// receives `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Creates a new event bus with the default buffer size.
    #[allow(clippy::should_implement_trait)]
    pub fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an error
    /// when there are no active subscribers (not fatal; callers `ok()` it).
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber to receive events.
    ///
    /// Each call creates an independent receiver that will receive all future
    /// events. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

/// Type alias for event filter functions.
type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with optional filtering.
///
/// # Example
///
/// ```rust
/// use core_runtime::events::{EventBus, EventStream, CoreEvent};
///
/// let event_bus = EventBus::new(100);
/// let stream = EventStream::new(event_bus.subscribe())
///     .filter(|event| matches!(event, CoreEvent::Triage(_)));
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    /// Creates a new event stream from a receiver.
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Adds a filter function; only matching events are returned by `recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    /// Receives the next event that passes the filter (if any).
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n`
    /// events, `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            match &self.filter {
                Some(predicate) if !predicate(&event) => continue,
                _ => return Ok(event),
            }
        }
    }
}
