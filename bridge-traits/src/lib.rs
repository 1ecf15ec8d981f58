//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the triage core and
//! platform-specific implementations. Each trait represents a capability the
//! core requires but that must be implemented differently per platform
//! (desktop, Android, iOS).
//!
//! ## Traits
//!
//! - [`FileSystemAccess`](storage::FileSystemAccess) - folder listing, stat,
//!   copy/delete, whole-file read/write, display-URI resolution
//! - [`StorageGate`](permission::StorageGate) - runtime storage permission
//!   check/request; anything but `Granted` blocks scans and transitions
//! - [`MediaIndex`](index::MediaIndex) - fire-and-forget reindex notification
//!   after copies/deletes in the writable folders
//! - [`Clock`](time::Clock) - time source for deterministic testing
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Platform
//! implementations should convert platform-specific errors to `BridgeError`
//! and include context (paths, permission aliases) in messages.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds so implementations can be
//! shared across async tasks behind `Arc<dyn _>`.

pub mod error;
pub mod index;
pub mod permission;
pub mod storage;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use index::MediaIndex;
pub use permission::{PermissionState, StorageGate};
pub use storage::{FileMetadata, FileSystemAccess};
pub use time::{Clock, SystemClock};
