//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! This crate provides production-ready implementations of the bridge traits
//! using desktop-appropriate libraries:
//! - `FileSystemAccess` using `tokio::fs`, with `file://` display URIs
//! - `StorageGate` as a fixed always-granted gate (desktop has no runtime
//!   storage permission)
//! - `MediaIndex` as a log-only notification sink
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{LoggingMediaIndex, StaticStorageGate, TokioFileSystem};
//!
//! let fs = TokioFileSystem::new();
//! let gate = StaticStorageGate::granted();
//! let index = LoggingMediaIndex::new();
//! // Hand to core-service as the dependency bundle
//! ```

mod filesystem;
mod index;
mod permission;

pub use filesystem::TokioFileSystem;
pub use index::LoggingMediaIndex;
pub use permission::StaticStorageGate;
