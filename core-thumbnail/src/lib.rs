//! # Thumbnail Module
//!
//! Serialized preview generation for triage records.
//!
//! ## Overview
//!
//! This module provides:
//! - [`ThumbnailPipeline`]: a single-consumer work queue (channel + one
//!   worker) producing embeddable data-URI previews, strict FIFO with one
//!   decode in flight
//! - [`ThumbnailConfig`]: fixed target width, JPEG quality, video capture
//!   offset and timeout
//! - Image decode via the `image` crate; video frame capture via ffmpeg

pub mod config;
pub mod decode;
pub mod error;
pub mod pipeline;

pub use config::ThumbnailConfig;
pub use error::{Result, ThumbnailError};
pub use pipeline::{MediaPreviewRenderer, PreviewRenderer, ThumbnailPipeline};
