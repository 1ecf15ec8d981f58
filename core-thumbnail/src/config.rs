//! Thumbnail pipeline configuration.

use std::time::Duration;

/// Configuration for preview generation
#[derive(Debug, Clone)]
pub struct ThumbnailConfig {
    /// Fixed target width in pixels; height follows the aspect ratio.
    pub target_width: u32,

    /// JPEG quality factor (1-100).
    pub jpeg_quality: u8,

    /// Offset into a video at which the preview frame is captured.
    pub video_capture_offset_secs: f64,

    /// Bounded wait for a single video decode. Image decodes are not
    /// time-limited.
    pub video_timeout: Duration,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            target_width: 320,
            jpeg_quality: 75,
            video_capture_offset_secs: 1.0,
            video_timeout: Duration::from_secs(10),
        }
    }
}

impl ThumbnailConfig {
    /// Set target width
    pub fn with_target_width(mut self, width: u32) -> Self {
        self.target_width = width;
        self
    }

    /// Set JPEG quality factor
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality;
        self
    }

    /// Set video decode timeout
    pub fn with_video_timeout(mut self, timeout: Duration) -> Self {
        self.video_timeout = timeout;
        self
    }
}
