//! Domain models for the triage library
//!
//! A [`MediaRecord`] is the unit of identity: one logical media item that may
//! physically live in the camera, pending, or completed folder. Its identity
//! is the base filename (extension and revision suffix stripped), so the same
//! item keeps one record as it moves between folders.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::LibraryError;
use crate::naming;

// =============================================================================
// Supported extensions
// =============================================================================

/// Image extensions eligible for triage (lower-case, without the dot).
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "webp", "heic", "heif", "dng", "tiff", "tif",
];

/// Video extensions eligible for triage.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv", "webm", "m4v", "3gp"];

/// Whether a lower-cased extension is in the fixed media allow-list.
pub fn is_supported_extension(extension: &str) -> bool {
    IMAGE_EXTENSIONS.contains(&extension) || VIDEO_EXTENSIONS.contains(&extension)
}

/// Whether a lower-cased extension denotes a video.
pub fn is_video_extension(extension: &str) -> bool {
    VIDEO_EXTENSIONS.contains(&extension)
}

// =============================================================================
// ID Type
// =============================================================================

/// Stable identity of a media record: the base filename.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MediaId(String);

impl MediaId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derive the identity from any filename, stripping extension and
    /// revision suffix.
    pub fn from_filename(name: &str) -> Self {
        Self(naming::base_of(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Status
// =============================================================================

/// Triage status of a record; always consistent with exactly one live path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaStatus {
    /// Untouched in the read-only source folder
    Camera,
    /// Pulled into the working folder for editing
    Pending,
    /// Promoted to the completed folder
    Completed,
}

impl MediaStatus {
    /// Convert status to its host-facing string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Camera => "camera",
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for MediaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaStatus {
    type Err = LibraryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "camera" => Ok(Self::Camera),
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            _ => Err(LibraryError::InvalidInput {
                field: "status".to_string(),
                message: format!("Unknown status: {}", s),
            }),
        }
    }
}

// =============================================================================
// Media record
// =============================================================================

/// One logical media item across the three triage folders.
///
/// Exactly the path field matching `status` is authoritative; the others are
/// absent or stale and must not be used for display. `camera_path` records the
/// source location; transitions never touch it, only a camera scan rewrites it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaRecord {
    pub id: MediaId,
    /// Canonical `<base>.<ext>` filename, without any revision suffix.
    pub original_name: String,
    pub status: MediaStatus,
    /// Host-displayable reference to whichever path is live for `status`.
    pub display_uri: String,
    pub camera_path: String,
    pub pending_path: Option<String>,
    pub completed_path: Option<String>,
    /// Lower-cased, empty when the name has no extension.
    pub extension: String,
    pub is_video: bool,
    /// Size in bytes of the authoritative file.
    pub size: u64,
    /// Modified time of the authoritative file, unix milliseconds.
    pub modified_time: i64,
    /// Compact embeddable preview, populated asynchronously. Never required
    /// for correctness.
    pub thumbnail: Option<String>,
}

impl MediaRecord {
    /// Build a fresh record from a canonical filename and its camera-folder
    /// location. Extension, identity, and video-ness are derived from the
    /// name; path fields for the other folders start empty.
    pub fn new(
        original_name: impl Into<String>,
        camera_path: impl Into<String>,
        display_uri: impl Into<String>,
    ) -> Self {
        let original_name = original_name.into();
        let extension = naming::extension_of(&original_name);
        let is_video = is_video_extension(&extension);

        Self {
            id: MediaId::from_filename(&original_name),
            original_name,
            status: MediaStatus::Camera,
            display_uri: display_uri.into(),
            camera_path: camera_path.into(),
            pending_path: None,
            completed_path: None,
            extension,
            is_video,
            size: 0,
            modified_time: 0,
            thumbnail: None,
        }
    }

    /// The path backing the current status, when the record is internally
    /// consistent.
    pub fn live_path(&self) -> Option<&str> {
        match self.status {
            MediaStatus::Camera => Some(self.camera_path.as_str()),
            MediaStatus::Pending => self.pending_path.as_deref(),
            MediaStatus::Completed => self.completed_path.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [
            MediaStatus::Camera,
            MediaStatus::Pending,
            MediaStatus::Completed,
        ] {
            assert_eq!(status.as_str().parse::<MediaStatus>().unwrap(), status);
        }
        assert!("archived".parse::<MediaStatus>().is_err());
    }

    #[test]
    fn test_id_from_filename() {
        assert_eq!(MediaId::from_filename("IMG_1~2.jpg").as_str(), "IMG_1");
        assert_eq!(MediaId::from_filename("IMG_1.jpg"), MediaId::new("IMG_1"));
    }

    #[test]
    fn test_record_derivation() {
        let record = MediaRecord::new("CLIP_7.MOV", "/dcim/CLIP_7.MOV", "file:///dcim/CLIP_7.MOV");
        assert_eq!(record.id.as_str(), "CLIP_7");
        assert_eq!(record.extension, "mov");
        assert!(record.is_video);
        assert_eq!(record.status, MediaStatus::Camera);
        assert_eq!(record.live_path(), Some("/dcim/CLIP_7.MOV"));
    }

    #[test]
    fn test_live_path_follows_status() {
        let mut record = MediaRecord::new("IMG_1.jpg", "/dcim/IMG_1.jpg", "uri");
        record.status = MediaStatus::Pending;
        assert_eq!(record.live_path(), None);

        record.pending_path = Some("/pending/IMG_1.jpg".to_string());
        assert_eq!(record.live_path(), Some("/pending/IMG_1.jpg"));
    }

    #[test]
    fn test_extension_allow_list() {
        assert!(is_supported_extension("jpg"));
        assert!(is_supported_extension("mp4"));
        assert!(!is_supported_extension("txt"));
        assert!(is_video_extension("mov"));
        assert!(!is_video_extension("png"));
    }

    #[test]
    fn test_status_serde_strings() {
        let json = serde_json::to_string(&MediaStatus::Pending).unwrap();
        assert_eq!(json, "\"pending\"");
    }
}
