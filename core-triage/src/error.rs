use bridge_traits::error::BridgeError;
use core_library::error::LibraryError;
use thiserror::Error;

/// Internal transition failures. These never cross the public boundary;
/// the engine converts them into failure results.
#[derive(Error, Debug)]
pub enum TriageError {
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("Store error: {0}")]
    Store(#[from] LibraryError),

    #[error("Record not found: {0}")]
    RecordNotFound(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Storage permission not granted")]
    PermissionDenied,
}

pub type Result<T> = std::result::Result<T, TriageError>;
