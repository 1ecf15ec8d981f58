use bridge_traits::error::BridgeError;
use core_library::error::LibraryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("Store error: {0}")]
    Store(#[from] LibraryError),
}

pub type Result<T> = std::result::Result<T, SyncError>;
