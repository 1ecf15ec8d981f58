//! Storage Gate Implementation for Desktop
//!
//! Desktop platforms have no runtime storage-permission dialog, so the gate
//! is a fixed answer. Tests use the non-granted variants to exercise the
//! blocked paths of the core.

use async_trait::async_trait;
use bridge_traits::{
    error::Result,
    permission::{PermissionState, StorageGate},
};

/// Gate that always reports the state it was constructed with.
#[derive(Debug, Clone)]
pub struct StaticStorageGate {
    state: PermissionState,
}

impl StaticStorageGate {
    pub fn new(state: PermissionState) -> Self {
        Self { state }
    }

    /// The desktop default: access is always granted.
    pub fn granted() -> Self {
        Self::new(PermissionState::Granted)
    }
}

impl Default for StaticStorageGate {
    fn default() -> Self {
        Self::granted()
    }
}

#[async_trait]
impl StorageGate for StaticStorageGate {
    async fn check_status(&self) -> Result<PermissionState> {
        Ok(self.state)
    }

    async fn request(&self) -> Result<PermissionState> {
        Ok(self.state)
    }
}
