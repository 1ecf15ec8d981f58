//! Storage Permission Abstraction
//!
//! Hosts that gate filesystem access behind a runtime permission (Android
//! all-files access, iOS photo library) implement [`StorageGate`]; the core
//! refuses to scan or move files unless the gate reports `Granted`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{BridgeError, Result};

/// Outcome of a permission check or request.
///
/// `Prompt` means the host has not yet asked the user and a call to
/// [`StorageGate::request`] may surface a system dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionState {
    Granted,
    Denied,
    Prompt,
}

impl PermissionState {
    /// Convert to the host-facing string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Granted => "granted",
            Self::Denied => "denied",
            Self::Prompt => "prompt",
        }
    }

    /// Only `Granted` unblocks scanning and transitions.
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }
}

impl fmt::Display for PermissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PermissionState {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "granted" => Ok(Self::Granted),
            "denied" => Ok(Self::Denied),
            "prompt" => Ok(Self::Prompt),
            _ => Err(BridgeError::OperationFailed(format!(
                "Unknown permission state: {}",
                s
            ))),
        }
    }
}

/// Storage permission gate
///
/// # Example
///
/// ```ignore
/// use bridge_traits::permission::StorageGate;
///
/// async fn ensure_access(gate: &dyn StorageGate) -> bool {
///     let mut state = gate.check_status().await.unwrap_or(PermissionState::Denied);
///     if !state.is_granted() {
///         state = gate.request().await.unwrap_or(PermissionState::Denied);
///     }
///     state.is_granted()
/// }
/// ```
#[async_trait]
pub trait StorageGate: Send + Sync {
    /// Query the current permission state without prompting the user.
    async fn check_status(&self) -> Result<PermissionState>;

    /// Request access, possibly surfacing a host permission dialog.
    ///
    /// Implementations should short-circuit to `Granted` when access is
    /// already held.
    async fn request(&self) -> Result<PermissionState>;
}
