//! Media Index Abstraction
//!
//! After the core copies or deletes a file outside the read-only source
//! folder, external gallery apps only notice if the platform media index is
//! poked. [`MediaIndex`] is that fire-and-forget notification; failures are
//! logged by callers and never fail the surrounding operation.

use async_trait::async_trait;
use std::path::Path;

use crate::error::Result;

/// Media index notification trait
#[async_trait]
pub trait MediaIndex: Send + Sync {
    /// Ask the platform to (re)index a single path.
    ///
    /// Called after every physical copy or delete in a writable folder so
    /// external viewers see the change. Best-effort; a returned error must
    /// not abort the operation that triggered it.
    async fn scan_file(&self, path: &Path) -> Result<()>;
}
