//! Media Index Implementation for Desktop
//!
//! Desktop file managers watch directories themselves; there is no media
//! store to poke. The notification is logged so the call sites stay
//! observable.

use async_trait::async_trait;
use bridge_traits::{error::Result, index::MediaIndex};
use std::path::Path;
use tracing::debug;

/// Media index that records notifications in the log and does nothing else.
#[derive(Debug, Default, Clone)]
pub struct LoggingMediaIndex;

impl LoggingMediaIndex {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MediaIndex for LoggingMediaIndex {
    async fn scan_file(&self, path: &Path) -> Result<()> {
        debug!(path = ?path, "Media index notified");
        Ok(())
    }
}
