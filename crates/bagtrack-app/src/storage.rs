use anyhow::{Context, Result};
use bagtrack_core::persistence::StorageUsage;

use crate::Session;

impl Session<'_> {
    pub fn storage_usage(&self) -> Result<StorageUsage> {
        self.gateway
            .usage()
            .context("failed to measure storage usage")
    }

    /// Whether a new image of `bytes` may be stored, or should stay in
    /// memory for this session only.
    pub fn can_store_image(&self, bytes: usize) -> Result<bool> {
        Ok(self.storage_usage()?.fits(bytes))
    }
}
