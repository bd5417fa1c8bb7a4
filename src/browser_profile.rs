//! Chrome profile directories for renderer processes
//!
//! Every launch gets its own UUID-named directory under the system temp
//! dir. Its path appears on the command line of the browser and all of its
//! helper processes, which is what the orphan sweep matches on.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// RAII wrapper for a Chrome profile directory
///
/// Removes the directory on drop unless `into_path()` is called.
#[derive(Debug)]
pub struct BrowserProfile {
    path: PathBuf,
    cleanup_on_drop: bool,
}

impl BrowserProfile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Consume the profile and return its path, disabling auto-cleanup
    ///
    /// Use this when the renderer process takes over cleanup.
    pub fn into_path(mut self) -> PathBuf {
        self.cleanup_on_drop = false;
        std::mem::take(&mut self.path)
    }
}

impl Drop for BrowserProfile {
    fn drop(&mut self) {
        if self.cleanup_on_drop && self.path.exists() {
            debug!("BrowserProfile cleanup: removing {}", self.path.display());
            if let Err(e) = std::fs::remove_dir_all(&self.path) {
                warn!("Failed to cleanup profile directory {}: {}", self.path.display(), e);
            }
        }
    }
}

/// Create a unique profile directory named `{prefix}_{uuid}` in the temp dir.
pub fn create_unique_profile_with_prefix(prefix: &str) -> Result<BrowserProfile> {
    let path = std::env::temp_dir().join(format!("{}_{}", prefix, Uuid::new_v4()));

    // create_dir (not create_dir_all) fails on collision instead of sharing a profile
    std::fs::create_dir(&path)
        .with_context(|| format!("Failed to create profile directory: {}", path.display()))?;

    info!("Created Chrome profile directory: {}", path.display());
    Ok(BrowserProfile {
        path,
        cleanup_on_drop: true,
    })
}

/// Remove a profile directory handed over via `into_path()`.
pub fn remove_profile_dir(path: &Path) -> Result<()> {
    if path.exists() {
        std::fs::remove_dir_all(path)
            .with_context(|| format!("Failed to remove profile directory: {}", path.display()))?;
    }
    Ok(())
}
