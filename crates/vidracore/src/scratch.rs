//! Per-download scratch directories.
//!
//! Every download job owns exactly one scratch directory; it is never
//! shared and it is removed unconditionally when the job ends, whatever
//! the outcome.

use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::config;
use crate::error::AppResult;

/// An exclusively-owned temporary directory for one download job.
///
/// Removal happens on drop, so early returns and errors in the job
/// pipeline cannot leak media files. `cleanup` is idempotent.
#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    /// Create a fresh scratch directory under the configured temp root.
    pub fn create() -> AppResult<Self> {
        Self::create_in(Path::new(&*config::TEMP_FILES_DIR))
    }

    /// Create a fresh scratch directory under an explicit root.
    pub fn create_in(root: &Path) -> AppResult<Self> {
        let path = root.join(format!("vidra-{}", Uuid::new_v4()));
        fs_err::create_dir_all(&path)?;
        log::debug!("Created scratch directory {}", path.display());
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the directory and everything in it. Safe to call more than
    /// once; a directory that is already gone is not an error.
    pub fn cleanup(&self) {
        if !self.path.exists() {
            return;
        }
        if let Err(e) = fs_err::remove_dir_all(&self.path) {
            log::warn!("Failed to clean up scratch directory {}: {}", self.path.display(), e);
        }
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        self.cleanup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleanup_removes_directory_and_contents() {
        let root = tempfile::tempdir().unwrap();
        let scratch = ScratchDir::create_in(root.path()).unwrap();
        let file = scratch.path().join("media.mp4");
        std::fs::write(&file, b"data").unwrap();

        let kept_path = scratch.path().to_path_buf();
        drop(scratch);

        assert!(!kept_path.exists());
        assert!(!file.exists());
    }

    #[test]
    fn test_cleanup_is_idempotent() {
        let root = tempfile::tempdir().unwrap();
        let scratch = ScratchDir::create_in(root.path()).unwrap();
        scratch.cleanup();
        // Second cleanup (and the drop that follows) must be a no-op.
        scratch.cleanup();
        assert!(!scratch.path().exists());
    }

    #[test]
    fn test_directories_are_unique_per_job() {
        let root = tempfile::tempdir().unwrap();
        let a = ScratchDir::create_in(root.path()).unwrap();
        let b = ScratchDir::create_in(root.path()).unwrap();
        assert_ne!(a.path(), b.path());
    }
}
