use gitmv_core::snapshot::{BUNDLE_ENTRY, METADATA_ENTRY};
use std::path::{Path, PathBuf};

/// Scratch directory name under the git dir.
pub const SCRATCH_DIR: &str = "gitmv-import";
/// Lock file name under the git dir.
pub const LOCK_FILE: &str = "gitmv.lock";

/// Well-known paths an import uses inside a destination's git dir.
///
/// Everything lives under the git dir so an interrupted run never shows up
/// as an untracked change in the working tree.
#[derive(Debug, Clone)]
pub struct ImportPaths {
    pub git_dir: PathBuf,
    pub scratch_dir: PathBuf,
    pub bundle_path: PathBuf,
    pub metadata_path: PathBuf,
    pub lock_file: PathBuf,
}

impl ImportPaths {
    /// Derive all paths from a git dir. Pure computation, no I/O.
    pub fn discover(git_dir: impl Into<PathBuf>) -> Self {
        let git_dir = git_dir.into();
        let scratch_dir = git_dir.join(SCRATCH_DIR);
        Self {
            bundle_path: scratch_dir.join(BUNDLE_ENTRY),
            metadata_path: scratch_dir.join(METADATA_ENTRY),
            lock_file: git_dir.join(LOCK_FILE),
            scratch_dir,
            git_dir,
        }
    }

    /// Whether a previous run left its scratch directory behind.
    pub fn has_leftovers(&self) -> bool {
        self.scratch_dir.exists()
    }

    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }
}
