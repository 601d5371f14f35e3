//! Error taxonomy shared by every gitmv crate.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while exporting or reconciling a repository.
///
/// A merge conflict is normally reported as a branch outcome, not as an
/// error; `MergeConflict` exists so the CLI can turn a halted run into a
/// non-zero exit.
#[derive(Debug, Error)]
pub enum GitmvError {
    /// The working directory is not inside a git repository.
    #[error("not a git repository: {}", .0.display())]
    NotARepository(PathBuf),

    /// The repository has no commits, so there is nothing to export.
    #[error("repository has no commits to export")]
    NoCommits,

    /// Sync-mode reconciliation requires a clean working tree.
    #[error("working tree has uncommitted changes; commit or stash them before importing")]
    UncommittedChanges,

    /// A requested branch does not exist locally.
    #[error("branch not found: {0}")]
    BranchNotFound(String),

    /// The archive lacks one of its two required entries.
    #[error("invalid archive: missing {0}")]
    InvalidArchive(String),

    /// The bundle did not pass `git bundle verify`.
    #[error("bundle verification failed: {}", .0.display())]
    CorruptBundle(PathBuf),

    /// The archive path given to `import` does not exist.
    #[error("archive not found: {}", .0.display())]
    ArchiveNotFound(PathBuf),

    /// Reconciliation halted on a branch with conflicted paths.
    #[error("merge conflict on branch '{branch}' ({} conflicted path(s)); resolve, commit, and re-run the import", .paths.len())]
    MergeConflict { branch: String, paths: Vec<String> },

    /// Another gitmv run holds the destination lock.
    #[error("destination is locked by another gitmv run ({})", .0.display())]
    Locked(PathBuf),

    /// A git invocation exited non-zero in a way no other variant covers.
    #[error("git {command} failed: {exit_detail}")]
    Adapter { command: String, exit_detail: String },

    /// Packing or unpacking the transport archive failed.
    #[error("archive error: {0}")]
    Archive(String),

    /// Invalid preference key or value.
    #[error("invalid setting: {0}")]
    Setting(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GitmvError {
    /// Create an adapter error for a failed git command.
    pub fn adapter(command: impl Into<String>, exit_detail: impl Into<String>) -> Self {
        Self::Adapter {
            command: command.into(),
            exit_detail: exit_detail.into(),
        }
    }

    /// Create an archive error
    pub fn archive(msg: impl Into<String>) -> Self {
        Self::Archive(msg.into())
    }

    /// Create an invalid archive error naming the missing entry
    pub fn invalid_archive(entry: impl Into<String>) -> Self {
        Self::InvalidArchive(entry.into())
    }
}

/// Result type for gitmv operations
pub type Result<T> = std::result::Result<T, GitmvError>;
