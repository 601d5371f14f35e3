//! The query/command surface the engine needs from a version-control backend.
//!
//! Implemented by `gitmv_git::GitCli` (shells out to `git`) and by
//! `gitmv_engine::fake::FakeRepository` (in-memory, for tests). The adapter
//! holds no state across calls; the repository on disk is the source of truth.

use crate::error::Result;
use crate::snapshot::CommitInfo;
use std::path::Path;
use std::path::PathBuf;

/// Diagnostic git prints when a merge has no common ancestor.
///
/// Git offers no machine-readable signal for this case, so adapters match
/// this text (with `LC_ALL=C` so it is never translated).
pub const UNRELATED_HISTORIES_MARKER: &str = "refusing to merge unrelated histories";

/// Which refs go into a bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefSpec {
    /// Every ref (`--all`).
    All,
    /// Only the named refs.
    Refs(Vec<String>),
}

/// Flags for [`Repository::merge_branch`].
#[derive(Debug, Clone, Default)]
pub struct MergeOptions {
    pub commit_message: Option<String>,
    pub no_fast_forward: bool,
    pub allow_unrelated_histories: bool,
}

/// Outcome of a merge attempt. Conflicts are a normal result, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeStatus {
    /// The merge completed (including "already up to date").
    Clean,
    /// Git refused because the histories share no ancestor; the caller may
    /// retry with `allow_unrelated_histories`.
    UnrelatedHistories { detail: String },
    /// The merge stopped with conflicted paths left in the working tree.
    Conflicted { paths: Vec<String>, detail: String },
}

impl MergeStatus {
    pub fn is_clean(&self) -> bool {
        matches!(self, MergeStatus::Clean)
    }
}

/// Stateless wrapper over one repository.
///
/// Methods documented as tolerant never fail; everything else returns
/// `GitmvError::Adapter` when the backend reports an error.
pub trait Repository {
    /// Root of the working tree this adapter operates on.
    fn workdir(&self) -> &Path;

    /// Tolerant.
    fn is_repository(&self) -> bool;

    /// Absolute path of the repository metadata directory (`.git`).
    fn git_dir(&self) -> Result<PathBuf>;

    /// Tolerant; `false` when HEAD does not resolve.
    fn has_commits(&self) -> bool;

    /// Tolerant; `0` when HEAD does not resolve.
    fn commit_count(&self) -> u64;

    /// Fails when there are no commits; guard with [`Repository::has_commits`].
    fn current_branch(&self) -> Result<String>;

    fn local_branches(&self) -> Result<Vec<String>>;

    fn all_tags(&self) -> Result<Vec<String>>;

    /// Fails when `reference` does not resolve.
    fn commit_info(&self, reference: &str) -> Result<CommitInfo>;

    /// Fails when no ref matches `refs`.
    fn create_bundle(&self, output: &Path, refs: &RefSpec) -> Result<()>;

    /// Tolerant; a truncated or malformed bundle yields `false`.
    fn verify_bundle(&self, path: &Path) -> bool;

    fn add_remote(&self, name: &str, locator: &str) -> Result<()>;

    /// Tolerant; removing an absent remote is not an error.
    fn remove_remote(&self, name: &str);

    /// Tolerant; `None` when the remote is not configured.
    fn remote_url(&self, name: &str) -> Option<String>;

    fn fetch(&self, remote: &str) -> Result<()>;

    /// Never fails for a conflict or an unrelated-histories refusal; those
    /// are encoded in [`MergeStatus`].
    fn merge_branch(&self, reference: &str, options: &MergeOptions) -> Result<MergeStatus>;

    fn checkout_new_branch(&self, name: &str, start_point: &str) -> Result<()>;

    fn checkout_existing(&self, name: &str) -> Result<()>;

    fn push(&self, remote: &str, branch: &str) -> Result<()>;

    fn working_tree_is_clean(&self) -> Result<bool>;
}
