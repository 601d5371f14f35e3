use serde::{Deserialize, Serialize};
use std::fmt;

/// Reconciliation strategy for an import run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Populate an empty repository: branches are created straight from the bundle.
    Init,
    /// Merge each branch into its local counterpart.
    Sync,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Init => f.write_str("init"),
            Mode::Sync => f.write_str("sync"),
        }
    }
}

/// Terminal state of one branch in an import run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BranchStatus {
    Created,
    Merged,
    Conflict,
    Simulated,
    Skipped,
}

impl BranchStatus {
    /// Whether the destination now holds new history for this branch.
    pub fn is_pushable(self) -> bool {
        matches!(self, BranchStatus::Created | BranchStatus::Merged)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BranchStatus::Created => "created",
            BranchStatus::Merged => "merged",
            BranchStatus::Conflict => "conflict",
            BranchStatus::Simulated => "simulated",
            BranchStatus::Skipped => "skipped",
        }
    }
}

impl fmt::Display for BranchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result record for one processed branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchOutcome {
    /// Destination branch name (after mapping).
    pub branch: String,
    /// Branch name in the snapshot.
    pub source: String,
    pub status: BranchStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conflicted_paths: Vec<String>,
}

impl BranchOutcome {
    pub fn new(source: &str, branch: &str, status: BranchStatus) -> Self {
        Self {
            branch: branch.to_string(),
            source: source.to_string(),
            status,
            conflicted_paths: Vec::new(),
        }
    }

    pub fn conflict(source: &str, branch: &str, paths: Vec<String>) -> Self {
        Self {
            conflicted_paths: paths,
            ..Self::new(source, branch, BranchStatus::Conflict)
        }
    }
}
