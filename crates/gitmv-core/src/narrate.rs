//! Operator-facing progress reports.
//!
//! The engine describes what it is doing with typed [`Notice`]s. This is
//! separate from `tracing` diagnostics: notices are the product's output,
//! rendered in the operator's language by the front end.

use crate::types::{BranchOutcome, Mode};
use std::path::PathBuf;
use std::sync::Mutex;

/// Severity used by front ends to decorate a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Plain,
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    // ── export ──
    DirtyTree,
    RepositorySummary {
        current_branch: String,
        branch_count: usize,
        tag_count: usize,
    },
    BranchListing {
        name: String,
        short_hash: Option<String>,
        active: bool,
    },
    CommitInfoUnavailable {
        reference: String,
    },
    BundleCreated {
        size: u64,
    },
    BundleVerified,
    ExportComplete {
        path: PathBuf,
        size: u64,
        sha256: String,
    },
    ExportCancelled,

    // ── import ──
    DryRun,
    ArchiveDigest {
        sha256: String,
    },
    EmptyRepository,
    ModeSelected(Mode),
    CurrentBranch(String),
    SnapshotSummary {
        export_date: String,
        original_branch: String,
        branch_count: usize,
        tag_count: usize,
    },
    RemoteRegistered(String),
    Fetched,
    UnknownBranches(Vec<String>),
    NoBranchesSelected,
    BranchesToProcess(Vec<String>),
    BranchStart {
        source: String,
        target: String,
    },
    CommitDetails {
        short_hash: String,
        message: String,
        author: String,
    },
    BranchCreated(String),
    WouldCreate(String),
    WouldCheckout(String),
    WouldMerge {
        remote_ref: String,
        branch: String,
    },
    Merged(String),
    UnrelatedHistories(String),
    Skipped(String),
    Conflict {
        branch: String,
        paths: Vec<String>,
    },
    ResolveInstructions,
    Summary(Vec<BranchOutcome>),
    RemoteUrl(String),
    PushFailed {
        branch: String,
        detail: String,
    },
    Pushed,
    PushDeclined,
    NoOriginRemote,
    CleanedUp,
    ImportComplete {
        merged: usize,
        created: usize,
    },
    DryRunComplete,
}

impl Notice {
    pub fn level(&self) -> Level {
        match self {
            Notice::DirtyTree
            | Notice::CommitInfoUnavailable { .. }
            | Notice::DryRun
            | Notice::UnknownBranches(_)
            | Notice::NoBranchesSelected
            | Notice::UnrelatedHistories(_)
            | Notice::Conflict { .. }
            | Notice::PushFailed { .. }
            | Notice::NoOriginRemote => Level::Warning,
            Notice::EmptyRepository
            | Notice::ModeSelected(_)
            | Notice::ResolveInstructions
            | Notice::PushDeclined => Level::Info,
            Notice::BundleVerified
            | Notice::BranchCreated(_)
            | Notice::Merged(_)
            | Notice::Pushed
            | Notice::CleanedUp => Level::Success,
            _ => Level::Plain,
        }
    }
}

pub trait Narrator {
    fn notify(&self, notice: Notice);
}

/// Collects notices in memory (for testing).
pub struct CollectNarrator {
    notices: Mutex<Vec<Notice>>,
}

impl Default for CollectNarrator {
    fn default() -> Self {
        Self::new()
    }
}

impl CollectNarrator {
    pub fn new() -> Self {
        Self {
            notices: Mutex::new(Vec::new()),
        }
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().map(|n| n.clone()).unwrap_or_default()
    }

    pub fn contains(&self, notice: &Notice) -> bool {
        self.notices().iter().any(|n| n == notice)
    }
}

impl Narrator for CollectNarrator {
    fn notify(&self, notice: Notice) {
        if let Ok(mut n) = self.notices.lock() {
            n.push(notice);
        }
    }
}

/// Discards every notice.
pub struct SilentNarrator;

impl Narrator for SilentNarrator {
    fn notify(&self, _notice: Notice) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collect_narrator_records_in_order() {
        let n = CollectNarrator::new();
        n.notify(Notice::DryRun);
        n.notify(Notice::Fetched);
        assert_eq!(n.notices(), vec![Notice::DryRun, Notice::Fetched]);
        assert!(n.contains(&Notice::Fetched));
        assert!(!n.contains(&Notice::Pushed));
    }

    #[test]
    fn conflicts_are_warnings() {
        let c = Notice::Conflict {
            branch: "main".into(),
            paths: vec![],
        };
        assert_eq!(c.level(), Level::Warning);
        assert_eq!(Notice::Merged("main".into()).level(), Level::Success);
    }
}
