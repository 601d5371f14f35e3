//! Export: capture branches into a verified bundle plus its snapshot, packed
//! into one archive.

use crate::snapshot::build_snapshot;
use gitmv_core::snapshot::{short_hash, BUNDLE_ENTRY, METADATA_ENTRY};
use gitmv_core::{
    GitmvError, Narrator, Notice, Prompter, Question, RefSpec, Repository, Result,
};
use gitmv_store::archive;
use std::fs;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Export only this branch.
    pub branch: Option<String>,
    pub all_branches: bool,
    /// No prompts; every branch unless `branch` is set.
    pub auto: bool,
    /// Directory the archive is written to.
    pub output_dir: PathBuf,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            branch: None,
            all_branches: false,
            auto: false,
            output_dir: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Written {
        path: PathBuf,
        size: u64,
        sha256: String,
    },
    /// The operator declined a confirmation or selected nothing.
    Cancelled,
}

const ARCHIVE_SUFFIX: &str = ".tar.zst";

/// `git-export-<YYYYMMDD-HHMMSS>.tar.zst`
pub fn archive_name(at: OffsetDateTime) -> String {
    format!(
        "git-export-{:04}{:02}{:02}-{:02}{:02}{:02}{ARCHIVE_SUFFIX}",
        at.year(),
        u8::from(at.month()),
        at.day(),
        at.hour(),
        at.minute(),
        at.second()
    )
}

/// First free archive path in `dir` for `at`. A name already taken (two
/// exports within the same second) gets a `-1`, `-2`, ... suffix.
pub fn unused_archive_path(dir: &Path, at: OffsetDateTime) -> PathBuf {
    let name = archive_name(at);
    let candidate = dir.join(&name);
    if !candidate.exists() {
        return candidate;
    }
    let stem = name.trim_end_matches(ARCHIVE_SUFFIX);
    let mut n = 1u32;
    loop {
        let candidate = dir.join(format!("{stem}-{n}{ARCHIVE_SUFFIX}"));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

/// Local wall-clock time, or UTC when the local offset cannot be determined.
pub fn now_local_or_utc() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

pub struct Exporter<'a> {
    repo: &'a dyn Repository,
    prompter: &'a dyn Prompter,
    narrator: &'a dyn Narrator,
}

impl<'a> Exporter<'a> {
    pub fn new(
        repo: &'a dyn Repository,
        prompter: &'a dyn Prompter,
        narrator: &'a dyn Narrator,
    ) -> Self {
        Self {
            repo,
            prompter,
            narrator,
        }
    }

    pub fn run(&self, options: &ExportOptions) -> Result<ExportOutcome> {
        if !self.repo.is_repository() {
            return Err(GitmvError::NotARepository(self.repo.workdir().to_path_buf()));
        }
        if !self.repo.has_commits() {
            return Err(GitmvError::NoCommits);
        }

        if !self.repo.working_tree_is_clean()? {
            self.narrator.notify(Notice::DirtyTree);
            if !options.auto && !self.prompter.confirm(&Question::ContinueWithDirtyTree, false)? {
                return Ok(self.cancel());
            }
        }

        let local = self.repo.local_branches()?;
        let current = self.repo.current_branch()?;
        let selected = self.select_branches(options, &local, &current)?;
        if selected.is_empty() {
            return Ok(self.cancel());
        }

        let snapshot = build_snapshot(
            self.repo,
            self.narrator,
            &selected,
            &current,
            OffsetDateTime::now_utc(),
        )?;

        self.narrator.notify(Notice::RepositorySummary {
            current_branch: snapshot.current_branch.clone(),
            branch_count: snapshot.branches.len(),
            tag_count: snapshot.tags.len(),
        });
        for name in &snapshot.branches {
            self.narrator.notify(Notice::BranchListing {
                name: name.clone(),
                short_hash: snapshot
                    .branch_info(name)
                    .map(|info| short_hash(&info.hash).to_string()),
                active: *name == snapshot.current_branch,
            });
        }
        if !options.auto && !self.prompter.confirm(&Question::ProceedWithExport, true)? {
            return Ok(self.cancel());
        }

        // Scratch is removed when `scratch` drops, on every path out of here.
        let scratch = tempfile::Builder::new().prefix("gitmv-export-").tempdir()?;
        let bundle_path = scratch.path().join(BUNDLE_ENTRY);
        let metadata_path = scratch.path().join(METADATA_ENTRY);

        let refs = if selected.len() == local.len() {
            RefSpec::All
        } else {
            RefSpec::Refs(selected.clone())
        };
        debug!(?refs, bundle = %bundle_path.display(), "creating bundle");
        self.repo.create_bundle(&bundle_path, &refs)?;
        if !self.repo.verify_bundle(&bundle_path) {
            return Err(GitmvError::CorruptBundle(bundle_path));
        }
        self.narrator.notify(Notice::BundleVerified);
        self.narrator.notify(Notice::BundleCreated {
            size: fs::metadata(&bundle_path)?.len(),
        });

        fs::write(&metadata_path, snapshot.to_json_pretty()?)?;

        let archive_path = unused_archive_path(&options.output_dir, now_local_or_utc());
        let size = archive::pack(
            &[
                (BUNDLE_ENTRY, bundle_path.as_path()),
                (METADATA_ENTRY, metadata_path.as_path()),
            ],
            &archive_path,
        )?;
        let sha256 = gitmv_store::sha256_file(&archive_path)?;

        self.narrator.notify(Notice::ExportComplete {
            path: archive_path.clone(),
            size,
            sha256: sha256.clone(),
        });
        Ok(ExportOutcome::Written {
            path: archive_path,
            size,
            sha256,
        })
    }

    fn select_branches(
        &self,
        options: &ExportOptions,
        local: &[String],
        current: &str,
    ) -> Result<Vec<String>> {
        if let Some(branch) = &options.branch {
            if !local.iter().any(|b| b == branch) {
                return Err(GitmvError::BranchNotFound(branch.clone()));
            }
            return Ok(vec![branch.clone()]);
        }
        if options.all_branches || options.auto {
            return Ok(local.to_vec());
        }
        self.prompter.multi_select(
            &Question::SelectExportBranches,
            local,
            &[current.to_string()],
        )
    }

    fn cancel(&self) -> ExportOutcome {
        self.narrator.notify(Notice::ExportCancelled);
        ExportOutcome::Cancelled
    }
}
