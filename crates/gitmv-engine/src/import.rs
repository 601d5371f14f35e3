//! Import: reconcile the branches of an archive into the repository at hand.
//!
//! A run moves through fixed steps: mode selection, leftover recovery,
//! unpack and verify, remote registration, branch selection, optional
//! mapping, then one branch at a time through create or merge. A conflict
//! halts the run and leaves the scratch directory and temporary remote in
//! place so the operator can resolve and re-run; every other exit cleans
//! them up.

use gitmv_core::snapshot::{BUNDLE_ENTRY, METADATA_ENTRY};
use gitmv_core::{
    BranchOutcome, BranchStatus, Choice, GitmvError, MergeOptions, MergeStatus, Mode, Narrator,
    Notice, Prompter, Question, Repository, Result, Snapshot,
};
use gitmv_store::{archive, DestinationLock, ImportPaths};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Name of the remote registered for the bundle during a run.
pub const TEMP_REMOTE: &str = "git-import-temp";

/// Remote consulted for the optional push step.
pub const PUSH_REMOTE: &str = "origin";

#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Create branches directly from the bundle, never merging.
    pub force_init: bool,
    /// No prompts; defaults are taken and nothing is pushed.
    pub auto: bool,
    pub dry_run: bool,
    /// Only these snapshot branches.
    pub branch_filter: Option<Vec<String>>,
    pub allow_unrelated_histories: bool,
}

/// Result of one import run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub mode: Mode,
    pub dry_run: bool,
    pub outcomes: Vec<BranchOutcome>,
    /// Stopped on a conflict; later branches were not processed.
    pub halted: bool,
    /// Branches whose push to `origin` failed.
    pub push_failures: Vec<String>,
}

impl RunSummary {
    fn new(mode: Mode, dry_run: bool) -> Self {
        Self {
            mode,
            dry_run,
            outcomes: Vec::new(),
            halted: false,
            push_failures: Vec::new(),
        }
    }

    pub fn count(&self, status: BranchStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }

    /// The outcome that halted the run, if any.
    pub fn conflict(&self) -> Option<&BranchOutcome> {
        self.outcomes
            .iter()
            .find(|o| o.status == BranchStatus::Conflict)
    }

    pub fn outcome(&self, branch: &str) -> Option<&BranchOutcome> {
        self.outcomes.iter().find(|o| o.branch == branch)
    }

    /// Turn a halted run into `GitmvError::MergeConflict`.
    pub fn into_result(self) -> Result<Self> {
        if self.halted {
            if let Some(c) = self.conflict() {
                return Err(GitmvError::MergeConflict {
                    branch: c.branch.clone(),
                    paths: c.conflicted_paths.clone(),
                });
            }
        }
        Ok(self)
    }
}

/// One selected branch after mapping. `target` is `None` when skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Planned {
    source: String,
    target: Option<String>,
    /// Target was named fresh by the operator; create it without asking.
    fresh: bool,
}

impl Planned {
    fn identity(source: &str) -> Self {
        Self {
            source: source.to_string(),
            target: Some(source.to_string()),
            fresh: false,
        }
    }
}

pub struct Importer<'a> {
    repo: &'a dyn Repository,
    prompter: &'a dyn Prompter,
    narrator: &'a dyn Narrator,
}

impl<'a> Importer<'a> {
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

    pub fn run(&self, archive_path: &Path, options: &ImportOptions) -> Result<RunSummary> {
        if options.dry_run {
            self.narrator.notify(Notice::DryRun);
        }
        if !archive_path.exists() {
            return Err(GitmvError::ArchiveNotFound(archive_path.to_path_buf()));
        }
        if !self.repo.is_repository() {
            return Err(GitmvError::NotARepository(self.repo.workdir().to_path_buf()));
        }

        let paths = ImportPaths::discover(self.repo.git_dir()?);
        let _lock = DestinationLock::acquire(&paths)?;

        let mode = self.select_mode(options)?;
        self.recover_leftovers(&paths, options.dry_run)?;

        if mode == Mode::Sync && !self.repo.working_tree_is_clean()? {
            return Err(GitmvError::UncommittedChanges);
        }
        if self.repo.has_commits() {
            self.narrator
                .notify(Notice::CurrentBranch(self.repo.current_branch()?));
        }

        let result = self.reconcile(archive_path, &paths, mode, options);
        match &result {
            Ok(summary) if summary.halted => {
                info!(scratch = %paths.scratch_dir.display(), "halted on conflict; keeping scratch state");
            }
            Ok(summary) => {
                self.cleanup(&paths, options.dry_run);
                self.narrator.notify(Notice::CleanedUp);
                if !summary.outcomes.is_empty() {
                    self.narrator.notify(if summary.dry_run {
                        Notice::DryRunComplete
                    } else {
                        Notice::ImportComplete {
                            merged: summary.count(BranchStatus::Merged),
                            created: summary.count(BranchStatus::Created),
                        }
                    });
                }
            }
            Err(e) => {
                debug!(error = %e, "import failed; cleaning up");
                self.cleanup(&paths, options.dry_run);
            }
        }
        result
    }

    fn select_mode(&self, options: &ImportOptions) -> Result<Mode> {
        let mode = if options.force_init {
            Mode::Init
        } else if !self.repo.has_commits() {
            self.narrator.notify(Notice::EmptyRepository);
            if options.auto || self.prompter.confirm(&Question::UseInitMode, true)? {
                Mode::Init
            } else {
                Mode::Sync
            }
        } else {
            Mode::Sync
        };
        self.narrator.notify(Notice::ModeSelected(mode));
        Ok(mode)
    }

    /// Remove scratch state an earlier aborted or conflicted run left behind.
    /// Remote configuration is left alone under dry-run.
    fn recover_leftovers(&self, paths: &ImportPaths, dry_run: bool) -> Result<()> {
        if paths.has_leftovers() {
            debug!(scratch = %paths.scratch_dir.display(), "removing leftover scratch directory");
            gitmv_store::remove_dir_if_exists(&paths.scratch_dir)?;
        }
        if !dry_run {
            self.repo.remove_remote(TEMP_REMOTE);
        }
        Ok(())
    }

    fn cleanup(&self, paths: &ImportPaths, dry_run: bool) {
        if let Err(e) = gitmv_store::remove_dir_if_exists(&paths.scratch_dir) {
            warn!(scratch = %paths.scratch_dir.display(), error = %e, "could not remove scratch directory");
        }
        if !dry_run {
            self.repo.remove_remote(TEMP_REMOTE);
        }
    }

    fn reconcile(
        &self,
        archive_path: &Path,
        paths: &ImportPaths,
        mode: Mode,
        options: &ImportOptions,
    ) -> Result<RunSummary> {
        let sha256 = gitmv_store::sha256_file(archive_path)?;
        self.narrator.notify(Notice::ArchiveDigest { sha256 });

        let entries = archive::unpack(
            archive_path,
            &paths.scratch_dir,
            &[BUNDLE_ENTRY, METADATA_ENTRY],
        )?;
        debug!(?entries, "archive unpacked");
        if !paths.metadata_path.is_file() {
            return Err(GitmvError::invalid_archive(METADATA_ENTRY));
        }
        if !paths.bundle_path.is_file() {
            return Err(GitmvError::invalid_archive(BUNDLE_ENTRY));
        }

        let snapshot = Snapshot::from_json(&fs::read(&paths.metadata_path)?)?;
        self.narrator.notify(Notice::SnapshotSummary {
            export_date: snapshot.export_date.clone(),
            original_branch: snapshot.current_branch.clone(),
            branch_count: snapshot.branches.len(),
            tag_count: snapshot.tags.len(),
        });

        if !self.repo.verify_bundle(&paths.bundle_path) {
            return Err(GitmvError::CorruptBundle(paths.bundle_path.clone()));
        }
        self.narrator.notify(Notice::BundleVerified);

        if !options.dry_run {
            let locator = paths.bundle_path.to_string_lossy();
            self.repo.add_remote(TEMP_REMOTE, &locator)?;
            self.narrator
                .notify(Notice::RemoteRegistered(TEMP_REMOTE.to_string()));
            self.repo.fetch(TEMP_REMOTE)?;
            self.narrator.notify(Notice::Fetched);
        }

        let mut summary = RunSummary::new(mode, options.dry_run);
        let selected = self.select_branches(&snapshot, options)?;
        if selected.is_empty() {
            self.narrator.notify(Notice::NoBranchesSelected);
            return Ok(summary);
        }
        self.narrator
            .notify(Notice::BranchesToProcess(selected.clone()));

        for planned in self.plan(&selected, mode, options)? {
            let Some(target) = planned.target.as_deref() else {
                self.narrator.notify(Notice::Skipped(planned.source.clone()));
                summary.outcomes.push(BranchOutcome::new(
                    &planned.source,
                    &planned.source,
                    BranchStatus::Skipped,
                ));
                continue;
            };
            let outcome = self.process_branch(&snapshot, &planned, target, mode, options)?;
            let halt = outcome.status == BranchStatus::Conflict;
            summary.outcomes.push(outcome);
            if halt {
                summary.halted = true;
                break;
            }
        }

        self.narrator.notify(Notice::Summary(summary.outcomes.clone()));
        if !summary.halted && !options.dry_run {
            self.offer_push(&mut summary, options)?;
        }
        Ok(summary)
    }

    fn select_branches(&self, snapshot: &Snapshot, options: &ImportOptions) -> Result<Vec<String>> {
        if let Some(filter) = &options.branch_filter {
            let unknown: Vec<String> = filter
                .iter()
                .filter(|b| !snapshot.includes(b))
                .cloned()
                .collect();
            if !unknown.is_empty() {
                self.narrator.notify(Notice::UnknownBranches(unknown));
            }
            return Ok(snapshot
                .branches
                .iter()
                .filter(|b| filter.contains(b))
                .cloned()
                .collect());
        }
        if options.auto {
            return Ok(snapshot.branches.clone());
        }
        self.prompter.multi_select(
            &Question::SelectImportBranches,
            &snapshot.branches,
            &[snapshot.current_branch.clone()],
        )
    }

    /// Resolve source → destination names before any branch is touched.
    fn plan(&self, selected: &[String], mode: Mode, options: &ImportOptions) -> Result<Vec<Planned>> {
        let identity = || -> Vec<Planned> { selected.iter().map(|b| Planned::identity(b)).collect() };
        if mode != Mode::Sync || options.auto {
            return Ok(identity());
        }
        if !self.prompter.confirm(&Question::CustomizeMapping, false)? {
            return Ok(identity());
        }

        let local = self.repo.local_branches()?;
        let mut plan: Vec<Planned> = Vec::with_capacity(selected.len());
        for source in selected {
            // A destination name receives at most one source branch.
            let claimed: Vec<&str> = plan.iter().filter_map(|p| p.target.as_deref()).collect();
            let existing: Vec<Choice> = local
                .iter()
                .filter(|b| !claimed.contains(&b.as_str()))
                .cloned()
                .map(Choice::Branch)
                .collect();

            let mut choices = Vec::new();
            if !claimed.contains(&source.as_str()) {
                choices.push(Choice::KeepName);
            }
            if !existing.is_empty() {
                choices.push(Choice::MapToExisting);
            }
            choices.push(Choice::MapToNew);
            choices.push(Choice::Skip);

            let question = Question::MapBranch {
                source: source.clone(),
            };
            let planned = match pick(&choices, self.prompter.select(&question, &choices)?)? {
                Choice::KeepName => Planned::identity(source),
                Choice::MapToExisting => {
                    let question = Question::ChooseExistingTarget {
                        source: source.clone(),
                    };
                    let target = match pick(&existing, self.prompter.select(&question, &existing)?)? {
                        Choice::Branch(name) => name.clone(),
                        _ => source.clone(),
                    };
                    Planned {
                        source: source.clone(),
                        target: Some(target),
                        fresh: false,
                    }
                }
                Choice::MapToNew => Planned {
                    source: source.clone(),
                    target: Some(self.ask_new_name(source, &local, &claimed)?),
                    fresh: true,
                },
                _ => Planned {
                    source: source.clone(),
                    target: None,
                    fresh: false,
                },
            };
            debug!(source = %planned.source, target = ?planned.target, "branch mapped");
            plan.push(planned);
        }
        Ok(plan)
    }

    /// Ask until the operator names a branch that neither exists locally nor
    /// was given to an earlier source in this plan.
    fn ask_new_name(&self, source: &str, local: &[String], claimed: &[&str]) -> Result<String> {
        let question = Question::NewBranchName {
            source: source.to_string(),
        };
        loop {
            let answer = self.prompter.text(&question)?;
            let name = answer.trim();
            let taken = local.iter().any(|b| b == name) || claimed.contains(&name);
            if !name.is_empty() && !taken {
                return Ok(name.to_string());
            }
        }
    }

    fn process_branch(
        &self,
        snapshot: &Snapshot,
        planned: &Planned,
        target: &str,
        mode: Mode,
        options: &ImportOptions,
    ) -> Result<BranchOutcome> {
        let source = planned.source.as_str();
        self.narrator.notify(Notice::BranchStart {
            source: source.to_string(),
            target: target.to_string(),
        });
        if let Some(info) = snapshot.branch_info(source) {
            self.narrator.notify(Notice::CommitDetails {
                short_hash: info.short_hash().to_string(),
                message: info.message.clone(),
                author: info.author.clone(),
            });
        }

        let remote_ref = format!("{TEMP_REMOTE}/{source}");
        if mode == Mode::Init {
            return self.create_branch(source, target, &remote_ref, options.dry_run);
        }

        let exists = self.repo.local_branches()?.iter().any(|b| b == target);
        if !exists {
            let create = if options.auto || planned.fresh {
                true
            } else {
                let choices = [Choice::CreateAndCheckout, Choice::Skip];
                let question = Question::MissingLocalBranch {
                    branch: target.to_string(),
                };
                matches!(
                    pick(&choices, self.prompter.select(&question, &choices)?)?,
                    Choice::CreateAndCheckout
                )
            };
            if !create {
                return Ok(self.skip(source, target));
            }
            return self.create_branch(source, target, &remote_ref, options.dry_run);
        }

        if !options.auto && !options.dry_run {
            let question = Question::ConfirmMerge {
                remote_ref: remote_ref.clone(),
                branch: target.to_string(),
            };
            if !self.prompter.confirm(&question, true)? {
                return Ok(self.skip(source, target));
            }
        }

        if self.repo.current_branch()? != target {
            if options.dry_run {
                self.narrator.notify(Notice::WouldCheckout(target.to_string()));
            } else {
                self.repo.checkout_existing(target)?;
            }
        }

        if options.dry_run {
            self.narrator.notify(Notice::WouldMerge {
                remote_ref,
                branch: target.to_string(),
            });
            return Ok(BranchOutcome::new(source, target, BranchStatus::Simulated));
        }

        self.merge(source, target, &remote_ref, options)
    }

    fn create_branch(
        &self,
        source: &str,
        target: &str,
        remote_ref: &str,
        dry_run: bool,
    ) -> Result<BranchOutcome> {
        if dry_run {
            self.narrator.notify(Notice::WouldCreate(target.to_string()));
            return Ok(BranchOutcome::new(source, target, BranchStatus::Simulated));
        }
        self.repo.checkout_new_branch(target, remote_ref)?;
        self.narrator.notify(Notice::BranchCreated(target.to_string()));
        Ok(BranchOutcome::new(source, target, BranchStatus::Created))
    }

    fn merge(
        &self,
        source: &str,
        target: &str,
        remote_ref: &str,
        options: &ImportOptions,
    ) -> Result<BranchOutcome> {
        let mut merge_options = MergeOptions {
            commit_message: Some(format!("Merge external changes from {source}")),
            no_fast_forward: true,
            allow_unrelated_histories: options.allow_unrelated_histories,
        };
        let mut status = self.repo.merge_branch(remote_ref, &merge_options)?;

        if let MergeStatus::UnrelatedHistories { detail } = &status {
            debug!(branch = %target, detail = %detail, "merge refused: unrelated histories");
            self.narrator
                .notify(Notice::UnrelatedHistories(target.to_string()));
            if merge_options.allow_unrelated_histories {
                return Err(GitmvError::adapter(format!("merge {remote_ref}"), detail.clone()));
            }
            let question = Question::RetryUnrelated {
                branch: target.to_string(),
            };
            // Auto mode takes the prompt's default and retries.
            if !options.auto && !self.prompter.confirm(&question, true)? {
                return Ok(self.skip(source, target));
            }
            merge_options.allow_unrelated_histories = true;
            status = self.repo.merge_branch(remote_ref, &merge_options)?;
        }

        match status {
            MergeStatus::Clean => {
                self.narrator.notify(Notice::Merged(target.to_string()));
                Ok(BranchOutcome::new(source, target, BranchStatus::Merged))
            }
            MergeStatus::Conflicted { paths, detail } => {
                debug!(branch = %target, detail = %detail, "merge stopped with conflicts");
                self.narrator.notify(Notice::Conflict {
                    branch: target.to_string(),
                    paths: paths.clone(),
                });
                self.narrator.notify(Notice::ResolveInstructions);
                Ok(BranchOutcome::conflict(source, target, paths))
            }
            MergeStatus::UnrelatedHistories { detail } => {
                Err(GitmvError::adapter(format!("merge {remote_ref}"), detail))
            }
        }
    }

    fn skip(&self, source: &str, target: &str) -> BranchOutcome {
        self.narrator.notify(Notice::Skipped(target.to_string()));
        BranchOutcome::new(source, target, BranchStatus::Skipped)
    }

    /// Offer to push created and merged branches to `origin`. Never pushes
    /// in auto mode. A failed push is recorded and the rest continue.
    fn offer_push(&self, summary: &mut RunSummary, options: &ImportOptions) -> Result<()> {
        let pushable: Vec<String> = summary
            .outcomes
            .iter()
            .filter(|o| o.status.is_pushable())
            .map(|o| o.branch.clone())
            .collect();
        if pushable.is_empty() {
            return Ok(());
        }
        let Some(url) = self.repo.remote_url(PUSH_REMOTE) else {
            self.narrator.notify(Notice::NoOriginRemote);
            return Ok(());
        };
        self.narrator.notify(Notice::RemoteUrl(url.clone()));

        if options.auto || !self.prompter.confirm(&Question::PushToRemote { url }, false)? {
            self.narrator.notify(Notice::PushDeclined);
            return Ok(());
        }

        for branch in pushable {
            if let Err(e) = self.repo.push(PUSH_REMOTE, &branch) {
                warn!(branch = %branch, error = %e, "push failed");
                self.narrator.notify(Notice::PushFailed {
                    branch: branch.clone(),
                    detail: e.to_string(),
                });
                summary.push_failures.push(branch);
            }
        }
        if summary.push_failures.is_empty() {
            self.narrator.notify(Notice::Pushed);
        }
        Ok(())
    }
}

fn pick(choices: &[Choice], index: usize) -> Result<&Choice> {
    choices.get(index).ok_or_else(|| {
        GitmvError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("selection {index} out of range"),
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::{ExportOptions, ExportOutcome, Exporter};
    use crate::fake::FakeRepository;
    use gitmv_core::narrate::{CollectNarrator, SilentNarrator};
    use gitmv_core::prompt::{Answer, ScriptedPrompter};
    use std::path::PathBuf;

    fn export(src: &FakeRepository, out: &Path) -> PathBuf {
        let options = ExportOptions {
            auto: true,
            output_dir: out.to_path_buf(),
            ..ExportOptions::default()
        };
        match Exporter::new(src, &ScriptedPrompter::default(), &SilentNarrator)
            .run(&options)
            .unwrap()
        {
            ExportOutcome::Written { path, .. } => path,
            ExportOutcome::Cancelled => panic!("export cancelled"),
        }
    }

    fn auto() -> ImportOptions {
        ImportOptions {
            auto: true,
            ..ImportOptions::default()
        }
    }

    fn filtered(names: &[&str]) -> ImportOptions {
        ImportOptions {
            branch_filter: Some(names.iter().map(|n| n.to_string()).collect()),
            ..ImportOptions::default()
        }
    }

    /// `main` (base) and `feature-x` (base + feature), `main` checked out.
    fn source(dir: &Path) -> FakeRepository {
        let repo = FakeRepository::new(dir).unwrap();
        repo.commit("base");
        repo.tag("v1");
        repo.branch("feature-x");
        repo.commit("feature");
        repo.switch("main");
        repo
    }

    /// Destination populated from `src` by an auto init import.
    fn seeded(src: &FakeRepository, dir: &Path) -> FakeRepository {
        let out = tempfile::tempdir().unwrap();
        let dst = FakeRepository::new(dir).unwrap();
        let archive = export(src, out.path());
        Importer::new(&dst, &ScriptedPrompter::default(), &SilentNarrator)
            .run(&archive, &auto())
            .unwrap();
        dst.switch("main");
        dst
    }

    fn scratch(dst: &FakeRepository) -> PathBuf {
        ImportPaths::discover(dst.git_dir().unwrap()).scratch_dir
    }

    #[test]
    fn init_mode_recreates_every_branch() {
        let (s, d, o) = (tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap());
        let src = source(s.path());
        let dst = FakeRepository::new(d.path()).unwrap();
        let archive = export(&src, o.path());
        let narrator = CollectNarrator::new();

        let summary = Importer::new(&dst, &ScriptedPrompter::default(), &narrator)
            .run(&archive, &auto())
            .unwrap();

        assert_eq!(summary.mode, Mode::Init);
        assert!(!summary.halted);
        assert_eq!(summary.count(BranchStatus::Created), 2);
        for branch in ["main", "feature-x"] {
            assert_eq!(dst.tip(branch), src.tip(branch), "tip of {branch}");
        }
        assert!(dst.remotes().is_empty());
        assert!(!scratch(&dst).exists());
        assert!(narrator.contains(&Notice::EmptyRepository));
        assert!(narrator.contains(&Notice::NoOriginRemote));
        assert!(narrator.contains(&Notice::ImportComplete {
            merged: 0,
            created: 2
        }));
    }

    #[test]
    fn empty_destination_asks_for_init_and_defaults_to_original_branch() {
        let (s, d, o) = (tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap());
        let src = source(s.path());
        let dst = FakeRepository::new(d.path()).unwrap();
        let archive = export(&src, o.path());
        let prompter = ScriptedPrompter::default();

        let summary = Importer::new(&dst, &prompter, &SilentNarrator)
            .run(&archive, &ImportOptions::default())
            .unwrap();

        assert_eq!(
            prompter.asked(),
            vec![Question::UseInitMode, Question::SelectImportBranches]
        );
        assert_eq!(summary.outcomes.len(), 1);
        assert_eq!(summary.outcome("main").unwrap().status, BranchStatus::Created);
        assert!(dst.tip("feature-x").is_none());
    }

    #[test]
    fn sync_creates_filtered_branch_and_leaves_main_untouched() {
        let (s, d, o) = (tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap());
        let src = FakeRepository::new(s.path()).unwrap();
        src.commit("base");
        let dst = seeded(&src, d.path());
        let dst_main = dst.tip("main");

        for i in 0..3 {
            src.commit(&format!("upstream {i}"));
        }
        src.branch("feature-x");
        src.commit("feature");
        src.switch("main");
        let archive = export(&src, o.path());

        let prompter = ScriptedPrompter::default();
        let summary = Importer::new(&dst, &prompter, &SilentNarrator)
            .run(&archive, &filtered(&["feature-x"]))
            .unwrap();

        assert_eq!(summary.mode, Mode::Sync);
        assert_eq!(summary.outcomes.len(), 1);
        assert_eq!(
            summary.outcome("feature-x").unwrap().status,
            BranchStatus::Created
        );
        assert_eq!(dst.tip("feature-x"), src.tip("feature-x"));
        assert_eq!(dst.tip("main"), dst_main);
        assert_eq!(
            prompter.asked(),
            vec![
                Question::CustomizeMapping,
                Question::MissingLocalBranch {
                    branch: "feature-x".into()
                },
            ]
        );
    }

    #[test]
    fn sync_merges_then_pushes_and_reports_failed_pushes() {
        let (s, d, o) = (tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap());
        let src = source(s.path());
        let dst = seeded(&src, d.path());
        dst.add_remote("origin", "https://git.example.com/repo.git").unwrap();
        dst.fail_push("feature-x");

        src.switch("feature-x");
        src.commit("more feature");
        src.switch("main");
        src.commit("more main");
        let archive = export(&src, o.path());

        let prompter = ScriptedPrompter::new(vec![
            Answer::No,  // customize mapping
            Answer::Yes, // merge feature-x
            Answer::Yes, // merge main
            Answer::Yes, // push
        ]);
        let narrator = CollectNarrator::new();
        let summary = Importer::new(&dst, &prompter, &narrator)
            .run(&archive, &filtered(&["main", "feature-x"]))
            .unwrap();

        assert_eq!(summary.count(BranchStatus::Merged), 2);
        let merged_main = dst.tip("main").unwrap();
        assert_eq!(dst.parents(&merged_main)[1], src.tip("main").unwrap());
        assert_eq!(
            dst.pushed(),
            vec![("origin".to_string(), "main".to_string())]
        );
        assert_eq!(summary.push_failures, vec!["feature-x".to_string()]);
        assert!(!narrator.contains(&Notice::Pushed));
        assert!(narrator
            .notices()
            .iter()
            .any(|n| matches!(n, Notice::PushFailed { branch, .. } if branch == "feature-x")));
        assert!(matches!(
            prompter.asked().last(),
            Some(Question::PushToRemote { url }) if url == "https://git.example.com/repo.git"
        ));
    }

    #[test]
    fn auto_mode_never_pushes() {
        let (s, d, o) = (tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap());
        let src = source(s.path());
        let dst = seeded(&src, d.path());
        dst.add_remote("origin", "https://git.example.com/repo.git").unwrap();
        src.commit("more main");
        let archive = export(&src, o.path());

        let narrator = CollectNarrator::new();
        let summary = Importer::new(&dst, &ScriptedPrompter::default(), &narrator)
            .run(&archive, &auto())
            .unwrap();
        assert_eq!(summary.count(BranchStatus::Merged), 2);
        assert!(dst.pushed().is_empty());
        assert!(narrator.contains(&Notice::PushDeclined));
    }

    #[test]
    fn conflict_halts_keeps_scratch_and_retry_succeeds() {
        let (s, d, o) = (tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap());
        let src = source(s.path());
        let dst = seeded(&src, d.path());
        dst.switch("feature-x");
        dst.commit("local feature edit");
        dst.switch("main");
        src.switch("feature-x");
        src.commit("remote feature edit");
        src.switch("main");
        src.commit("remote main edit");
        let archive = export(&src, o.path());
        dst.script_conflict("git-import-temp/feature-x", &["src/lib.rs"]);

        let narrator = CollectNarrator::new();
        let summary = Importer::new(&dst, &ScriptedPrompter::default(), &narrator)
            .run(&archive, &auto())
            .unwrap();

        assert!(summary.halted);
        // feature-x sorts first; main is never reached
        assert_eq!(summary.outcomes.len(), 1);
        let conflict = summary.conflict().unwrap();
        assert_eq!(conflict.branch, "feature-x");
        assert_eq!(conflict.conflicted_paths, vec!["src/lib.rs".to_string()]);
        assert!(narrator.contains(&Notice::ResolveInstructions));
        assert!(!narrator.contains(&Notice::CleanedUp));
        assert!(scratch(&dst).exists());
        assert_eq!(dst.remotes(), vec![TEMP_REMOTE.to_string()]);
        let paths = ImportPaths::discover(dst.git_dir().unwrap());
        drop(DestinationLock::acquire(&paths).unwrap());
        assert!(matches!(
            summary.clone().into_result(),
            Err(GitmvError::MergeConflict { branch, .. }) if branch == "feature-x"
        ));

        dst.commit_resolution().unwrap();
        let retry = Importer::new(&dst, &ScriptedPrompter::default(), &SilentNarrator)
            .run(&archive, &auto())
            .unwrap();
        assert!(!retry.halted);
        assert_eq!(retry.count(BranchStatus::Merged), 2);
        assert!(!scratch(&dst).exists());
        assert!(dst.remotes().is_empty());
    }

    #[test]
    fn dry_run_changes_nothing() {
        let (s, d, o) = (tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap());
        let src = source(s.path());
        let dst = seeded(&src, d.path());
        dst.switch("feature-x");
        src.commit("more main");
        let archive = export(&src, o.path());

        let before = (dst.mutations(), dst.tip("main"), dst.tip("feature-x"), dst.head());
        let options = ImportOptions {
            dry_run: true,
            ..auto()
        };
        let narrator = CollectNarrator::new();
        let summary = Importer::new(&dst, &ScriptedPrompter::default(), &narrator)
            .run(&archive, &options)
            .unwrap();

        assert_eq!(summary.count(BranchStatus::Simulated), 2);
        assert_eq!(
            before,
            (dst.mutations(), dst.tip("main"), dst.tip("feature-x"), dst.head())
        );
        assert!(narrator.contains(&Notice::WouldCheckout("main".into())));
        assert!(narrator.contains(&Notice::DryRunComplete));
        assert!(!narrator.contains(&Notice::Fetched));
        assert!(!scratch(&dst).exists());
    }

    #[test]
    fn dry_run_init_creates_nothing() {
        let (s, d, o) = (tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap());
        let src = source(s.path());
        let dst = FakeRepository::new(d.path()).unwrap();
        let archive = export(&src, o.path());
        let options = ImportOptions {
            dry_run: true,
            force_init: true,
            ..auto()
        };
        let summary = Importer::new(&dst, &ScriptedPrompter::default(), &SilentNarrator)
            .run(&archive, &options)
            .unwrap();
        assert_eq!(summary.count(BranchStatus::Simulated), 2);
        assert!(dst.local_branches().unwrap().is_empty());
        assert!(dst.mutations().is_empty());
    }

    #[test]
    fn empty_selection_is_a_clean_exit() {
        let (s, d, o) = (tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap());
        let src = source(s.path());
        let dst = seeded(&src, d.path());
        let tips = (dst.tip("main"), dst.tip("feature-x"));
        let archive = export(&src, o.path());

        let narrator = CollectNarrator::new();
        let prompter = ScriptedPrompter::new(vec![Answer::Names(vec![])]);
        let summary = Importer::new(&dst, &prompter, &narrator)
            .run(&archive, &ImportOptions::default())
            .unwrap();

        assert!(summary.outcomes.is_empty());
        assert!(narrator.contains(&Notice::NoBranchesSelected));
        assert_eq!(tips, (dst.tip("main"), dst.tip("feature-x")));
        assert!(dst.remotes().is_empty());
        assert!(!scratch(&dst).exists());
    }

    #[test]
    fn unknown_filter_names_are_reported() {
        let (s, d, o) = (tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap());
        let src = source(s.path());
        let dst = FakeRepository::new(d.path()).unwrap();
        let archive = export(&src, o.path());
        let narrator = CollectNarrator::new();
        let options = ImportOptions {
            force_init: true,
            ..filtered(&["main", "nope"])
        };
        let summary = Importer::new(&dst, &ScriptedPrompter::default(), &narrator)
            .run(&archive, &options)
            .unwrap();
        assert_eq!(summary.outcomes.len(), 1);
        assert!(narrator.contains(&Notice::UnknownBranches(vec!["nope".into()])));
    }

    #[test]
    fn unrelated_histories_retry_after_confirmation() {
        let (s, d, o) = (tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap());
        let src = FakeRepository::new(s.path()).unwrap();
        src.commit("their root");
        let dst = FakeRepository::new(d.path()).unwrap();
        dst.commit("our root");
        let archive = export(&src, o.path());

        let prompter = ScriptedPrompter::new(vec![Answer::No, Answer::Yes, Answer::Yes]);
        let narrator = CollectNarrator::new();
        let summary = Importer::new(&dst, &prompter, &narrator)
            .run(&archive, &filtered(&["main"]))
            .unwrap();

        assert_eq!(summary.outcome("main").unwrap().status, BranchStatus::Merged);
        assert!(narrator.contains(&Notice::UnrelatedHistories("main".into())));
        assert_eq!(
            prompter.asked()[2],
            Question::RetryUnrelated {
                branch: "main".into()
            }
        );
        let tip = dst.tip("main").unwrap();
        assert_eq!(dst.parents(&tip)[1], src.tip("main").unwrap());
    }

    #[test]
    fn unrelated_histories_in_auto_mode_retry_once() {
        let (s, d, o) = (tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap());
        let src = FakeRepository::new(s.path()).unwrap();
        let theirs = src.commit("their root");
        let dst = FakeRepository::new(d.path()).unwrap();
        let ours = dst.commit("our root");
        let archive = export(&src, o.path());

        let narrator = CollectNarrator::new();
        let prompter = ScriptedPrompter::default();
        let summary = Importer::new(&dst, &prompter, &narrator)
            .run(&archive, &auto())
            .unwrap();
        assert_eq!(summary.outcome("main").unwrap().status, BranchStatus::Merged);
        assert!(narrator.contains(&Notice::UnrelatedHistories("main".into())));
        assert!(prompter.asked().is_empty());
        let tip = dst.tip("main").unwrap();
        assert_eq!(dst.parents(&tip), vec![ours, theirs]);
        assert!(summary.into_result().is_ok());
    }

    #[test]
    fn allowed_unrelated_histories_merge_without_refusal() {
        let (s, d, o) = (tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap());
        let src = FakeRepository::new(s.path()).unwrap();
        src.commit("their root");
        let dst = FakeRepository::new(d.path()).unwrap();
        dst.commit("our root");
        let archive = export(&src, o.path());

        let options = ImportOptions {
            allow_unrelated_histories: true,
            ..auto()
        };
        let narrator = CollectNarrator::new();
        let summary = Importer::new(&dst, &ScriptedPrompter::default(), &narrator)
            .run(&archive, &options)
            .unwrap();
        assert_eq!(summary.outcome("main").unwrap().status, BranchStatus::Merged);
        assert!(!narrator.contains(&Notice::UnrelatedHistories("main".into())));
    }

    #[test]
    fn mapping_never_sends_two_sources_to_one_branch() {
        let (s, d, o) = (tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap());
        let src = source(s.path());
        let dst = seeded(&src, d.path());
        let archive = export(&src, o.path());

        let prompter = ScriptedPrompter::new(vec![
            Answer::Yes,                          // customize mapping
            Answer::Pick(2),                      // feature-x: new name
            Answer::Text("imported".into()),      // accepted
            Answer::Pick(2),                      // main: new name
            Answer::Text("imported".into()),      // rejected: given to feature-x
            Answer::Text("imported-main".into()), // accepted
        ]);
        let summary = Importer::new(&dst, &prompter, &SilentNarrator)
            .run(&archive, &filtered(&["feature-x", "main"]))
            .unwrap();

        let from_feature = summary.outcome("imported").unwrap();
        assert_eq!(from_feature.source, "feature-x");
        assert_eq!(from_feature.status, BranchStatus::Created);
        let from_main = summary.outcome("imported-main").unwrap();
        assert_eq!(from_main.source, "main");
        assert_eq!(from_main.status, BranchStatus::Created);
        assert_eq!(dst.tip("imported"), src.tip("feature-x"));
        assert_eq!(dst.tip("imported-main"), src.tip("main"));
        assert!(dst.mutations().iter().all(|m| !m.starts_with("merge")));
    }

    #[test]
    fn claimed_branch_is_not_offered_again() {
        let (s, d, o) = (tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap());
        let src = source(s.path());
        let dst = seeded(&src, d.path());
        let archive = export(&src, o.path());

        let prompter = ScriptedPrompter::new(vec![
            Answer::Yes,     // customize mapping
            Answer::Pick(1), // feature-x: existing branch
            Answer::Pick(1), // -> main (of feature-x, main)
            // main: keep-name and `main` itself are gone, leaving
            // [existing (feature-x), new name, skip]
            Answer::Pick(2),
            Answer::Yes, // merge feature-x into main
        ]);
        let summary = Importer::new(&dst, &prompter, &SilentNarrator)
            .run(&archive, &filtered(&["feature-x", "main"]))
            .unwrap();

        let statuses: Vec<(&str, &str, BranchStatus)> = summary
            .outcomes
            .iter()
            .map(|o| (o.source.as_str(), o.branch.as_str(), o.status))
            .collect();
        assert_eq!(
            statuses,
            vec![
                ("feature-x", "main", BranchStatus::Merged),
                ("main", "main", BranchStatus::Skipped),
            ]
        );
        assert_eq!(
            prompter
                .asked()
                .iter()
                .filter(|q| matches!(q, Question::ConfirmMerge { .. }))
                .count(),
            1
        );
    }

    #[test]
    fn mapping_renames_and_redirects_branches() {
        let (s, d, o) = (tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap());
        let src = source(s.path());
        let dst = seeded(&src, d.path());
        dst.branch("dev");
        dst.switch("main");
        let archive = export(&src, o.path());

        let prompter = ScriptedPrompter::new(vec![
            Answer::Yes,                             // customize mapping
            Answer::Pick(2),                         // feature-x: new name
            Answer::Text("   ".into()),              // rejected: blank
            Answer::Text("main".into()),             // rejected: exists
            Answer::Text("imported-feature".into()), // accepted
            Answer::Pick(1),                         // main: existing branch
            Answer::Pick(0),                         // -> dev
            Answer::Yes,                             // merge into dev
        ]);
        let summary = Importer::new(&dst, &prompter, &SilentNarrator)
            .run(&archive, &filtered(&["feature-x", "main"]))
            .unwrap();

        let created = summary.outcome("imported-feature").unwrap();
        assert_eq!(created.source, "feature-x");
        assert_eq!(created.status, BranchStatus::Created);
        assert_eq!(dst.tip("imported-feature"), src.tip("feature-x"));

        let merged = summary.outcome("dev").unwrap();
        assert_eq!(merged.source, "main");
        assert_eq!(merged.status, BranchStatus::Merged);
        assert_eq!(dst.head(), "dev");
        // fresh names are created without asking again
        assert!(!prompter
            .asked()
            .iter()
            .any(|q| matches!(q, Question::MissingLocalBranch { .. })));
    }

    #[test]
    fn mapping_skip_records_outcome() {
        let (s, d, o) = (tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap());
        let src = source(s.path());
        let dst = seeded(&src, d.path());
        let archive = export(&src, o.path());

        let prompter = ScriptedPrompter::new(vec![Answer::Yes, Answer::Pick(3)]);
        let summary = Importer::new(&dst, &prompter, &SilentNarrator)
            .run(&archive, &filtered(&["main"]))
            .unwrap();
        assert_eq!(summary.outcome("main").unwrap().status, BranchStatus::Skipped);
        assert!(dst.mutations().iter().all(|m| !m.starts_with("merge")));
    }

    #[test]
    fn missing_local_branch_can_be_skipped() {
        let (s, d, o) = (tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap());
        let src = source(s.path());
        let dst = FakeRepository::new(d.path()).unwrap();
        dst.commit("unrelated local");
        let archive = export(&src, o.path());

        let prompter = ScriptedPrompter::new(vec![Answer::No, Answer::Pick(1)]);
        let summary = Importer::new(&dst, &prompter, &SilentNarrator)
            .run(&archive, &filtered(&["feature-x"]))
            .unwrap();
        assert_eq!(
            summary.outcome("feature-x").unwrap().status,
            BranchStatus::Skipped
        );
        assert!(dst.tip("feature-x").is_none());
    }

    #[test]
    fn fatal_errors_are_classified_and_clean_up() {
        let (s, d, o) = (tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap());
        let src = source(s.path());
        let archive = export(&src, o.path());
        let prompter = ScriptedPrompter::default();

        let missing = o.path().join("missing.tar.zst");
        let dst = FakeRepository::new(d.path()).unwrap();
        let err = Importer::new(&dst, &prompter, &SilentNarrator)
            .run(&missing, &auto())
            .unwrap_err();
        assert!(matches!(err, GitmvError::ArchiveNotFound(p) if p == missing));

        let plain = FakeRepository::not_a_repository(o.path());
        let err = Importer::new(&plain, &prompter, &SilentNarrator)
            .run(&archive, &auto())
            .unwrap_err();
        assert!(matches!(err, GitmvError::NotARepository(_)));

        dst.commit("local");
        dst.set_dirty(true);
        let err = Importer::new(&dst, &prompter, &SilentNarrator)
            .run(&archive, &auto())
            .unwrap_err();
        assert!(matches!(err, GitmvError::UncommittedChanges));
    }

    #[test]
    fn incomplete_or_corrupt_archives_are_rejected() {
        let (d, o) = (tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap());
        let dst = FakeRepository::new(d.path()).unwrap();
        let meta = o.path().join("metadata.json");
        fs::write(
            &meta,
            br#"{"exportDate":"2025-10-25T01:02:03Z","currentBranch":"main","branches":["main"],"tags":[],"repositoryPath":"/src"}"#,
        )
        .unwrap();
        let garbage = o.path().join("repository.bundle");
        fs::write(&garbage, b"not a bundle").unwrap();

        let only_meta = o.path().join("only-meta.tar.zst");
        archive::pack(&[(METADATA_ENTRY, meta.as_path())], &only_meta).unwrap();
        let err = Importer::new(&dst, &ScriptedPrompter::default(), &SilentNarrator)
            .run(&only_meta, &auto())
            .unwrap_err();
        assert!(matches!(err, GitmvError::InvalidArchive(e) if e == BUNDLE_ENTRY));
        assert!(!scratch(&dst).exists());

        let corrupt = o.path().join("corrupt.tar.zst");
        archive::pack(
            &[
                (BUNDLE_ENTRY, garbage.as_path()),
                (METADATA_ENTRY, meta.as_path()),
            ],
            &corrupt,
        )
        .unwrap();
        let err = Importer::new(&dst, &ScriptedPrompter::default(), &SilentNarrator)
            .run(&corrupt, &auto())
            .unwrap_err();
        assert!(matches!(err, GitmvError::CorruptBundle(_)));
        assert!(!scratch(&dst).exists());
        assert!(dst.remotes().is_empty());
    }

    #[test]
    fn concurrent_run_is_locked_out() {
        let (s, d, o) = (tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap());
        let src = source(s.path());
        let dst = FakeRepository::new(d.path()).unwrap();
        let archive = export(&src, o.path());
        let _held = DestinationLock::acquire(&ImportPaths::discover(dst.git_dir().unwrap())).unwrap();

        let err = Importer::new(&dst, &ScriptedPrompter::default(), &SilentNarrator)
            .run(&archive, &auto())
            .unwrap_err();
        assert!(matches!(err, GitmvError::Locked(_)));
        assert!(dst.local_branches().unwrap().is_empty());
    }

    #[test]
    fn leftovers_from_an_aborted_run_are_recovered() {
        let (s, d, o) = (tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap());
        let src = source(s.path());
        let dst = FakeRepository::new(d.path()).unwrap();
        let archive = export(&src, o.path());
        let stale = scratch(&dst);
        fs::create_dir_all(&stale).unwrap();
        fs::write(stale.join("repository.bundle"), b"stale").unwrap();
        dst.add_remote(TEMP_REMOTE, "/old/bundle").unwrap();

        let summary = Importer::new(&dst, &ScriptedPrompter::default(), &SilentNarrator)
            .run(&archive, &auto())
            .unwrap();
        assert_eq!(summary.count(BranchStatus::Created), 2);
        assert!(!stale.exists());
        assert!(dst.remotes().is_empty());
    }
}
