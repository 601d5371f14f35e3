//! In-memory [`Repository`] for exercising the engine without spawning git.
//!
//! Commits form a real parent graph, so merge-base questions (fast-forward,
//! up to date, unrelated histories) are answered the same way git would.
//! Conflicts are scripted per merged ref. Bundles are JSON files holding the
//! refs and every reachable commit.

use gitmv_core::adapter::UNRELATED_HISTORIES_MARKER;
use gitmv_core::{
    CommitInfo, GitmvError, MergeOptions, MergeStatus, RefSpec, Repository, Result,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

static NEXT_REPO: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FakeCommit {
    id: String,
    parents: Vec<String>,
    message: String,
    author: String,
    date: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct FakeBundle {
    refs: BTreeMap<String, String>,
    commits: Vec<FakeCommit>,
}

#[derive(Debug, Default)]
struct State {
    commits: HashMap<String, FakeCommit>,
    branches: BTreeMap<String, String>,
    head: String,
    tags: BTreeMap<String, String>,
    remotes: BTreeMap<String, String>,
    remote_refs: BTreeMap<String, String>,
    dirty: bool,
    conflicts: HashMap<String, Vec<String>>,
    pending_merge: Option<(String, String)>,
    failing_pushes: BTreeSet<String>,
    pushed: Vec<(String, String)>,
    mutations: Vec<String>,
    counter: u64,
}

/// Fake repository rooted at a real directory; only `.git/` is created on
/// disk so locks and scratch files behave as they do for a real checkout.
pub struct FakeRepository {
    workdir: PathBuf,
    git_dir: PathBuf,
    is_repository: bool,
    seed: u64,
    state: Mutex<State>,
}

impl FakeRepository {
    /// Empty repository (no commits) with `main` as the unborn branch.
    pub fn new(workdir: &Path) -> Result<Self> {
        let git_dir = workdir.join(".git");
        std::fs::create_dir_all(&git_dir)?;
        Ok(Self {
            workdir: workdir.to_path_buf(),
            git_dir,
            is_repository: true,
            seed: NEXT_REPO.fetch_add(1, Ordering::Relaxed),
            state: Mutex::new(State {
                head: "main".into(),
                ..State::default()
            }),
        })
    }

    /// A directory that is not a repository.
    pub fn not_a_repository(workdir: &Path) -> Self {
        Self {
            workdir: workdir.to_path_buf(),
            git_dir: workdir.join(".git"),
            is_repository: false,
            seed: NEXT_REPO.fetch_add(1, Ordering::Relaxed),
            state: Mutex::new(State::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Commit on the checked-out branch. Returns the new commit id.
    pub fn commit(&self, message: &str) -> String {
        let mut st = self.state();
        let head = st.head.clone();
        let parents: Vec<String> = st.branches.get(&head).cloned().into_iter().collect();
        let id = self.new_commit(&mut st, parents, message);
        st.branches.insert(head, id.clone());
        id
    }

    /// Root commit on `branch` sharing no history with anything else.
    /// The branch is created if needed; HEAD does not move.
    pub fn orphan_commit(&self, branch: &str, message: &str) -> String {
        let mut st = self.state();
        let id = self.new_commit(&mut st, Vec::new(), message);
        st.branches.insert(branch.to_string(), id.clone());
        id
    }

    /// Create `name` at the current tip and check it out.
    pub fn branch(&self, name: &str) {
        let mut st = self.state();
        if let Some(tip) = st.branches.get(&st.head).cloned() {
            st.branches.insert(name.to_string(), tip);
        }
        st.head = name.to_string();
    }

    pub fn switch(&self, name: &str) {
        self.state().head = name.to_string();
    }

    /// Lightweight tag at the current tip.
    pub fn tag(&self, name: &str) {
        let mut st = self.state();
        if let Some(tip) = st.branches.get(&st.head).cloned() {
            st.tags.insert(name.to_string(), tip);
        }
    }

    pub fn set_dirty(&self, dirty: bool) {
        self.state().dirty = dirty;
    }

    /// Merging `reference` will stop with `paths` conflicted.
    pub fn script_conflict(&self, reference: &str, paths: &[&str]) {
        self.state().conflicts.insert(
            reference.to_string(),
            paths.iter().map(|p| p.to_string()).collect(),
        );
    }

    /// Operator resolves the pending conflicted merge and commits it.
    pub fn commit_resolution(&self) -> Option<String> {
        let mut st = self.state();
        let (ours, theirs) = st.pending_merge.take()?;
        let head = st.head.clone();
        let id = self.new_commit(&mut st, vec![ours, theirs], "Resolve conflicts");
        st.branches.insert(head, id.clone());
        st.dirty = false;
        Some(id)
    }

    /// Pushing `branch` fails.
    pub fn fail_push(&self, branch: &str) {
        self.state().failing_pushes.insert(branch.to_string());
    }

    pub fn tip(&self, branch: &str) -> Option<String> {
        self.state().branches.get(branch).cloned()
    }

    pub fn head(&self) -> String {
        self.state().head.clone()
    }

    pub fn remotes(&self) -> Vec<String> {
        self.state().remotes.keys().cloned().collect()
    }

    /// `(remote, branch)` pairs pushed so far.
    pub fn pushed(&self) -> Vec<(String, String)> {
        self.state().pushed.clone()
    }

    /// Every state-changing command issued through the adapter, in order.
    pub fn mutations(&self) -> Vec<String> {
        self.state().mutations.clone()
    }

    /// Parents of a commit.
    pub fn parents(&self, id: &str) -> Vec<String> {
        self.state()
            .commits
            .get(id)
            .map(|c| c.parents.clone())
            .unwrap_or_default()
    }

    fn new_commit(&self, st: &mut State, parents: Vec<String>, message: &str) -> String {
        st.counter += 1;
        let id = format!("{:08x}{:032x}", self.seed, st.counter);
        st.commits.insert(
            id.clone(),
            FakeCommit {
                id: id.clone(),
                parents,
                message: message.to_string(),
                author: "Dev <dev@example.com>".into(),
                date: format!("2025-10-25 10:{:02}:00 +0000", st.counter % 60),
            },
        );
        id
    }
}

fn resolve(st: &State, reference: &str) -> Option<String> {
    if let Some(id) = st.branches.get(reference) {
        return Some(id.clone());
    }
    if let Some(id) = st.tags.get(reference) {
        return Some(id.clone());
    }
    if let Some(id) = st.remote_refs.get(reference) {
        return Some(id.clone());
    }
    if reference == "HEAD" {
        return st.branches.get(&st.head).cloned();
    }
    st.commits.contains_key(reference).then(|| reference.to_string())
}

fn ancestors(st: &State, id: &str) -> HashSet<String> {
    let mut seen = HashSet::new();
    let mut stack = vec![id.to_string()];
    while let Some(next) = stack.pop() {
        if !seen.insert(next.clone()) {
            continue;
        }
        if let Some(c) = st.commits.get(&next) {
            stack.extend(c.parents.iter().cloned());
        }
    }
    seen
}

fn missing(command: &str, reference: &str) -> GitmvError {
    GitmvError::adapter(
        command,
        format!("fatal: '{reference}' did not resolve (exit status: 128)"),
    )
}

impl Repository for FakeRepository {
    fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn is_repository(&self) -> bool {
        self.is_repository
    }

    fn git_dir(&self) -> Result<PathBuf> {
        if !self.is_repository {
            return Err(GitmvError::NotARepository(self.workdir.clone()));
        }
        Ok(self.git_dir.clone())
    }

    fn has_commits(&self) -> bool {
        let st = self.state();
        st.branches.contains_key(&st.head)
    }

    fn commit_count(&self) -> u64 {
        let st = self.state();
        match st.branches.get(&st.head) {
            Some(tip) => ancestors(&st, tip).len() as u64,
            None => 0,
        }
    }

    fn current_branch(&self) -> Result<String> {
        let st = self.state();
        if st.branches.contains_key(&st.head) {
            Ok(st.head.clone())
        } else {
            Err(missing("rev-parse --abbrev-ref HEAD", "HEAD"))
        }
    }

    fn local_branches(&self) -> Result<Vec<String>> {
        Ok(self.state().branches.keys().cloned().collect())
    }

    fn all_tags(&self) -> Result<Vec<String>> {
        Ok(self.state().tags.keys().cloned().collect())
    }

    fn commit_info(&self, reference: &str) -> Result<CommitInfo> {
        let st = self.state();
        let id = resolve(&st, reference).ok_or_else(|| missing("log -1", reference))?;
        let c = st
            .commits
            .get(&id)
            .ok_or_else(|| missing("log -1", reference))?;
        Ok(CommitInfo {
            hash: c.id.clone(),
            message: c.message.clone(),
            author: c.author.clone(),
            date: c.date.clone(),
        })
    }

    fn create_bundle(&self, output: &Path, refs: &RefSpec) -> Result<()> {
        let st = self.state();
        let mut bundle_refs = BTreeMap::new();
        match refs {
            RefSpec::All => {
                for (name, id) in &st.branches {
                    bundle_refs.insert(format!("refs/heads/{name}"), id.clone());
                }
                for (name, id) in &st.tags {
                    bundle_refs.insert(format!("refs/tags/{name}"), id.clone());
                }
            }
            RefSpec::Refs(names) => {
                for name in names {
                    if let Some(id) = st.branches.get(name) {
                        bundle_refs.insert(format!("refs/heads/{name}"), id.clone());
                    } else if let Some(id) = st.tags.get(name) {
                        bundle_refs.insert(format!("refs/tags/{name}"), id.clone());
                    }
                }
            }
        }
        if bundle_refs.is_empty() {
            return Err(GitmvError::adapter(
                "bundle create",
                "fatal: Refusing to create empty bundle.",
            ));
        }
        let mut reachable = HashSet::new();
        for id in bundle_refs.values() {
            reachable.extend(ancestors(&st, id));
        }
        let mut commits: Vec<FakeCommit> = reachable
            .iter()
            .filter_map(|id| st.commits.get(id).cloned())
            .collect();
        commits.sort_by(|a, b| a.id.cmp(&b.id));
        let bundle = FakeBundle {
            refs: bundle_refs,
            commits,
        };
        std::fs::write(output, serde_json::to_vec(&bundle)?)?;
        Ok(())
    }

    fn verify_bundle(&self, path: &Path) -> bool {
        let Ok(data) = std::fs::read(path) else {
            return false;
        };
        let Ok(bundle) = serde_json::from_slice::<FakeBundle>(&data) else {
            return false;
        };
        let ids: HashSet<&str> = bundle.commits.iter().map(|c| c.id.as_str()).collect();
        bundle.refs.values().all(|id| ids.contains(id.as_str()))
    }

    fn add_remote(&self, name: &str, locator: &str) -> Result<()> {
        let mut st = self.state();
        if st.remotes.contains_key(name) {
            return Err(GitmvError::adapter(
                format!("remote add {name}"),
                format!("error: remote {name} already exists."),
            ));
        }
        st.remotes.insert(name.to_string(), locator.to_string());
        st.mutations.push(format!("remote add {name}"));
        Ok(())
    }

    fn remove_remote(&self, name: &str) {
        let mut st = self.state();
        if st.remotes.remove(name).is_some() {
            let prefix = format!("{name}/");
            st.remote_refs.retain(|r, _| !r.starts_with(&prefix));
            st.mutations.push(format!("remote remove {name}"));
        }
    }

    fn remote_url(&self, name: &str) -> Option<String> {
        self.state().remotes.get(name).cloned()
    }

    fn fetch(&self, remote: &str) -> Result<()> {
        let mut st = self.state();
        let locator = st
            .remotes
            .get(remote)
            .cloned()
            .ok_or_else(|| missing("fetch", remote))?;
        let data = std::fs::read(&locator)?;
        let bundle: FakeBundle = serde_json::from_slice(&data)?;
        for c in bundle.commits {
            st.commits.insert(c.id.clone(), c);
        }
        for (name, id) in bundle.refs {
            if let Some(branch) = name.strip_prefix("refs/heads/") {
                st.remote_refs.insert(format!("{remote}/{branch}"), id);
            }
        }
        st.mutations.push(format!("fetch {remote}"));
        Ok(())
    }

    fn merge_branch(&self, reference: &str, options: &MergeOptions) -> Result<MergeStatus> {
        let mut st = self.state();
        let theirs = resolve(&st, reference).ok_or_else(|| missing("merge", reference))?;
        let head = st.head.clone();
        let ours = st
            .branches
            .get(&head)
            .cloned()
            .ok_or_else(|| missing("merge", "HEAD"))?;
        st.mutations.push(format!("merge {reference}"));

        let our_history = ancestors(&st, &ours);
        if our_history.contains(&theirs) {
            return Ok(MergeStatus::Clean);
        }
        let their_history = ancestors(&st, &theirs);
        if !options.allow_unrelated_histories && our_history.is_disjoint(&their_history) {
            return Ok(MergeStatus::UnrelatedHistories {
                detail: format!("fatal: {UNRELATED_HISTORIES_MARKER}"),
            });
        }
        if let Some(paths) = st.conflicts.get(reference).cloned() {
            st.dirty = true;
            st.pending_merge = Some((ours, theirs));
            return Ok(MergeStatus::Conflicted {
                detail: format!("CONFLICT (content): Merge conflict in {}", paths.join(", ")),
                paths,
            });
        }
        if their_history.contains(&ours) && !options.no_fast_forward {
            st.branches.insert(head, theirs);
            return Ok(MergeStatus::Clean);
        }
        let message = options
            .commit_message
            .clone()
            .unwrap_or_else(|| format!("Merge {reference}"));
        let id = self.new_commit(&mut st, vec![ours, theirs], &message);
        st.branches.insert(head, id);
        Ok(MergeStatus::Clean)
    }

    fn checkout_new_branch(&self, name: &str, start_point: &str) -> Result<()> {
        let mut st = self.state();
        if st.branches.contains_key(name) {
            return Err(GitmvError::adapter(
                format!("checkout -b {name}"),
                format!("fatal: a branch named '{name}' already exists"),
            ));
        }
        let id = resolve(&st, start_point).ok_or_else(|| missing("checkout -b", start_point))?;
        st.branches.insert(name.to_string(), id);
        st.head = name.to_string();
        st.mutations.push(format!("checkout -b {name} {start_point}"));
        Ok(())
    }

    fn checkout_existing(&self, name: &str) -> Result<()> {
        let mut st = self.state();
        if !st.branches.contains_key(name) {
            return Err(missing("checkout", name));
        }
        st.head = name.to_string();
        st.mutations.push(format!("checkout {name}"));
        Ok(())
    }

    fn push(&self, remote: &str, branch: &str) -> Result<()> {
        let mut st = self.state();
        if !st.remotes.contains_key(remote) {
            return Err(missing("push", remote));
        }
        if st.failing_pushes.contains(branch) {
            return Err(GitmvError::adapter(
                format!("push {remote} {branch}"),
                "error: failed to push some refs (exit status: 1)",
            ));
        }
        st.pushed.push((remote.to_string(), branch.to_string()));
        st.mutations.push(format!("push {remote} {branch}"));
        Ok(())
    }

    fn working_tree_is_clean(&self) -> Result<bool> {
        Ok(!self.state().dirty)
    }
}
