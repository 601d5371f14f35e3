//! [`Repository`] implementation that shells out to the system `git` binary.
//!
//! Every call runs one `git` process in the working tree and waits for it.
//! Commands run with `LC_ALL=C` so diagnostics can be classified by text, and
//! with `GIT_TERMINAL_PROMPT=0` so a push never blocks on a credential prompt.

use gitmv_core::adapter::UNRELATED_HISTORIES_MARKER;
use gitmv_core::{CommitInfo, GitmvError, MergeOptions, MergeStatus, RefSpec, Repository, Result};
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tracing::debug;

/// Field separator for `git log --format` output; never appears in subjects.
const FIELD_SEP: &str = "\x1f";

pub struct GitCli {
    workdir: PathBuf,
}

impl GitCli {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new("git");
        cmd.args(args)
            .current_dir(&self.workdir)
            .env("LC_ALL", "C")
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null());
        cmd
    }

    fn output(&self, args: &[&str]) -> Result<Output> {
        debug!(args = ?args, "spawning git");
        self.command(args)
            .output()
            .map_err(|e| GitmvError::adapter(args.join(" "), format!("git not available: {e}")))
    }

    /// Run git and return trimmed stdout; non-zero exit is an adapter error.
    fn run(&self, args: &[&str]) -> Result<String> {
        let output = self.output(args)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GitmvError::adapter(
                args.join(" "),
                format!("{} ({})", stderr.trim(), output.status),
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Run git; `None` on any failure.
    fn run_tolerant(&self, args: &[&str]) -> Option<String> {
        match self.run(args) {
            Ok(out) => Some(out),
            Err(e) => {
                debug!(error = %e, "tolerated git failure");
                None
            }
        }
    }

    /// Index the pack section of a bundle into a throwaway object directory.
    ///
    /// `git bundle verify` only reads the header, so a bundle cut off inside
    /// its pack data still passes it. Objects already in this repository
    /// are visible as alternates, so packs with prerequisites resolve.
    fn pack_is_complete(&self, bundle: &Path) -> Result<bool> {
        let scratch = tempfile::Builder::new()
            .prefix("gitmv-verify-")
            .tempdir()?;
        let pack_path = scratch.path().join("bundle.pack");
        {
            let mut reader = BufReader::new(File::open(bundle)?);
            if !skip_bundle_header(&mut reader)? {
                return Ok(false);
            }
            io::copy(&mut reader, &mut File::create(&pack_path)?)?;
        }
        let objects = scratch.path().join("objects");
        fs::create_dir_all(objects.join("pack"))?;
        let alternates = self.git_dir()?.join("objects");

        let args = ["index-pack", "--stdin", "--fix-thin"];
        debug!(args = ?args, bundle = %bundle.display(), "spawning git");
        let output = self
            .command(&args)
            .env("GIT_OBJECT_DIRECTORY", &objects)
            .env("GIT_ALTERNATE_OBJECT_DIRECTORIES", &alternates)
            .stdin(File::open(&pack_path)?)
            .output()?;
        if !output.status.success() {
            debug!(
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "bundle pack rejected"
            );
        }
        Ok(output.status.success())
    }

    /// Paths with unresolved conflicts in the index.
    fn conflicted_paths(&self) -> Vec<String> {
        self.run_tolerant(&["diff", "--name-only", "--diff-filter=U"])
            .map(|out| lines(&out))
            .unwrap_or_default()
    }
}

/// Advance past the bundle header (signature, capabilities, prerequisites,
/// refs) up to its terminating blank line. `false` when the header never ends.
fn skip_bundle_header<R: BufRead>(reader: &mut R) -> io::Result<bool> {
    let mut line = Vec::new();
    let mut first = true;
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            return Ok(false);
        }
        if first {
            if !line.starts_with(b"# v") {
                return Ok(false);
            }
            first = false;
        } else if line == b"\n" {
            return Ok(true);
        }
    }
}

fn lines(out: &str) -> Vec<String> {
    out.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse `%H<US>%s<US>%an <%ae><US>%ai` into a [`CommitInfo`].
fn parse_commit_line(line: &str) -> Option<CommitInfo> {
    let mut parts = line.splitn(4, FIELD_SEP);
    let hash = parts.next()?.trim();
    let message = parts.next()?;
    let author = parts.next()?;
    let date = parts.next()?;
    if hash.is_empty() {
        return None;
    }
    Some(CommitInfo {
        hash: hash.to_string(),
        message: message.to_string(),
        author: author.to_string(),
        date: date.trim().to_string(),
    })
}

/// Whether merge diagnostics report the unrelated-histories refusal.
pub fn is_unrelated_histories(diagnostic: &str) -> bool {
    diagnostic.contains(UNRELATED_HISTORIES_MARKER)
}

impl Repository for GitCli {
    fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn is_repository(&self) -> bool {
        self.run_tolerant(&["rev-parse", "--git-dir"]).is_some()
    }

    fn git_dir(&self) -> Result<PathBuf> {
        let out = self.run(&["rev-parse", "--absolute-git-dir"])?;
        Ok(PathBuf::from(out))
    }

    fn has_commits(&self) -> bool {
        self.run_tolerant(&["rev-parse", "--verify", "--quiet", "HEAD"])
            .is_some()
    }

    fn commit_count(&self) -> u64 {
        self.run_tolerant(&["rev-list", "--count", "HEAD"])
            .and_then(|s| s.parse().ok())
            .unwrap_or(0)
    }

    fn current_branch(&self) -> Result<String> {
        self.run(&["rev-parse", "--abbrev-ref", "HEAD"])
    }

    fn local_branches(&self) -> Result<Vec<String>> {
        let out = self.run(&["branch", "--format=%(refname:short)"])?;
        Ok(lines(&out)
            .into_iter()
            .filter(|b| !b.starts_with('('))
            .collect())
    }

    fn all_tags(&self) -> Result<Vec<String>> {
        let out = self.run(&["tag", "--list"])?;
        Ok(lines(&out))
    }

    fn commit_info(&self, reference: &str) -> Result<CommitInfo> {
        let format = format!("--format=%H{FIELD_SEP}%s{FIELD_SEP}%an <%ae>{FIELD_SEP}%ai");
        let out = self.run(&["log", "-1", &format, reference, "--"])?;
        parse_commit_line(&out).ok_or_else(|| {
            GitmvError::adapter(format!("log -1 {reference}"), "unexpected log output")
        })
    }

    fn create_bundle(&self, output: &Path, refs: &RefSpec) -> Result<()> {
        let output = output.to_string_lossy().into_owned();
        let mut args = vec!["bundle", "create", output.as_str()];
        match refs {
            RefSpec::All => args.push("--all"),
            RefSpec::Refs(names) => args.extend(names.iter().map(String::as_str)),
        }
        self.run(&args).map(|_| ())
    }

    fn verify_bundle(&self, path: &Path) -> bool {
        let bundle_path = path.to_string_lossy().into_owned();
        if self
            .run_tolerant(&["bundle", "verify", bundle_path.as_str()])
            .is_none()
        {
            return false;
        }
        match self.pack_is_complete(path) {
            Ok(complete) => complete,
            Err(e) => {
                debug!(bundle = %bundle_path, error = %e, "could not check bundle pack");
                false
            }
        }
    }

    fn add_remote(&self, name: &str, locator: &str) -> Result<()> {
        self.run(&["remote", "add", name, locator]).map(|_| ())
    }

    fn remove_remote(&self, name: &str) {
        let _ = self.run_tolerant(&["remote", "remove", name]);
    }

    fn remote_url(&self, name: &str) -> Option<String> {
        self.run_tolerant(&["remote", "get-url", name])
            .filter(|url| !url.is_empty())
    }

    fn fetch(&self, remote: &str) -> Result<()> {
        self.run(&["fetch", remote]).map(|_| ())
    }

    fn merge_branch(&self, reference: &str, options: &MergeOptions) -> Result<MergeStatus> {
        let mut args = vec!["merge"];
        if options.no_fast_forward {
            args.push("--no-ff");
        }
        if options.allow_unrelated_histories {
            args.push("--allow-unrelated-histories");
        }
        if let Some(message) = options.commit_message.as_deref() {
            args.push("-m");
            args.push(message);
        }
        args.push(reference);

        let output = self.output(&args)?;
        if output.status.success() {
            return Ok(MergeStatus::Clean);
        }

        let detail = format!(
            "{}\n{}",
            String::from_utf8_lossy(&output.stdout).trim(),
            String::from_utf8_lossy(&output.stderr).trim()
        )
        .trim()
        .to_string();

        if is_unrelated_histories(&detail) {
            return Ok(MergeStatus::UnrelatedHistories { detail });
        }

        let paths = self.conflicted_paths();
        if paths.is_empty() {
            return Err(GitmvError::adapter(args.join(" "), detail));
        }
        Ok(MergeStatus::Conflicted { paths, detail })
    }

    fn checkout_new_branch(&self, name: &str, start_point: &str) -> Result<()> {
        self.run(&["checkout", "-b", name, start_point]).map(|_| ())
    }

    fn checkout_existing(&self, name: &str) -> Result<()> {
        self.run(&["checkout", name]).map(|_| ())
    }

    fn push(&self, remote: &str, branch: &str) -> Result<()> {
        self.run(&["push", remote, branch]).map(|_| ())
    }

    fn working_tree_is_clean(&self) -> Result<bool> {
        let out = self.run(&["status", "--porcelain"])?;
        Ok(out.is_empty())
    }
}
