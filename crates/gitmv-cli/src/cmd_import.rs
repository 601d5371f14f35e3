use crate::terminal::{ConsoleNarrator, TerminalPrompter};
use gitmv_core::Catalog;
use gitmv_engine::{ImportOptions, Importer};
use gitmv_git::GitCli;
use std::path::Path;
use tracing::{info, warn};

/// Normalize `--branch a,b` values; no names means no filter.
pub fn branch_filter(raw: &[String]) -> Option<Vec<String>> {
    let names: Vec<String> = raw
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if names.is_empty() {
        None
    } else {
        Some(names)
    }
}

/// `gitmv import <archive>`
///
/// An unresolved conflict comes back as an error so the process exits 1.
pub fn execute(
    repo_root: &Path,
    archive: &Path,
    options: &ImportOptions,
    catalog: Catalog,
) -> anyhow::Result<()> {
    let repo = GitCli::new(repo_root);
    let prompter = TerminalPrompter::stdio(catalog);
    let narrator = ConsoleNarrator::stdout(catalog);

    let summary = Importer::new(&repo, &prompter, &narrator).run(archive, options)?;
    if !summary.push_failures.is_empty() {
        warn!(branches = ?summary.push_failures, "some branches were not pushed");
    }
    let summary = summary.into_result()?;
    info!(
        mode = %summary.mode,
        dry_run = summary.dry_run,
        branches = summary.outcomes.len(),
        "import finished"
    );
    Ok(())
}
