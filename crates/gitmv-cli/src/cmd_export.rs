use crate::terminal::{ConsoleNarrator, TerminalPrompter};
use gitmv_core::Catalog;
use gitmv_engine::{ExportOptions, ExportOutcome, Exporter};
use gitmv_git::GitCli;
use std::path::Path;
use tracing::info;

/// `gitmv export`
pub fn execute(repo_root: &Path, options: &ExportOptions, catalog: Catalog) -> anyhow::Result<()> {
    let repo = GitCli::new(repo_root);
    let prompter = TerminalPrompter::stdio(catalog);
    let narrator = ConsoleNarrator::stdout(catalog);

    match Exporter::new(&repo, &prompter, &narrator).run(options)? {
        ExportOutcome::Written { path, size, .. } => {
            info!(path = %path.display(), size, "archive written");
        }
        ExportOutcome::Cancelled => info!("export cancelled by operator"),
    }
    Ok(())
}
