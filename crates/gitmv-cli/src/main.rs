mod cmd_config;
mod cmd_export;
mod cmd_import;
mod terminal;

use clap::{Parser, Subcommand};
use gitmv_core::{Catalog, Language};
use gitmv_engine::{ExportOptions, ImportOptions};
use gitmv_store::prefs::preferences_path;
use gitmv_store::Preferences;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "gitmv",
    version,
    about = "Move git repositories between network-isolated environments"
)]
struct Cli {
    /// Message language for this run (en or ko); overrides the stored preference
    #[arg(long, global = true)]
    lang: Option<Language>,
    /// Print diagnostic logs to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Bundle branches and metadata into a portable archive
    Export {
        /// Export only this branch
        #[arg(long, conflicts_with = "all")]
        branch: Option<String>,
        /// Export every local branch
        #[arg(long)]
        all: bool,
        /// Run without prompts
        #[arg(long)]
        auto: bool,
        /// Directory the archive is written to
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },
    /// Reconcile an exported archive into the repository at hand
    Import {
        /// Path to a git-export-*.tar.zst archive written by `gitmv export` (zip files are not read)
        archive: PathBuf,
        /// Create branches directly from the bundle (empty repositories)
        #[arg(long)]
        init: bool,
        /// Run without prompts; never pushes
        #[arg(long)]
        auto: bool,
        /// Report what would happen without changing anything
        #[arg(long)]
        dry_run: bool,
        /// Only these branches (comma-separated)
        #[arg(long, value_delimiter = ',')]
        branch: Vec<String>,
        /// Merge even when the histories share no ancestor
        #[arg(long)]
        allow_unrelated_histories: bool,
    },
    /// Manage stored preferences
    Config {
        #[command(subcommand)]
        cmd: cmd_config::ConfigCmd,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let prefs_path = preferences_path();
    let prefs = Preferences::load(&prefs_path);
    let language = cli.lang.unwrap_or(prefs.language);
    debug!(language = %language, prefs = %prefs_path.display(), "preferences loaded");
    let catalog = Catalog::new(language);

    match run(cli.cmd, catalog, &prefs_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            terminal::report_error(&catalog, &e);
            ExitCode::FAILURE
        }
    }
}

fn run(cmd: Command, catalog: Catalog, prefs_path: &std::path::Path) -> anyhow::Result<()> {
    let repo_root = std::env::current_dir()?;

    match cmd {
        Command::Export {
            branch,
            all,
            auto,
            output_dir,
        } => cmd_export::execute(
            &repo_root,
            &ExportOptions {
                branch,
                all_branches: all,
                auto,
                output_dir,
            },
            catalog,
        ),
        Command::Import {
            archive,
            init,
            auto,
            dry_run,
            branch,
            allow_unrelated_histories,
        } => cmd_import::execute(
            &repo_root,
            &archive,
            &ImportOptions {
                force_init: init,
                auto,
                dry_run,
                branch_filter: cmd_import::branch_filter(&branch),
                allow_unrelated_histories,
            },
            catalog,
        ),
        Command::Config { cmd } => cmd_config::run(cmd, prefs_path),
    }
}
