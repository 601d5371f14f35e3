use clap::Subcommand;
use gitmv_store::Preferences;
use std::path::Path;

// ── CLI Schema ──

#[derive(Subcommand)]
pub enum ConfigCmd {
    /// Set a preference
    Set {
        /// Preference key (e.g. language)
        key: String,
        /// New value (language: en or ko)
        value: String,
    },
    /// Print a preference
    Get {
        /// Preference key
        key: String,
    },
    /// List all preferences
    List,
}

// ── Dispatch ──

pub fn run(cmd: ConfigCmd, prefs_path: &Path) -> anyhow::Result<()> {
    match cmd {
        ConfigCmd::Set { key, value } => set(prefs_path, &key, &value),
        ConfigCmd::Get { key } => get(prefs_path, &key),
        ConfigCmd::List => list(prefs_path),
    }
}

// ── Command Implementations ──

/// `gitmv config set <key> <value>`
pub fn set(prefs_path: &Path, key: &str, value: &str) -> anyhow::Result<()> {
    let mut prefs = Preferences::load(prefs_path);
    prefs.set(key, value)?;
    prefs.save(prefs_path)?;
    println!("{key} = {}", prefs.get(key).unwrap_or_default());
    Ok(())
}

/// `gitmv config get <key>`
pub fn get(prefs_path: &Path, key: &str) -> anyhow::Result<()> {
    let prefs = Preferences::load(prefs_path);
    match prefs.get(key) {
        Some(val) => println!("{val}"),
        None => anyhow::bail!("unknown setting '{key}'"),
    }
    Ok(())
}

/// `gitmv config list`
pub fn list(prefs_path: &Path) -> anyhow::Result<()> {
    let prefs = Preferences::load(prefs_path);
    if !prefs_path.exists() {
        println!("(no config set, using defaults)");
    }
    for (k, v) in prefs.entries() {
        println!("{k} = {v}");
    }
    Ok(())
}
