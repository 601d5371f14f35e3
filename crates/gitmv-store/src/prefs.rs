//! Per-user preferences (`preferences.json`).

use crate::error::StoreResult;
use crate::write_atomic;
use gitmv_core::{GitmvError, Language};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

pub const PREFERENCES_FILE: &str = "preferences.json";

/// Keys accepted by `gitmv config`.
pub const KNOWN_KEYS: &[&str] = &["language"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub language: Language,
}

/// Return the preferences directory: `<config dir>/gitmv/`
/// (falls back to `~/.gitmv/`).
pub fn config_root() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        config_dir.join("gitmv")
    } else if let Some(home) = dirs::home_dir() {
        home.join(".gitmv")
    } else {
        PathBuf::from(".gitmv")
    }
}

pub fn preferences_path() -> PathBuf {
    config_root().join(PREFERENCES_FILE)
}

impl Preferences {
    /// Load from `path`. A missing or unreadable file yields defaults.
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return Self::default(),
        };
        match serde_json::from_str(&content) {
            Ok(prefs) => prefs,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring malformed preferences");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> StoreResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        write_atomic(path, json.as_bytes())
    }

    /// Value of a known key as a display string.
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "language" => Some(self.language.code().to_string()),
            _ => None,
        }
    }

    /// Set a known key. Unknown keys and unparseable values are rejected.
    pub fn set(&mut self, key: &str, value: &str) -> gitmv_core::Result<()> {
        match key {
            "language" => {
                self.language = value.parse().map_err(GitmvError::Setting)?;
                Ok(())
            }
            _ => Err(GitmvError::Setting(format!(
                "unknown setting '{key}' (known: {})",
                KNOWN_KEYS.join(", ")
            ))),
        }
    }

    /// All known settings as `(key, value)` pairs.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        KNOWN_KEYS
            .iter()
            .filter_map(|k| self.get(k).map(|v| (*k, v)))
            .collect()
    }
}
