use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{ChromeSyncError, Result};
use crate::pipeline::BatchPolicy;
use crate::profile::{default_users_root, Browser};

/// Project-level configuration, loaded from `.chromesync.toml`.
///
/// Every field has a default so chromesync works without any config
/// file at all.  Command-line flags override these values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// What to do when one login fails to decrypt.
    #[serde(default)]
    pub batch_policy: BatchPolicy,

    /// Browser whose logins are read by default.
    #[serde(default = "default_source_browser")]
    pub source_browser: Browser,

    /// Browser whose `Login Data` receives migrated logins by default.
    #[serde(default = "default_destination_browser")]
    pub destination_browser: Browser,

    /// Directory holding per-user folders, for all-users triage.
    #[serde(default = "default_users_root")]
    pub users_root: PathBuf,

    /// Directory (relative to the working directory) for the audit database.
    #[serde(default = "default_audit_dir")]
    pub audit_dir: String,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_source_browser() -> Browser {
    Browser::Chrome
}

fn default_destination_browser() -> Browser {
    Browser::Edge
}

fn default_audit_dir() -> String {
    ".chromesync".to_string()
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            batch_policy: BatchPolicy::default(),
            source_browser: default_source_browser(),
            destination_browser: default_destination_browser(),
            users_root: default_users_root(),
            audit_dir: default_audit_dir(),
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the working directory.
    const FILE_NAME: &'static str = ".chromesync.toml";

    /// Load settings from `<dir>/.chromesync.toml`.
    ///
    /// If the file does not exist, defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(dir: &Path) -> Result<Self> {
        let config_path = dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            ChromeSyncError::ConfigError(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        tracing::debug!(path = %config_path.display(), "loaded settings");
        Ok(settings)
    }

    /// Full path of the audit directory for a working directory.
    pub fn audit_path(&self, dir: &Path) -> PathBuf {
        dir.join(&self.audit_dir)
    }
}

// ── Tests ────────────────────────────────────────────────────────────
