//! CLI module — Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::path::{Path, PathBuf};

use clap::{Args, Parser};
use tracing_subscriber::EnvFilter;

use crate::config::Settings;
use crate::crypto::{MasterKeys, StateKey, UnavailablePlatformStore};
use crate::errors::{ChromeSyncError, Result};
use crate::pipeline::BatchPolicy;
use crate::profile::{Browser, FsProfileLocator, TriageContext};
use crate::statekey::{LocalStateKeyProvider, StateKeyProvider, StaticKeyProvider};

/// chromesync CLI: move saved Chromium logins between profiles.
#[derive(Parser)]
#[command(
    name = "chromesync",
    about = "Decrypt, verify and re-key Chromium saved logins",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Log pipeline progress to stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Platform master key as GUID:SHA1 (repeatable)
    #[arg(long = "masterkey", global = true, value_name = "GUID:SHA1")]
    pub master_keys: Vec<String>,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Decrypt and list saved logins
    Logins {
        #[command(flatten)]
        triage: TriageArgs,

        /// Browser to read (default from config: chrome)
        #[arg(short, long, value_enum)]
        browser: Option<Browser>,

        /// Base64 state key (skips Local State unwrapping)
        #[arg(long, env = "CHROMESYNC_SOURCE_KEY", hide_env_values = true)]
        key: Option<String>,

        /// Print decrypted passwords in the table
        #[arg(long)]
        show_passwords: bool,
    },

    /// Decrypt every login and prove the codec reproduces it byte-for-byte
    Verify {
        /// Profile folder (home folder, User Data, or folder with Login Data)
        #[arg(short, long)]
        profile: PathBuf,

        /// Browser to read (default from config: chrome)
        #[arg(short, long, value_enum)]
        browser: Option<Browser>,

        /// Base64 state key (skips Local State unwrapping)
        #[arg(long, env = "CHROMESYNC_SOURCE_KEY", hide_env_values = true)]
        key: Option<String>,

        /// Stop at the first login that fails
        #[arg(long)]
        fail_fast: bool,
    },

    /// Re-encrypt logins into another browser's Login Data
    ///
    /// With --from/--to, one source profile is copied into one destination
    /// profile. Otherwise each triaged user folder is migrated in place from
    /// --from-browser to --to-browser.
    Migrate {
        #[command(flatten)]
        triage: TriageArgs,

        /// Source profile folder
        #[arg(long, requires = "to", conflicts_with_all = ["profile", "all_users", "host"])]
        from: Option<PathBuf>,

        /// Destination profile folder
        #[arg(long, requires = "from")]
        to: Option<PathBuf>,

        /// Source browser (default from config: chrome)
        #[arg(long, value_enum)]
        from_browser: Option<Browser>,

        /// Destination browser (default from config: edge)
        #[arg(long, value_enum)]
        to_browser: Option<Browser>,

        /// Base64 source state key
        #[arg(long, env = "CHROMESYNC_SOURCE_KEY", hide_env_values = true)]
        source_key: Option<String>,

        /// Base64 destination state key
        #[arg(long, env = "CHROMESYNC_DEST_KEY", hide_env_values = true)]
        dest_key: Option<String>,

        /// Stop at the first login that fails
        #[arg(long)]
        fail_fast: bool,

        /// Decrypt and re-encrypt but do not write the destination
        #[arg(long)]
        dry_run: bool,

        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// View the audit log of verify/migrate runs
    #[cfg(feature = "audit-log")]
    Audit {
        /// Number of entries to show (default: 50)
        #[arg(long, default_value = "50")]
        last: usize,
        /// Show entries since a duration ago (e.g. 7d, 24h, 30m)
        #[arg(long)]
        since: Option<String>,
    },
}

/// Which user folders to triage.
#[derive(Args, Debug, Clone, Default)]
pub struct TriageArgs {
    /// A single profile or user folder
    #[arg(short, long, conflicts_with = "all_users")]
    pub profile: Option<PathBuf>,

    /// Every user folder under the configured users root (needs --masterkey)
    #[arg(long)]
    pub all_users: bool,

    /// Remote host to triage through its C$ share
    #[arg(long, conflicts_with = "all_users")]
    pub host: Option<String>,
}

impl TriageArgs {
    pub fn context(&self) -> TriageContext {
        match (&self.profile, self.all_users, &self.host) {
            (profile, _, Some(host)) => TriageContext::RemoteHost {
                host: host.clone(),
                user_folder: profile.clone(),
            },
            (Some(profile), _, None) => TriageContext::UserFolder(profile.clone()),
            (None, true, None) => TriageContext::AllUsers,
            (None, false, None) => TriageContext::CurrentUser,
        }
    }
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Install the stderr `tracing` subscriber.
///
/// `RUST_LOG` wins; otherwise `--verbose` selects debug output.
pub fn init_logging(verbose: bool) {
    let default = if verbose { "chromesync=debug" } else { "chromesync=warn" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Load settings from the working directory.
pub fn load_settings() -> Result<(PathBuf, Settings)> {
    let cwd = std::env::current_dir()?;
    let settings = Settings::load(&cwd)?;
    Ok((cwd, settings))
}

/// Parse `--masterkey GUID:SHA1` values.
pub fn parse_master_keys(values: &[String]) -> Result<MasterKeys> {
    let mut keys = MasterKeys::new();
    for value in values {
        let (guid, sha1) = value.split_once(':').ok_or_else(|| {
            ChromeSyncError::InvalidArgument(format!(
                "master key '{value}' must be GUID:SHA1"
            ))
        })?;
        if guid.is_empty() || sha1.is_empty() {
            return Err(ChromeSyncError::InvalidArgument(format!(
                "master key '{value}' must be GUID:SHA1"
            )));
        }
        keys.insert(guid, sha1);
    }
    Ok(keys)
}

/// Flags beat config.
pub fn batch_policy(fail_fast: bool, settings: &Settings) -> BatchPolicy {
    if fail_fast {
        BatchPolicy::FailFast
    } else {
        settings.batch_policy
    }
}

/// A locator configured from settings and master keys.
pub fn profile_locator(settings: &Settings, master_keys: &MasterKeys) -> FsProfileLocator {
    FsProfileLocator::new(settings.users_root.clone())
        .with_master_keys_supplied(!master_keys.is_empty())
}

/// Resolve the state key for `profile`.
///
/// An explicit base64 key wins; otherwise `Local State` is unwrapped
/// through the platform key store.
pub fn resolve_state_key(
    explicit: Option<&str>,
    browser: Browser,
    profile: &Path,
    master_keys: &MasterKeys,
) -> Result<StateKey> {
    match explicit {
        Some(encoded) => StaticKeyProvider::new(StateKey::from_base64(encoded)?)
            .resolve(profile, master_keys),
        None => LocalStateKeyProvider::new(browser, UnavailablePlatformStore)
            .resolve(profile, master_keys),
    }
}
