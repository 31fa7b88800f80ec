//! `chromesync migrate` — move saved logins into another browser's profile.
//!
//! Every login is decrypted under the source key, proven to round-trip,
//! re-encrypted under the destination key with a fresh IV, and upserted
//! into the destination `Login Data`.  Nothing is written for a profile
//! until its whole batch has been processed.
//!
//! Usage:
//!   chromesync migrate --from ~/chrome-copy --to ~/edge-copy --force
//!   chromesync migrate --all-users --masterkey {guid}:sha1 --to-browser brave

use std::path::{Path, PathBuf};

use dialoguer::Confirm;

use crate::cli::output;
use crate::cli::{
    batch_policy, load_settings, parse_master_keys, profile_locator, resolve_state_key, Cli,
    TriageArgs,
};
use crate::crypto::MasterKeys;
use crate::errors::{ChromeSyncError, Result};
use crate::pipeline::{BatchPolicy, Pipeline};
use crate::profile::{Browser, ProfileLocator};
use crate::store::{CredentialStore, LoginDataStore};

/// Options for one migrate run.
pub struct MigrateArgs<'a> {
    pub triage: &'a TriageArgs,
    pub from: Option<&'a Path>,
    pub to: Option<&'a Path>,
    pub from_browser: Option<Browser>,
    pub to_browser: Option<Browser>,
    pub source_key: Option<&'a str>,
    pub dest_key: Option<&'a str>,
    pub fail_fast: bool,
    pub dry_run: bool,
    pub force: bool,
}

/// Settings shared by every profile in the run.
struct Plan<'a> {
    args: &'a MigrateArgs<'a>,
    from_browser: Browser,
    to_browser: Browser,
    master_keys: MasterKeys,
    policy: BatchPolicy,
    #[cfg_attr(not(feature = "audit-log"), allow(dead_code))]
    audit_dir: PathBuf,
}

/// Logins seen and logins written (or ready, on a dry run) for one profile.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Tally {
    total: usize,
    ready: usize,
}

/// Execute the `migrate` command.
pub fn execute(cli: &Cli, args: &MigrateArgs<'_>) -> Result<()> {
    let (cwd, settings) = load_settings()?;
    let master_keys = parse_master_keys(&cli.master_keys)?;

    let pairs: Vec<(PathBuf, PathBuf)> = match (args.from, args.to) {
        (Some(from), Some(to)) => vec![(from.to_path_buf(), to.to_path_buf())],
        (None, None) => profile_locator(&settings, &master_keys)
            .enumerate(&args.triage.context())?
            .into_iter()
            .map(|folder| (folder.clone(), folder))
            .collect(),
        _ => {
            return Err(ChromeSyncError::InvalidArgument(
                "--from and --to must be given together".into(),
            ))
        }
    };

    let plan = Plan {
        args,
        from_browser: args.from_browser.unwrap_or(settings.source_browser),
        to_browser: args.to_browser.unwrap_or(settings.destination_browser),
        master_keys,
        policy: batch_policy(args.fail_fast, &settings),
        audit_dir: settings.audit_path(&cwd),
    };

    if args.from.is_none() && plan.from_browser == plan.to_browser {
        return Err(ChromeSyncError::InvalidArgument(format!(
            "in-place migration needs two different browsers (both are {})",
            plan.from_browser
        )));
    }

    if pairs.is_empty() {
        output::warning("No user folders to migrate.");
        output::tip("All-users migration needs at least one --masterkey GUID:SHA1.");
        return Ok(());
    }

    let single = pairs.len() == 1;
    let mut tally = Tally::default();
    let mut failed_profiles = 0usize;

    for (from, to) in &pairs {
        match plan.migrate_profile(from, to) {
            Ok(done) => {
                tally.total += done.total;
                tally.ready += done.ready;
            }
            // Most user folders have only one of the two browsers.
            Err(ChromeSyncError::NotFound(path)) if !single => {
                tracing::debug!(folder = %from.display(), missing = %path.display(), "skipping folder");
            }
            Err(e) if single => return Err(e),
            Err(e) => {
                failed_profiles += 1;
                output::warning(&format!("{}: {e}", from.display()));
            }
        }
    }

    if tally.ready > 0 && !args.dry_run {
        output::tip("Restart the destination browser to pick up the new logins.");
    }

    if failed_profiles > 0 {
        return Err(ChromeSyncError::CommandFailed(format!(
            "{failed_profiles} profile(s) could not be migrated"
        )));
    }

    if args.dry_run {
        return Ok(());
    }
    finish(tally)
}

impl Plan<'_> {
    fn migrate_profile(&self, from: &Path, to: &Path) -> Result<Tally> {
        let (from_browser, to_browser) = (self.from_browser, self.to_browser);

        let source_path = from_browser.login_data_path(from)?;
        let dest_path = to_browser.login_data_path(to)?;
        if source_path == dest_path {
            return Err(ChromeSyncError::InvalidArgument(
                "source and destination are the same Login Data file".into(),
            ));
        }

        let source_key =
            resolve_state_key(self.args.source_key, from_browser, from, &self.master_keys)?;
        let dest_key = resolve_state_key(self.args.dest_key, to_browser, to, &self.master_keys)?;

        let store = LoginDataStore::new();
        let records = store.list(&source_path)?;
        let total = records.len();

        let pipeline = Pipeline::new(self.policy).with_master_keys(self.master_keys.clone());
        tracing::info!(
            policy = ?pipeline.policy(),
            source = %source_path.display(),
            destination = %dest_path.display(),
            total,
            "migrating profile"
        );
        let outcome = pipeline.migrate(records, &source_key, &dest_key)?;
        let ready = outcome.records.len();

        output::print_failures(&outcome.failures);

        if self.args.dry_run {
            output::info(&format!(
                "Dry run: {ready} of {total} login(s) would be written to {}",
                dest_path.display()
            ));
            return Ok(Tally { total, ready });
        }

        if ready == 0 {
            output::warning(&format!("Nothing to write for {}.", from.display()));
            return Ok(Tally { total, ready });
        }

        if !self.args.force {
            let confirmed = Confirm::new()
                .with_prompt(format!(
                    "Write {ready} login(s) into {}?",
                    dest_path.display()
                ))
                .default(false)
                .interact()
                .map_err(|e| ChromeSyncError::CommandFailed(format!("confirm prompt: {e}")))?;

            if !confirmed {
                output::info("Skipped.");
                return Ok(Tally::default());
            }
        }

        let written = store.replace(&dest_path, &outcome.records)?;

        #[cfg(feature = "audit-log")]
        crate::audit::log_audit(
            &self.audit_dir,
            "migrate",
            &format!("{from_browser} -> {to_browser}"),
            Some(&format!("{} -> {}", from.display(), to.display())),
            Some(&format!("{written} of {total} migrated")),
        );

        output::success(&format!(
            "Migrated {written} login(s) from {from_browser} to {to_browser} ({})",
            to.display()
        ));

        Ok(Tally {
            total,
            ready: written,
        })
    }
}

/// Partial success still exits non-zero.
fn finish(tally: Tally) -> Result<()> {
    if tally.ready < tally.total {
        return Err(ChromeSyncError::CommandFailed(format!(
            "{} of {} login(s) were not migrated",
            tally.total - tally.ready,
            tally.total
        )));
    }
    Ok(())
}
