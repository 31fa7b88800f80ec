//! `chromesync logins` — decrypt and list saved logins.
//!
//! Usage:
//!   chromesync logins --profile ~/copied-profile --key <base64>
//!   chromesync logins --all-users --masterkey {guid}:sha1
//!   chromesync logins --host ws01

use std::path::Path;

use console::style;

use crate::cli::output;
use crate::cli::{
    load_settings, parse_master_keys, profile_locator, resolve_state_key, Cli, TriageArgs,
};
use crate::crypto::MasterKeys;
use crate::errors::{ChromeSyncError, Result};
use crate::pipeline::{BatchPolicy, Pipeline};
use crate::profile::{Browser, ProfileLocator};
use crate::store::{CredentialStore, LoginDataStore};

/// Execute the `logins` command.
pub fn execute(
    cli: &Cli,
    triage: &TriageArgs,
    browser: Option<Browser>,
    key: Option<&str>,
    show_passwords: bool,
) -> Result<()> {
    let (_, settings) = load_settings()?;
    let browser = browser.unwrap_or(settings.source_browser);
    let master_keys = parse_master_keys(&cli.master_keys)?;

    let context = triage.context();
    let folders = profile_locator(&settings, &master_keys).enumerate(&context)?;
    if folders.is_empty() {
        output::warning("No user folders to triage.");
        output::tip("All-users triage needs at least one --masterkey GUID:SHA1.");
        return Ok(());
    }

    let single = folders.len() == 1;
    let mut failed_profiles = 0usize;

    for folder in &folders {
        let listed = list_profile(
            folder,
            browser,
            key,
            &master_keys,
            settings.batch_policy,
            show_passwords,
        );
        match listed {
            Ok(()) => {}
            // When sweeping many folders, most have no browser installed.
            Err(ChromeSyncError::NotFound(_)) if !single => {
                tracing::debug!(folder = %folder.display(), "no Login Data");
            }
            Err(e) if single => return Err(e),
            Err(e) => {
                failed_profiles += 1;
                output::warning(&format!("{}: {e}", folder.display()));
            }
        }
    }

    if failed_profiles > 0 {
        return Err(ChromeSyncError::CommandFailed(format!(
            "{failed_profiles} profile(s) could not be read"
        )));
    }

    Ok(())
}

fn list_profile(
    folder: &Path,
    browser: Browser,
    key: Option<&str>,
    master_keys: &MasterKeys,
    policy: BatchPolicy,
    show_passwords: bool,
) -> Result<()> {
    let login_data = browser.login_data_path(folder)?;
    let records = LoginDataStore::new().list(&login_data)?;
    let state_key = resolve_state_key(key, browser, folder, master_keys)?;

    let pipeline = Pipeline::new(policy).with_master_keys(master_keys.clone());
    let outcome = pipeline.decrypt_all(records, &state_key)?;

    println!(
        "{}",
        style(format!("{browser} logins in {}", folder.display())).bold()
    );
    output::print_logins_table(&outcome.records, show_passwords);
    output::print_failures(&outcome.failures);

    Ok(())
}
