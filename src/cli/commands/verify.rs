//! `chromesync verify` — decrypt every login and re-derive its stored
//! bytes, without writing anything.

use std::path::Path;

use crate::cli::output;
use crate::cli::{batch_policy, load_settings, parse_master_keys, resolve_state_key, Cli};
use crate::errors::{ChromeSyncError, Result};
use crate::pipeline::Pipeline;
use crate::profile::Browser;
use crate::store::{CredentialStore, LoginDataStore};

/// Execute the `verify` command.
pub fn execute(
    cli: &Cli,
    profile: &Path,
    browser: Option<Browser>,
    key: Option<&str>,
    fail_fast: bool,
) -> Result<()> {
    #[cfg_attr(not(feature = "audit-log"), allow(unused_variables))]
    let (cwd, settings) = load_settings()?;
    let browser = browser.unwrap_or(settings.source_browser);
    let master_keys = parse_master_keys(&cli.master_keys)?;

    let login_data = browser.login_data_path(profile)?;
    let records = LoginDataStore::new().list(&login_data)?;
    let total = records.len();
    let state_key = resolve_state_key(key, browser, profile, &master_keys)?;

    let pipeline = Pipeline::new(batch_policy(fail_fast, &settings)).with_master_keys(master_keys);
    let outcome = pipeline.decrypt_all(records, &state_key)?;

    let verified = outcome.records.len();
    let failed = outcome.failures.len();
    drop(outcome.records);

    #[cfg(feature = "audit-log")]
    crate::audit::log_audit(
        &settings.audit_path(&cwd),
        "verify",
        &browser.to_string(),
        Some(&profile.display().to_string()),
        Some(&format!("{verified} of {total} verified")),
    );

    output::print_failures(&outcome.failures);

    if failed > 0 {
        return Err(ChromeSyncError::CommandFailed(format!(
            "{failed} of {total} login(s) failed verification"
        )));
    }

    output::success(&format!("All {verified} login(s) decrypt and round-trip cleanly"));
    Ok(())
}
