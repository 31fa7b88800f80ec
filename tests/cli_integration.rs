//! Integration tests for the chromesync CLI.
//!
//! These tests exercise the binary end-to-end using `assert_cmd`.
//! Keys are passed as base64 flags so no platform key store is needed,
//! and writes use `--force` to skip the interactive confirmation.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_fs::TempDir;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use predicates::prelude::*;

use chromesync::crypto::{self, StateKey};
use chromesync::pipeline::{BatchPolicy, Pipeline};
use chromesync::profile::Browser;
use chromesync::store::{CredentialRecord, CredentialStore, LoginDataStore, LoginMetadata};

const SOURCE_KEY: [u8; 32] = [0x11; 32];
const DEST_KEY: [u8; 32] = [0x22; 32];

/// Helper: get a Command pointing at the chromesync binary.
fn chromesync(cwd: &Path) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("chromesync").expect("binary should exist");
    cmd.current_dir(cwd)
        .env_remove("CHROMESYNC_SOURCE_KEY")
        .env_remove("CHROMESYNC_DEST_KEY")
        .env_remove("RUST_LOG");
    cmd
}

fn b64(key: &[u8; 32]) -> String {
    BASE64.encode(key)
}

fn login(origin: &str, user: &str, password: &str, key: &[u8; 32]) -> CredentialRecord {
    let iv = crypto::generate_iv();
    let s = crypto::encrypt(password.as_bytes(), key, &iv).unwrap();
    CredentialRecord::sealed(
        LoginMetadata {
            origin_url: origin.into(),
            username_value: user.into(),
            signon_realm: origin.into(),
            date_created: 13_340_000_000_000_000,
            ..LoginMetadata::default()
        },
        crypto::encode(&iv, &s.ciphertext, &s.tag),
    )
}

/// A profile folder holding a loose `Login Data` file.
fn profile(root: &Path, name: &str, records: &[CredentialRecord]) -> PathBuf {
    let dir = root.join(name);
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("Login Data");
    LoginDataStore::create_empty(&path).unwrap();
    if !records.is_empty() {
        LoginDataStore.replace(&path, records).unwrap();
    }
    dir
}

/// `Login Data` in a browser's default profile under a user folder.
fn browser_login_data(user: &Path, browser: Browser, records: &[CredentialRecord]) -> PathBuf {
    let dir = browser.user_data_dir(user).join("Default");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("Login Data");
    LoginDataStore::create_empty(&path).unwrap();
    if !records.is_empty() {
        LoginDataStore.replace(&path, records).unwrap();
    }
    path
}

fn passwords_under(path: &Path, key: [u8; 32]) -> Vec<String> {
    let records = LoginDataStore.list(path).unwrap();
    Pipeline::new(BatchPolicy::FailFast)
        .decrypt_all(records, &StateKey::new(key))
        .unwrap()
        .records
        .iter()
        .map(|r| r.plaintext_str().unwrap().to_string())
        .collect()
}

fn source_profile(root: &Path) -> PathBuf {
    profile(
        root,
        "chrome",
        &[
            login("https://mail.example/", "ann", "s3cret", &SOURCE_KEY),
            login("https://shop.example/", "ann", "hunter2", &SOURCE_KEY),
        ],
    )
}

fn migrate_args(from: &Path, to: &Path) -> Vec<String> {
    vec![
        "migrate".into(),
        "--from".into(),
        from.display().to_string(),
        "--to".into(),
        to.display().to_string(),
        "--source-key".into(),
        b64(&SOURCE_KEY),
        "--dest-key".into(),
        b64(&DEST_KEY),
    ]
}

// ---------------------------------------------------------------------------
// Basics
// ---------------------------------------------------------------------------

#[test]
fn help_flag_shows_usage() {
    let tmp = TempDir::new().unwrap();
    chromesync(tmp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Chromium saved logins"))
        .stdout(predicate::str::contains("logins"))
        .stdout(predicate::str::contains("verify"))
        .stdout(predicate::str::contains("migrate"));
}

#[test]
fn version_flag_shows_version() {
    let tmp = TempDir::new().unwrap();
    chromesync(tmp.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("chromesync"));
}

#[test]
fn no_args_shows_help() {
    let tmp = TempDir::new().unwrap();
    chromesync(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn verify_missing_profile_fails() {
    let tmp = TempDir::new().unwrap();
    chromesync(tmp.path())
        .args(["verify", "--profile"])
        .arg(tmp.path().join("nobody"))
        .args(["--key", &b64(&SOURCE_KEY)])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not found"));
}

#[test]
fn malformed_key_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let src = source_profile(tmp.path());
    chromesync(tmp.path())
        .args(["verify", "--profile"])
        .arg(&src)
        .args(["--key", &BASE64.encode([0u8; 16])])
        .assert()
        .failure()
        .stderr(predicate::str::contains("32 bytes"));
}

// ---------------------------------------------------------------------------
// logins / verify
// ---------------------------------------------------------------------------

#[test]
fn logins_masks_passwords_by_default() {
    let tmp = TempDir::new().unwrap();
    let src = source_profile(tmp.path());

    chromesync(tmp.path())
        .args(["logins", "--profile"])
        .arg(&src)
        .args(["--key", &b64(&SOURCE_KEY)])
        .assert()
        .success()
        .stdout(predicate::str::contains("https://mail.example/"))
        .stdout(predicate::str::contains("********"))
        .stdout(predicate::str::contains("s3cret").not());
}

#[test]
fn logins_reads_key_from_environment() {
    let tmp = TempDir::new().unwrap();
    let src = source_profile(tmp.path());

    chromesync(tmp.path())
        .env("CHROMESYNC_SOURCE_KEY", b64(&SOURCE_KEY))
        .args(["logins", "--show-passwords", "--profile"])
        .arg(&src)
        .assert()
        .success()
        .stdout(predicate::str::contains("hunter2"));
}

#[test]
fn verify_passes_with_correct_key() {
    let tmp = TempDir::new().unwrap();
    let src = source_profile(tmp.path());

    chromesync(tmp.path())
        .args(["verify", "--profile"])
        .arg(&src)
        .args(["--key", &b64(&SOURCE_KEY)])
        .assert()
        .success()
        .stdout(predicate::str::contains("All 2 login(s)"));
}

#[test]
fn verify_reports_every_failure_with_wrong_key() {
    let tmp = TempDir::new().unwrap();
    let src = source_profile(tmp.path());

    chromesync(tmp.path())
        .args(["verify", "--profile"])
        .arg(&src)
        .args(["--key", &b64(&DEST_KEY)])
        .assert()
        .failure()
        .stderr(predicate::str::contains("2 login(s) could not be processed"))
        .stderr(predicate::str::contains("2 of 2 login(s) failed verification"));
}

#[test]
fn verify_fail_fast_names_the_first_login() {
    let tmp = TempDir::new().unwrap();
    let src = source_profile(tmp.path());

    chromesync(tmp.path())
        .args(["verify", "--fail-fast", "--profile"])
        .arg(&src)
        .args(["--key", &b64(&DEST_KEY)])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ann :: https://mail.example/"));
}

// ---------------------------------------------------------------------------
// migrate
// ---------------------------------------------------------------------------

#[test]
fn migrate_writes_destination_under_new_key() {
    let tmp = TempDir::new().unwrap();
    let src = source_profile(tmp.path());
    let dst = profile(tmp.path(), "edge", &[]);

    chromesync(tmp.path())
        .args(migrate_args(&src, &dst))
        .arg("--force")
        .assert()
        .success()
        .stdout(predicate::str::contains("Migrated 2 login(s)"));

    let records = LoginDataStore.list(&dst.join("Login Data")).unwrap();
    let opened = Pipeline::new(BatchPolicy::FailFast)
        .decrypt_all(records, &StateKey::new(DEST_KEY))
        .unwrap();
    let passwords: Vec<&str> = opened
        .records
        .iter()
        .map(|r| r.plaintext_str().unwrap())
        .collect();
    assert_eq!(passwords, vec!["s3cret", "hunter2"]);
}

#[cfg(feature = "audit-log")]
#[test]
fn migrate_is_recorded_in_audit_log() {
    let tmp = TempDir::new().unwrap();
    let src = source_profile(tmp.path());
    let dst = profile(tmp.path(), "edge", &[]);

    chromesync(tmp.path())
        .args(migrate_args(&src, &dst))
        .arg("--force")
        .assert()
        .success();

    chromesync(tmp.path())
        .arg("audit")
        .assert()
        .success()
        .stdout(predicate::str::contains("migrate"))
        .stdout(predicate::str::contains("2 of 2 migrated"));
}

#[test]
fn migrate_all_users_rekeys_each_user_folder_in_place() {
    let tmp = TempDir::new().unwrap();
    let users = tmp.path().join("Users");
    for (name, password) in [("alice", "alice-pw"), ("bob", "bob-pw")] {
        let user = users.join(name);
        browser_login_data(
            &user,
            Browser::Chrome,
            &[login("https://mail.example/", name, password, &SOURCE_KEY)],
        );
        browser_login_data(&user, Browser::Edge, &[]);
    }
    // No browser data at all: skipped rather than failing the run.
    std::fs::create_dir_all(users.join("carol")).unwrap();
    std::fs::write(
        tmp.path().join(".chromesync.toml"),
        format!("users_root = {:?}\n", users.display().to_string()),
    )
    .unwrap();

    chromesync(tmp.path())
        .args(["migrate", "--all-users", "--force", "--masterkey", "{guid}:00ff"])
        .args(["--source-key", &b64(&SOURCE_KEY), "--dest-key", &b64(&DEST_KEY)])
        .assert()
        .success()
        .stdout(predicate::str::contains("Migrated 1 login(s)").count(2));

    for (name, password) in [("alice", "alice-pw"), ("bob", "bob-pw")] {
        let edge = Browser::Edge
            .user_data_dir(&users.join(name))
            .join("Default")
            .join("Login Data");
        assert_eq!(passwords_under(&edge, DEST_KEY), vec![password.to_string()]);
    }
}

#[test]
fn migrate_in_place_needs_two_browsers() {
    let tmp = TempDir::new().unwrap();
    let src = source_profile(tmp.path());

    chromesync(tmp.path())
        .args(["migrate", "--force", "--to-browser", "chrome", "--profile"])
        .arg(&src)
        .assert()
        .failure()
        .stderr(predicate::str::contains("two different browsers"));
}

#[test]
fn migrate_dry_run_writes_nothing() {
    let tmp = TempDir::new().unwrap();
    let src = source_profile(tmp.path());
    let dst = profile(tmp.path(), "edge", &[]);

    chromesync(tmp.path())
        .args(migrate_args(&src, &dst))
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry run: 2 of 2"));

    assert!(LoginDataStore.list(&dst.join("Login Data")).unwrap().is_empty());
}

#[test]
fn migrate_into_same_file_is_refused() {
    let tmp = TempDir::new().unwrap();
    let src = source_profile(tmp.path());

    chromesync(tmp.path())
        .args(migrate_args(&src, &src))
        .arg("--force")
        .assert()
        .failure()
        .stderr(predicate::str::contains("same Login Data"));
}

#[test]
fn migrate_without_keys_or_local_state_fails() {
    let tmp = TempDir::new().unwrap();
    let src = source_profile(tmp.path());
    let dst = profile(tmp.path(), "edge", &[]);

    chromesync(tmp.path())
        .args(["migrate", "--force", "--from"])
        .arg(&src)
        .arg("--to")
        .arg(&dst)
        .assert()
        .failure()
        .stderr(predicate::str::contains("State key unavailable"));
}

#[cfg(feature = "audit-log")]
#[test]
fn audit_on_fresh_directory_is_empty() {
    let tmp = TempDir::new().unwrap();
    chromesync(tmp.path())
        .arg("audit")
        .assert()
        .success()
        .stdout(predicate::str::contains("No audit entries"));
}
