//! Store module — saved-login records and where they live.
//!
//! This module provides:
//! - `CredentialRecord`, `LoginMetadata` and `Secret` types (`record`)
//! - The SQLite `Login Data` backend (`login_data`)

pub mod login_data;
pub mod record;

use std::path::Path;

use crate::errors::Result;

// Re-export the most commonly used items.
pub use login_data::LoginDataStore;
pub use record::{
    chrome_time_to_utc, utc_to_chrome_time, CredentialRecord, LoginMetadata, RecordIdentity,
    Secret,
};

/// Lists and upserts saved logins in a credential database file.
pub trait CredentialStore {
    /// Read every record, secrets still sealed.
    ///
    /// Fails with `NotFound` or `AccessDenied` when the file cannot be read.
    fn list(&self, path: &Path) -> Result<Vec<CredentialRecord>>;

    /// Upsert records by their identity columns. Returns the number written.
    ///
    /// Fails with `WriteError`; never writes a record whose secret is revealed.
    fn replace(&self, path: &Path, records: &[CredentialRecord]) -> Result<usize>;
}
