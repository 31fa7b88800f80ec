//! SQLite-backed access to a Chromium `Login Data` file.
//!
//! Reads copy the file to a temporary snapshot first, so a profile whose
//! browser is running (and holding SQLite's lock) can still be listed and
//! is never modified by `list`.  Writes upsert on the `logins` table's
//! unique key (origin, username/password elements, username, realm)
//! inside a single transaction.

use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;

use rusqlite::{params, Connection, OpenFlags, Row};
use tempfile::NamedTempFile;

use super::record::{CredentialRecord, LoginMetadata};
use super::CredentialStore;
use crate::errors::{ChromeSyncError, Result};

/// Columns read and written, in this order, by every query below.
const COLUMNS: &str = "origin_url, action_url, username_element, username_value, \
     password_element, password_value, submit_element, signon_realm, date_created, \
     blacklisted_by_user, scheme, password_type, times_used, date_last_used, \
     date_password_modified, display_name, icon_url, federation_url";

/// Subset of Chromium's `logins` schema that this crate reads and writes.
const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS logins (
    origin_url              VARCHAR NOT NULL,
    action_url              VARCHAR,
    username_element        VARCHAR,
    username_value          VARCHAR,
    password_element        VARCHAR,
    password_value          BLOB,
    submit_element          VARCHAR,
    signon_realm            VARCHAR NOT NULL,
    date_created            INTEGER NOT NULL,
    blacklisted_by_user     INTEGER NOT NULL,
    scheme                  INTEGER NOT NULL,
    password_type           INTEGER,
    times_used              INTEGER,
    form_data               BLOB,
    display_name            VARCHAR,
    icon_url                VARCHAR,
    federation_url          VARCHAR,
    skip_zero_click         INTEGER,
    generation_upload_status INTEGER,
    possible_username_pairs BLOB,
    id                      INTEGER PRIMARY KEY AUTOINCREMENT,
    date_last_used          INTEGER NOT NULL DEFAULT 0,
    moving_blocked_for      BLOB,
    date_password_modified  INTEGER NOT NULL DEFAULT 0,
    UNIQUE (origin_url, username_element, username_value, password_element, signon_realm)
);";

/// `CredentialStore` over Chromium's SQLite `Login Data` format.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoginDataStore;

impl LoginDataStore {
    pub fn new() -> Self {
        Self
    }

    /// Create an empty `Login Data` database with the `logins` table.
    pub fn create_empty(path: &Path) -> Result<()> {
        let conn = Connection::open(path)
            .map_err(|e| ChromeSyncError::WriteError(format!("create {}: {e}", path.display())))?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| ChromeSyncError::WriteError(format!("create logins table: {e}")))?;
        Ok(())
    }

    /// Map filesystem-level failures before SQLite gets a chance to
    /// report them less precisely.
    fn check_readable(path: &Path) -> Result<()> {
        Self::open_source(path).map(drop)
    }

    fn open_source(path: &Path) -> Result<File> {
        match File::open(path) {
            Ok(file) => Ok(file),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(ChromeSyncError::NotFound(path.to_path_buf()))
            }
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                Err(ChromeSyncError::AccessDenied(path.to_path_buf()))
            }
            Err(e) => Err(ChromeSyncError::Io(e)),
        }
    }

    /// Copy `path` into a temporary file that nothing else holds open.
    fn snapshot(path: &Path) -> Result<NamedTempFile> {
        let mut source = Self::open_source(path)?;
        let mut snapshot = NamedTempFile::new()?;
        std::io::copy(&mut source, snapshot.as_file_mut())?;
        snapshot.as_file().sync_all()?;
        Ok(snapshot)
    }
}

impl CredentialStore for LoginDataStore {
    fn list(&self, path: &Path) -> Result<Vec<CredentialRecord>> {
        let snapshot = Self::snapshot(path)?;

        let conn = Connection::open_with_flags(
            snapshot.path(),
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| ChromeSyncError::Store(format!("open {}: {e}", path.display())))?;

        let mut stmt = conn
            .prepare(&format!("SELECT {COLUMNS} FROM logins ORDER BY id"))
            .map_err(|e| ChromeSyncError::Store(format!("query prepare: {e}")))?;

        let rows = stmt
            .query_map([], read_row)
            .map_err(|e| ChromeSyncError::Store(format!("query exec: {e}")))?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row.map_err(|e| ChromeSyncError::Store(format!("row parse: {e}")))?);
        }

        tracing::debug!(path = %path.display(), count = records.len(), "listed logins");
        Ok(records)
    }

    fn replace(&self, path: &Path, records: &[CredentialRecord]) -> Result<usize> {
        // Refuse the whole batch before touching the file.
        if let Some(open) = records.iter().find(|r| !r.is_sealed()) {
            return Err(ChromeSyncError::InvalidArgument(format!(
                "refusing to write plaintext secret for {}",
                open.identity()
            )));
        }

        Self::check_readable(path)?;

        let mut conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_WRITE)
            .map_err(|e| ChromeSyncError::WriteError(format!("open {}: {e}", path.display())))?;

        let tx = conn
            .transaction()
            .map_err(|e| ChromeSyncError::WriteError(format!("begin transaction: {e}")))?;

        {
            let mut stmt = tx
                .prepare(&format!(
                    "INSERT OR REPLACE INTO logins ({COLUMNS}) VALUES \
                     (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)"
                ))
                .map_err(|e| ChromeSyncError::WriteError(format!("insert prepare: {e}")))?;

            for record in records {
                let m = &record.metadata;
                stmt.execute(params![
                    m.origin_url,
                    m.action_url,
                    m.username_element,
                    m.username_value,
                    m.password_element,
                    record.raw_secret(),
                    m.submit_element,
                    m.signon_realm,
                    m.date_created,
                    m.blacklisted_by_user,
                    m.scheme,
                    m.password_type,
                    m.times_used,
                    m.date_last_used,
                    m.date_password_modified,
                    m.display_name,
                    m.icon_url,
                    m.federation_url,
                ])
                .map_err(|e| {
                    ChromeSyncError::WriteError(format!("upsert {}: {e}", record.identity()))
                })?;
            }
        }

        tx.commit()
            .map_err(|e| ChromeSyncError::WriteError(format!("commit: {e}")))?;

        tracing::debug!(path = %path.display(), count = records.len(), "replaced logins");
        Ok(records.len())
    }
}

/// Read one `logins` row. Nullable text columns collapse to "".
fn read_row(row: &Row<'_>) -> rusqlite::Result<CredentialRecord> {
    let text = |idx: usize| -> rusqlite::Result<String> {
        Ok(row.get::<_, Option<String>>(idx)?.unwrap_or_default())
    };
    let int = |idx: usize| -> rusqlite::Result<i64> {
        Ok(row.get::<_, Option<i64>>(idx)?.unwrap_or_default())
    };

    let metadata = LoginMetadata {
        origin_url: text(0)?,
        action_url: text(1)?,
        username_element: text(2)?,
        username_value: text(3)?,
        password_element: text(4)?,
        submit_element: text(6)?,
        signon_realm: text(7)?,
        date_created: int(8)?,
        blacklisted_by_user: int(9)?,
        scheme: int(10)?,
        password_type: int(11)?,
        times_used: int(12)?,
        date_last_used: int(13)?,
        date_password_modified: int(14)?,
        display_name: text(15)?,
        icon_url: text(16)?,
        federation_url: text(17)?,
    };
    let raw: Option<Vec<u8>> = row.get(5)?;

    Ok(CredentialRecord::sealed(metadata, raw.unwrap_or_default()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use zeroize::Zeroizing;

    fn metadata(origin: &str, user: &str) -> LoginMetadata {
        LoginMetadata {
            origin_url: origin.into(),
            username_value: user.into(),
            signon_realm: origin.into(),
            date_created: 13_300_000_000_000_000,
            times_used: 3,
            ..LoginMetadata::default()
        }
    }

    #[test]
    fn list_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let result = LoginDataStore.list(&dir.path().join("Login Data"));
        assert!(matches!(result, Err(ChromeSyncError::NotFound(_))));
    }

    #[test]
    fn replace_then_list_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Login Data");
        LoginDataStore::create_empty(&path).unwrap();

        let records = vec![
            CredentialRecord::sealed(metadata("https://a.example/", "ann"), b"v10aaa".to_vec()),
            CredentialRecord::sealed(metadata("https://b.example/", "ben"), b"v10bbb".to_vec()),
        ];
        assert_eq!(LoginDataStore.replace(&path, &records).unwrap(), 2);

        let listed = LoginDataStore.list(&path).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].metadata, records[0].metadata);
        assert_eq!(listed[1].raw_secret(), Some(&b"v10bbb"[..]));
    }

    #[test]
    fn list_reads_a_database_held_by_a_running_browser() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Login Data");
        LoginDataStore::create_empty(&path).unwrap();
        let record = CredentialRecord::sealed(metadata("https://a.example/", "ann"), b"v10a".to_vec());
        LoginDataStore.replace(&path, &[record]).unwrap();

        // The browser keeps an exclusive lock once it has written.
        let browser = Connection::open(&path).unwrap();
        let mode: String = browser
            .query_row("PRAGMA locking_mode = EXCLUSIVE", [], |row| row.get(0))
            .unwrap();
        assert_eq!(mode, "exclusive");
        browser
            .execute("UPDATE logins SET times_used = times_used + 1", [])
            .unwrap();

        let listed = LoginDataStore.list(&path).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].metadata.times_used, 4);
        drop(browser);
    }

    #[test]
    fn replace_upserts_on_identity() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Login Data");
        LoginDataStore::create_empty(&path).unwrap();

        let first = CredentialRecord::sealed(metadata("https://a.example/", "ann"), b"old".to_vec());
        LoginDataStore.replace(&path, &[first]).unwrap();

        let second = CredentialRecord::sealed(metadata("https://a.example/", "ann"), b"new".to_vec());
        LoginDataStore.replace(&path, &[second]).unwrap();

        let listed = LoginDataStore.list(&path).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].raw_secret(), Some(&b"new"[..]));
    }

    #[test]
    fn replace_refuses_plaintext() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Login Data");
        LoginDataStore::create_empty(&path).unwrap();

        let mut record = CredentialRecord::sealed(metadata("https://a.example/", "ann"), vec![]);
        record.reveal(Zeroizing::new(b"cleartext".to_vec()));

        let result = LoginDataStore.replace(&path, &[record]);
        assert!(matches!(result, Err(ChromeSyncError::InvalidArgument(_))));
        assert!(LoginDataStore.list(&path).unwrap().is_empty());
    }

    #[test]
    fn replace_into_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let record = CredentialRecord::sealed(metadata("https://a.example/", "ann"), vec![1]);
        let result = LoginDataStore.replace(&dir.path().join("missing"), &[record]);
        assert!(matches!(result, Err(ChromeSyncError::NotFound(_))));
    }

    #[test]
    fn list_tolerates_null_columns() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Login Data");
        LoginDataStore::create_empty(&path).unwrap();

        let conn = Connection::open(&path).unwrap();
        conn.execute(
            "INSERT INTO logins (origin_url, signon_realm, date_created, blacklisted_by_user, scheme)
             VALUES ('https://n.example/', 'https://n.example/', 0, 0, 0)",
            [],
        )
        .unwrap();
        drop(conn);

        let listed = LoginDataStore.list(&path).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].metadata.username_value, "");
        assert_eq!(listed[0].raw_secret(), Some(&[][..]));
    }
}
