//! Audit log — SQLite-based history of migration runs.
//!
//! Stores a record of every `verify` and `migrate` run in a local SQLite
//! database at `<audit_dir>/audit.db`.  Entries hold browsers, profile
//! paths and counts; never logins, keys or passwords.
//!
//! Designed for graceful degradation: if the database can't be opened or
//! written to, operations silently continue without logging.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::Connection;

use crate::errors::{ChromeSyncError, Result};

/// A single audit log entry.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub operation: String,
    /// Browser or `source -> destination` pair the run targeted.
    pub target: String,
    pub profile: Option<String>,
    pub details: Option<String>,
}

/// SQLite-backed audit log.
pub struct AuditLog {
    conn: Connection,
}

impl AuditLog {
    /// Open (or create) the audit database at `<audit_dir>/audit.db`.
    ///
    /// Returns `None` if the database can't be opened — callers should
    /// treat this as "audit logging unavailable" and continue normally.
    pub fn open(audit_dir: &Path) -> Option<Self> {
        let db_path = Self::db_path(audit_dir);
        let conn = Connection::open(&db_path).ok()?;

        // Owner-only: the log names profile paths.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            let _ = std::fs::set_permissions(&db_path, perms);
        }

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS audit_log (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp   TEXT NOT NULL,
                operation   TEXT NOT NULL,
                target      TEXT NOT NULL,
                profile     TEXT,
                details     TEXT
            );",
        )
        .ok()?;

        Some(Self { conn })
    }

    /// Record an operation. Fire-and-forget — errors are silently ignored.
    pub fn log(&self, operation: &str, target: &str, profile: Option<&str>, details: Option<&str>) {
        let now = Utc::now().to_rfc3339();
        let _ = self.conn.execute(
            "INSERT INTO audit_log (timestamp, operation, target, profile, details)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![now, operation, target, profile, details],
        );
    }

    /// Query recent audit entries.
    ///
    /// - `limit`: maximum number of entries to return (most recent first).
    /// - `since`: if provided, only return entries newer than this timestamp.
    pub fn query(&self, limit: usize, since: Option<DateTime<Utc>>) -> Result<Vec<AuditEntry>> {
        let limit_i64 = i64::try_from(limit).unwrap_or(i64::MAX);
        let since_str = since.map(|ts| ts.to_rfc3339());

        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, timestamp, operation, target, profile, details
                 FROM audit_log
                 WHERE ?1 IS NULL OR timestamp >= ?1
                 ORDER BY id DESC
                 LIMIT ?2",
            )
            .map_err(|e| ChromeSyncError::AuditError(format!("query prepare: {e}")))?;

        let rows = stmt
            .query_map(rusqlite::params![since_str, limit_i64], |row| {
                let ts_str: String = row.get(1)?;
                let timestamp = DateTime::parse_from_rfc3339(&ts_str)
                    .map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc));

                Ok(AuditEntry {
                    id: row.get(0)?,
                    timestamp,
                    operation: row.get(2)?,
                    target: row.get(3)?,
                    profile: row.get(4)?,
                    details: row.get(5)?,
                })
            })
            .map_err(|e| ChromeSyncError::AuditError(format!("query exec: {e}")))?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row.map_err(|e| ChromeSyncError::AuditError(format!("row parse: {e}")))?);
        }

        Ok(entries)
    }

    /// Return the path to the audit database.
    pub fn db_path(audit_dir: &Path) -> PathBuf {
        audit_dir.join("audit.db")
    }
}

/// Convenience helper: log an audit event, creating `audit_dir` if needed.
///
/// Never fails the parent operation.
pub fn log_audit(
    audit_dir: &Path,
    op: &str,
    target: &str,
    profile: Option<&str>,
    details: Option<&str>,
) {
    if std::fs::create_dir_all(audit_dir).is_err() {
        tracing::debug!(dir = %audit_dir.display(), "audit directory unavailable");
        return;
    }

    if let Some(audit) = AuditLog::open(audit_dir) {
        audit.log(op, target, profile, details);
    }
}
