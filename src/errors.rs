use std::path::PathBuf;
use thiserror::Error;

use crate::store::RecordIdentity;

/// All errors that can occur in chromesync.
///
/// Variants never carry key material, plaintext or ciphertext bytes.
/// Per-record failures are wrapped in [`ChromeSyncError::Record`] so the
/// caller knows which login failed without seeing what it contained.
#[derive(Debug, Error)]
pub enum ChromeSyncError {
    // --- Codec errors ---
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid blob format: {0}")]
    Format(String),

    #[error("Decryption failed — wrong key or corrupted credential")]
    DecryptionFailed,

    #[error("Round-trip integrity check failed — codec defect or tampered credential")]
    IntegrityMismatch,

    // --- Collaborator errors (propagated verbatim) ---
    #[error("Platform key store could not decrypt legacy credential: {0}")]
    ExternalDecryptionFailed(String),

    #[error("State key unavailable: {0}")]
    KeyUnavailable(String),

    #[error("Not found: {0}")]
    NotFound(PathBuf),

    #[error("Access denied: {0}")]
    AccessDenied(PathBuf),

    #[error("Write to credential store failed: {0}")]
    WriteError(String),

    #[error("Credential store error: {0}")]
    Store(String),

    // --- Batch errors ---
    #[error("{operation} failed for {identity}: {source}")]
    Record {
        identity: RecordIdentity,
        operation: &'static str,
        #[source]
        source: Box<ChromeSyncError>,
    },

    #[error("Batch interrupted after {0} record(s)")]
    Interrupted(usize),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    ConfigError(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("Audit error: {0}")]
    AuditError(String),
}

impl ChromeSyncError {
    /// Wrap `self` with the identity of the record it happened on.
    pub fn for_record(self, identity: RecordIdentity, operation: &'static str) -> Self {
        Self::Record {
            identity,
            operation,
            source: Box::new(self),
        }
    }

    /// Returns `true` for failures that must abort a whole batch
    /// regardless of the configured policy.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::IntegrityMismatch | Self::Interrupted(_) => true,
            Self::Record { source, .. } => source.is_fatal(),
            _ => false,
        }
    }

    /// The innermost error, skipping any record context.
    pub fn root(&self) -> &ChromeSyncError {
        match self {
            Self::Record { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Convenience type alias for chromesync results.
pub type Result<T> = std::result::Result<T, ChromeSyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> RecordIdentity {
        RecordIdentity {
            origin_url: "https://example.com/login".into(),
            username: "alice".into(),
        }
    }

    #[test]
    fn integrity_mismatch_is_fatal_even_when_wrapped() {
        let err = ChromeSyncError::IntegrityMismatch.for_record(identity(), "verify");
        assert!(err.is_fatal());
        assert!(matches!(err.root(), ChromeSyncError::IntegrityMismatch));
    }

    #[test]
    fn decryption_failure_is_recoverable() {
        let err = ChromeSyncError::DecryptionFailed.for_record(identity(), "decrypt");
        assert!(!err.is_fatal());
    }

    #[test]
    fn record_error_names_the_login() {
        let err = ChromeSyncError::DecryptionFailed.for_record(identity(), "decrypt");
        let msg = err.to_string();
        assert!(msg.contains("alice"));
        assert!(msg.contains("https://example.com/login"));
        assert!(msg.contains("decrypt"));
    }
}
