//! Saved-login records as read from a browser's `Login Data` database.
//!
//! A record's identity-bearing columns are carried in [`LoginMetadata`]
//! and pass through every transform untouched.  Only [`Secret`] changes
//! state: sealed at rest, revealed transiently, sealed again before it
//! is written anywhere.

use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use zeroize::Zeroizing;

/// Seconds between 1601-01-01 (Chromium epoch) and 1970-01-01.
const CHROME_EPOCH_OFFSET_SECS: i64 = 11_644_473_600;

/// Origin and username of a login, enough to point at it in an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordIdentity {
    pub origin_url: String,
    pub username: String,
}

impl fmt::Display for RecordIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} :: {}", self.username, self.origin_url)
    }
}

/// Every non-secret column of a `logins` row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginMetadata {
    pub origin_url: String,
    pub action_url: String,
    pub username_element: String,
    pub username_value: String,
    pub password_element: String,
    pub submit_element: String,
    pub signon_realm: String,
    /// Microseconds since 1601-01-01 UTC.
    pub date_created: i64,
    pub blacklisted_by_user: i64,
    pub scheme: i64,
    pub password_type: i64,
    pub times_used: i64,
    pub date_last_used: i64,
    pub date_password_modified: i64,
    pub display_name: String,
    pub icon_url: String,
    pub federation_url: String,
}

/// The password column in one of its two lifecycle states.
#[derive(Clone)]
pub enum Secret {
    /// Raw encrypted bytes exactly as stored (legacy or `v10`).
    Sealed(Vec<u8>),
    /// Decrypted plaintext, zeroed on drop. Never persisted.
    Revealed(Zeroizing<Vec<u8>>),
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sealed(raw) => write!(f, "Sealed({} bytes)", raw.len()),
            Self::Revealed(_) => f.write_str("Revealed(<redacted>)"),
        }
    }
}

/// One stored login.
#[derive(Debug, Clone)]
pub struct CredentialRecord {
    pub metadata: LoginMetadata,
    pub secret: Secret,
}

impl CredentialRecord {
    /// Build a record fresh from the store, with its secret still sealed.
    pub fn sealed(metadata: LoginMetadata, raw: Vec<u8>) -> Self {
        Self {
            metadata,
            secret: Secret::Sealed(raw),
        }
    }

    pub fn identity(&self) -> RecordIdentity {
        RecordIdentity {
            origin_url: self.metadata.origin_url.clone(),
            username: self.metadata.username_value.clone(),
        }
    }

    /// The stored encrypted bytes, if the secret is sealed.
    pub fn raw_secret(&self) -> Option<&[u8]> {
        match &self.secret {
            Secret::Sealed(raw) => Some(raw),
            Secret::Revealed(_) => None,
        }
    }

    /// The decrypted bytes, if the secret has been revealed.
    pub fn plaintext(&self) -> Option<&[u8]> {
        match &self.secret {
            Secret::Sealed(_) => None,
            Secret::Revealed(plain) => Some(plain.as_slice()),
        }
    }

    /// The decrypted password as text, if revealed and valid UTF-8.
    pub fn plaintext_str(&self) -> Option<&str> {
        self.plaintext().and_then(|p| std::str::from_utf8(p).ok())
    }

    pub fn is_sealed(&self) -> bool {
        matches!(self.secret, Secret::Sealed(_))
    }

    /// Attach decrypted plaintext, replacing the sealed bytes.
    pub fn reveal(&mut self, plaintext: Zeroizing<Vec<u8>>) {
        self.secret = Secret::Revealed(plaintext);
    }

    /// Replace the plaintext with freshly encrypted bytes. The old
    /// plaintext buffer is zeroed as it drops.
    pub fn seal(&mut self, raw: Vec<u8>) {
        self.secret = Secret::Sealed(raw);
    }
}

// ---------------------------------------------------------------------------
// Chromium timestamps
// ---------------------------------------------------------------------------

/// Convert a Chromium timestamp (µs since 1601) to UTC.
///
/// Returns `None` for zero ("never") or out-of-range values.
pub fn chrome_time_to_utc(micros: i64) -> Option<DateTime<Utc>> {
    if micros <= 0 {
        return None;
    }
    let secs = micros.div_euclid(1_000_000) - CHROME_EPOCH_OFFSET_SECS;
    let nanos = u32::try_from(micros.rem_euclid(1_000_000) * 1_000).ok()?;
    Utc.timestamp_opt(secs, nanos).single()
}

/// Convert a UTC timestamp to Chromium's µs-since-1601 representation.
pub fn utc_to_chrome_time(at: DateTime<Utc>) -> i64 {
    (at.timestamp() + CHROME_EPOCH_OFFSET_SECS) * 1_000_000 + i64::from(at.timestamp_subsec_micros())
}
