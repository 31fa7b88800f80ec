//! Key material consumed by the codec.
//!
//! A [`StateKey`] is the raw AES-256 key unwrapped from a profile's
//! `Local State` file.  It lives only for the duration of a batch and
//! zeroes its memory when dropped.

use std::collections::HashMap;
use std::fmt;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use zeroize::{Zeroize, Zeroizing};

use crate::errors::{ChromeSyncError, Result};

/// Length of a state key in bytes (256 bits, for AES-256).
pub const STATE_KEY_LEN: usize = 32;

/// A 32-byte AES-256-GCM key scoped to one browser profile.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct StateKey {
    bytes: [u8; STATE_KEY_LEN],
}

impl StateKey {
    /// Create a `StateKey` from an exact-size array.
    pub fn new(bytes: [u8; STATE_KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Validate and copy key bytes of unknown length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; STATE_KEY_LEN] = bytes.try_into().map_err(|_| {
            ChromeSyncError::InvalidArgument(format!(
                "state key must be exactly {STATE_KEY_LEN} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self { bytes })
    }

    /// Parse a base64-encoded key (as passed on the command line).
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let decoded = Zeroizing::new(BASE64.decode(encoded.trim()).map_err(|e| {
            ChromeSyncError::InvalidArgument(format!("state key is not valid base64: {e}"))
        })?);
        Self::from_slice(&decoded)
    }

    /// Access the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; STATE_KEY_LEN] {
        &self.bytes
    }
}

impl fmt::Debug for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StateKey(<redacted>)")
    }
}

/// Platform master keys supplied by the operator, keyed by GUID.
///
/// Opaque to this crate; handed through to the platform unwrapper.
#[derive(Default, Clone)]
pub struct MasterKeys {
    keys: HashMap<String, String>,
}

impl MasterKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, guid: impl Into<String>, sha1: impl Into<String>) {
        self.keys.insert(guid.into(), sha1.into());
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }
}

impl fmt::Debug for MasterKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MasterKeys({} entries)", self.keys.len())
    }
}
