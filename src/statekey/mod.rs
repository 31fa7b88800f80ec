//! Resolving a profile's AES state key.
//!
//! Chromium keeps the key in `Local State` as
//! `os_crypt.encrypted_key = base64("DPAPI" || wrapped)`.  Unwrapping
//! `wrapped` needs the platform key store and is delegated to a
//! [`KeyUnwrapper`]; everything around it lives here.

use std::fs;
use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;
use zeroize::Zeroizing;

use crate::crypto::{KeyUnwrapper, MasterKeys, StateKey};
use crate::errors::{ChromeSyncError, Result};
use crate::profile::Browser;

/// Prefix marking a platform-protected key in `Local State`.
const WRAPPED_KEY_PREFIX: &[u8] = b"DPAPI";

/// Resolves the 32-byte state key for one profile.
pub trait StateKeyProvider {
    fn resolve(&self, profile: &Path, master_keys: &MasterKeys) -> Result<StateKey>;
}

// ---------------------------------------------------------------------------
// Local State
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct LocalState {
    os_crypt: Option<OsCrypt>,
}

#[derive(Deserialize)]
struct OsCrypt {
    encrypted_key: Option<String>,
}

/// Extract the still-wrapped key bytes from a `Local State` document.
pub fn wrapped_key_from_local_state(json: &str) -> Result<Vec<u8>> {
    let state: LocalState = serde_json::from_str(json)
        .map_err(|e| ChromeSyncError::KeyUnavailable(format!("Local State is not valid JSON: {e}")))?;

    let encoded = state
        .os_crypt
        .and_then(|o| o.encrypted_key)
        .ok_or_else(|| {
            ChromeSyncError::KeyUnavailable("Local State has no os_crypt.encrypted_key".into())
        })?;

    let decoded = BASE64.decode(encoded.trim()).map_err(|e| {
        ChromeSyncError::KeyUnavailable(format!("os_crypt.encrypted_key is not base64: {e}"))
    })?;

    decoded
        .strip_prefix(WRAPPED_KEY_PREFIX)
        .map(<[u8]>::to_vec)
        .ok_or_else(|| {
            ChromeSyncError::KeyUnavailable("encrypted_key does not start with DPAPI prefix".into())
        })
}

/// Reads `Local State` from the profile and unwraps it.
pub struct LocalStateKeyProvider<U> {
    browser: Browser,
    unwrapper: U,
}

impl<U: KeyUnwrapper> LocalStateKeyProvider<U> {
    pub fn new(browser: Browser, unwrapper: U) -> Self {
        Self { browser, unwrapper }
    }
}

impl<U: KeyUnwrapper> StateKeyProvider for LocalStateKeyProvider<U> {
    fn resolve(&self, profile: &Path, master_keys: &MasterKeys) -> Result<StateKey> {
        let path = self.browser.local_state_path(profile).map_err(|_| {
            ChromeSyncError::KeyUnavailable(format!(
                "no {} Local State under {}",
                self.browser,
                profile.display()
            ))
        })?;

        let json = fs::read_to_string(&path).map_err(|e| {
            ChromeSyncError::KeyUnavailable(format!("cannot read {}: {e}", path.display()))
        })?;

        let wrapped = Zeroizing::new(wrapped_key_from_local_state(&json)?);
        let raw = self.unwrapper.unwrap_key(&wrapped, master_keys)?;

        tracing::debug!(path = %path.display(), "state key unwrapped");
        StateKey::from_slice(&raw)
    }
}

// ---------------------------------------------------------------------------
// Pre-resolved keys
// ---------------------------------------------------------------------------

/// A key the operator already has, used for every profile.
#[derive(Debug, Clone)]
pub struct StaticKeyProvider {
    key: StateKey,
}

impl StaticKeyProvider {
    pub fn new(key: StateKey) -> Self {
        Self { key }
    }
}

impl StateKeyProvider for StaticKeyProvider {
    fn resolve(&self, profile: &Path, _master_keys: &MasterKeys) -> Result<StateKey> {
        tracing::debug!(profile = %profile.display(), "using supplied state key");
        Ok(self.key.clone())
    }
}
