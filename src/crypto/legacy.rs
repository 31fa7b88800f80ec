//! Seam for values protected only by the platform key store.
//!
//! Pre-`v10` credentials and the wrapped key inside `Local State` are
//! both unwrapped by an OS service this crate does not implement.  The
//! traits here are the boundary; callers plug in a real implementation.

use zeroize::Zeroizing;

use super::keys::MasterKeys;
use crate::errors::{ChromeSyncError, Result};

/// Decrypts a legacy (non-`v10`) credential value.
pub trait LegacyDecryptor {
    fn decrypt_legacy(&self, raw: &[u8], master_keys: &MasterKeys) -> Result<Zeroizing<Vec<u8>>>;
}

/// Unwraps the platform-protected key stored in `Local State`.
pub trait KeyUnwrapper {
    fn unwrap_key(&self, wrapped: &[u8], master_keys: &MasterKeys) -> Result<Zeroizing<Vec<u8>>>;
}

/// Stand-in used when no platform key store is available on this host.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailablePlatformStore;

impl LegacyDecryptor for UnavailablePlatformStore {
    fn decrypt_legacy(&self, _raw: &[u8], _master_keys: &MasterKeys) -> Result<Zeroizing<Vec<u8>>> {
        Err(ChromeSyncError::ExternalDecryptionFailed(
            "no platform key store available on this host".into(),
        ))
    }
}

impl KeyUnwrapper for UnavailablePlatformStore {
    fn unwrap_key(&self, _wrapped: &[u8], _master_keys: &MasterKeys) -> Result<Zeroizing<Vec<u8>>> {
        Err(ChromeSyncError::KeyUnavailable(
            "no platform key store available to unwrap Local State key".into(),
        ))
    }
}
