//! Credential value codec.
//!
//! This module provides:
//! - The `v10` blob layout: format detection, decode and encode (`blob`)
//! - AES-256-GCM encrypt/decrypt with caller-supplied IVs (`encryption`)
//! - Zeroizing state keys and operator master keys (`keys`)
//! - The platform key store boundary for legacy values (`legacy`)

pub mod blob;
pub mod encryption;
pub mod keys;
pub mod legacy;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{decode, decrypt, StateKey, ...};
pub use blob::{decode, detect_format, encode, EncryptedBlob, Format};
pub use encryption::{decrypt, encrypt, generate_iv, Sealed};
pub use keys::{MasterKeys, StateKey};
pub use legacy::{KeyUnwrapper, LegacyDecryptor, UnavailablePlatformStore};
