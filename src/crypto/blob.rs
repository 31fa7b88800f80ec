//! On-disk layout of an encrypted Chromium credential value.
//!
//! A versioned (`v10`) value has this layout:
//!
//! ```text
//! [v10: 3 bytes][IV: 12 bytes][ciphertext: N bytes][GCM tag: 16 bytes]
//! ```
//!
//! Anything that does not start with the `v10` marker is a legacy value,
//! protected only by the platform key store and opaque to this module.

use crate::errors::{ChromeSyncError, Result};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Version marker at the start of every locally-keyed value.
pub const MAGIC: &[u8; 3] = b"v10";

/// Size of the AES-256-GCM IV in bytes.
pub const IV_LEN: usize = 12;

/// Size of the AES-256-GCM authentication tag in bytes.
pub const TAG_LEN: usize = 16;

/// Smallest well-formed versioned value: magic + IV + empty ciphertext + tag.
pub const MIN_VERSIONED_LEN: usize = MAGIC.len() + IV_LEN + TAG_LEN;

/// Byte offset where the ciphertext begins.
const CIPHERTEXT_OFFSET: usize = MAGIC.len() + IV_LEN;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Which encryption scheme protects a raw credential value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Platform-protected only, no local AEAD wrapper.
    Legacy,
    /// `v10` AES-256-GCM under the profile's state key.
    Versioned,
}

/// A decoded versioned value, split into its AEAD parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedBlob {
    pub iv: [u8; IV_LEN],
    pub ciphertext: Vec<u8>,
    pub tag: [u8; TAG_LEN],
}

impl EncryptedBlob {
    /// Serialize back to the on-disk layout.
    pub fn to_bytes(&self) -> Vec<u8> {
        encode(&self.iv, &self.ciphertext, &self.tag)
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Inspect the first three bytes of `raw` to tell the two schemes apart.
pub fn detect_format(raw: &[u8]) -> Format {
    if raw.starts_with(MAGIC) {
        Format::Versioned
    } else {
        Format::Legacy
    }
}

/// Split a raw versioned value into IV, ciphertext and tag.
pub fn decode(raw: &[u8]) -> Result<EncryptedBlob> {
    if raw.len() < MIN_VERSIONED_LEN {
        return Err(ChromeSyncError::Format(format!(
            "value is {} bytes, versioned values need at least {MIN_VERSIONED_LEN}",
            raw.len()
        )));
    }

    if detect_format(raw) != Format::Versioned {
        return Err(ChromeSyncError::Format("missing v10 version marker".into()));
    }

    let tag_offset = raw.len() - TAG_LEN;

    let mut iv = [0u8; IV_LEN];
    iv.copy_from_slice(&raw[MAGIC.len()..CIPHERTEXT_OFFSET]);

    let mut tag = [0u8; TAG_LEN];
    tag.copy_from_slice(&raw[tag_offset..]);

    Ok(EncryptedBlob {
        iv,
        ciphertext: raw[CIPHERTEXT_OFFSET..tag_offset].to_vec(),
        tag,
    })
}

/// Concatenate magic, IV, ciphertext and tag, in that order.
pub fn encode(iv: &[u8; IV_LEN], ciphertext: &[u8], tag: &[u8; TAG_LEN]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(MIN_VERSIONED_LEN + ciphertext.len());

    buf.extend_from_slice(MAGIC); // 3 bytes
    buf.extend_from_slice(iv); // 12 bytes
    buf.extend_from_slice(ciphertext); // N bytes
    buf.extend_from_slice(tag); // 16 bytes

    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_raw(ciphertext_len: usize) -> Vec<u8> {
        let mut raw = MAGIC.to_vec();
        raw.extend((0..IV_LEN as u8).map(|b| b + 1));
        raw.extend(std::iter::repeat(0x5A).take(ciphertext_len));
        raw.extend((0..TAG_LEN as u8).map(|b| 0xF0 ^ b));
        raw
    }

    #[test]
    fn detects_versioned_marker() {
        assert_eq!(detect_format(b"v10abc"), Format::Versioned);
        assert_eq!(detect_format(b"v11abc"), Format::Legacy);
        assert_eq!(detect_format(&[0x01, 0x00, 0x00, 0x00]), Format::Legacy);
        assert_eq!(detect_format(b""), Format::Legacy);
    }

    #[test]
    fn decode_splits_at_fixed_offsets() {
        let raw = sample_raw(7);
        let blob = decode(&raw).unwrap();

        assert_eq!(&blob.iv[..], &raw[3..15]);
        assert_eq!(blob.ciphertext, vec![0x5A; 7]);
        assert_eq!(&blob.tag[..], &raw[raw.len() - 16..]);
    }

    #[test]
    fn decode_accepts_empty_ciphertext() {
        let raw = sample_raw(0);
        assert_eq!(raw.len(), MIN_VERSIONED_LEN);

        let blob = decode(&raw).unwrap();
        assert!(blob.ciphertext.is_empty());
    }

    #[test]
    fn decode_rejects_short_values() {
        for len in 0..MIN_VERSIONED_LEN {
            let raw = &sample_raw(0)[..len];
            assert!(
                matches!(decode(raw), Err(ChromeSyncError::Format(_))),
                "length {len} should be rejected"
            );
        }
    }

    #[test]
    fn decode_rejects_unknown_marker() {
        let mut raw = sample_raw(4);
        raw[2] = b'1';
        assert!(matches!(decode(&raw), Err(ChromeSyncError::Format(_))));
    }

    #[test]
    fn encode_inverts_decode() {
        for len in [0, 1, 16, 33] {
            let raw = sample_raw(len);
            assert_eq!(decode(&raw).unwrap().to_bytes(), raw);
        }
    }
}
