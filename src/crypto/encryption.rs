//! AES-256-GCM transform for versioned credential values.
//!
//! Unlike a typical seal/open API the IV is always supplied by the
//! caller and the tag is kept detached from the ciphertext, because the
//! browser stores them as separate regions of the blob (see `blob`).
//! Associated data is always empty.

use aes_gcm::aead::{AeadInPlace, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce, Tag};
use zeroize::Zeroizing;

use super::blob::{EncryptedBlob, IV_LEN, TAG_LEN};
use super::keys::STATE_KEY_LEN;
use crate::errors::{ChromeSyncError, Result};

/// Ciphertext and detached tag produced by [`encrypt`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sealed {
    pub ciphertext: Vec<u8>,
    pub tag: [u8; TAG_LEN],
}

/// Encrypt `plaintext` under `key` with the caller-chosen `iv`.
///
/// Deterministic for fixed inputs. Never call this twice with the same
/// key and IV for different plaintexts.
pub fn encrypt(plaintext: &[u8], key: &[u8], iv: &[u8]) -> Result<Sealed> {
    let cipher = build_cipher(key)?;

    if iv.len() != IV_LEN {
        return Err(ChromeSyncError::InvalidArgument(format!(
            "IV must be exactly {IV_LEN} bytes, got {}",
            iv.len()
        )));
    }

    let mut buffer = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(Nonce::from_slice(iv), b"", &mut buffer)
        .map_err(|_| ChromeSyncError::InvalidArgument("plaintext too long for AES-GCM".into()))?;

    let mut tag_bytes = [0u8; TAG_LEN];
    tag_bytes.copy_from_slice(tag.as_slice());

    Ok(Sealed {
        ciphertext: buffer,
        tag: tag_bytes,
    })
}

/// Decrypt a versioned value and verify its tag.
///
/// The tag is checked before any plaintext is released; on failure the
/// working buffer is zeroed and only `DecryptionFailed` is returned.
pub fn decrypt(blob: &EncryptedBlob, key: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    let cipher = build_cipher(key)?;

    let mut buffer = Zeroizing::new(blob.ciphertext.clone());
    cipher
        .decrypt_in_place_detached(
            Nonce::from_slice(&blob.iv),
            b"",
            buffer.as_mut_slice(),
            Tag::from_slice(&blob.tag),
        )
        .map_err(|_| ChromeSyncError::DecryptionFailed)?;

    Ok(buffer)
}

/// Draw a fresh random IV from the OS RNG.
pub fn generate_iv() -> [u8; IV_LEN] {
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let mut iv = [0u8; IV_LEN];
    iv.copy_from_slice(nonce.as_slice());
    iv
}

fn build_cipher(key: &[u8]) -> Result<Aes256Gcm> {
    if key.len() != STATE_KEY_LEN {
        return Err(ChromeSyncError::InvalidArgument(format!(
            "key must be exactly {STATE_KEY_LEN} bytes, got {}",
            key.len()
        )));
    }

    Aes256Gcm::new_from_slice(key)
        .map_err(|e| ChromeSyncError::InvalidArgument(format!("invalid key length: {e}")))
}
