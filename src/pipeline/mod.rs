//! Batch decrypt / verify / re-key orchestration.
//!
//! Each record moves through:
//!
//! ```text
//! Sealed ──decrypt──▶ Revealed ──verify──▶ Verified ──reencrypt──▶ Sealed'
//!    │                   │
//!    └─▶ Failed(decrypt) └─▶ Failed(integrity)  (always aborts the batch)
//! ```
//!
//! Records share nothing but the read-only state key, so a failure on
//! one record never changes how another is processed.  What happens
//! after a recoverable failure is decided by [`BatchPolicy`].

pub mod cancel;
pub mod outcome;

use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::crypto::{
    self, EncryptedBlob, Format, LegacyDecryptor, MasterKeys, StateKey, UnavailablePlatformStore,
};
use crate::errors::{ChromeSyncError, Result};
use crate::store::CredentialRecord;

pub use cancel::CancelToken;
pub use outcome::{BatchOutcome, RecordFailure};

/// What to do when a single record fails to decrypt.
///
/// Integrity mismatches and interruptions abort under either policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BatchPolicy {
    /// Record the failure, keep going, report everything at the end.
    #[default]
    Aggregate,
    /// Stop at the first failing record.
    FailFast,
}

/// Drives the codec over collections of records.
pub struct Pipeline<L = UnavailablePlatformStore> {
    policy: BatchPolicy,
    legacy: L,
    master_keys: MasterKeys,
    cancel: CancelToken,
}

impl Pipeline<UnavailablePlatformStore> {
    /// A pipeline with no platform key store; legacy records will fail.
    pub fn new(policy: BatchPolicy) -> Self {
        Self {
            policy,
            legacy: UnavailablePlatformStore,
            master_keys: MasterKeys::default(),
            cancel: CancelToken::default(),
        }
    }
}

impl<L: LegacyDecryptor> Pipeline<L> {
    /// Use `legacy` to decrypt pre-`v10` values.
    pub fn with_legacy<M: LegacyDecryptor>(self, legacy: M) -> Pipeline<M> {
        Pipeline {
            policy: self.policy,
            legacy,
            master_keys: self.master_keys,
            cancel: self.cancel,
        }
    }

    pub fn with_master_keys(mut self, master_keys: MasterKeys) -> Self {
        self.master_keys = master_keys;
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn policy(&self) -> BatchPolicy {
        self.policy
    }

    // ------------------------------------------------------------------
    // Batch operations
    // ------------------------------------------------------------------

    /// Decrypt and verify every record under `key`.
    ///
    /// Successfully decrypted records come back revealed in
    /// `outcome.records`.  Under `Aggregate`, records that failed are
    /// listed in `outcome.failures` instead; under `FailFast` the first
    /// failure is returned as the error and later records are untouched.
    pub fn decrypt_all(
        &self,
        records: Vec<CredentialRecord>,
        key: &StateKey,
    ) -> Result<BatchOutcome> {
        let total = records.len();
        let mut outcome = BatchOutcome::with_capacity(total);

        for (index, mut record) in records.into_iter().enumerate() {
            if self.cancel.is_cancelled() {
                return Err(ChromeSyncError::Interrupted(index));
            }

            match self.decrypt_record(&mut record, key) {
                Ok(()) => outcome.records.push(record),
                Err(e) if e.is_fatal() || self.policy == BatchPolicy::FailFast => {
                    tracing::warn!(
                        index,
                        identity = %record.identity(),
                        error = %e.root(),
                        "aborting batch"
                    );
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!(
                        index,
                        identity = %record.identity(),
                        error = %e.root(),
                        "skipping record"
                    );
                    outcome.failures.push(RecordFailure::new(index, record.identity(), e));
                }
            }
        }

        tracing::info!(
            total,
            decrypted = outcome.records.len(),
            failed = outcome.failures.len(),
            "decrypt batch complete"
        );
        Ok(outcome)
    }

    /// Re-encrypt revealed records under `destination_key`, each with a
    /// freshly drawn IV, discarding the plaintext.
    pub fn reencrypt_for_destination(
        &self,
        records: Vec<CredentialRecord>,
        destination_key: &StateKey,
    ) -> Result<Vec<CredentialRecord>> {
        let mut sealed = Vec::with_capacity(records.len());

        for (index, mut record) in records.into_iter().enumerate() {
            if self.cancel.is_cancelled() {
                return Err(ChromeSyncError::Interrupted(index));
            }

            let raw = match record.plaintext() {
                Some([]) => Vec::new(),
                Some(plaintext) => {
                    let iv = crypto::generate_iv();
                    let fresh = crypto::encrypt(plaintext, destination_key.as_bytes(), &iv)
                        .map_err(|e| e.for_record(record.identity(), "reencrypt"))?;
                    crypto::encode(&iv, &fresh.ciphertext, &fresh.tag)
                }
                None => {
                    return Err(ChromeSyncError::InvalidArgument(
                        "record has no decrypted secret to re-encrypt".into(),
                    )
                    .for_record(record.identity(), "reencrypt"));
                }
            };

            record.seal(raw);
            sealed.push(record);
        }

        tracing::info!(count = sealed.len(), "re-encrypted for destination");
        Ok(sealed)
    }

    /// Decrypt under `source_key`, then re-key under `destination_key`.
    ///
    /// Returns the re-keyed records ready for write-back plus any
    /// per-record failures collected under `Aggregate`.
    pub fn migrate(
        &self,
        source_records: Vec<CredentialRecord>,
        source_key: &StateKey,
        destination_key: &StateKey,
    ) -> Result<BatchOutcome> {
        let decrypted = self.decrypt_all(source_records, source_key)?;
        let records = self.reencrypt_for_destination(decrypted.records, destination_key)?;

        Ok(BatchOutcome {
            records,
            failures: decrypted.failures,
        })
    }

    // ------------------------------------------------------------------
    // Per-record transform
    // ------------------------------------------------------------------

    /// Move one sealed record to the revealed state.
    fn decrypt_record(&self, record: &mut CredentialRecord, key: &StateKey) -> Result<()> {
        let identity = record.identity();
        let raw = record.raw_secret().ok_or_else(|| {
            ChromeSyncError::InvalidArgument("record is already decrypted".into())
                .for_record(identity.clone(), "decrypt")
        })?;

        let plaintext = if raw.is_empty() {
            // Never-saved entries carry no password at all.
            Zeroizing::new(Vec::new())
        } else {
            match crypto::detect_format(raw) {
                Format::Versioned => {
                    let blob = crypto::decode(raw)
                        .map_err(|e| e.for_record(identity.clone(), "decode"))?;
                    let plaintext = crypto::decrypt(&blob, key.as_bytes())
                        .map_err(|e| e.for_record(identity.clone(), "decrypt"))?;
                    verify_round_trip(&blob, &plaintext, key)
                        .map_err(|e| e.for_record(identity.clone(), "verify"))?;
                    plaintext
                }
                Format::Legacy => self
                    .legacy
                    .decrypt_legacy(raw, &self.master_keys)
                    .map_err(|e| e.for_record(identity.clone(), "decrypt-legacy"))?,
            }
        };

        tracing::debug!(identity = %identity, "record decrypted");
        record.reveal(plaintext);
        Ok(())
    }
}

/// Re-encrypt `plaintext` with the blob's own key and IV and require the
/// result to match the stored ciphertext and tag exactly.
///
/// This is the only place an IV is deliberately reused, and only to
/// reproduce bytes that already exist.
pub fn verify_round_trip(blob: &EncryptedBlob, plaintext: &[u8], key: &StateKey) -> Result<()> {
    let again = crypto::encrypt(plaintext, key.as_bytes(), &blob.iv)?;

    let same_ciphertext = again.ciphertext[..].ct_eq(&blob.ciphertext[..]);
    let same_tag = again.tag[..].ct_eq(&blob.tag[..]);

    if bool::from(same_ciphertext & same_tag) {
        Ok(())
    } else {
        Err(ChromeSyncError::IntegrityMismatch)
    }
}
