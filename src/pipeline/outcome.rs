//! Results of a batch run.

use crate::errors::ChromeSyncError;
use crate::store::{CredentialRecord, RecordIdentity};

/// A record that could not be processed, kept for the final report.
#[derive(Debug)]
pub struct RecordFailure {
    /// Position of the record in the input batch.
    pub index: usize,
    pub identity: RecordIdentity,
    pub error: ChromeSyncError,
}

impl RecordFailure {
    pub fn new(index: usize, identity: RecordIdentity, error: ChromeSyncError) -> Self {
        Self {
            index,
            identity,
            error,
        }
    }

    /// The underlying cause without the record wrapper.
    pub fn cause(&self) -> &ChromeSyncError {
        self.error.root()
    }
}

/// Records that made it through a batch, plus those that did not.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub records: Vec<CredentialRecord>,
    pub failures: Vec<RecordFailure>,
}

impl BatchOutcome {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
            failures: Vec::new(),
        }
    }

    /// `true` when every input record succeeded.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Turn any collected failure into an error, for callers that want
    /// all-or-nothing semantics after an aggregate run.
    pub fn into_complete(mut self) -> Result<Vec<CredentialRecord>, ChromeSyncError> {
        if self.failures.is_empty() {
            Ok(self.records)
        } else {
            Err(self.failures.swap_remove(0).error)
        }
    }
}
