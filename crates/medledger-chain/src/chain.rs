//! Hash-chain primitives: hashing and chain integrity verification.
//!
//! Hash input layout (UTF-8 bytes, concatenated in order, no separators):
//!   1. timestamp as decimal Unix seconds
//!   2. prev_hash (64 hex chars, or empty for the first entry)
//!   3. log_index as decimal
//!   4. creator id
//!   5. patient id (empty when absent)
//!   6. organization id (empty when absent)
//!
//! The transaction `details` are not part of the input.  Changing the
//! layout invalidates every hash already stored, so it must stay fixed.

use sha2::{Digest, Sha256};
use thiserror::Error;

use medledger_contracts::log::Log;

/// Compute the SHA-256 chain hash from its individual inputs.
///
/// Returns a lowercase 64-character hex string.
pub fn hash_log(
    timestamp: i64,
    prev_hash: &str,
    log_index: u64,
    creator_id: &str,
    patient_id: &str,
    organization_id: &str,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(timestamp.to_string().as_bytes());
    hasher.update(prev_hash.as_bytes());
    hasher.update(log_index.to_string().as_bytes());
    hasher.update(creator_id.as_bytes());
    hasher.update(patient_id.as_bytes());
    hasher.update(organization_id.as_bytes());

    hex::encode(hasher.finalize())
}

/// Recompute the chain hash of `log` from its own fields.
pub fn hash_of(log: &Log) -> String {
    hash_log(
        log.timestamp,
        &log.prev_hash,
        log.log_index,
        log.payload.creator_id(),
        log.payload.patient_id(),
        log.payload.organization_id(),
    )
}

/// The first inconsistency found while walking a chain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainBreak {
    #[error("log {log_index}: prev_hash {found:?} does not link to {expected:?}")]
    Unlinked {
        log_index: u64,
        expected: String,
        found: String,
    },

    #[error("log {log_index}: stored hash {stored} does not match recomputed {recomputed}")]
    HashMismatch {
        log_index: u64,
        stored: String,
        recomputed: String,
    },

    #[error("expected log_index {expected}, found {found}")]
    IndexGap { expected: u64, found: u64 },
}

/// Incremental chain checker, fed one log at a time in commit order.
///
/// Lets callers verify a chain page by page without holding it in memory.
#[derive(Debug, Clone)]
pub struct ChainVerifier {
    expected_prev: String,
    expected_index: u64,
    verified: u64,
}

impl Default for ChainVerifier {
    fn default() -> Self {
        Self {
            expected_prev: Log::GENESIS_PREV_HASH.to_string(),
            expected_index: 1,
            verified: 0,
        }
    }
}

impl ChainVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check the next log.  Rules, in order:
    ///
    /// 1. **Index continuity**: `log_index` is exactly one past the
    ///    previous entry (1 for the first).
    /// 2. **Prev-hash linkage**: `prev_hash` equals the previous entry's
    ///    `hash` (empty for the first).
    /// 3. **Hash correctness**: `hash` matches the value recomputed from
    ///    the entry's own fields.
    pub fn push(&mut self, log: &Log) -> Result<(), ChainBreak> {
        if log.log_index != self.expected_index {
            return Err(ChainBreak::IndexGap {
                expected: self.expected_index,
                found: log.log_index,
            });
        }

        if log.prev_hash != self.expected_prev {
            return Err(ChainBreak::Unlinked {
                log_index: log.log_index,
                expected: self.expected_prev.clone(),
                found: log.prev_hash.clone(),
            });
        }

        let recomputed = hash_of(log);
        if log.hash != recomputed {
            return Err(ChainBreak::HashMismatch {
                log_index: log.log_index,
                stored: log.hash.clone(),
                recomputed,
            });
        }

        self.expected_prev = log.hash.clone();
        self.expected_index += 1;
        self.verified += 1;
        Ok(())
    }

    /// Number of logs accepted so far.
    pub fn verified(&self) -> u64 {
        self.verified
    }
}

/// Verify a complete chain, starting from the genesis entry.
///
/// An empty chain is defined as valid.
pub fn verify_chain(logs: &[Log]) -> Result<(), ChainBreak> {
    let mut verifier = ChainVerifier::new();
    for log in logs {
        verifier.push(log)?;
    }
    Ok(())
}
