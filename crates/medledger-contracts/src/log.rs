//! Committed ledger entries and ledger-wide statistics.

use serde::{Deserialize, Serialize};

use crate::transaction::Transaction;

/// One committed, hash-chained ledger entry.
///
/// Only the committer fills in `hash`, `prev_hash`, `timestamp` and
/// `log_index`.  Before commit the same shape travels through the work queue
/// as an *envelope*: a `Log` whose chain fields are still zero-valued.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Log {
    /// SHA-256 hex digest identifying this entry.
    #[serde(default)]
    pub hash: String,

    /// `hash` of the entry committed immediately before this one, or
    /// `GENESIS_PREV_HASH` for the first entry.
    #[serde(default)]
    pub prev_hash: String,

    /// Commit time, Unix seconds.
    #[serde(default)]
    pub timestamp: i64,

    /// Position in commit order.  The first entry has index 1.
    #[serde(default)]
    pub log_index: u64,

    /// The transaction this entry records.
    #[serde(default)]
    pub payload: Transaction,

    /// Administrative soft-delete flag.  Deleted entries stay in the chain.
    #[serde(default)]
    pub deleted: bool,
}

impl Log {
    /// `prev_hash` of the first entry in the chain: the empty zero value.
    pub const GENESIS_PREV_HASH: &'static str = "";

    /// Wrap a transaction in an uncommitted envelope.
    pub fn envelope(payload: Transaction) -> Self {
        Self {
            payload,
            ..Self::default()
        }
    }

    /// True when this entry is the first in its chain.
    pub fn is_genesis(&self) -> bool {
        self.prev_hash == Self::GENESIS_PREV_HASH
    }
}

/// Aggregate statistics kept in a single encrypted slot.
///
/// GetLedgerStat only reads this; it is written by the administrative
/// stats refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerStats {
    #[serde(default)]
    pub total_tx_logs: u64,
    #[serde(default)]
    pub last_updated_timestamp_sec: i64,
    #[serde(default)]
    pub last_verified_timestamp_sec: i64,
    #[serde(default)]
    pub last_insert_hash: String,
    /// Whether the last verification pass found an intact chain.
    #[serde(default)]
    pub valid: bool,
}
