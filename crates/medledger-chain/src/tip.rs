//! The committer's view of the chain head.

use medledger_contracts::log::Log;

/// The most recently committed log, owned by exactly one committer.
///
/// The next entry takes its `prev_hash` and `log_index` from here.  The tip
/// is advanced before the new row is persisted and rolled back if the
/// insert fails, so it always ends up at the last *durable* entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainTip {
    last: Option<Log>,
}

impl ChainTip {
    /// A tip with nothing committed yet.
    pub fn genesis() -> Self {
        Self::default()
    }

    /// A tip positioned at `last`, typically the newest stored row.
    pub fn at(last: Option<Log>) -> Self {
        Self { last }
    }

    pub fn last(&self) -> Option<&Log> {
        self.last.as_ref()
    }

    /// `prev_hash` for the next entry.
    pub fn prev_hash(&self) -> &str {
        self.last
            .as_ref()
            .map(|l| l.hash.as_str())
            .unwrap_or(Log::GENESIS_PREV_HASH)
    }

    /// Index of the last committed entry, 0 before the first.
    pub fn last_index(&self) -> u64 {
        self.last.as_ref().map_or(0, |l| l.log_index)
    }

    /// Move the tip to `log`, returning the previous position.
    pub(crate) fn advance(&mut self, log: Log) -> Option<Log> {
        self.last.replace(log)
    }

    /// Restore a position returned by `advance`.
    pub(crate) fn rollback(&mut self, previous: Option<Log>) {
        self.last = previous;
    }
}
