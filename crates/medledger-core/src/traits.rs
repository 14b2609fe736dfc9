//! Capability traits at the ledger's trust boundaries.
//!
//! - `Cipher`       : opaque symmetric encryption provider
//! - `OrderingStore`: durable FIFO lists, encrypted slots and leases
//! - `LogStore`     : the relational table of committed, hash-chained logs
//!
//! The service and the committer only ever see these traits.  Concrete
//! providers are injected at construction.

use std::time::Duration;

use async_trait::async_trait;

use medledger_contracts::{
    error::{CipherError, StoreResult},
    filter::Filter,
    log::Log,
};

/// Symmetric encryption applied to every payload before it reaches a store.
///
/// Implementations must be authenticated: decrypting a corrupted or foreign
/// ciphertext returns `CipherError::Decrypt` instead of garbage.
pub trait Cipher: Send + Sync {
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CipherError>;

    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CipherError>;
}

/// A single write inside an atomic `OrderingStore::exec_batch`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOp {
    /// Push `value` onto the head of `list`.
    PushHead { list: String, value: Vec<u8> },
}

/// Durable, cross-process ordering structures.
///
/// Lists are push-to-head / pop-from-tail FIFOs: the tail holds the oldest
/// entry.  Many producers may push concurrently; the work queue has exactly
/// one consumer.
#[async_trait]
pub trait OrderingStore: Send + Sync {
    /// Push `value` onto the head (newest end) of `list`.
    async fn push_head(&self, list: &str, value: Vec<u8>) -> StoreResult<()>;

    /// Push `value` onto the tail (oldest end) of `list`, ahead of every
    /// queued entry.
    async fn push_tail(&self, list: &str, value: Vec<u8>) -> StoreResult<()>;

    /// Remove and return the oldest entry of `list`, waiting up to `timeout`
    /// for one to arrive.  `Ok(None)` means the wait timed out.
    async fn pop_tail(&self, list: &str, timeout: Duration) -> StoreResult<Option<Vec<u8>>>;

    /// All entries of `list`, newest first.
    async fn range(&self, list: &str) -> StoreResult<Vec<Vec<u8>>>;

    async fn len(&self, list: &str) -> StoreResult<usize>;

    /// Apply every operation or none of them.
    async fn exec_batch(&self, batch: Vec<BatchOp>) -> StoreResult<()>;

    async fn get_slot(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    async fn set_slot(&self, key: &str, value: Vec<u8>) -> StoreResult<()>;

    /// Take the lease at `key` for `holder` if it is free or expired.
    /// Returns `false` when another holder owns a live lease.
    async fn try_acquire_lease(&self, key: &str, holder: &str, ttl: Duration) -> StoreResult<bool>;

    /// Extend a lease `holder` still owns.  Returns `false` if the lease has
    /// expired or passed to another holder.
    async fn renew_lease(&self, key: &str, holder: &str, ttl: Duration) -> StoreResult<bool>;

    /// Drop the lease if `holder` owns it.  Releasing a lease held by someone
    /// else is a no-op.
    async fn release_lease(&self, key: &str, holder: &str) -> StoreResult<()>;
}

/// Keyset query over committed logs, ascending by `log_index`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogQuery {
    /// Only logs with `log_index > after_index` are returned.
    pub after_index: u64,
    pub limit: usize,
    pub filter: Option<Filter>,
    /// Soft-deleted rows are skipped unless this is set.
    pub include_deleted: bool,
}

/// The relational table of committed logs.
///
/// `hash` is unique; inserting a duplicate fails with `StoreError::Conflict`.
#[async_trait]
pub trait LogStore: Send + Sync {
    async fn insert(&self, log: &Log) -> StoreResult<()>;

    async fn get_by_hash(&self, hash: &str) -> StoreResult<Option<Log>>;

    /// The row with the highest `log_index`, if any.
    async fn latest(&self) -> StoreResult<Option<Log>>;

    async fn list(&self, query: &LogQuery) -> StoreResult<Vec<Log>>;

    /// Number of rows, soft-deleted ones included.
    async fn count(&self) -> StoreResult<u64>;

    /// Set the administrative soft-delete flag.  Fails with
    /// `StoreError::NotFound` for an unknown hash.
    async fn soft_delete(&self, hash: &str) -> StoreResult<()>;
}
