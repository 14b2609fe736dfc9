//! # medledger-chain
//!
//! Append-only, SHA-256 hash-chained commit path for the medical-records
//! transaction ledger.
//!
//! ## Overview
//!
//! Every accepted transaction waits on the ordering store's work queue until
//! the single [`Committer`] dequeues it, links it to the previous entry via
//! `prev_hash`, and inserts it into the log store.  Tampering with any
//! committed row breaks the chain and is detected by [`verify_chain`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use medledger_chain::Committer;
//!
//! let handle = Committer::builder()
//!     .ordering(ordering)
//!     .logs(logs)
//!     .cipher(cipher)
//!     .config(config)
//!     .build()?
//!     .spawn();
//! // ...
//! handle.shutdown().await?;
//! ```

pub mod admin;
pub mod chain;
pub mod committer;
pub mod tip;

pub use admin::{refresh_ledger_stats, replay_backup};
pub use chain::{hash_log, hash_of, verify_chain, ChainBreak, ChainVerifier};
pub use committer::{CommitError, Committer, CommitterBuilder, CommitterHandle};
pub use tip::ChainTip;

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicBool, Ordering},
        time::Duration,
    };

    use async_trait::async_trait;
    use sha2::{Digest, Sha256};

    use medledger_contracts::{
        actor::{ActorKind, ActorPayload},
        config::StoreKeys,
        error::{StoreError, StoreResult},
        log::{LedgerStats, Log},
        transaction::{Operation, Transaction},
    };
    use medledger_core::{
        codec,
        traits::{BatchOp, LogStore, OrderingStore},
    };
    use medledger_store::{ChaChaCipher, MemoryLogStore, MemoryOrderingStore};

    use super::{hash_log, hash_of, refresh_ledger_stats, replay_backup, verify_chain, ChainBreak};

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn make_tx(creator: &str) -> Transaction {
        Transaction {
            operation: Operation::UpdateRecord,
            creator: Some(ActorPayload::new(ActorKind::Hospital, creator, "Hospital")),
            patient: Some(ActorPayload::new(ActorKind::Patient, "pat-1", "Pat")),
            organization: None,
            details: b"details".to_vec(),
        }
    }

    /// Build a correctly linked chain of `n` logs.
    fn make_chain(n: u64) -> Vec<Log> {
        let mut logs: Vec<Log> = Vec::new();
        for i in 1..=n {
            let prev_hash = logs.last().map(|l| l.hash.clone()).unwrap_or_default();
            let mut log = Log {
                hash: String::new(),
                prev_hash,
                timestamp: 1_700_000_000 + i as i64,
                log_index: i,
                payload: make_tx(&format!("hosp-{}", i)),
                deleted: false,
            };
            log.hash = hash_of(&log);
            logs.push(log);
        }
        logs
    }

    /// Ordering store that can refuse pushes onto the work queue, or mimic
    /// a running committer that quarantines every replayed entry again.
    #[derive(Default)]
    struct ScriptedOrdering {
        inner: MemoryOrderingStore,
        keys: StoreKeys,
        reject_queue: AtomicBool,
        requarantine: AtomicBool,
    }

    #[async_trait]
    impl OrderingStore for ScriptedOrdering {
        async fn push_head(&self, list: &str, value: Vec<u8>) -> StoreResult<()> {
            if list == self.keys.queue {
                if self.reject_queue.load(Ordering::SeqCst) {
                    return Err(StoreError::Backend {
                        reason: "queue unavailable".to_string(),
                    });
                }
                if self.requarantine.load(Ordering::SeqCst) {
                    return self.inner.push_head(&self.keys.backup, value).await;
                }
            }
            self.inner.push_head(list, value).await
        }
        async fn push_tail(&self, list: &str, value: Vec<u8>) -> StoreResult<()> {
            self.inner.push_tail(list, value).await
        }
        async fn pop_tail(&self, list: &str, timeout: Duration) -> StoreResult<Option<Vec<u8>>> {
            self.inner.pop_tail(list, timeout).await
        }
        async fn range(&self, list: &str) -> StoreResult<Vec<Vec<u8>>> {
            self.inner.range(list).await
        }
        async fn len(&self, list: &str) -> StoreResult<usize> {
            self.inner.len(list).await
        }
        async fn exec_batch(&self, batch: Vec<BatchOp>) -> StoreResult<()> {
            self.inner.exec_batch(batch).await
        }
        async fn get_slot(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
            self.inner.get_slot(key).await
        }
        async fn set_slot(&self, key: &str, value: Vec<u8>) -> StoreResult<()> {
            self.inner.set_slot(key, value).await
        }
        async fn try_acquire_lease(
            &self,
            key: &str,
            holder: &str,
            ttl: Duration,
        ) -> StoreResult<bool> {
            self.inner.try_acquire_lease(key, holder, ttl).await
        }
        async fn renew_lease(&self, key: &str, holder: &str, ttl: Duration) -> StoreResult<bool> {
            self.inner.renew_lease(key, holder, ttl).await
        }
        async fn release_lease(&self, key: &str, holder: &str) -> StoreResult<()> {
            self.inner.release_lease(key, holder).await
        }
    }

    // ── Hashing ───────────────────────────────────────────────────────────────

    /// The hash is SHA-256 over the decimal/string concatenation of its
    /// inputs.
    #[test]
    fn test_hash_matches_concatenated_inputs() {
        let expected = hex::encode(Sha256::digest(b"1700000000abc7hosp-1pat-1org-1"));
        assert_eq!(
            hash_log(1_700_000_000, "abc", 7, "hosp-1", "pat-1", "org-1"),
            expected
        );
    }

    /// `details` are not hashed: two logs that differ only in details share
    /// a hash.
    #[test]
    fn test_details_do_not_affect_hash() {
        let a = make_chain(1).remove(0);
        let mut b = a.clone();
        b.payload.details = b"something else".to_vec();
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    // ── Verification ──────────────────────────────────────────────────────────

    #[test]
    fn test_valid_chain_verifies() {
        assert_eq!(verify_chain(&make_chain(4)), Ok(()));
    }

    #[test]
    fn test_verify_empty() {
        assert_eq!(verify_chain(&[]), Ok(()));
    }

    #[test]
    fn test_tampered_actor_is_detected() {
        let mut logs = make_chain(3);
        logs[1].payload.creator = Some(ActorPayload::new(ActorKind::Hospital, "forged", "X"));
        assert!(matches!(
            verify_chain(&logs),
            Err(ChainBreak::HashMismatch { log_index: 2, .. })
        ));
    }

    #[test]
    fn test_broken_link_is_detected() {
        let mut logs = make_chain(3);
        logs[2].prev_hash = "f".repeat(64);
        logs[2].hash = hash_of(&logs[2]);
        assert!(matches!(
            verify_chain(&logs),
            Err(ChainBreak::Unlinked { log_index: 3, .. })
        ));
    }

    #[test]
    fn test_index_gap_is_detected() {
        let mut logs = make_chain(3);
        logs.remove(1);
        assert_eq!(
            verify_chain(&logs),
            Err(ChainBreak::IndexGap { expected: 2, found: 3 })
        );
    }

    // ── Administration ────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_replay_backup_moves_entries_oldest_first() {
        let ordering = MemoryOrderingStore::new();
        let keys = StoreKeys::default();
        ordering.push_head(&keys.backup, b"first".to_vec()).await.unwrap();
        ordering.push_head(&keys.backup, b"second".to_vec()).await.unwrap();

        let moved = replay_backup(&ordering, &keys).await.unwrap();
        assert_eq!(moved, 2);
        assert_eq!(ordering.len(&keys.backup).await.unwrap(), 0);

        let zero = std::time::Duration::ZERO;
        assert_eq!(
            ordering.pop_tail(&keys.queue, zero).await.unwrap(),
            Some(b"first".to_vec())
        );
        assert_eq!(
            ordering.pop_tail(&keys.queue, zero).await.unwrap(),
            Some(b"second".to_vec())
        );
    }

    /// A queue failure leaves the entry on the backup list, still oldest.
    #[tokio::test]
    async fn test_replay_backup_keeps_entry_when_queue_rejects_it() {
        let ordering = ScriptedOrdering::default();
        let keys = StoreKeys::default();
        ordering.push_head(&keys.backup, b"first".to_vec()).await.unwrap();
        ordering.push_head(&keys.backup, b"second".to_vec()).await.unwrap();
        ordering.reject_queue.store(true, Ordering::SeqCst);

        assert!(replay_backup(&ordering, &keys).await.is_err());
        assert_eq!(ordering.len(&keys.queue).await.unwrap(), 0);
        assert_eq!(
            ordering.range(&keys.backup).await.unwrap(),
            vec![b"second".to_vec(), b"first".to_vec()]
        );
    }

    /// Entries quarantined again during the replay are left for the next
    /// one instead of being chased forever.
    #[tokio::test]
    async fn test_replay_backup_moves_only_entries_present_at_start() {
        let ordering = ScriptedOrdering::default();
        let keys = StoreKeys::default();
        ordering.push_head(&keys.backup, b"poison".to_vec()).await.unwrap();
        ordering.requarantine.store(true, Ordering::SeqCst);

        let moved = tokio::time::timeout(Duration::from_secs(5), replay_backup(&ordering, &keys))
            .await
            .expect("replay must terminate")
            .unwrap();
        assert_eq!(moved, 1);
        assert_eq!(ordering.len(&keys.backup).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_refresh_stats_reports_valid_chain() {
        let ordering = MemoryOrderingStore::new();
        let logs = MemoryLogStore::new();
        let cipher = ChaChaCipher::generate();
        let keys = StoreKeys::default();
        let chain = make_chain(5);
        for log in &chain {
            logs.insert(log).await.unwrap();
        }
        logs.soft_delete(&chain[2].hash).await.unwrap();

        // A page size smaller than the chain exercises the paging walk.
        let stats = refresh_ledger_stats(&ordering, &logs, &cipher, &keys, 2)
            .await
            .unwrap();
        assert_eq!(stats.total_tx_logs, 5);
        assert!(stats.valid);
        assert_eq!(stats.last_insert_hash, chain[4].hash);
        assert_eq!(stats.last_updated_timestamp_sec, chain[4].timestamp);

        let slot = ordering.get_slot(&keys.stats).await.unwrap().unwrap();
        let stored: LedgerStats = codec::open(&cipher, &slot).unwrap();
        assert_eq!(stored, stats);
    }

    #[tokio::test]
    async fn test_refresh_stats_flags_broken_chain() {
        let ordering = MemoryOrderingStore::new();
        let logs = MemoryLogStore::new();
        let cipher = ChaChaCipher::generate();
        let mut chain = make_chain(3);
        chain[1].payload.patient = None;
        for log in &chain {
            logs.insert(log).await.unwrap();
        }

        let stats = refresh_ledger_stats(&ordering, &logs, &cipher, &StoreKeys::default(), 10)
            .await
            .unwrap();
        assert!(!stats.valid);
        assert_eq!(stats.total_tx_logs, 3);
    }

    #[tokio::test]
    async fn test_refresh_stats_on_empty_store() {
        let stats = refresh_ledger_stats(
            &MemoryOrderingStore::new(),
            &MemoryLogStore::new(),
            &ChaChaCipher::generate(),
            &StoreKeys::default(),
            10,
        )
        .await
        .unwrap();
        assert_eq!(stats.total_tx_logs, 0);
        assert!(stats.valid);
        assert!(stats.last_insert_hash.is_empty());
    }
}
