//! Operator tooling around the committed chain.
//!
//! Neither function is on the request path.  `replay_backup` is the manual
//! recovery step for quarantined entries; `refresh_ledger_stats` populates
//! the slot that GetLedgerStat reads.

use std::time::Duration;

use chrono::Utc;
use tracing::{error, info, warn};

use medledger_contracts::{
    config::StoreKeys,
    error::LedgerResult,
    log::LedgerStats,
};
use medledger_core::{
    codec,
    traits::{Cipher, LogQuery, LogStore, OrderingStore},
};

use crate::chain::ChainVerifier;

/// Move the entries currently on the backup list back onto the work queue.
///
/// Entries are moved oldest first, so they are re-committed in the order
/// they were originally quarantined.  Only entries present when the call
/// starts are moved: anything a running committer quarantines meanwhile
/// waits for the next replay.  If the queue rejects an entry it is returned
/// to the oldest end of the backup list before the error is reported.
/// Returns the number moved.
pub async fn replay_backup(ordering: &dyn OrderingStore, keys: &StoreKeys) -> LedgerResult<usize> {
    let pending = ordering.len(&keys.backup).await?;
    let mut moved = 0;
    while moved < pending {
        let Some(raw) = ordering.pop_tail(&keys.backup, Duration::ZERO).await? else {
            break;
        };
        if let Err(e) = ordering.push_head(&keys.queue, raw.clone()).await {
            if let Err(restore) = ordering.push_tail(&keys.backup, raw).await {
                error!(error = %restore, "failed to restore entry to backup list");
            }
            warn!(moved, error = %e, "backup replay interrupted");
            return Err(e.into());
        }
        moved += 1;
    }
    info!(moved, "backup list replayed onto work queue");
    Ok(moved)
}

/// Walk the whole chain, verify it, and write fresh encrypted stats.
///
/// The walk pages through the store `page_size` rows at a time, including
/// soft-deleted rows, which remain part of the chain.  A broken chain is
/// not an error: it is reported through `LedgerStats::valid`.
pub async fn refresh_ledger_stats(
    ordering: &dyn OrderingStore,
    logs: &dyn LogStore,
    cipher: &dyn Cipher,
    keys: &StoreKeys,
    page_size: usize,
) -> LedgerResult<LedgerStats> {
    let mut verifier = ChainVerifier::new();
    let mut valid = true;
    let mut total = 0u64;
    let mut last = None;
    let mut query = LogQuery {
        after_index: 0,
        limit: page_size.max(1),
        filter: None,
        include_deleted: true,
    };

    loop {
        let page = logs.list(&query).await?;
        let Some(tail) = page.last() else { break };
        query.after_index = tail.log_index;

        for log in &page {
            total += 1;
            if valid {
                if let Err(brk) = verifier.push(log) {
                    warn!(error = %brk, "chain verification failed");
                    valid = false;
                }
            }
        }
        last = page.into_iter().last();
    }

    let stats = LedgerStats {
        total_tx_logs: total,
        last_updated_timestamp_sec: last.as_ref().map_or(0, |l| l.timestamp),
        last_verified_timestamp_sec: Utc::now().timestamp(),
        last_insert_hash: last.map(|l| l.hash).unwrap_or_default(),
        valid,
    };

    let sealed = codec::seal(cipher, &stats)?;
    ordering.set_slot(&keys.stats, sealed).await?;

    info!(
        total_tx_logs = stats.total_tx_logs,
        verified = verifier.verified(),
        valid = stats.valid,
        last_insert_hash = %stats.last_insert_hash,
        "ledger stats refreshed"
    );
    Ok(stats)
}
