//! The ledger committer: the single writer of the hash chain.
//!
//! Per dequeued entry the committer runs a fixed pipeline:
//!
//!   Wait → Lease → Decrypt → Decode → Chain → Persist
//!
//! Any failure after the entry has been dequeued moves the raw bytes to the
//! backup list and the loop carries on with the next entry.  Nothing is
//! retried here; replaying the backup list is an operator action.
//!
//! # Single writer
//!
//! Two committers draining the same queue would both chain from the same
//! tip and fork the ledger.  `run()` therefore does not drain until it holds
//! the ordering store's committer lease, renews it on every loop iteration,
//! and stops (returning `LedgerError::LeaseLost`) the moment a renewal
//! fails.

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use thiserror::Error;
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, error, info, warn};

use medledger_contracts::{
    config::LedgerConfig,
    error::{CipherError, CodecError, LedgerError, LedgerResult, StoreError, StoreResult},
    log::Log,
};
use medledger_core::{
    codec,
    traits::{Cipher, LogStore, OrderingStore},
};

use crate::{chain::hash_of, tip::ChainTip};

/// Pause after a failed dequeue before polling the store again.
const DEQUEUE_ERROR_BACKOFF: Duration = Duration::from_millis(250);

/// Why a dequeued entry was quarantined instead of committed.
#[derive(Debug, Error)]
pub enum CommitError {
    #[error("decrypt failed: {0}")]
    Decrypt(CipherError),

    #[error("decode failed: {0}")]
    Decode(CodecError),

    #[error("persist failed: {0}")]
    Persist(StoreError),
}

impl CommitError {
    /// Name of the pipeline stage that failed.
    pub fn stage(&self) -> &'static str {
        match self {
            CommitError::Decrypt(_) => "decrypt",
            CommitError::Decode(_) => "decode",
            CommitError::Persist(_) => "persist",
        }
    }
}

/// Builder for [`Committer`].  Every collaborator is mandatory.
#[derive(Default)]
pub struct CommitterBuilder {
    ordering: Option<Arc<dyn OrderingStore>>,
    logs: Option<Arc<dyn LogStore>>,
    cipher: Option<Arc<dyn Cipher>>,
    config: Option<LedgerConfig>,
    holder: Option<String>,
}

impl CommitterBuilder {
    pub fn ordering(mut self, ordering: Arc<dyn OrderingStore>) -> Self {
        self.ordering = Some(ordering);
        self
    }

    pub fn logs(mut self, logs: Arc<dyn LogStore>) -> Self {
        self.logs = Some(logs);
        self
    }

    pub fn cipher(mut self, cipher: Arc<dyn Cipher>) -> Self {
        self.cipher = Some(cipher);
        self
    }

    pub fn config(mut self, config: LedgerConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Lease holder identity.  Defaults to a random `committer-<uuid>`.
    pub fn holder(mut self, holder: impl Into<String>) -> Self {
        self.holder = Some(holder.into());
        self
    }

    /// Returns `LedgerError::Config` if a collaborator is missing or the
    /// configuration is invalid.
    pub fn build(self) -> LedgerResult<Committer> {
        let ordering = self
            .ordering
            .ok_or_else(|| LedgerError::config("committer requires an ordering store"))?;
        let logs = self
            .logs
            .ok_or_else(|| LedgerError::config("committer requires a log store"))?;
        let cipher = self
            .cipher
            .ok_or_else(|| LedgerError::config("committer requires a cipher"))?;
        let config = self
            .config
            .ok_or_else(|| LedgerError::config("committer requires a configuration"))?;
        config.validate()?;

        Ok(Committer {
            ordering,
            logs,
            cipher,
            config,
            holder: self
                .holder
                .unwrap_or_else(|| format!("committer-{}", uuid::Uuid::new_v4())),
            tip: ChainTip::genesis(),
        })
    }
}

/// The sole consumer of the work queue.
pub struct Committer {
    ordering: Arc<dyn OrderingStore>,
    logs: Arc<dyn LogStore>,
    cipher: Arc<dyn Cipher>,
    config: LedgerConfig,
    holder: String,
    tip: ChainTip,
}

enum Wake {
    Shutdown,
    HandleDropped,
    Popped(StoreResult<Option<Vec<u8>>>),
}

/// Map a `watch::Receiver::changed` result onto a wake reason.  A closed
/// channel means every sender, i.e. the `CommitterHandle`, is gone.
fn shutdown_wake(changed: Result<(), watch::error::RecvError>) -> Wake {
    match changed {
        Ok(()) => Wake::Shutdown,
        Err(_) => Wake::HandleDropped,
    }
}

impl Committer {
    pub fn builder() -> CommitterBuilder {
        CommitterBuilder::default()
    }

    pub fn tip(&self) -> &ChainTip {
        &self.tip
    }

    /// Position the tip at the newest stored row, so a restarted committer
    /// continues the existing chain instead of starting a new one.
    pub(crate) async fn hydrate(&mut self) -> LedgerResult<()> {
        let latest = self.logs.latest().await?;
        self.tip = ChainTip::at(latest);
        info!(
            tip_hash = %self.tip.prev_hash(),
            log_index = self.tip.last_index(),
            "committer chain tip hydrated"
        );
        Ok(())
    }

    /// Commit one raw queue entry, quarantining it on failure.
    ///
    /// On success the tip has advanced to the returned log.  On failure the
    /// tip is exactly where it was before the call and the raw bytes are on
    /// the backup list.
    pub(crate) async fn commit_entry(&mut self, raw: Vec<u8>) -> Result<Log, CommitError> {
        match self.chain_and_persist(&raw).await {
            Ok(log) => {
                info!(
                    hash = %log.hash,
                    log_index = log.log_index,
                    operation = %log.payload.operation,
                    "log committed"
                );
                Ok(log)
            }
            Err(e) => {
                warn!(
                    stage = e.stage(),
                    error = %e,
                    tip_index = self.tip.last_index(),
                    "entry moved to backup list"
                );
                self.quarantine(raw).await;
                Err(e)
            }
        }
    }

    async fn chain_and_persist(&mut self, raw: &[u8]) -> Result<Log, CommitError> {
        // ── Decrypt ──────────────────────────────────────────────────────────
        let plain = self.cipher.decrypt(raw).map_err(CommitError::Decrypt)?;

        // ── Decode ───────────────────────────────────────────────────────────
        let envelope: Log = codec::decode(&plain).map_err(CommitError::Decode)?;

        // ── Chain ────────────────────────────────────────────────────────────
        let mut log = Log {
            hash: String::new(),
            prev_hash: self.tip.prev_hash().to_string(),
            timestamp: Utc::now().timestamp(),
            log_index: self.tip.last_index() + 1,
            payload: envelope.payload,
            deleted: false,
        };
        log.hash = hash_of(&log);

        // ── Persist ──────────────────────────────────────────────────────────
        //
        // The tip moves first; a failed insert puts it back so the next
        // entry chains from the last durable hash.
        let previous = self.tip.advance(log.clone());
        if let Err(e) = self.logs.insert(&log).await {
            self.tip.rollback(previous);
            return Err(CommitError::Persist(e));
        }

        Ok(log)
    }

    async fn quarantine(&self, raw: Vec<u8>) {
        if let Err(e) = self.ordering.push_head(&self.config.keys.backup, raw).await {
            error!(error = %e, "failed to move entry to backup list; entry dropped");
        }
    }

    async fn ensure_lease(&self) -> LedgerResult<()> {
        let keys = &self.config.keys;
        match self
            .ordering
            .renew_lease(&keys.lease, &self.holder, self.config.lease_ttl())
            .await
        {
            Ok(true) => Ok(()),
            Ok(false) => Err(LedgerError::LeaseLost {
                reason: format!("lease '{}' is no longer held by {}", keys.lease, self.holder),
            }),
            Err(e) => Err(LedgerError::LeaseLost {
                reason: format!("lease '{}' could not be renewed: {}", keys.lease, e),
            }),
        }
    }

    async fn release_lease(&self) {
        if let Err(e) = self
            .ordering
            .release_lease(&self.config.keys.lease, &self.holder)
            .await
        {
            warn!(holder = %self.holder, error = %e, "failed to release committer lease");
        }
    }

    /// Drain the work queue until shutdown or until the lease is lost.
    ///
    /// Waits for the committer lease, hydrates the tip, then loops.  While
    /// another holder owns the lease (including a crashed committer whose
    /// lease has not yet expired) the attempt is repeated every dequeue
    /// timeout.  An entry already being processed when shutdown fires runs
    /// to completion.
    ///
    /// Shutdown is signalled by sending `true` on the channel.  Dropping
    /// every sender also stops the committer.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> LedgerResult<()> {
        if !self.acquire_lease(&mut shutdown).await {
            info!(holder = %self.holder, "committer stopped before acquiring its lease");
            return Ok(());
        }

        let result = match self.hydrate().await {
            Ok(()) => self.drain(&mut shutdown).await,
            Err(e) => Err(e),
        };

        self.release_lease().await;
        match &result {
            Ok(()) => info!(holder = %self.holder, tip_index = self.tip.last_index(), "committer stopped"),
            Err(e) => error!(holder = %self.holder, error = %e, "committer halted"),
        }
        result
    }

    /// Poll for the lease until it is ours (`true`) or shutdown fires
    /// (`false`).
    async fn acquire_lease(&self, shutdown: &mut watch::Receiver<bool>) -> bool {
        let keys = &self.config.keys;
        let mut waiting = false;
        loop {
            if *shutdown.borrow() {
                return false;
            }

            match self
                .ordering
                .try_acquire_lease(&keys.lease, &self.holder, self.config.lease_ttl())
                .await
            {
                Ok(true) => {
                    info!(lease = %keys.lease, holder = %self.holder, "committer lease acquired");
                    return true;
                }
                Ok(false) if !waiting => {
                    warn!(
                        lease = %keys.lease,
                        holder = %self.holder,
                        "committer lease held elsewhere; waiting"
                    );
                    waiting = true;
                }
                Ok(false) => {}
                Err(e) => warn!(lease = %keys.lease, error = %e, "lease acquisition failed"),
            }

            let wake = tokio::select! {
                biased;
                changed = shutdown.changed() => Some(shutdown_wake(changed)),
                _ = tokio::time::sleep(self.config.dequeue_timeout()) => None,
            };
            if let Some(Wake::HandleDropped) = wake {
                info!(holder = %self.holder, "committer handle dropped");
                return false;
            }
        }
    }

    async fn drain(&mut self, shutdown: &mut watch::Receiver<bool>) -> LedgerResult<()> {
        let queue = self.config.keys.queue.clone();
        let timeout = self.config.dequeue_timeout();

        loop {
            if *shutdown.borrow() {
                return Ok(());
            }

            // ── Wait ─────────────────────────────────────────────────────────
            let wake = tokio::select! {
                biased;
                changed = shutdown.changed() => shutdown_wake(changed),
                popped = self.ordering.pop_tail(&queue, timeout) => Wake::Popped(popped),
            };

            match wake {
                Wake::Shutdown => return Ok(()),
                Wake::HandleDropped => {
                    info!(holder = %self.holder, "committer handle dropped; stopping");
                    return Ok(());
                }
                Wake::Popped(Ok(None)) => {
                    debug!("dequeue timed out; queue idle");
                    self.ensure_lease().await?;
                }
                Wake::Popped(Err(e)) => {
                    warn!(error = %e, "dequeue failed");
                    tokio::time::sleep(DEQUEUE_ERROR_BACKOFF).await;
                    self.ensure_lease().await?;
                }
                Wake::Popped(Ok(Some(raw))) => {
                    // ── Lease ────────────────────────────────────────────────
                    if let Err(e) = self.ensure_lease().await {
                        // Hand the entry back, still first in line.
                        if let Err(push_err) = self.ordering.push_tail(&queue, raw).await {
                            error!(error = %push_err, "failed to requeue entry after lease loss");
                        }
                        return Err(e);
                    }
                    // Failures are quarantined and logged inside.
                    let _ = self.commit_entry(raw).await;
                }
            }
        }
    }

    /// Run the committer on a new tokio task.
    ///
    /// Dropping the returned handle stops the committer as if `shutdown`
    /// had been called, without waiting for it.
    pub fn spawn(self) -> CommitterHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(self.run(shutdown_rx));
        CommitterHandle { shutdown_tx, task }
    }
}

/// Control handle for a spawned committer.
pub struct CommitterHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<LedgerResult<()>>,
}

impl CommitterHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Signal shutdown and wait for the committer to stop.
    pub async fn shutdown(self) -> LedgerResult<()> {
        // The task may already have exited and dropped its receiver.
        let _ = self.shutdown_tx.send(true);
        self.join().await
    }

    /// Wait for the committer to stop on its own.
    pub async fn join(self) -> LedgerResult<()> {
        self.task
            .await
            .map_err(|e| LedgerError::internal(format!("committer task failed: {}", e)))?
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
