//! In-memory implementation of `OrderingStore`.
//!
//! Lists are `VecDeque`s with the head at the front and the tail at the
//! back.  A single `parking_lot::Mutex` guards every list, slot and lease,
//! so a batch is applied atomically simply by holding the lock for its
//! whole duration.  Blocked `pop_tail` callers park on a `tokio::sync::Notify`
//! that every push wakes.
//!
//! Data is not persisted; it lives as long as the last clone of the store.

use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use medledger_contracts::error::StoreResult;
use medledger_core::traits::{BatchOp, OrderingStore};

#[derive(Debug)]
struct Lease {
    holder: String,
    expires_at: Instant,
}

#[derive(Debug, Default)]
struct State {
    lists: HashMap<String, VecDeque<Vec<u8>>>,
    slots: HashMap<String, Vec<u8>>,
    leases: HashMap<String, Lease>,
}

#[derive(Debug, Default)]
struct Inner {
    state: Mutex<State>,
    pushed: Notify,
}

/// Cheaply cloneable in-memory ordering store.  All clones share data.
#[derive(Debug, Clone, Default)]
pub struct MemoryOrderingStore {
    inner: Arc<Inner>,
}

impl MemoryOrderingStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn try_pop(&self, list: &str) -> Option<Vec<u8>> {
        let mut state = self.inner.state.lock();
        state.lists.get_mut(list).and_then(|q| q.pop_back())
    }
}

#[async_trait]
impl OrderingStore for MemoryOrderingStore {
    async fn push_head(&self, list: &str, value: Vec<u8>) -> StoreResult<()> {
        {
            let mut state = self.inner.state.lock();
            state.lists.entry(list.to_string()).or_default().push_front(value);
        }
        self.inner.pushed.notify_waiters();
        Ok(())
    }

    async fn push_tail(&self, list: &str, value: Vec<u8>) -> StoreResult<()> {
        {
            let mut state = self.inner.state.lock();
            state.lists.entry(list.to_string()).or_default().push_back(value);
        }
        self.inner.pushed.notify_waiters();
        Ok(())
    }

    async fn pop_tail(&self, list: &str, timeout: Duration) -> StoreResult<Option<Vec<u8>>> {
        let deadline = Instant::now() + timeout;
        loop {
            // Register interest before checking, so a push between the check
            // and the wait is not missed.
            let mut notified = std::pin::pin!(self.inner.pushed.notified());
            notified.as_mut().enable();

            if let Some(value) = self.try_pop(list) {
                return Ok(Some(value));
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(None);
            }
            if tokio::time::timeout(remaining, notified).await.is_err() {
                return Ok(self.try_pop(list));
            }
        }
    }

    async fn range(&self, list: &str) -> StoreResult<Vec<Vec<u8>>> {
        let state = self.inner.state.lock();
        Ok(state
            .lists
            .get(list)
            .map(|q| q.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn len(&self, list: &str) -> StoreResult<usize> {
        let state = self.inner.state.lock();
        Ok(state.lists.get(list).map_or(0, VecDeque::len))
    }

    async fn exec_batch(&self, batch: Vec<BatchOp>) -> StoreResult<()> {
        {
            let mut state = self.inner.state.lock();
            for op in batch {
                match op {
                    BatchOp::PushHead { list, value } => {
                        state.lists.entry(list).or_default().push_front(value);
                    }
                }
            }
        }
        self.inner.pushed.notify_waiters();
        Ok(())
    }

    async fn get_slot(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.inner.state.lock().slots.get(key).cloned())
    }

    async fn set_slot(&self, key: &str, value: Vec<u8>) -> StoreResult<()> {
        self.inner.state.lock().slots.insert(key.to_string(), value);
        Ok(())
    }

    async fn try_acquire_lease(&self, key: &str, holder: &str, ttl: Duration) -> StoreResult<bool> {
        let now = Instant::now();
        let mut state = self.inner.state.lock();
        if let Some(lease) = state.leases.get(key) {
            if lease.expires_at > now && lease.holder != holder {
                return Ok(false);
            }
        }
        state.leases.insert(
            key.to_string(),
            Lease {
                holder: holder.to_string(),
                expires_at: now + ttl,
            },
        );
        Ok(true)
    }

    async fn renew_lease(&self, key: &str, holder: &str, ttl: Duration) -> StoreResult<bool> {
        let now = Instant::now();
        let mut state = self.inner.state.lock();
        match state.leases.get_mut(key) {
            Some(lease) if lease.holder == holder && lease.expires_at > now => {
                lease.expires_at = now + ttl;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn release_lease(&self, key: &str, holder: &str) -> StoreResult<()> {
        let mut state = self.inner.state.lock();
        if state.leases.get(key).is_some_and(|l| l.holder == holder) {
            state.leases.remove(key);
        }
        Ok(())
    }
}
