//! In-memory implementation of `LogStore`.
//!
//! Rows live in a `BTreeMap` keyed by `log_index`, which gives ordered
//! keyset scans for free, with a secondary hash index enforcing uniqueness.

use std::{
    collections::{BTreeMap, HashMap},
    ops::Bound,
    sync::Arc,
};

use async_trait::async_trait;
use parking_lot::RwLock;

use medledger_contracts::{
    error::{StoreError, StoreResult},
    log::Log,
};
use medledger_core::traits::{LogQuery, LogStore};

#[derive(Debug, Default)]
struct Table {
    rows: BTreeMap<u64, Log>,
    by_hash: HashMap<String, u64>,
}

/// Cheaply cloneable in-memory log table.  All clones share data.
#[derive(Debug, Clone, Default)]
pub struct MemoryLogStore {
    table: Arc<RwLock<Table>>,
}

impl MemoryLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every row in index order, soft-deleted ones included.
    pub fn snapshot(&self) -> Vec<Log> {
        self.table.read().rows.values().cloned().collect()
    }
}

#[async_trait]
impl LogStore for MemoryLogStore {
    async fn insert(&self, log: &Log) -> StoreResult<()> {
        let mut table = self.table.write();
        if table.by_hash.contains_key(&log.hash) {
            return Err(StoreError::Conflict {
                key: log.hash.clone(),
            });
        }
        if table.rows.contains_key(&log.log_index) {
            return Err(StoreError::Conflict {
                key: format!("log_index {}", log.log_index),
            });
        }
        table.by_hash.insert(log.hash.clone(), log.log_index);
        table.rows.insert(log.log_index, log.clone());
        Ok(())
    }

    async fn get_by_hash(&self, hash: &str) -> StoreResult<Option<Log>> {
        let table = self.table.read();
        Ok(table
            .by_hash
            .get(hash)
            .and_then(|index| table.rows.get(index))
            .cloned())
    }

    async fn latest(&self) -> StoreResult<Option<Log>> {
        Ok(self
            .table
            .read()
            .rows
            .last_key_value()
            .map(|(_, log)| log.clone()))
    }

    async fn list(&self, query: &LogQuery) -> StoreResult<Vec<Log>> {
        let table = self.table.read();
        let logs = table
            .rows
            .range((Bound::Excluded(query.after_index), Bound::Unbounded))
            .map(|(_, log)| log)
            .filter(|log| query.include_deleted || !log.deleted)
            .filter(|log| query.filter.as_ref().map_or(true, |f| f.matches(log)))
            .take(query.limit)
            .cloned()
            .collect();
        Ok(logs)
    }

    async fn count(&self) -> StoreResult<u64> {
        Ok(self.table.read().rows.len() as u64)
    }

    async fn soft_delete(&self, hash: &str) -> StoreResult<()> {
        let mut table = self.table.write();
        let index = *table
            .by_hash
            .get(hash)
            .ok_or_else(|| StoreError::NotFound {
                key: hash.to_string(),
            })?;
        if let Some(row) = table.rows.get_mut(&index) {
            row.deleted = true;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use medledger_contracts::{
        actor::{ActorKind, ActorPayload},
        error::StoreError,
        filter::Filter,
        log::Log,
        transaction::{Operation, Transaction},
    };
    use medledger_core::traits::{LogQuery, LogStore};

    use super::MemoryLogStore;

    fn make_log(index: u64, patient: &str) -> Log {
        Log {
            hash: format!("hash-{}", index),
            prev_hash: if index == 1 {
                String::new()
            } else {
                format!("hash-{}", index - 1)
            },
            timestamp: 1_700_000_000 + index as i64,
            log_index: index,
            payload: Transaction {
                operation: Operation::AddRecord,
                creator: Some(ActorPayload::new(ActorKind::Hospital, "hosp-1", "General")),
                patient: Some(ActorPayload::new(ActorKind::Patient, patient, "P")),
                organization: None,
                details: b"x".to_vec(),
            },
            deleted: false,
        }
    }

    async fn seeded(n: u64) -> MemoryLogStore {
        let store = MemoryLogStore::new();
        for i in 1..=n {
            let patient = if i % 2 == 0 { "even" } else { "odd" };
            store.insert(&make_log(i, patient)).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn duplicate_hash_is_a_conflict() {
        let store = seeded(1).await;
        let mut dup = make_log(2, "odd");
        dup.hash = "hash-1".to_string();
        let err = store.insert(&dup).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
    }

    #[tokio::test]
    async fn latest_is_highest_index() {
        let store = MemoryLogStore::new();
        assert!(store.latest().await.unwrap().is_none());
        let store = seeded(3).await;
        assert_eq!(store.latest().await.unwrap().unwrap().log_index, 3);
    }

    #[tokio::test]
    async fn list_is_keyset_paginated() {
        let store = seeded(5).await;
        let page = store
            .list(&LogQuery { after_index: 2, limit: 2, ..LogQuery::default() })
            .await
            .unwrap();
        let indexes: Vec<u64> = page.iter().map(|l| l.log_index).collect();
        assert_eq!(indexes, vec![3, 4]);
    }

    #[tokio::test]
    async fn list_applies_filter_before_limit() {
        let store = seeded(6).await;
        let filter = Filter {
            patient_ids: Some(vec!["even".to_string()]),
            ..Filter::default()
        };
        let page = store
            .list(&LogQuery { after_index: 0, limit: 2, filter: Some(filter), include_deleted: false })
            .await
            .unwrap();
        let indexes: Vec<u64> = page.iter().map(|l| l.log_index).collect();
        assert_eq!(indexes, vec![2, 4]);
    }

    #[tokio::test]
    async fn soft_deleted_rows_are_hidden_from_listing_only() {
        let store = seeded(3).await;
        store.soft_delete("hash-2").await.unwrap();

        let visible = store
            .list(&LogQuery { limit: 10, ..LogQuery::default() })
            .await
            .unwrap();
        assert_eq!(visible.len(), 2);

        let all = store
            .list(&LogQuery { limit: 10, include_deleted: true, ..LogQuery::default() })
            .await
            .unwrap();
        assert_eq!(all.len(), 3);

        let row = store.get_by_hash("hash-2").await.unwrap().unwrap();
        assert!(row.deleted);
        assert_eq!(store.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn soft_delete_of_unknown_hash_is_not_found() {
        let store = seeded(1).await;
        let err = store.soft_delete("nope").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }
}
