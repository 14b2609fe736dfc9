//! The request-facing ledger service.
//!
//! Handlers share no mutable state and may run concurrently.  Writes never
//! touch the log store: AddLog only enqueues, and the committer is the sole
//! writer of committed rows.  Every store round-trip runs under the
//! configured request deadline; an expired deadline surfaces as a store
//! timeout and therefore as `Internal`.

use std::{future::Future, sync::Arc};

use tracing::{debug, info};

use medledger_contracts::{
    config::LedgerConfig,
    error::{LedgerError, LedgerResult, StoreError, StoreResult},
    log::{LedgerStats, Log},
    operation::PendingOperation,
    rpc::{
        AddLogRequest, AddLogResponse, Empty, GetLogRequest, ListLogsRequest, ListLogsResponse,
        ListOperationsRequest, ListOperationsResponse,
    },
};
use medledger_core::{
    codec,
    traits::{BatchOp, Cipher, LogQuery, LogStore, OrderingStore},
};

use crate::validation::{validate_add_log, validate_filter};

/// Builder for [`LedgerService`].
#[derive(Default)]
pub struct LedgerServiceBuilder {
    ordering: Option<Arc<dyn OrderingStore>>,
    logs: Option<Arc<dyn LogStore>>,
    cipher: Option<Arc<dyn Cipher>>,
    config: Option<LedgerConfig>,
}

impl LedgerServiceBuilder {
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

    /// Optional; defaults to `LedgerConfig::default()`.
    pub fn config(mut self, config: LedgerConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn build(self) -> LedgerResult<LedgerService> {
        let ordering = self
            .ordering
            .ok_or_else(|| LedgerError::config("ledger service requires an ordering store"))?;
        let logs = self
            .logs
            .ok_or_else(|| LedgerError::config("ledger service requires a log store"))?;
        let cipher = self
            .cipher
            .ok_or_else(|| LedgerError::config("ledger service requires a cipher"))?;
        let config = self.config.unwrap_or_default();
        config.validate()?;

        Ok(LedgerService {
            ordering,
            logs,
            cipher,
            config,
        })
    }
}

/// AddLog, GetLog, ListLogs, GetLedgerStat and ListOperations.
#[derive(Clone)]
pub struct LedgerService {
    ordering: Arc<dyn OrderingStore>,
    logs: Arc<dyn LogStore>,
    cipher: Arc<dyn Cipher>,
    config: LedgerConfig,
}

impl LedgerService {
    pub fn builder() -> LedgerServiceBuilder {
        LedgerServiceBuilder::default()
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Validate, encrypt and enqueue a transaction.
    ///
    /// The receipt and the queue entry are written in one atomic batch: on
    /// failure neither is visible.  Returns as soon as the entry is queued;
    /// the log is committed later by the committer.
    pub async fn add_log(&self, request: AddLogRequest) -> LedgerResult<AddLogResponse> {
        let tx = validate_add_log(request).inspect_err(|e| {
            debug!(error = %e, "AddLog rejected");
        })?;

        let operation = PendingOperation::for_transaction(&tx);
        let creator_id = tx.creator_id().to_string();
        let operation_name = tx.operation.as_str();

        let envelope = codec::seal(self.cipher.as_ref(), &Log::envelope(tx))?;
        let receipt = codec::seal(self.cipher.as_ref(), &operation)?;

        let keys = &self.config.keys;
        let batch = vec![
            BatchOp::PushHead {
                list: keys.operations(&creator_id),
                value: receipt,
            },
            BatchOp::PushHead {
                list: keys.queue.clone(),
                value: envelope,
            },
        ];
        self.deadline(self.ordering.exec_batch(batch)).await?;

        info!(
            operation_id = %operation.id,
            operation = operation_name,
            creator = %creator_id,
            "transaction accepted"
        );
        Ok(AddLogResponse {
            operation_id: operation.id,
        })
    }

    /// Fetch one committed log by its exact hash.
    ///
    /// Soft-deleted logs are still returned.
    pub async fn get_log(&self, request: GetLogRequest) -> LedgerResult<Log> {
        if request.hash.is_empty() {
            return Err(LedgerError::invalid_argument("hash is required"));
        }

        match self.deadline(self.logs.get_by_hash(&request.hash)).await {
            Ok(Some(log)) => Ok(log),
            Ok(None) | Err(StoreError::NotFound { .. }) => {
                Err(LedgerError::not_found("log not found for hash"))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// One keyset page of committed logs, ascending by `log_index`.
    pub async fn list_logs(&self, request: ListLogsRequest) -> LedgerResult<ListLogsResponse> {
        if let Some(filter) = &request.filter {
            validate_filter(filter)?;
        }

        let query = LogQuery {
            after_index: request.page_token,
            limit: self.config.clamp_page_size(request.page_size),
            filter: request.filter.filter(|f| !f.is_disabled()),
            include_deleted: false,
        };
        let logs = self.deadline(self.logs.list(&query)).await?;

        // An empty page leaves the cursor where it was.
        let next_page_token = logs.last().map_or(request.page_token, |l| l.log_index);
        debug!(
            page_token = request.page_token,
            returned = logs.len(),
            next_page_token,
            "ListLogs page served"
        );
        Ok(ListLogsResponse {
            logs,
            next_page_token,
        })
    }

    /// Read and decrypt the stats slot.
    ///
    /// The slot is written out of band; until the first refresh it is
    /// missing and this returns `Internal`.
    pub async fn get_ledger_stat(&self, request: Option<Empty>) -> LedgerResult<LedgerStats> {
        if request.is_none() {
            return Err(LedgerError::invalid_argument("request is required"));
        }

        let slot = self
            .deadline(self.ordering.get_slot(&self.config.keys.stats))
            .await?
            .ok_or_else(|| LedgerError::internal("ledger stats have not been computed"))?;
        codec::open(self.cipher.as_ref(), &slot)
    }

    /// The pending-operation receipts submitted by one actor, newest first.
    pub async fn list_operations(
        &self,
        request: ListOperationsRequest,
    ) -> LedgerResult<ListOperationsResponse> {
        if request.actor_id.is_empty() {
            return Err(LedgerError::invalid_argument("actor id is required"));
        }

        let raw = self
            .deadline(self.ordering.range(&self.config.keys.operations(&request.actor_id)))
            .await?;
        let operations = raw
            .iter()
            .map(|bytes| codec::open::<PendingOperation>(self.cipher.as_ref(), bytes))
            .collect::<LedgerResult<Vec<_>>>()?;

        Ok(ListOperationsResponse { operations })
    }

    async fn deadline<T>(&self, call: impl Future<Output = StoreResult<T>>) -> StoreResult<T> {
        tokio::time::timeout(self.config.request_timeout(), call)
            .await
            .unwrap_or(Err(StoreError::Timeout))
    }
}
