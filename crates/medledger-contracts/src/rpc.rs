//! Request and response shapes of the ledger RPC surface.
//!
//! Message fields that a transport may leave unset are `Option`s, so a
//! missing message is representable and rejected by the service rather
//! than by the decoder.

use serde::{Deserialize, Serialize};

use crate::{filter::Filter, log::Log, operation::PendingOperation, transaction::Transaction};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddLogRequest {
    #[serde(default)]
    pub transaction: Option<Transaction>,
}

impl AddLogRequest {
    pub fn new(transaction: Transaction) -> Self {
        Self {
            transaction: Some(transaction),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddLogResponse {
    /// Id of the `PendingOperation` receipt.
    pub operation_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetLogRequest {
    #[serde(default)]
    pub hash: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListLogsRequest {
    /// Keyset token: only entries with a greater `log_index` are returned.
    #[serde(default)]
    pub page_token: u64,
    /// Clamped to `(0, max]`; values `<= 0` select the default.
    #[serde(default)]
    pub page_size: i32,
    #[serde(default)]
    pub filter: Option<Filter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListLogsResponse {
    pub logs: Vec<Log>,
    pub next_page_token: u64,
}

/// The empty marker message taken by GetLedgerStat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Empty;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListOperationsRequest {
    #[serde(default)]
    pub actor_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListOperationsResponse {
    /// Newest first.
    pub operations: Vec<PendingOperation>,
}
