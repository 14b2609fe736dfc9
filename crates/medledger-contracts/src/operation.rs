//! Pending-operation receipts returned by AddLog.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::transaction::Transaction;

/// Status of a pending operation.
///
/// Receipts are created `Pending` and the ledger never changes them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationStatus {
    #[default]
    Pending,
}

/// A lightweight receipt for a transaction accepted into the work queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingOperation {
    /// UUID v4 generated at acceptance time.
    pub id: String,
    /// Human-readable summary of what was submitted.
    pub details: String,
    pub status: OperationStatus,
    pub timestamp_sec: i64,
}

impl PendingOperation {
    /// Build a fresh `Pending` receipt describing `tx`.
    pub fn for_transaction(tx: &Transaction) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            details: summarize(tx),
            status: OperationStatus::Pending,
            timestamp_sec: Utc::now().timestamp(),
        }
    }
}

/// Summary line embedding the operation name and the organization and
/// patient identifiers.
fn summarize(tx: &Transaction) -> String {
    let organization = tx
        .organization
        .as_ref()
        .map(|o| format!("{} ({})", o.name, o.id))
        .unwrap_or_else(|| "-".to_string());
    let patient = tx
        .patient
        .as_ref()
        .map(|p| format!("{} ({})", p.name, p.id))
        .unwrap_or_else(|| "-".to_string());

    format!(
        "{} requested by organization {} for patient {}",
        tx.operation, organization, patient
    )
}
