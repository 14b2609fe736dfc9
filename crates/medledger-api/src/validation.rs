//! Request validation for the ledger service.
//!
//! Every check is local and runs before any store I/O.  Checks run in a
//! fixed order and the first failure wins, so each malformed request maps
//! to exactly one `InvalidArgument` reason.

use medledger_contracts::{
    actor::ActorKind,
    error::{LedgerError, LedgerResult},
    filter::Filter,
    rpc::AddLogRequest,
    transaction::{Operation, Transaction},
};

/// Validate an AddLog request and hand back its transaction.
///
/// Order of checks:
///
/// 1. a transaction is present
/// 2. the creator actor is present, with an id, a name and a known kind
/// 3. the operation is not the `Unknown` sentinel
/// 4. `details` are non-empty
pub fn validate_add_log(request: AddLogRequest) -> LedgerResult<Transaction> {
    let tx = request
        .transaction
        .ok_or_else(|| LedgerError::invalid_argument("transaction is required"))?;

    let creator = tx
        .creator
        .as_ref()
        .ok_or_else(|| LedgerError::invalid_argument("creator actor is required"))?;
    if creator.id.is_empty() {
        return Err(LedgerError::invalid_argument("creator id is required"));
    }
    if creator.name.is_empty() {
        return Err(LedgerError::invalid_argument("creator name is required"));
    }
    if creator.kind == ActorKind::Unknown {
        return Err(LedgerError::invalid_argument("creator actor kind is unknown"));
    }

    if tx.operation == Operation::Unknown {
        return Err(LedgerError::invalid_argument("operation is unknown"));
    }

    if tx.details.is_empty() {
        return Err(LedgerError::invalid_argument("transaction details are required"));
    }

    Ok(tx)
}

/// Reject filters that can never match, such as an inverted date range.
pub fn validate_filter(filter: &Filter) -> LedgerResult<()> {
    if let Some(range) = filter.date_range {
        if let (Some(from), Some(to)) = (range.from, range.to) {
            if from > to {
                return Err(LedgerError::invalid_argument(format!(
                    "date range start {} is after its end {}",
                    from, to
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use medledger_contracts::{
        actor::ActorPayload,
        error::LedgerError,
        filter::DateRange,
    };

    use super::*;

    fn valid_tx() -> Transaction {
        Transaction {
            operation: Operation::AddRecord,
            creator: Some(ActorPayload::new(ActorKind::Hospital, "hosp-1", "General")),
            patient: Some(ActorPayload::new(ActorKind::Patient, "pat-1", "Pat")),
            organization: None,
            details: b"blood panel".to_vec(),
        }
    }

    fn reason(result: LedgerResult<Transaction>) -> String {
        match result {
            Err(LedgerError::InvalidArgument { reason }) => reason,
            other => panic!("expected InvalidArgument, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_request_passes() {
        let tx = validate_add_log(AddLogRequest::new(valid_tx())).unwrap();
        assert_eq!(tx, valid_tx());
    }

    #[test]
    fn test_each_check_has_its_own_reason() {
        let mut reasons = vec![reason(validate_add_log(AddLogRequest::default()))];

        let mut tx = valid_tx();
        tx.creator = None;
        reasons.push(reason(validate_add_log(AddLogRequest::new(tx))));

        let mut tx = valid_tx();
        tx.creator.as_mut().unwrap().id.clear();
        reasons.push(reason(validate_add_log(AddLogRequest::new(tx))));

        let mut tx = valid_tx();
        tx.creator.as_mut().unwrap().name.clear();
        reasons.push(reason(validate_add_log(AddLogRequest::new(tx))));

        let mut tx = valid_tx();
        tx.creator.as_mut().unwrap().kind = ActorKind::Unknown;
        reasons.push(reason(validate_add_log(AddLogRequest::new(tx))));

        let mut tx = valid_tx();
        tx.operation = Operation::Unknown;
        reasons.push(reason(validate_add_log(AddLogRequest::new(tx))));

        let mut tx = valid_tx();
        tx.details.clear();
        reasons.push(reason(validate_add_log(AddLogRequest::new(tx))));

        let mut distinct = reasons.clone();
        distinct.sort();
        distinct.dedup();
        assert_eq!(distinct.len(), reasons.len(), "reasons: {:?}", reasons);
    }

    /// With several defects present, the earliest check reports.
    #[test]
    fn test_first_failure_wins() {
        let mut tx = valid_tx();
        tx.creator.as_mut().unwrap().name.clear();
        tx.operation = Operation::Unknown;
        tx.details.clear();
        assert_eq!(
            reason(validate_add_log(AddLogRequest::new(tx))),
            "creator name is required"
        );
    }

    #[test]
    fn test_inverted_date_range_is_rejected() {
        let filter = Filter {
            date_range: Some(DateRange {
                from: Some(200),
                to: Some(100),
            }),
            ..Filter::default()
        };
        assert!(matches!(
            validate_filter(&filter),
            Err(LedgerError::InvalidArgument { .. })
        ));

        let open_ended = Filter {
            date_range: Some(DateRange {
                from: Some(200),
                to: None,
            }),
            ..Filter::default()
        };
        assert!(validate_filter(&open_ended).is_ok());
    }
}
