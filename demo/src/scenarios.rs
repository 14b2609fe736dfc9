//! Demo scenarios run against the in-memory ledger stack.
//!
//! All actors and records here are fictional.

use std::{sync::Arc, time::Duration};

use tracing::info;

use medledger_api::LedgerService;
use medledger_chain::{refresh_ledger_stats, replay_backup, verify_chain, Committer};
use medledger_contracts::{
    actor::{ActorKind, ActorPayload},
    config::LedgerConfig,
    error::{LedgerError, LedgerResult},
    filter::Filter,
    log::Log,
    rpc::{AddLogRequest, Empty, GetLogRequest, ListLogsRequest, ListOperationsRequest},
    transaction::{Operation, Transaction},
};
use medledger_core::traits::{LogStore, OrderingStore};
use medledger_store::{ChaChaCipher, MemoryLogStore, MemoryOrderingStore};

/// How long a scenario waits for the committer to catch up.
const COMMIT_WAIT: Duration = Duration::from_secs(5);

// ── Stack ─────────────────────────────────────────────────────────────────────

/// One ordering store, one log store, one key: a single-node deployment.
pub struct Stack {
    ordering: Arc<MemoryOrderingStore>,
    logs: Arc<MemoryLogStore>,
    cipher: Arc<ChaChaCipher>,
    config: LedgerConfig,
    service: LedgerService,
}

impl Stack {
    pub fn new(config: LedgerConfig) -> LedgerResult<Self> {
        let ordering = Arc::new(MemoryOrderingStore::new());
        let logs = Arc::new(MemoryLogStore::new());
        let cipher = Arc::new(ChaChaCipher::generate());
        let service = LedgerService::builder()
            .ordering(ordering.clone())
            .logs(logs.clone())
            .cipher(cipher.clone())
            .config(config.clone())
            .build()?;
        Ok(Self {
            ordering,
            logs,
            cipher,
            config,
            service,
        })
    }

    fn committer(&self) -> LedgerResult<Committer> {
        Committer::builder()
            .ordering(self.ordering.clone())
            .logs(self.logs.clone())
            .cipher(self.cipher.clone())
            .config(self.config.clone())
            .holder("demo-committer")
            .build()
    }

    async fn submit(&self, tx: Transaction) -> LedgerResult<String> {
        let resp = self.service.add_log(AddLogRequest::new(tx)).await?;
        Ok(resp.operation_id)
    }

    /// Run the committer until `expected` rows are stored, then stop it.
    async fn commit_all(&self, expected: u64) -> LedgerResult<()> {
        let handle = self.committer()?.spawn();
        let deadline = tokio::time::Instant::now() + COMMIT_WAIT;
        while self.logs.count().await? < expected {
            if handle.is_finished() {
                handle.join().await?;
                return Err(LedgerError::internal("committer stopped before the queue drained"));
            }
            if tokio::time::Instant::now() >= deadline {
                handle.shutdown().await?;
                return Err(LedgerError::internal(format!(
                    "committer did not store {} logs within {:?}",
                    expected, COMMIT_WAIT
                )));
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        handle.shutdown().await
    }

    /// Wait until the work queue is empty, then stop the committer.
    async fn drain_queue(&self) -> LedgerResult<()> {
        let handle = self.committer()?.spawn();
        let deadline = tokio::time::Instant::now() + COMMIT_WAIT;
        while self.ordering.len(&self.config.keys.queue).await? > 0 {
            if tokio::time::Instant::now() >= deadline {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        handle.shutdown().await
    }

    async fn all_logs(&self) -> LedgerResult<Vec<Log>> {
        let mut out = Vec::new();
        let mut token = 0;
        loop {
            let page = self
                .service
                .list_logs(ListLogsRequest {
                    page_token: token,
                    page_size: self.config.max_page_size as i32,
                    filter: None,
                })
                .await?;
            if page.logs.is_empty() {
                return Ok(out);
            }
            token = page.next_page_token;
            out.extend(page.logs);
        }
    }
}

// ── Sample data ───────────────────────────────────────────────────────────────

fn hospital() -> ActorPayload {
    ActorPayload::new(ActorKind::Hospital, "hosp-stmary", "St. Mary General")
}

fn insurer() -> ActorPayload {
    ActorPayload::new(ActorKind::Insurer, "ins-northwind", "Northwind Health")
}

fn patient(n: u32) -> ActorPayload {
    ActorPayload::new(ActorKind::Patient, format!("pat-{:03}", n), format!("Patient {}", n))
}

fn tx(
    creator: ActorPayload,
    operation: Operation,
    patient: ActorPayload,
    details: &str,
) -> Transaction {
    Transaction {
        operation,
        creator: Some(creator),
        patient: Some(patient),
        organization: Some(hospital()),
        details: details.as_bytes().to_vec(),
    }
}

fn short(hash: &str) -> &str {
    if hash.is_empty() {
        "(genesis)"
    } else {
        &hash[..hash.len().min(16)]
    }
}

fn print_log(log: &Log) {
    println!(
        "  #{:<3} {:<16} prev={:<16} hash={}  {} by {}",
        log.log_index,
        log.payload.operation.as_str(),
        short(&log.prev_hash),
        short(&log.hash),
        log.payload.patient_id(),
        log.payload.creator_id(),
    );
}

// ── Scenario: chain ───────────────────────────────────────────────────────────

/// Submit a patient's visit, commit it, and verify the resulting chain.
pub async fn chain(stack: &Stack) -> LedgerResult<()> {
    println!("=== Scenario: hash-chained commit ===");
    println!();

    let submissions = vec![
        tx(hospital(), Operation::RegisterPatient, patient(1), "intake form"),
        tx(hospital(), Operation::AddRecord, patient(1), "CBC: within normal limits"),
        tx(insurer(), Operation::SubmitClaim, patient(1), "claim 88121, outpatient"),
    ];
    let count = submissions.len() as u64;
    for t in submissions {
        let id = stack.submit(t).await?;
        println!("  accepted, pending operation {}", id);
    }

    stack.commit_all(count).await?;
    println!();

    let logs = stack.all_logs().await?;
    for log in &logs {
        print_log(log);
    }

    let first = logs
        .first()
        .ok_or_else(|| LedgerError::internal("no logs were committed"))?;
    let fetched = stack
        .service
        .get_log(GetLogRequest {
            hash: first.hash.clone(),
        })
        .await?;
    println!();
    println!(
        "  GetLog #{}: {:?}",
        fetched.log_index,
        String::from_utf8_lossy(&fetched.payload.details)
    );

    match verify_chain(&logs) {
        Ok(()) => println!("  Chain verification: PASS ({} logs)", logs.len()),
        Err(brk) => {
            return Err(LedgerError::internal(format!("chain verification failed: {}", brk)))
        }
    }

    refresh_ledger_stats(
        stack.ordering.as_ref(),
        stack.logs.as_ref(),
        stack.cipher.as_ref(),
        &stack.config.keys,
        stack.config.default_page_size as usize,
    )
    .await?;
    let stats = stack.service.get_ledger_stat(Some(Empty)).await?;
    println!(
        "  Ledger stats: {} logs, valid={}, last hash {}",
        stats.total_tx_logs,
        stats.valid,
        short(&stats.last_insert_hash)
    );

    let ops = stack
        .service
        .list_operations(ListOperationsRequest {
            actor_id: hospital().id,
        })
        .await?;
    println!("  Receipts for {}:", hospital().id);
    for op in &ops.operations {
        println!("    {} [{:?}] {}", op.id, op.status, op.details);
    }

    println!();
    println!("  RESULT: chain intact");
    println!();
    Ok(())
}

// ── Scenario: quarantine ──────────────────────────────────────────────────────

/// Bad input is rejected up front; undecryptable queue entries are moved to
/// the backup list without breaking the chain.
pub async fn quarantine(stack: &Stack) -> LedgerResult<()> {
    println!("=== Scenario: validation and quarantine ===");
    println!();

    let unknown = tx(hospital(), Operation::Unknown, patient(2), "missing operation");
    match stack.submit(unknown).await {
        Err(e @ LedgerError::InvalidArgument { .. }) => println!("  AddLog rejected: {}", e),
        Err(e) => return Err(e),
        Ok(id) => {
            return Err(LedgerError::internal(format!(
                "invalid transaction was accepted as {}",
                id
            )))
        }
    }

    stack
        .submit(tx(hospital(), Operation::AddRecord, patient(2), "x-ray, left wrist"))
        .await?;
    // An entry sealed under some other key; the committer cannot open it.
    stack
        .ordering
        .push_head(&stack.config.keys.queue, b"foreign ciphertext".to_vec())
        .await?;
    stack
        .submit(tx(hospital(), Operation::UpdateRecord, patient(2), "cast applied"))
        .await?;

    stack.drain_queue().await?;

    let logs = stack.all_logs().await?;
    for log in &logs {
        print_log(log);
    }
    let backup = stack.ordering.len(&stack.config.keys.backup).await?;
    println!("  Backup list entries: {}", backup);
    match verify_chain(&logs) {
        Ok(()) => println!("  Chain verification: PASS ({} logs)", logs.len()),
        Err(brk) => {
            return Err(LedgerError::internal(format!("chain verification failed: {}", brk)))
        }
    }

    let moved = replay_backup(stack.ordering.as_ref(), &stack.config.keys).await?;
    info!(moved, "operator replayed backup list");
    println!("  Replayed {} entry(ies) onto the work queue for another attempt", moved);

    println!();
    println!("  RESULT: failures isolated");
    println!();
    Ok(())
}

// ── Scenario: paginate ────────────────────────────────────────────────────────

/// Keyset pagination over a larger ledger, with and without a filter.
pub async fn paginate(stack: &Stack) -> LedgerResult<()> {
    println!("=== Scenario: filtered pagination ===");
    println!();

    let mut count = 0u64;
    for n in 1..=6 {
        stack
            .submit(tx(hospital(), Operation::AddRecord, patient(n), "annual checkup"))
            .await?;
        stack
            .submit(tx(insurer(), Operation::SubmitClaim, patient(n), "checkup claim"))
            .await?;
        count += 2;
    }
    stack.commit_all(count).await?;

    let mut token = 0;
    let mut page_no = 1;
    loop {
        let page = stack
            .service
            .list_logs(ListLogsRequest {
                page_token: token,
                page_size: 5,
                filter: None,
            })
            .await?;
        if page.logs.is_empty() {
            break;
        }
        println!("  Page {} (token {} -> {})", page_no, token, page.next_page_token);
        for log in &page.logs {
            print_log(log);
        }
        token = page.next_page_token;
        page_no += 1;
    }

    let claims = stack
        .service
        .list_logs(ListLogsRequest {
            page_token: 0,
            page_size: 50,
            filter: Some(Filter {
                creator_kinds: Some(vec![ActorKind::Insurer]),
                patient_ids: Some(vec![patient(2).id, patient(5).id]),
                ..Filter::default()
            }),
        })
        .await?;
    println!();
    println!("  Insurer activity for pat-002 and pat-005:");
    for log in &claims.logs {
        print_log(log);
    }

    println!();
    println!("  RESULT: {} logs paged, {} matched filter", count, claims.logs.len());
    println!();
    Ok(())
}
