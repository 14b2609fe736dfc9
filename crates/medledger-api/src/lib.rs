//! # medledger-api
//!
//! The request-facing surface of the medical-records transaction ledger.
//!
//! [`LedgerService`] accepts transactions (AddLog) by validating,
//! encrypting and enqueueing them, and answers reads (GetLog, ListLogs,
//! GetLedgerStat, ListOperations) directly against the stores.  It never
//! writes a committed row itself; see `medledger-chain` for the committer.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use medledger_api::LedgerService;
//!
//! let service = LedgerService::builder()
//!     .ordering(ordering)
//!     .logs(logs)
//!     .cipher(cipher)
//!     .config(config)
//!     .build()?;
//!
//! let receipt = service.add_log(AddLogRequest::new(tx)).await?;
//! ```

pub mod service;
pub mod validation;

pub use service::{LedgerService, LedgerServiceBuilder};

// ── Tests ─────────────────────────────────────────────────────────────────────
