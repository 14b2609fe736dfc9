//! # medledger-contracts
//!
//! Shared types, error taxonomy, and configuration for the medical-records
//! transaction ledger.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate: only data definitions, small predicates, and error types.

pub mod actor;
pub mod config;
pub mod error;
pub mod filter;
pub mod log;
pub mod operation;
pub mod rpc;
pub mod transaction;
