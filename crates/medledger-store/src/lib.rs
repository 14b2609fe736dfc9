//! # medledger-store
//!
//! Reference backends for the ledger's capability traits:
//!
//! - [`MemoryOrderingStore`]: FIFO lists with blocking pop, atomic batches,
//!   slots and TTL leases
//! - [`MemoryLogStore`]: hash-unique, index-ordered table of committed logs
//! - [`ChaChaCipher`]: ChaCha20-Poly1305 encryption provider
//!
//! The in-memory stores are suitable for tests, demos and single-process
//! deployments; nothing is persisted across restarts.

pub mod cipher;
pub mod logs;
pub mod ordering;

pub use cipher::ChaChaCipher;
pub use logs::MemoryLogStore;
pub use ordering::MemoryOrderingStore;
