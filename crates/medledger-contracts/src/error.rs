//! Error types for the ledger pipeline.
//!
//! `LedgerError` is what the request-facing service returns.  The narrower
//! `StoreError`, `CipherError` and `CodecError` come from the collaborators
//! behind it and collapse into `LedgerError::Internal` on the API path.

use thiserror::Error;

/// The RPC-facing error taxonomy.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The request was malformed or incomplete.  Raised before any I/O.
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// The query addressed an entry that does not exist.
    #[error("not found: {reason}")]
    NotFound { reason: String },

    /// An encryption, encoding or store failure.
    #[error("internal error: {reason}")]
    Internal { reason: String },

    /// A required construction argument or configuration value is missing
    /// or invalid.
    #[error("configuration error: {reason}")]
    Config { reason: String },

    /// The committer no longer holds the single-writer lease.
    #[error("committer lease lost: {reason}")]
    LeaseLost { reason: String },
}

impl LedgerError {
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    pub fn not_found(reason: impl Into<String>) -> Self {
        Self::NotFound {
            reason: reason.into(),
        }
    }

    pub fn internal(reason: impl Into<String>) -> Self {
        Self::Internal {
            reason: reason.into(),
        }
    }

    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// The transport status this error maps to.
    pub fn code(&self) -> StatusCode {
        match self {
            LedgerError::InvalidArgument { .. } => StatusCode::InvalidArgument,
            LedgerError::NotFound { .. } => StatusCode::NotFound,
            LedgerError::Internal { .. }
            | LedgerError::Config { .. }
            | LedgerError::LeaseLost { .. } => StatusCode::Internal,
        }
    }
}

/// Status codes surfaced by the RPC layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    InvalidArgument,
    NotFound,
    Internal,
}

/// Errors raised by the ordering store and the relational log store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("key not found: {key}")]
    NotFound { key: String },

    /// A uniqueness constraint was violated, e.g. a duplicate log hash.
    #[error("conflict on {key}")]
    Conflict { key: String },

    #[error("store operation timed out")]
    Timeout,

    #[error("store backend error: {reason}")]
    Backend { reason: String },
}

/// Errors raised by an encryption provider.
#[derive(Debug, Error)]
pub enum CipherError {
    #[error("encryption failed: {reason}")]
    Encrypt { reason: String },

    #[error("decryption failed: {reason}")]
    Decrypt { reason: String },

    #[error("invalid key: {reason}")]
    InvalidKey { reason: String },
}

/// Errors raised while marshalling ledger messages to bytes.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("encode failed: {0}")]
    Encode(String),

    #[error("decode failed: {0}")]
    Decode(String),
}

impl From<StoreError> for LedgerError {
    fn from(e: StoreError) -> Self {
        LedgerError::internal(e.to_string())
    }
}

impl From<CipherError> for LedgerError {
    fn from(e: CipherError) -> Self {
        LedgerError::internal(e.to_string())
    }
}

impl From<CodecError> for LedgerError {
    fn from(e: CodecError) -> Self {
        LedgerError::internal(e.to_string())
    }
}

/// Convenience alias used by the service and committer.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Convenience alias used by store implementations.
pub type StoreResult<T> = Result<T, StoreError>;
