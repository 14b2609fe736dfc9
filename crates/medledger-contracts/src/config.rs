//! Ledger configuration loaded from TOML.
//!
//! Every field has a default, so an empty document is a valid configuration.
//!
//! ```toml
//! dequeue_timeout_ms = 5000
//! request_timeout_ms = 10000
//! lease_ttl_ms = 15000
//! default_page_size = 10
//! max_page_size = 500
//!
//! [keys]
//! queue = "ledger:queue"
//! backup = "ledger:backup"
//! ```

use std::{path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};

/// Names of the ordering-store lists and slots the ledger uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreKeys {
    /// FIFO of encrypted log envelopes awaiting commit.
    pub queue: String,
    /// Quarantine list for entries the committer could not process.
    pub backup: String,
    /// Encrypted `LedgerStats` slot.
    pub stats: String,
    /// Single-writer lease held by the committer.
    pub lease: String,
    /// Prefix of the per-actor pending-operation lists.
    pub operations_prefix: String,
}

impl Default for StoreKeys {
    fn default() -> Self {
        Self {
            queue: "ledger:queue".to_string(),
            backup: "ledger:backup".to_string(),
            stats: "ledger:stats".to_string(),
            lease: "ledger:committer-lease".to_string(),
            operations_prefix: "ledger:operations:".to_string(),
        }
    }
}

impl StoreKeys {
    /// Key of the pending-operation list for one actor.
    pub fn operations(&self, actor_id: &str) -> String {
        format!("{}{}", self.operations_prefix, actor_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub dequeue_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub lease_ttl_ms: u64,
    pub default_page_size: u32,
    pub max_page_size: u32,
    pub keys: StoreKeys,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            dequeue_timeout_ms: 5_000,
            request_timeout_ms: 10_000,
            lease_ttl_ms: 15_000,
            default_page_size: 10,
            max_page_size: 500,
            keys: StoreKeys::default(),
        }
    }
}

impl LedgerConfig {
    /// Parse and validate a TOML document.
    ///
    /// Returns `LedgerError::Config` if the TOML is malformed or the values
    /// are inconsistent.
    pub fn from_toml_str(s: &str) -> LedgerResult<Self> {
        let config: LedgerConfig = toml::from_str(s)
            .map_err(|e| LedgerError::config(format!("failed to parse ledger TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read the file at `path` and parse it as ledger configuration.
    pub fn from_file(path: &Path) -> LedgerResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            LedgerError::config(format!(
                "failed to read ledger config '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> LedgerResult<()> {
        if self.dequeue_timeout_ms == 0 {
            return Err(LedgerError::config("dequeue_timeout_ms must be positive"));
        }
        // A blocked pop must never outlive the lease it runs under.
        if self.lease_ttl_ms <= self.dequeue_timeout_ms {
            return Err(LedgerError::config(format!(
                "lease_ttl_ms ({}) must exceed dequeue_timeout_ms ({})",
                self.lease_ttl_ms, self.dequeue_timeout_ms
            )));
        }
        if self.default_page_size == 0 || self.default_page_size > self.max_page_size {
            return Err(LedgerError::config(format!(
                "default_page_size ({}) must be in (0, {}]",
                self.default_page_size, self.max_page_size
            )));
        }
        Ok(())
    }

    pub fn dequeue_timeout(&self) -> Duration {
        Duration::from_millis(self.dequeue_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn lease_ttl(&self) -> Duration {
        Duration::from_millis(self.lease_ttl_ms)
    }

    /// Clamp a requested page size into `(0, max_page_size]`.
    pub fn clamp_page_size(&self, requested: i32) -> usize {
        if requested <= 0 {
            self.default_page_size as usize
        } else {
            (requested as u32).min(self.max_page_size) as usize
        }
    }
}
