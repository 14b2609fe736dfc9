//! # medledger-core
//!
//! The seams of the medical-records transaction ledger.
//!
//! This crate provides:
//! - The three capability traits (`Cipher`, `OrderingStore`, `LogStore`)
//! - The codec used to marshal messages before they are encrypted
//!
//! ## Usage
//!
//! ```rust,ignore
//! use medledger_core::{codec, traits::{Cipher, LogStore, OrderingStore}};
//!
//! let bytes = codec::seal(cipher.as_ref(), &envelope)?;
//! ordering.push_head(&keys.queue, bytes).await?;
//! ```

pub mod codec;
pub mod traits;

pub use traits::{BatchOp, Cipher, LogQuery, LogStore, OrderingStore};

#[cfg(test)]
mod tests {
    use medledger_contracts::{
        actor::{ActorKind, ActorPayload},
        error::{CipherError, LedgerError},
        log::Log,
        transaction::{Operation, Transaction},
    };

    use crate::{codec, traits::Cipher};

    // ── Helpers ───────────────────────────────────────────────────────────────

    /// A toy cipher that tags plaintext so tampering is detectable.
    struct TagCipher;

    const TAG: &[u8] = b"sealed:";

    impl Cipher for TagCipher {
        fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
            let mut out = TAG.to_vec();
            out.extend_from_slice(plaintext);
            Ok(out)
        }

        fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CipherError> {
            ciphertext
                .strip_prefix(TAG)
                .map(|p| p.to_vec())
                .ok_or_else(|| CipherError::Decrypt {
                    reason: "missing tag".to_string(),
                })
        }
    }

    fn make_envelope() -> Log {
        Log::envelope(Transaction {
            operation: Operation::SubmitClaim,
            creator: Some(ActorPayload::new(ActorKind::Insurer, "ins-1", "Acme Health")),
            patient: None,
            organization: None,
            details: vec![0, 1, 2, 255],
        })
    }

    // ── Tests ─────────────────────────────────────────────────────────────────

    #[test]
    fn seal_then_open_preserves_the_envelope() {
        let envelope = make_envelope();
        let sealed = codec::seal(&TagCipher, &envelope).unwrap();
        let opened: Log = codec::open(&TagCipher, &sealed).unwrap();
        assert_eq!(opened, envelope);
    }

    #[test]
    fn open_reports_decrypt_failures_as_internal() {
        let err = codec::open::<Log>(&TagCipher, b"garbage").unwrap_err();
        match err {
            LedgerError::Internal { reason } => assert!(reason.contains("decryption failed")),
            other => panic!("expected Internal, got {:?}", other),
        }
    }

    #[test]
    fn decode_rejects_non_json() {
        let err = codec::decode::<Log>(b"\xff\xfe").unwrap_err();
        assert!(err.to_string().contains("decode failed"));
    }
}
