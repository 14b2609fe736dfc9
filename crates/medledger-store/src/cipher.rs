//! ChaCha20-Poly1305 encryption provider.
//!
//! Ciphertext layout: 12-byte random nonce followed by the AEAD output
//! (ciphertext plus 16-byte Poly1305 tag).  Any modification of the stored
//! bytes fails tag verification and surfaces as `CipherError::Decrypt`.

use chacha20poly1305::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    ChaCha20Poly1305, Nonce,
};

use medledger_contracts::error::CipherError;
use medledger_core::traits::Cipher;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

pub struct ChaChaCipher {
    aead: ChaCha20Poly1305,
}

impl ChaChaCipher {
    /// Build a cipher from a raw 32-byte key.
    pub fn new(key: &[u8]) -> Result<Self, CipherError> {
        let aead = ChaCha20Poly1305::new_from_slice(key).map_err(|_| CipherError::InvalidKey {
            reason: format!("expected 32 key bytes, got {}", key.len()),
        })?;
        Ok(Self { aead })
    }

    /// Build a cipher from a 64-character hex key.
    pub fn from_hex(key_hex: &str) -> Result<Self, CipherError> {
        let key = hex::decode(key_hex.trim()).map_err(|e| CipherError::InvalidKey {
            reason: format!("key is not valid hex: {}", e),
        })?;
        Self::new(&key)
    }

    /// Build a cipher with a freshly generated random key.
    pub fn generate() -> Self {
        let key = ChaCha20Poly1305::generate_key(&mut OsRng);
        Self {
            aead: ChaCha20Poly1305::new(&key),
        }
    }
}

impl Cipher for ChaChaCipher {
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
        let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);
        let sealed = self
            .aead
            .encrypt(&nonce, plaintext)
            .map_err(|e| CipherError::Encrypt {
                reason: e.to_string(),
            })?;

        let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&sealed);
        Ok(out)
    }

    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CipherError> {
        if ciphertext.len() < NONCE_LEN + TAG_LEN {
            return Err(CipherError::Decrypt {
                reason: format!("ciphertext too short ({} bytes)", ciphertext.len()),
            });
        }
        let (nonce, sealed) = ciphertext.split_at(NONCE_LEN);
        self.aead
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map_err(|_| CipherError::Decrypt {
                reason: "authentication tag mismatch".to_string(),
            })
    }
}
