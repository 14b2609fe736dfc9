//! Marshalling of ledger messages to bytes.
//!
//! Messages are encoded as compact JSON.  `seal` and `open` chain encoding
//! with the injected `Cipher`, which is the shape every payload takes before
//! it is written to the ordering store.

use serde::{de::DeserializeOwned, Serialize};

use medledger_contracts::error::{CodecError, LedgerResult};

use crate::traits::Cipher;

pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec(value).map_err(|e| CodecError::Encode(e.to_string()))
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    serde_json::from_slice(bytes).map_err(|e| CodecError::Decode(e.to_string()))
}

/// Encode `value`, then encrypt it.
pub fn seal<T: Serialize>(cipher: &dyn Cipher, value: &T) -> LedgerResult<Vec<u8>> {
    let plain = encode(value)?;
    Ok(cipher.encrypt(&plain)?)
}

/// Decrypt `bytes`, then decode them.
pub fn open<T: DeserializeOwned>(cipher: &dyn Cipher, bytes: &[u8]) -> LedgerResult<T> {
    let plain = cipher.decrypt(bytes)?;
    Ok(decode(&plain)?)
}
