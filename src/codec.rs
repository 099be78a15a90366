//! Value codec
//!
//! Every typed value LexiKV persists (dictionary entries, `set_typed`
//! payloads, backup records) goes through these two functions, so the
//! encoding is defined in exactly one place.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

/// Encode a value with bincode
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    Ok(bincode::serialize(value)?)
}

/// Decode a value previously produced by [`encode`]
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(bincode::deserialize(bytes)?)
}
