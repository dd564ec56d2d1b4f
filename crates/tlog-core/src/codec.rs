//! # codec
//!
//! why: ship topology snapshots between roles as compact, order-preserving bytes
//! relations: wraps the serde impls of endpoint, group, generation, config and core_state
//! what: encode / decode over bincode with fixed-width ints and bounded allocation

use bincode::Options;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ConfigError;

/// Upper bound on the bytes a single decode may allocate.
pub const MAX_PAYLOAD_BYTES: u64 = 64 * 1024 * 1024;

fn options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
        .with_limit(MAX_PAYLOAD_BYTES)
        .reject_trailing_bytes()
}

pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, ConfigError> {
    options()
        .serialize(value)
        .map_err(|e| ConfigError::Encoding(e.to_string()))
}

/// Decodes a value; the whole buffer must be consumed.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ConfigError> {
    options()
        .deserialize(bytes)
        .map_err(|e| ConfigError::Encoding(e.to_string()))
}
