//! # error
//!
//! why: give every failure of the topology model a typed, matchable shape
//! relations: returned by endpoint, config, codec and core_state operations
//! what: ConfigError

use crate::types::Uid;

/// Errors produced while querying, building or decoding log system topology.
///
/// Nothing in this crate retries or recovers locally; every variant is
/// surfaced to the caller, which is normally the recovery process.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// An operation was called on a value that does not satisfy its contract,
    /// e.g. reading the interface of an unresolved endpoint.
    #[error("precondition violated: {0}")]
    PreconditionViolation(String),

    /// Malformed wire payload.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// A snapshot does not chain to the predecessor it was checked against.
    #[error("snapshot does not follow predecessor: {reason}")]
    ChainDiscontinuity { reason: String },

    /// A structural assertion failed; the topology was built incorrectly upstream.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}

impl ConfigError {
    pub(crate) fn unresolved(id: Uid) -> Self {
        Self::PreconditionViolation(format!("log server {id} has no resolved interface"))
    }
}
