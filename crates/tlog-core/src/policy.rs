//! # policy
//!
//! why: let log groups carry and compare the replication policy they were recruited under
//! relations: held by group.rs and core_state.rs, evaluated by the external placement engine
//! what: ReplicationPolicy tree, PolicyRef handle, PolicyDigest content digest

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Shared handle to a replication policy.
///
/// Two handles are considered the same policy when their digests match,
/// regardless of whether they point at the same allocation.
pub type PolicyRef = Arc<ReplicationPolicy>;

/// Describes how replicas must be spread across locality attributes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReplicationPolicy {
    /// A single replica anywhere.
    One,
    /// `count` distinct values of `attribute`, each satisfying `inner`.
    Across {
        count: u32,
        attribute: String,
        inner: Box<ReplicationPolicy>,
    },
    /// Every sub-policy must be satisfied.
    All(Vec<ReplicationPolicy>),
}

impl ReplicationPolicy {
    pub fn across(count: u32, attribute: impl Into<String>, inner: ReplicationPolicy) -> Self {
        Self::Across {
            count,
            attribute: attribute.into(),
            inner: Box::new(inner),
        }
    }

    /// Human readable form, for logs only. Not injective; never compare on it.
    pub fn describe(&self) -> String {
        match self {
            Self::One => "One".to_string(),
            Self::Across {
                count,
                attribute,
                inner,
            } => format!("{attribute}^{count} x {}", inner.describe()),
            Self::All(policies) => {
                let parts: Vec<String> = policies.iter().map(Self::describe).collect();
                format!("({})", parts.join(" & "))
            }
        }
    }

    /// Digest over a tagged, length-prefixed encoding of the policy tree, so
    /// structurally different policies never hash the same input.
    pub fn digest(&self) -> PolicyDigest {
        let mut hasher = blake3::Hasher::new();
        self.hash_into(&mut hasher);
        PolicyDigest(hasher.finalize().into())
    }

    fn hash_into(&self, hasher: &mut blake3::Hasher) {
        match self {
            Self::One => {
                hasher.update(&[0]);
            }
            Self::Across {
                count,
                attribute,
                inner,
            } => {
                hasher.update(&[1]);
                hasher.update(&count.to_le_bytes());
                hasher.update(&(attribute.len() as u64).to_le_bytes());
                hasher.update(attribute.as_bytes());
                inner.hash_into(hasher);
            }
            Self::All(policies) => {
                hasher.update(&[2]);
                hasher.update(&(policies.len() as u64).to_le_bytes());
                for policy in policies {
                    policy.hash_into(hasher);
                }
            }
        }
    }

    /// Minimum number of replicas the policy can be satisfied with.
    pub fn replica_count(&self) -> u32 {
        match self {
            Self::One => 1,
            Self::Across { count, inner, .. } => count.saturating_mul(inner.replica_count()),
            Self::All(policies) => policies.iter().map(Self::replica_count).max().unwrap_or(0),
        }
    }
}

impl fmt::Display for ReplicationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// BLAKE3 digest of a policy's structure.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PolicyDigest([u8; 32]);

impl fmt::Debug for PolicyDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PolicyDigest(")?;
        for byte in &self.0[..8] {
            write!(f, "{byte:02x}")?;
        }
        write!(f, ")")
    }
}

/// Digest comparison of two optional policies: both absent, or both present with equal digests.
pub(crate) fn same_policy(a: Option<&PolicyRef>, b: Option<&PolicyRef>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.digest() == b.digest(),
        _ => false,
    }
}
