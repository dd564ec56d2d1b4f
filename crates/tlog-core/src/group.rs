//! # group
//!
//! why: describe one replication group of log servers within an epoch
//! relations: collected by generation.rs and config.rs, summarised by core_state.rs
//! what: LogGroup with full and identity equality, BestPolicy, FaultToleranceBasis

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::endpoint::EndpointRef;
use crate::error::ConfigError;
use crate::locality::{Locality, LocalityTags};
use crate::policy::{same_policy, PolicyRef, ReplicationPolicy};

/// Whether the group's replication policy is authoritative for fault tolerance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BestPolicy {
    /// Fault tolerance decisions must consult the policy's content.
    #[default]
    Explicit,
    /// Legacy semantics: only the replica count matters.
    Default,
}

impl fmt::Display for BestPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explicit => f.write_str("explicit"),
            Self::Default => f.write_str("default"),
        }
    }
}

/// What a fault tolerance calculation for a group should be based on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultToleranceBasis<'a> {
    Policy(&'a ReplicationPolicy),
    ReplicaCount(u32),
}

/// A replication group of transaction logs.
///
/// `tlog_localities` is index-aligned with `tlogs` (or empty when unknown).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogGroup {
    pub tlogs: Vec<EndpointRef>,
    pub log_routers: Vec<EndpointRef>,
    /// Replicas allowed to miss a write while it is still durable.
    pub write_anti_quorum: u32,
    /// Total replicas each write goes to.
    pub replication_factor: u32,
    pub tlog_localities: Vec<LocalityTags>,
    pub locality: Locality,
    /// True for the primary region, false for remote or satellite groups.
    pub is_local: bool,
    pub best_policy: BestPolicy,
    pub policy: Option<PolicyRef>,
}

impl Default for LogGroup {
    fn default() -> Self {
        Self {
            tlogs: Vec::new(),
            log_routers: Vec::new(),
            write_anti_quorum: 0,
            replication_factor: 0,
            tlog_localities: Vec::new(),
            locality: Locality::UNSCOPED,
            is_local: true,
            best_policy: BestPolicy::Explicit,
            policy: None,
        }
    }
}

impl LogGroup {
    pub fn new(tlogs: Vec<EndpointRef>, replication_factor: u32) -> Self {
        Self {
            tlogs,
            replication_factor,
            ..Self::default()
        }
    }

    /// How many replicas can be lost while acknowledged writes stay durable.
    ///
    /// Derived only; never part of equality.
    pub fn durability_margin(&self) -> u32 {
        self.replication_factor.saturating_sub(self.write_anti_quorum)
    }

    pub fn fault_tolerance_basis(&self) -> Result<FaultToleranceBasis<'_>, ConfigError> {
        match self.best_policy {
            BestPolicy::Default => Ok(FaultToleranceBasis::ReplicaCount(self.replication_factor)),
            BestPolicy::Explicit => self
                .policy
                .as_deref()
                .map(FaultToleranceBasis::Policy)
                .ok_or_else(|| {
                    ConfigError::PreconditionViolation(
                        "explicit best policy requires a replication policy".to_string(),
                    )
                }),
        }
    }

    /// Scalars, policy digest, and per-tlog id, presence and commit token, in order.
    pub fn full_eq(&self, other: &LogGroup) -> bool {
        self.same_shape(other)
            && self.tlogs.iter().zip(&other.tlogs).all(|(a, b)| {
                a.id() == b.id() && a.present() == b.present() && a.commit_token() == b.commit_token()
            })
    }

    /// Scalars, policy digest, and per-tlog id in order. Liveness is ignored.
    pub fn identity_eq(&self, other: &LogGroup) -> bool {
        self.same_shape(other) && self.tlogs.iter().zip(&other.tlogs).all(|(a, b)| a.id() == b.id())
    }

    fn same_shape(&self, other: &LogGroup) -> bool {
        self.write_anti_quorum == other.write_anti_quorum
            && self.replication_factor == other.replication_factor
            && self.is_local == other.is_local
            && self.best_policy == other.best_policy
            && self.tlogs.len() == other.tlogs.len()
            && self.locality == other.locality
            && same_policy(self.policy.as_ref(), other.policy.as_ref())
    }
}

impl fmt::Display for LogGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "anti: {} replication: {} local: {} best: {} routers: {} tLogs: {} locality: {}",
            self.write_anti_quorum,
            self.replication_factor,
            self.is_local,
            self.best_policy,
            self.log_routers.len(),
            describe(&self.tlogs),
            self.locality,
        )
    }
}

/// Comma separated display of a list.
pub(crate) fn describe<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
