//! # core_state
//!
//! why: the id-only topology summary the recovery coordinator persists between recoveries
//! relations: derived from and rebuilt into config.rs snapshots, persisted by tlog-storage
//! what: CoreLogGroup, CoreGeneration, CoreState

use serde::{Deserialize, Serialize};

use crate::config::LogSystemConfig;
use crate::endpoint::EndpointRef;
use crate::error::ConfigError;
use crate::generation::GenerationRecord;
use crate::group::{BestPolicy, LogGroup};
use crate::locality::{Locality, LocalityTags};
use crate::policy::{same_policy, PolicyRef};
use crate::types::{LogSystemType, Uid, Version};

/// A log group reduced to the ids of its tlogs and its replication settings.
///
/// The quorum settings are the ones the tlogs were written with, which may
/// differ from what the current database configuration asks for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreLogGroup {
    pub tlogs: Vec<Uid>,
    pub write_anti_quorum: u32,
    pub replication_factor: u32,
    pub tlog_localities: Vec<LocalityTags>,
    pub policy: Option<PolicyRef>,
    pub is_local: bool,
    pub best_policy: BestPolicy,
    pub locality: Locality,
}

impl Default for CoreLogGroup {
    fn default() -> Self {
        Self::from_group(&LogGroup::default())
    }
}

impl CoreLogGroup {
    /// Drops routers and liveness; keeps ids in order.
    pub fn from_group(group: &LogGroup) -> Self {
        Self {
            tlogs: group.tlogs.iter().map(EndpointRef::id).collect(),
            write_anti_quorum: group.write_anti_quorum,
            replication_factor: group.replication_factor,
            tlog_localities: group.tlog_localities.clone(),
            policy: group.policy.clone(),
            is_local: group.is_local,
            best_policy: group.best_policy,
            locality: group.locality,
        }
    }

    /// A group of unresolved tlog refs with no routers.
    pub fn to_group(&self) -> LogGroup {
        LogGroup {
            tlogs: self.tlogs.iter().copied().map(EndpointRef::unresolved).collect(),
            log_routers: Vec::new(),
            write_anti_quorum: self.write_anti_quorum,
            replication_factor: self.replication_factor,
            tlog_localities: self.tlog_localities.clone(),
            locality: self.locality,
            is_local: self.is_local,
            best_policy: self.best_policy,
            policy: self.policy.clone(),
        }
    }

    /// Ids in order, quorum settings, flags and policy digest. Locality tags are not compared.
    pub fn full_eq(&self, other: &CoreLogGroup) -> bool {
        self.tlogs == other.tlogs
            && self.write_anti_quorum == other.write_anti_quorum
            && self.replication_factor == other.replication_factor
            && self.is_local == other.is_local
            && self.best_policy == other.best_policy
            && self.locality == other.locality
            && same_policy(self.policy.as_ref(), other.policy.as_ref())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoreGeneration {
    pub groups: Vec<CoreLogGroup>,
    pub epoch_end: Version,
}

impl CoreGeneration {
    pub fn full_eq(&self, other: &CoreGeneration) -> bool {
        self.epoch_end == other.epoch_end && core_groups_full_eq(&self.groups, &other.groups)
    }
}

/// Persisted summary of the log system written at the end of each recovery.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoreState {
    pub log_groups: Vec<CoreLogGroup>,
    /// Most recent sealed generation first.
    pub old_generations: Vec<CoreGeneration>,
    /// Increases with every successful recovery.
    pub recovery_count: u64,
    pub log_system_type: LogSystemType,
}

impl CoreState {
    pub fn from_config(config: &LogSystemConfig, recovery_count: u64) -> Self {
        Self {
            log_groups: config.log_groups().iter().map(CoreLogGroup::from_group).collect(),
            old_generations: config
                .old_generations()
                .iter()
                .map(|generation| CoreGeneration {
                    groups: generation.groups.iter().map(CoreLogGroup::from_group).collect(),
                    epoch_end: generation.epoch_end,
                })
                .collect(),
            recovery_count,
            log_system_type: config.log_system_type(),
        }
    }

    /// Rebuilds a snapshot whose tlogs are all unresolved.
    pub fn to_config(&self) -> Result<LogSystemConfig, ConfigError> {
        let mut builder = LogSystemConfig::builder(self.log_system_type)
            .log_groups(self.log_groups.iter().map(CoreLogGroup::to_group));
        for generation in &self.old_generations {
            builder = builder.old_generation(GenerationRecord::new(
                generation.groups.iter().map(CoreLogGroup::to_group).collect(),
                generation.epoch_end,
            ));
        }
        builder.build()
    }

    /// Ids of every tlog in every sealed generation, most recent generation first.
    pub fn prior_committed_log_servers(&self) -> Vec<Uid> {
        self.old_generations
            .iter()
            .flat_map(|generation| generation.groups.iter())
            .flat_map(|group| group.tlogs.iter().copied())
            .collect()
    }

    pub fn full_eq(&self, other: &CoreState) -> bool {
        self.log_system_type == other.log_system_type
            && self.recovery_count == other.recovery_count
            && core_groups_full_eq(&self.log_groups, &other.log_groups)
            && self.old_generations.len() == other.old_generations.len()
            && self
                .old_generations
                .iter()
                .zip(&other.old_generations)
                .all(|(a, b)| a.full_eq(b))
    }
}

fn core_groups_full_eq(a: &[CoreLogGroup], b: &[CoreLogGroup]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.full_eq(y))
}
