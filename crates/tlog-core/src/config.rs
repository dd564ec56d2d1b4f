//! # config
//!
//! why: the immutable snapshot of the whole log system that every role reads
//! relations: built by the recovery coordinator, chained across epochs, summarised by core_state.rs
//! what: LogSystemConfig queries and comparisons, LogSystemConfigBuilder, RetentionPolicy

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::endpoint::{EndpointRef, LogServerInterface};
use crate::error::ConfigError;
use crate::generation::{describe_groups, groups_full_eq, GenerationRecord};
use crate::group::LogGroup;
use crate::types::{LogSystemType, NetworkAddress, Uid, Version};

/// Snapshot of the current log groups and every sealed generation before them.
///
/// Once built a config is never modified; a topology change produces a new
/// config. Share published snapshots behind an `Arc`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogSystemConfig {
    log_system_type: LogSystemType,
    log_groups: Vec<LogGroup>,
    /// Most recent sealed generation first.
    old_generations: Vec<GenerationRecord>,
    expected_log_sets: u32,
    min_routers: u32,
}

impl LogSystemConfig {
    pub fn builder(log_system_type: LogSystemType) -> LogSystemConfigBuilder {
        LogSystemConfigBuilder::new(log_system_type)
    }

    pub fn log_system_type(&self) -> LogSystemType {
        self.log_system_type
    }

    pub fn log_groups(&self) -> &[LogGroup] {
        &self.log_groups
    }

    pub fn old_generations(&self) -> &[GenerationRecord] {
        &self.old_generations
    }

    pub fn expected_log_sets(&self) -> u32 {
        self.expected_log_sets
    }

    pub fn min_routers(&self) -> u32 {
        self.min_routers
    }

    /// Resolved interfaces of every current-epoch tlog, in group order.
    pub fn all_present_logs(&self) -> Vec<&LogServerInterface> {
        self.log_groups
            .iter()
            .flat_map(|group| group.tlogs.iter())
            .filter_map(EndpointRef::as_present)
            .collect()
    }

    /// Distinct `(shared id, address)` pairs of resolved tlogs across the
    /// current epoch and every sealed generation, sorted.
    ///
    /// A shared id that maps to two different addresses is an
    /// [`ConfigError::InvariantViolation`].
    pub fn all_shared_logs(&self) -> Result<Vec<(Uid, NetworkAddress)>, ConfigError> {
        let mut results: Vec<(Uid, NetworkAddress)> = self
            .log_groups
            .iter()
            .chain(self.old_generations.iter().flat_map(|generation| generation.groups.iter()))
            .flat_map(|group| group.tlogs.iter())
            .filter_map(EndpointRef::as_present)
            .map(|interface| (interface.shared_id(), interface.address()))
            .collect();

        results.sort();
        results.dedup();

        if let Some(pair) = results.windows(2).find(|pair| pair[0].0 == pair[1].0) {
            let (shared_id, first) = pair[0];
            let second = pair[1].1;
            error!(%shared_id, %first, %second, "shared log id maps to more than one address");
            return Err(ConfigError::InvariantViolation(format!(
                "shared log {shared_id} is at both {first} and {second}"
            )));
        }

        Ok(results)
    }

    /// True if any current group of `other` is identity-equal to any current group of `self`.
    ///
    /// This is an any-match on purpose: it detects continuity when only part of
    /// the topology changed. It is not snapshot equality.
    pub fn is_equal_ids(&self, other: &LogSystemConfig) -> bool {
        any_identity_match(&other.log_groups, &self.log_groups)
    }

    /// True if `self` has a sealed generation and any current group of `other`
    /// is identity-equal to a group of `self`'s most recent sealed generation.
    pub fn is_next_generation_of(&self, other: &LogSystemConfig) -> bool {
        match self.old_generations.first() {
            Some(latest) => any_identity_match(&other.log_groups, &latest.groups),
            None => false,
        }
    }

    /// [`is_next_generation_of`](Self::is_next_generation_of) as a `Result`, for
    /// callers that expect the chain to hold.
    pub fn ensure_next_generation_of(&self, previous: &LogSystemConfig) -> Result<(), ConfigError> {
        if self.is_next_generation_of(previous) {
            return Ok(());
        }
        let reason = if self.old_generations.is_empty() {
            "snapshot has no sealed generations".to_string()
        } else {
            "no current group of the predecessor matches the latest sealed generation".to_string()
        };
        warn!(
            previous = %previous,
            current = %self,
            %reason,
            "log system chain discontinuity"
        );
        Err(ConfigError::ChainDiscontinuity { reason })
    }

    pub fn full_eq(&self, other: &LogSystemConfig) -> bool {
        self.log_system_type == other.log_system_type
            && groups_full_eq(&self.log_groups, &other.log_groups)
            && self.old_generations.len() == other.old_generations.len()
            && self
                .old_generations
                .iter()
                .zip(&other.old_generations)
                .all(|(a, b)| a.full_eq(b))
            && self.min_routers == other.min_routers
            && self.expected_log_sets == other.expected_log_sets
    }
}

fn any_identity_match(left: &[LogGroup], right: &[LogGroup]) -> bool {
    left.iter().any(|a| right.iter().any(|b| a.identity_eq(b)))
}

impl fmt::Display for LogSystemConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "type: {:?} oldGenerations: {} {}",
            self.log_system_type,
            self.old_generations.len(),
            describe_groups(&self.log_groups)
        )
    }
}

/// How many sealed generations a newly built config keeps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    /// `None` keeps every generation.
    pub max_generations: Option<usize>,
}

impl RetentionPolicy {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn keep_latest(max_generations: usize) -> Self {
        Self {
            max_generations: Some(max_generations),
        }
    }
}

/// Assembles and validates a [`LogSystemConfig`].
#[derive(Debug, Clone, Default)]
pub struct LogSystemConfigBuilder {
    log_system_type: LogSystemType,
    log_groups: Vec<LogGroup>,
    old_generations: Vec<GenerationRecord>,
    expected_log_sets: u32,
    min_routers: u32,
    retention: RetentionPolicy,
}

impl LogSystemConfigBuilder {
    pub fn new(log_system_type: LogSystemType) -> Self {
        Self {
            log_system_type,
            ..Self::default()
        }
    }

    /// Starts the next epoch after `previous`: its current groups become the
    /// most recent sealed generation, ending at `epoch_end`.
    pub fn successor_of(previous: &LogSystemConfig, epoch_end: Version) -> Self {
        let mut old_generations = Vec::with_capacity(previous.old_generations.len() + 1);
        if !previous.log_groups.is_empty() {
            old_generations.push(GenerationRecord::new(previous.log_groups.clone(), epoch_end));
        }
        old_generations.extend(previous.old_generations.iter().cloned());

        Self {
            log_system_type: previous.log_system_type,
            log_groups: Vec::new(),
            old_generations,
            expected_log_sets: previous.expected_log_sets,
            min_routers: previous.min_routers,
            retention: RetentionPolicy::default(),
        }
    }

    pub fn log_group(mut self, group: LogGroup) -> Self {
        self.log_groups.push(group);
        self
    }

    pub fn log_groups(mut self, groups: impl IntoIterator<Item = LogGroup>) -> Self {
        self.log_groups.extend(groups);
        self
    }

    /// Appends a sealed generation; add them most recent first.
    pub fn old_generation(mut self, generation: GenerationRecord) -> Self {
        self.old_generations.push(generation);
        self
    }

    pub fn expected_log_sets(mut self, expected_log_sets: u32) -> Self {
        self.expected_log_sets = expected_log_sets;
        self
    }

    pub fn min_routers(mut self, min_routers: u32) -> Self {
        self.min_routers = min_routers;
        self
    }

    pub fn retention(mut self, retention: RetentionPolicy) -> Self {
        self.retention = retention;
        self
    }

    pub fn build(mut self) -> Result<LogSystemConfig, ConfigError> {
        if let Some(pair) = self
            .old_generations
            .windows(2)
            .find(|pair| pair[0].epoch_end < pair[1].epoch_end)
        {
            let (newer, older) = (pair[0].epoch_end, pair[1].epoch_end);
            error!(newer, older, "sealed generations out of order");
            return Err(ConfigError::InvariantViolation(format!(
                "generation ending at {newer} is listed before older generation ending at {older}"
            )));
        }

        let groups = self
            .log_groups
            .iter()
            .chain(self.old_generations.iter().flat_map(|generation| generation.groups.iter()));
        for group in groups {
            if !group.tlog_localities.is_empty() && group.tlog_localities.len() != group.tlogs.len() {
                error!(
                    tlogs = group.tlogs.len(),
                    localities = group.tlog_localities.len(),
                    "locality tags not aligned with tlogs"
                );
                return Err(ConfigError::InvariantViolation(format!(
                    "{} locality tags for {} tlogs",
                    group.tlog_localities.len(),
                    group.tlogs.len()
                )));
            }
        }

        if let Some(max) = self.retention.max_generations {
            if self.old_generations.len() > max {
                let dropped = self.old_generations.len() - max;
                self.old_generations.truncate(max);
                debug!(dropped, kept = max, "trimmed sealed generations");
            }
        }

        let config = LogSystemConfig {
            log_system_type: self.log_system_type,
            log_groups: self.log_groups,
            old_generations: self.old_generations,
            expected_log_sets: self.expected_log_sets,
            min_routers: self.min_routers,
        };
        debug!(config = %config, "built log system config");
        Ok(config)
    }
}
