//! # generation
//!
//! why: remember the log groups of an epoch that no longer accepts writes
//! relations: stored most-recent-first in config.rs, consulted by recovery replay
//! what: GenerationRecord

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::group::{describe, LogGroup};
use crate::types::Version;

/// A sealed epoch: its log groups and the version at which it ended (exclusive).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationRecord {
    pub groups: Vec<LogGroup>,
    pub epoch_end: Version,
}

impl GenerationRecord {
    pub fn new(groups: Vec<LogGroup>, epoch_end: Version) -> Self {
        Self { groups, epoch_end }
    }

    pub fn full_eq(&self, other: &GenerationRecord) -> bool {
        self.epoch_end == other.epoch_end && groups_full_eq(&self.groups, &other.groups)
    }

    /// Same group count and pairwise identity-equal groups. `epoch_end` is not compared.
    pub fn identity_eq(&self, other: &GenerationRecord) -> bool {
        self.groups.len() == other.groups.len()
            && self.groups.iter().zip(&other.groups).all(|(a, b)| a.identity_eq(b))
    }
}

impl fmt::Display for GenerationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "end: {} {}", self.epoch_end, describe_groups(&self.groups))
    }
}

pub(crate) fn groups_full_eq(a: &[LogGroup], b: &[LogGroup]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.full_eq(y))
}

pub(crate) fn describe_groups(groups: &[LogGroup]) -> String {
    format!("[{}]", describe(groups))
}
