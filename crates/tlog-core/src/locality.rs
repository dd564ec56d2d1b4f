//! # locality
//!
//! why: carry placement metadata for log servers and the region a log group serves
//! relations: tags are supplied by the locality subsystem and stored per tlog in group.rs
//! what: LocalityTags key/value map, Locality region id with its sentinel values

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Key/value placement attributes of one server process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalityTags {
    entries: BTreeMap<String, String>,
}

impl LocalityTags {
    pub const PROCESS_ID: &'static str = "processid";
    pub const ZONE_ID: &'static str = "zoneid";
    pub const MACHINE_ID: &'static str = "machineid";
    pub const DC_ID: &'static str = "dcid";
    pub const DATA_HALL: &'static str = "data_hall";

    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter; replaces any previous value for `key`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn process_id(&self) -> Option<&str> {
        self.get(Self::PROCESS_ID)
    }

    pub fn zone_id(&self) -> Option<&str> {
        self.get(Self::ZONE_ID)
    }

    pub fn machine_id(&self) -> Option<&str> {
        self.get(Self::MACHINE_ID)
    }

    pub fn dc_id(&self) -> Option<&str> {
        self.get(Self::DC_ID)
    }

    pub fn data_hall(&self) -> Option<&str> {
        self.get(Self::DATA_HALL)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for LocalityTags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (key, value) in self.iter() {
            if !first {
                write!(f, " ")?;
            }
            write!(f, "{key}={value}")?;
            first = false;
        }
        Ok(())
    }
}

/// Region or domain a log group is scoped to.
///
/// [`Locality::UNSCOPED`] means "no specific domain". It is compared exactly
/// like any other value and never matches a concrete locality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locality(pub i8);

impl Locality {
    pub const UNSCOPED: Locality = Locality(-99);

    pub fn is_unscoped(self) -> bool {
        self == Self::UNSCOPED
    }
}

impl Default for Locality {
    fn default() -> Self {
        Self::UNSCOPED
    }
}

impl fmt::Display for Locality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
