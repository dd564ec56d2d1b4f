//! # endpoint
//!
//! why: refer to a log server by id whether or not we currently know how to reach it
//! relations: stored in group.rs tlog and router lists, resolved by the transport layer
//! what: Endpoint, LogServerInterface, EndpointRef with its presence-flag wire form

use std::fmt;

use serde::de::{self, SeqAccess, Visitor};
use serde::ser::SerializeTuple;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ConfigError;
use crate::locality::LocalityTags;
use crate::types::{NetworkAddress, Uid};

/// One addressable capability of a server: where it lives plus its connection token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    pub address: NetworkAddress,
    pub token: Uid,
}

impl Endpoint {
    /// Endpoint at `address` with a freshly minted token.
    pub fn new(address: NetworkAddress) -> Self {
        Self {
            address,
            token: Uid::new_v4(),
        }
    }
}

/// The live interface of a transaction log server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogServerInterface {
    /// Identity of this logical log role.
    pub unique_id: Uid,
    /// Identity of the physical log process, shared across roles and epochs.
    pub shared_id: Uid,
    pub locality: LocalityTags,
    pub commit: Endpoint,
    pub peek: Endpoint,
    pub pop: Endpoint,
    pub lock: Endpoint,
}

impl LogServerInterface {
    /// Interface whose endpoints all live at `address`, each with a new token.
    pub fn new(unique_id: Uid, shared_id: Uid, address: NetworkAddress) -> Self {
        Self {
            unique_id,
            shared_id,
            locality: LocalityTags::default(),
            commit: Endpoint::new(address),
            peek: Endpoint::new(address),
            pop: Endpoint::new(address),
            lock: Endpoint::new(address),
        }
    }

    pub fn with_locality(mut self, locality: LocalityTags) -> Self {
        self.locality = locality;
        self
    }

    pub fn id(&self) -> Uid {
        self.unique_id
    }

    pub fn shared_id(&self) -> Uid {
        self.shared_id
    }

    pub fn address(&self) -> NetworkAddress {
        self.commit.address
    }
}

/// A log server known by id, possibly with a resolved interface.
///
/// When resolved, the interface's own id is the identity; the two can never
/// disagree because the resolved variant does not store a separate id.
#[derive(Debug, Clone)]
pub enum EndpointRef {
    Unresolved(Uid),
    Resolved(LogServerInterface),
}

impl EndpointRef {
    pub fn unresolved(id: Uid) -> Self {
        Self::Unresolved(id)
    }

    pub fn resolved(interface: LogServerInterface) -> Self {
        Self::Resolved(interface)
    }

    pub fn id(&self) -> Uid {
        match self {
            Self::Unresolved(id) => *id,
            Self::Resolved(interface) => interface.id(),
        }
    }

    pub fn present(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    /// The resolved interface.
    ///
    /// Fails with [`ConfigError::PreconditionViolation`] when not [`present`](Self::present).
    pub fn interf(&self) -> Result<&LogServerInterface, ConfigError> {
        match self {
            Self::Resolved(interface) => Ok(interface),
            Self::Unresolved(id) => Err(ConfigError::unresolved(*id)),
        }
    }

    pub(crate) fn as_present(&self) -> Option<&LogServerInterface> {
        match self {
            Self::Resolved(interface) => Some(interface),
            Self::Unresolved(_) => None,
        }
    }

    /// Token of the commit endpoint, if resolved.
    pub(crate) fn commit_token(&self) -> Option<Uid> {
        self.as_present().map(|interface| interface.commit.token)
    }
}

impl From<LogServerInterface> for EndpointRef {
    fn from(interface: LogServerInterface) -> Self {
        Self::Resolved(interface)
    }
}

impl PartialEq<Uid> for EndpointRef {
    fn eq(&self, other: &Uid) -> bool {
        self.id() == *other
    }
}

impl fmt::Display for EndpointRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

// -- wire form: (present, interface | id) --

impl Serialize for EndpointRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(2)?;
        match self {
            Self::Resolved(interface) => {
                tuple.serialize_element(&true)?;
                tuple.serialize_element(interface)?;
            }
            Self::Unresolved(id) => {
                tuple.serialize_element(&false)?;
                tuple.serialize_element(id)?;
            }
        }
        tuple.end()
    }
}

impl<'de> Deserialize<'de> for EndpointRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_tuple(2, EndpointRefVisitor)
    }
}

struct EndpointRefVisitor;

impl<'de> Visitor<'de> for EndpointRefVisitor {
    type Value = EndpointRef;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a presence flag followed by a log server interface or id")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let present: bool = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(0, &self))?;
        if present {
            let interface: LogServerInterface = seq
                .next_element()?
                .ok_or_else(|| de::Error::invalid_length(1, &self))?;
            Ok(EndpointRef::Resolved(interface))
        } else {
            let id: Uid = seq
                .next_element()?
                .ok_or_else(|| de::Error::invalid_length(1, &self))?;
            Ok(EndpointRef::Unresolved(id))
        }
    }
}
