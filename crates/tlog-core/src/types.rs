//! # types
//!
//! why: shared scalar types for identities, versions and addresses
//! relations: used by every other module in the crate
//! what: Uid, Version, NetworkAddress, LogSystemType

use std::fmt;
use std::net::{AddrParseError, IpAddr, SocketAddr};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Opaque 128-bit identifier for log servers and endpoint tokens.
pub type Uid = uuid::Uuid;

/// A position in the transaction log.
pub type Version = i64;

/// Which log system algorithm produced a snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogSystemType {
    /// No log system has been recruited yet.
    #[default]
    Empty,
    /// Logs are partitioned by tag across log groups.
    TagPartitioned,
}

/// Address of a server process.
///
/// Ordering is by ip, then port, then tls flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NetworkAddress {
    pub ip: IpAddr,
    pub port: u16,
    pub tls: bool,
}

impl NetworkAddress {
    pub fn new(ip: IpAddr, port: u16) -> Self {
        Self { ip, port, tls: false }
    }

    pub fn with_tls(mut self) -> Self {
        self.tls = true;
        self
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip, self.port)
    }
}

impl From<SocketAddr> for NetworkAddress {
    fn from(addr: SocketAddr) -> Self {
        Self::new(addr.ip(), addr.port())
    }
}

impl fmt::Display for NetworkAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.socket_addr())?;
        if self.tls {
            write!(f, ":tls")?;
        }
        Ok(())
    }
}

impl FromStr for NetworkAddress {
    type Err = AddrParseError;

    /// Parses `ip:port`, optionally followed by `:tls`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.strip_suffix(":tls") {
            Some(addr) => Ok(Self::from(SocketAddr::from_str(addr)?).with_tls()),
            None => Ok(Self::from(SocketAddr::from_str(s)?)),
        }
    }
}
