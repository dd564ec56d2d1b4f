//! # tlog-core
//!
//! why: describe which transaction log servers make up each replication epoch
//! relations: authored by the recovery coordinator, persisted via tlog-storage, read by every other role
//! what: endpoint refs, log groups, sealed generations, the root log system config, wire codec, core state

pub mod codec;
pub mod config;
pub mod core_state;
pub mod endpoint;
pub mod error;
pub mod generation;
pub mod group;
pub mod locality;
pub mod policy;
pub mod types;

pub use config::{LogSystemConfig, LogSystemConfigBuilder, RetentionPolicy};
pub use core_state::{CoreGeneration, CoreLogGroup, CoreState};
pub use endpoint::{Endpoint, EndpointRef, LogServerInterface};
pub use error::ConfigError;
pub use generation::GenerationRecord;
pub use group::{BestPolicy, FaultToleranceBasis, LogGroup};
pub use locality::{Locality, LocalityTags};
pub use policy::{PolicyDigest, PolicyRef, ReplicationPolicy};
pub use types::{LogSystemType, NetworkAddress, Uid, Version};
