//! The structs
//!
use std::collections::{BTreeMap, BTreeSet};

/// A pod: a master and its replicas, monitored by a quorum of sentinels.
#[derive(Serialize, Debug, Default, Clone, PartialEq)]
pub struct PodConfig {
    pub name: String,
    pub master_ip: String,
    pub master_port: u16,
    /// The number of sentinels that must agree on the master being down.
    pub quorum: usize,
    #[serde(skip_serializing)]
    pub auth_token: Option<String>,
    /// The sentinels this pod is declared to be monitored by (`known-sentinel`).
    pub sentinels: BTreeSet<String>,
    /// The replicas in the order of the configuration file (`known-slave`).
    pub slaves: Vec<String>,
    /// Filled by the audit.
    pub confirmed_sentinels: BTreeSet<String>,
    /// Filled by the audit.
    pub invalid_sentinels: BTreeSet<String>,
}

/// The identity of the sentinel whose configuration is audited.
#[derive(Serialize, Debug, Default, Clone, PartialEq)]
pub struct LocalSentinel {
    pub host: String,
    pub port: u16,
    /// `host:port`, empty as long as the bind address or port is unknown.
    pub name: String,
    pub dir: String,
}

#[derive(Serialize, Debug, Default, Clone)]
pub struct Topology {
    pub local: LocalSentinel,
    pub pods: BTreeMap<String, PodConfig>,
    /// All sentinels declared by any pod, except the local sentinel.
    pub known_sentinels: BTreeSet<String>,
}

/// The kinds of configuration finding.
///
/// The order is the order in which they are reported.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfigIssue {
    NotEnoughSentinels,
    NoQuorum,
    HasInvalidSentinels,
    DuplicateMasterIp,
    DuplicateSlaveIp,
}

/// The pods per finding kind, rebuilt on every audit.
#[derive(Serialize, Debug, Default, Clone, PartialEq)]
pub struct IssueIndex {
    pub issues: BTreeMap<ConfigIssue, Vec<String>>,
}

/// A pod that shares its master IP with another pod and whose master cannot be reached
/// with its own credentials.
#[derive(Serialize, Debug, Default, Clone, PartialEq)]
pub struct RemovalCandidate {
    pub pod: String,
    pub master_address: String,
    pub error: String,
}
