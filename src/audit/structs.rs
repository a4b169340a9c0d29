//! The structs
//!
use std::collections::BTreeMap;
use crate::probe::{InvalidEndpoints, Prober};
use crate::topology::{IssueIndex, RemovalCandidate, Topology};

/// The result of probing a known sentinel.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub enum Reachability {
    Available,
    /// Unreachable, with the error.
    Missing(String),
}

/// The state of a single audit pass.
pub struct AuditSession {
    pub topology: Topology,
    pub prober: Prober,
    /// The number of threads probing in parallel.
    pub parallel: usize,
    pub invalid_endpoints: InvalidEndpoints,
    pub issue_index: IssueIndex,
    pub removal_candidates: Vec<RemovalCandidate>,
    pub sentinel_reachability: BTreeMap<String, Reachability>,
}
