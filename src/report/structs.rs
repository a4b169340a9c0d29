//! The structs
//!
use std::collections::BTreeMap;
use chrono::{DateTime, Local};
use regex::Regex;
use crate::audit::Reachability;
use crate::topology::{ConfigIssue, IssueIndex, LocalSentinel, PodConfig, RemovalCandidate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Report {
    BaseConfig,
    KnownSentinels,
    Pods,
    Runtime,
    Json,
}

#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub by_error: bool,
    pub details_enable: bool,
    /// Only pods with a matching name are shown, all pods when not set.
    pub pod_filter: Option<Regex>,
}

/// The json report.
#[derive(Serialize, Debug)]
pub struct AuditSummary<'a> {
    pub timestamp: DateTime<Local>,
    pub local: &'a LocalSentinel,
    pub known_sentinels: &'a BTreeMap<String, Reachability>,
    pub invalid_endpoints: Vec<String>,
    pub pods: Vec<PodSummary<'a>>,
    pub issues: &'a IssueIndex,
    pub removal_candidates: &'a [RemovalCandidate],
}

#[derive(Serialize, Debug)]
pub struct PodSummary<'a> {
    #[serde(flatten)]
    pub pod: &'a PodConfig,
    pub issues: Vec<ConfigIssue>,
}
