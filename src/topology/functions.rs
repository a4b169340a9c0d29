//! The impls and functions
//!
use std::{fmt, collections::BTreeSet};
use log::*;
use crate::topology::{ConfigIssue, IssueIndex, LocalSentinel, PodConfig, Topology};

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let description = match self {
            ConfigIssue::NotEnoughSentinels => "Not Enough Sentinels",
            ConfigIssue::NoQuorum => "NO Quorum Possible",
            ConfigIssue::HasInvalidSentinels => "Has Sentinels Configured which do not exist or are unreachable",
            ConfigIssue::DuplicateMasterIp => "Shares a master IP with another pod",
            ConfigIssue::DuplicateSlaveIp => "Shares a slave IP with another pod",
        };
        write!(f, "{}", description)
    }
}

impl ConfigIssue {
    pub fn code(&self) -> &'static str {
        match self {
            ConfigIssue::NotEnoughSentinels => "NOT_ENOUGH_SENTINELS",
            ConfigIssue::NoQuorum => "NO_QUORUM",
            ConfigIssue::HasInvalidSentinels => "HAS_INVALID_SENTINELS",
            ConfigIssue::DuplicateMasterIp => "DUPLICATE_MASTER_IP",
            ConfigIssue::DuplicateSlaveIp => "DUPLICATE_SLAVE_IP",
        }
    }
}

impl PodConfig {
    pub fn new(name: &str) -> Self {
        PodConfig {
            name: name.to_string(),
            ..Default::default()
        }
    }
    pub fn master_address(&self) -> String {
        format!("{}:{}", self.master_ip, self.master_port)
    }
    /// A pod can be created by `auth-pass` or `known-*` lines before its `monitor` line.
    /// Until `monitor` is seen, it has no master.
    pub fn is_monitored(&self) -> bool {
        !self.master_ip.is_empty()
    }
    /// The findings that follow from the sentinel validation of this pod alone.
    ///
    /// Not enough confirmed sentinels raises both NO_QUORUM and NOT_ENOUGH_SENTINELS.
    pub fn config_issues(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        if !self.invalid_sentinels.is_empty() {
            issues.push(ConfigIssue::HasInvalidSentinels);
        }
        if self.confirmed_sentinels.len() < self.quorum {
            issues.push(ConfigIssue::NoQuorum);
            issues.push(ConfigIssue::NotEnoughSentinels);
        }
        issues
    }
}

impl LocalSentinel {
    pub fn set_host(&mut self, host: &str) {
        self.host = host.to_string();
        self.update_name();
    }
    pub fn set_port(&mut self, port: u16) {
        self.port = port;
        self.update_name();
    }
    fn update_name(&mut self) {
        if !self.host.is_empty() && self.port > 0 {
            self.name = format!("{}:{}", self.host, self.port);
        }
    }
}

impl Topology {
    pub fn new() -> Self {
        Default::default()
    }
    /// The pod with this name, created empty when it is not known yet.
    pub fn pod_entry(&mut self, name: &str) -> &mut PodConfig {
        self.pods
            .entry(name.to_string())
            .or_insert_with(|| PodConfig::new(name))
    }
    /// The pod that monitors a master at `ip:port`.
    pub fn pod_by_master_address(&self, address: &str) -> Option<&PodConfig> {
        self.pods
            .values()
            .filter(|pod| pod.is_monitored())
            .find(|pod| pod.master_address() == address)
    }
    /// Rebuild the registry of known sentinels: every sentinel declared by a pod, minus
    /// the local sentinel.
    pub fn build_known_sentinels(&mut self) {
        let local_name = &self.local.name;
        self.known_sentinels = self.pods
            .values()
            .flat_map(|pod| pod.sentinels.iter())
            .filter(|sentinel| *sentinel != local_name)
            .cloned()
            .collect();
        debug!("known sentinels: {:?}", self.known_sentinels);
    }
}

impl IssueIndex {
    pub fn new() -> Self {
        Default::default()
    }
    /// Register a finding for a pod. A pod is listed once per finding kind.
    pub fn raise(&mut self, issue: ConfigIssue, pod: &str) {
        let pods = self.issues.entry(issue).or_default();
        if !pods.iter().any(|name| name == pod) {
            trace!("{}: {}", pod, issue.code());
            pods.push(pod.to_string());
        }
    }
    pub fn pods_with(&self, issue: ConfigIssue) -> &[String] {
        self.issues
            .get(&issue)
            .map(|pods| pods.as_slice())
            .unwrap_or_default()
    }
    pub fn issues_for(&self, pod: &str) -> Vec<ConfigIssue> {
        self.issues
            .iter()
            .filter(|(_, pods)| pods.iter().any(|name| name == pod))
            .map(|(issue, _)| *issue)
            .collect()
    }
    pub fn pods_with_issues(&self) -> BTreeSet<&str> {
        self.issues
            .values()
            .flatten()
            .map(|pod| pod.as_str())
            .collect()
    }
    pub fn is_empty(&self) -> bool {
        self.issues.values().all(|pods| pods.is_empty())
    }
}
