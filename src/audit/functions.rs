//! The impls and functions
//!
use std::{collections::{BTreeMap, BTreeSet}, sync::mpsc::channel, time::Instant};
use itertools::Itertools;
use log::*;
use anyhow::{Result, Context};
use crate::audit::{AuditSession, Reachability};
use crate::probe::{InvalidEndpoints, Prober};
use crate::topology::{ConfigIssue, IssueIndex, PodConfig, RemovalCandidate, Topology};

impl AuditSession {
    pub fn new(
        topology: Topology,
        prober: Prober,
        parallel: usize,
    ) -> Self
    {
        AuditSession {
            topology,
            prober,
            parallel: parallel.max(1),
            invalid_endpoints: InvalidEndpoints::new(),
            issue_index: IssueIndex::new(),
            removal_candidates: Vec::new(),
            sentinel_reachability: BTreeMap::new(),
        }
    }
    /// Perform an audit pass. The issue index and removal candidates are rebuilt, the cache
    /// of invalid endpoints is kept.
    pub fn run(&mut self) -> Result<()> {
        info!("begin audit");
        let timer = Instant::now();

        self.issue_index = IssueIndex::new();
        self.removal_candidates.clear();

        self.probe_known_sentinels()?;
        self.validate_pods()?;
        self.find_duplicate_master_ips();
        self.find_duplicate_slave_ips();

        info!("end audit: {:?}, {} of {} pods have configuration issues",
            timer.elapsed(),
            self.issue_index.pods_with_issues().len(),
            self.topology.pods.len(),
        );
        Ok(())
    }
    fn thread_pool(&self) -> Result<rayon::ThreadPool> {
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.parallel)
            .build()
            .with_context(|| format!("Cannot create a thread pool of {} threads", self.parallel))
    }
    /// Probe every known sentinel once. Unreachable sentinels land in the invalid endpoints
    /// cache, so pod validation does not wait for them again.
    pub fn probe_known_sentinels(&mut self) -> Result<()> {
        info!("begin parallel probe of {} known sentinels", self.topology.known_sentinels.len());
        let timer = Instant::now();

        let pool = self.thread_pool()?;
        let (tx, rx) = channel();
        let prober = &self.prober;
        let invalid_endpoints = &self.invalid_endpoints;
        let known_sentinels = &self.topology.known_sentinels;

        pool.scope(move |s| {
            for sentinel in known_sentinels {
                let tx = tx.clone();
                s.spawn(move |_| {
                    let reachability = match prober.probe_cached(invalid_endpoints, sentinel, None) {
                        Ok(()) => Reachability::Available,
                        Err(e) => Reachability::Missing(format!("{:#}", e)),
                    };
                    if let Err(e) = tx.send((sentinel.to_string(), reachability)) {
                        error!("error sending data via tx: {}", e);
                    }
                });
            }
        });
        self.sentinel_reachability = rx.into_iter().collect();

        info!("end parallel probe of known sentinels: {:?}", timer.elapsed());
        Ok(())
    }
    /// Sort the sentinels of every pod into confirmed and invalid, and raise the findings
    /// that follow from it.
    pub fn validate_pods(&mut self) -> Result<()> {
        info!("begin parallel validation of {} pods", self.topology.pods.len());
        let timer = Instant::now();

        let pool = self.thread_pool()?;
        let (tx, rx) = channel();
        let prober = &self.prober;
        let invalid_endpoints = &self.invalid_endpoints;
        let pods = &self.topology.pods;

        pool.scope(move |s| {
            for pod in pods.values() {
                let tx = tx.clone();
                s.spawn(move |_| {
                    let (confirmed, invalid) = prober.validate_sentinels(&pod.sentinels, invalid_endpoints);
                    debug!("{}: {} confirmed, {} invalid sentinels", pod.name, confirmed.len(), invalid.len());
                    if let Err(e) = tx.send((pod.name.clone(), confirmed, invalid)) {
                        error!("error sending data via tx: {}", e);
                    }
                });
            }
        });
        for (name, confirmed, invalid) in rx {
            if let Some(pod) = self.topology.pods.get_mut(&name) {
                pod.confirmed_sentinels = confirmed;
                pod.invalid_sentinels = invalid;
            }
        }

        for pod in self.topology.pods.values() {
            let issues = pod.config_issues();
            if !issues.is_empty() {
                info!("{}: {}", pod.name, issues.iter().map(|issue| issue.code()).join(", "));
            }
            for issue in issues {
                self.issue_index.raise(issue, &pod.name);
            }
        }

        info!("end parallel validation of pods: {:?}", timer.elapsed());
        Ok(())
    }
    /// Raise DUPLICATE_MASTER_IP for pods whose masters share an IP address. The master of
    /// each of these pods is probed with the secret of the pod; when that fails the pod is a
    /// removal candidate.
    pub fn find_duplicate_master_ips(&mut self) {
        info!("Looking for duplicated master IPs");
        let mut master_ip_to_pod: BTreeMap<&str, &PodConfig> = BTreeMap::new();
        let mut collisions: Vec<(&PodConfig, &PodConfig)> = Vec::new();

        for pod in self.topology.pods.values().filter(|pod| pod.is_monitored()) {
            match master_ip_to_pod.get(pod.master_ip.as_str()) {
                Some(owner) => {
                    warn!("Found duplicate master! {} and {} share master IP {}", owner.name, pod.name, pod.master_ip);
                    collisions.push((*owner, pod));
                }
                None => {
                    master_ip_to_pod.insert(&pod.master_ip, pod);
                }
            }
        }

        let mut probed: BTreeSet<&str> = BTreeSet::new();
        for (owner, pod) in collisions {
            self.issue_index.raise(ConfigIssue::DuplicateMasterIp, &owner.name);
            self.issue_index.raise(ConfigIssue::DuplicateMasterIp, &pod.name);
            for candidate in [owner, pod] {
                if !probed.insert(&candidate.name) {
                    continue;
                }
                let master_address = candidate.master_address();
                if let Err(e) = self.prober.probe(&master_address, candidate.auth_token.as_deref()) {
                    warn!("{} can not authenticate to {}, recommend removing it: {:#}", candidate.name, master_address, e);
                    self.removal_candidates.push(RemovalCandidate {
                        pod: candidate.name.clone(),
                        master_address,
                        error: format!("{:#}", e),
                    });
                }
            }
        }
    }
    /// Raise DUPLICATE_SLAVE_IP for pods that share a replica, and for pods that have a
    /// replica that is the master of a pod.
    pub fn find_duplicate_slave_ips(&mut self) {
        info!("Looking for duplicated slave IPs");
        let mut master_address_to_pod: BTreeMap<String, &str> = BTreeMap::new();
        for pod in self.topology.pods.values().filter(|pod| pod.is_monitored()) {
            master_address_to_pod.entry(pod.master_address()).or_insert(&pod.name);
        }

        let mut slave_to_pod: BTreeMap<&str, &str> = BTreeMap::new();
        let mut conflicts: Vec<(&str, &str)> = Vec::new();
        for pod in self.topology.pods.values() {
            for slave in pod.slaves.iter().unique() {
                match slave_to_pod.get(slave.as_str()) {
                    Some(owner) if *owner != pod.name => {
                        warn!("Found duplicate slave! {} and {} share slave {}", owner, pod.name, slave);
                        conflicts.push((*owner, pod.name.as_str()));
                    }
                    Some(_) => {}
                    None => {
                        slave_to_pod.insert(slave.as_str(), pod.name.as_str());
                    }
                }
                if let Some(master_pod) = master_address_to_pod.get(slave) {
                    warn!("Found duplicate slave/master! {} is master of {} and slave of {}", slave, master_pod, pod.name);
                    conflicts.push((*master_pod, pod.name.as_str()));
                }
            }
        }

        for (first, second) in conflicts {
            self.issue_index.raise(ConfigIssue::DuplicateSlaveIp, first);
            self.issue_index.raise(ConfigIssue::DuplicateSlaveIp, second);
        }
    }
    /// The pods that have at least one finding.
    pub fn pods_with_issues(&self) -> BTreeSet<&str> {
        self.issue_index.pods_with_issues()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{sync::{Arc, Mutex}, time::Duration};
    use anyhow::anyhow;
    use crate::resp::{Connector, Reply, Session};
    use crate::sentinel_config::read_sentinel_config;

    /// Every endpoint in `reachable` answers PING, and accepts AUTH with its password.
    struct FakeConnector {
        reachable: BTreeMap<String, Option<String>>,
        attempts: Arc<Mutex<Vec<String>>>,
    }
    struct FakeSession {
        password: Option<String>,
    }

    impl Session for FakeSession {
        fn execute(&mut self, args: &[&str]) -> Result<Reply> {
            match args {
                ["AUTH", secret] if self.password.as_deref() == Some(*secret) => Ok(Reply::Status("OK".to_string())),
                ["AUTH", _] => Ok(Reply::Error("ERR invalid password".to_string())),
                ["PING"] => Ok(Reply::Status("PONG".to_string())),
                _ => Ok(Reply::Error("ERR unknown command".to_string())),
            }
        }
    }

    impl Connector for FakeConnector {
        fn connect(&self, endpoint: &str, _timeout: Duration) -> Result<Box<dyn Session>> {
            self.attempts.lock().unwrap().push(endpoint.to_string());
            match self.reachable.get(endpoint) {
                Some(password) => Ok(Box::new(FakeSession { password: password.clone() })),
                None => Err(anyhow!("Connection refused")),
            }
        }
    }

    fn audit(config: &str, reachable: &[(&str, Option<&str>)]) -> (AuditSession, Arc<Mutex<Vec<String>>>) {
        let attempts = Arc::new(Mutex::new(Vec::new()));
        let connector = FakeConnector {
            reachable: reachable.iter().map(|(e, p)| (e.to_string(), p.map(|p| p.to_string()))).collect(),
            attempts: attempts.clone(),
        };
        let topology = read_sentinel_config(config.as_bytes()).unwrap();
        let prober = Prober::new(Box::new(connector), Duration::from_millis(100));
        let mut session = AuditSession::new(topology, prober, 2);
        session.run().unwrap();
        (session, attempts)
    }

    const SENTINELS: [(&str, Option<&str>); 3] = [
        ("10.0.0.10:26379", None),
        ("10.0.0.11:26379", None),
        ("10.0.0.12:26379", None),
    ];

    #[test]
    fn unit_healthy_pod_has_no_findings() {
        let config = "\
bind 10.0.0.10
port 26379
sentinel monitor pod1 10.0.0.1 6379 2
sentinel known-sentinel pod1 10.0.0.11 26379
sentinel known-sentinel pod1 10.0.0.12 26379
";
        let (session, _) = audit(config, &SENTINELS);
        assert!(session.issue_index.is_empty());
        assert!(session.removal_candidates.is_empty());
        let pod = &session.topology.pods["pod1"];
        assert_eq!(pod.confirmed_sentinels.len(), 2);
        assert!(pod.invalid_sentinels.is_empty());
    }

    #[test]
    fn unit_unreachable_sentinel_breaks_quorum() {
        let config = "\
sentinel monitor pod1 10.0.0.1 6379 2
sentinel known-sentinel pod1 10.0.0.11 26379
sentinel known-sentinel pod1 10.0.0.99 26379
";
        let (session, _) = audit(config, &SENTINELS);
        assert_eq!(session.issue_index.issues_for("pod1"), vec![
            ConfigIssue::NotEnoughSentinels,
            ConfigIssue::NoQuorum,
            ConfigIssue::HasInvalidSentinels,
        ]);
        assert_eq!(session.sentinel_reachability["10.0.0.11:26379"], Reachability::Available);
        assert!(matches!(session.sentinel_reachability["10.0.0.99:26379"], Reachability::Missing(_)));
    }

    #[test]
    fn unit_unreachable_sentinel_is_probed_once() {
        let config = "\
sentinel monitor pod1 10.0.0.1 6379 1
sentinel known-sentinel pod1 10.0.0.99 26379
sentinel monitor pod2 10.0.0.2 6379 1
sentinel known-sentinel pod2 10.0.0.99 26379
sentinel monitor pod3 10.0.0.3 6379 1
sentinel known-sentinel pod3 10.0.0.99 26379
";
        let (session, attempts) = audit(config, &SENTINELS);
        let dead_attempts = attempts.lock().unwrap().iter().filter(|e| *e == "10.0.0.99:26379").count();
        assert_eq!(dead_attempts, 1);
        assert_eq!(session.issue_index.pods_with(ConfigIssue::HasInvalidSentinels).len(), 3);
        assert_eq!(session.invalid_endpoints.to_vec(), vec!["10.0.0.99:26379".to_string()]);
    }

    #[test]
    fn unit_duplicate_master_ip() {
        let config = "\
sentinel monitor pod1 10.0.0.1 6379 1
sentinel auth-pass pod1 secret1
sentinel known-sentinel pod1 10.0.0.11 26379
sentinel monitor pod2 10.0.0.1 6380 1
sentinel auth-pass pod2 secret2
sentinel known-sentinel pod2 10.0.0.11 26379
sentinel monitor pod3 10.0.0.3 6379 1
sentinel known-sentinel pod3 10.0.0.11 26379
";
        let mut reachable = SENTINELS.to_vec();
        reachable.push(("10.0.0.1:6379", Some("secret1")));
        reachable.push(("10.0.0.1:6380", Some("other")));
        let (session, _) = audit(config, &reachable);
        assert_eq!(session.issue_index.pods_with(ConfigIssue::DuplicateMasterIp), &["pod1".to_string(), "pod2".to_string()]);
        assert_eq!(session.removal_candidates.len(), 1);
        assert_eq!(session.removal_candidates[0].pod, "pod2");
        assert_eq!(session.removal_candidates[0].master_address, "10.0.0.1:6380");
    }

    #[test]
    fn unit_duplicate_master_ip_three_pods() {
        let config = "\
sentinel monitor pod1 10.0.0.1 6379 1
sentinel monitor pod2 10.0.0.1 6380 1
sentinel monitor pod3 10.0.0.1 6381 1
";
        let (session, _) = audit(config, &[]);
        assert_eq!(session.issue_index.pods_with(ConfigIssue::DuplicateMasterIp).len(), 3);
        // unreachable masters are candidates, each once
        assert_eq!(session.removal_candidates.iter().map(|c| c.pod.as_str()).collect::<Vec<_>>(), vec!["pod1", "pod2", "pod3"]);
    }

    #[test]
    fn unit_duplicate_slave_between_pods() {
        let config = "\
sentinel monitor pod1 10.0.0.1 6379 1
sentinel known-slave pod1 10.0.0.5 6379
sentinel monitor pod2 10.0.0.2 6379 1
sentinel known-slave pod2 10.0.0.5 6379
sentinel monitor pod3 10.0.0.3 6379 1
sentinel known-slave pod3 10.0.0.5 6380
";
        let (session, _) = audit(config, &[]);
        assert_eq!(session.issue_index.pods_with(ConfigIssue::DuplicateSlaveIp), &["pod1".to_string(), "pod2".to_string()]);
    }

    #[test]
    fn unit_slave_is_master_of_other_pod() {
        let config = "\
sentinel monitor pod1 10.0.0.1 6379 1
sentinel monitor pod2 10.0.0.2 6379 1
sentinel known-slave pod2 10.0.0.1 6379
";
        let (session, _) = audit(config, &[]);
        assert_eq!(session.issue_index.pods_with(ConfigIssue::DuplicateSlaveIp), &["pod1".to_string(), "pod2".to_string()]);
        assert!(session.issue_index.pods_with(ConfigIssue::DuplicateMasterIp).is_empty());
    }

    #[test]
    fn unit_repeated_slave_in_one_pod_is_fine() {
        let config = "\
sentinel monitor pod1 10.0.0.1 6379 0
sentinel known-slave pod1 10.0.0.5 6379
sentinel known-slave pod1 10.0.0.5 6379
";
        let (session, _) = audit(config, &[]);
        assert!(session.issue_index.is_empty());
    }

    #[test]
    fn unit_rerun_rebuilds_findings() {
        let config = "\
sentinel monitor pod1 10.0.0.1 6379 1
sentinel known-sentinel pod1 10.0.0.11 26379
";
        let (mut session, _) = audit(config, &SENTINELS);
        assert!(session.issue_index.is_empty());
        session.topology.pod_entry("pod1").quorum = 2;
        session.run().unwrap();
        assert_eq!(session.issue_index.pods_with(ConfigIssue::NoQuorum), &["pod1".to_string()]);
        assert_eq!(session.pods_with_issues().len(), 1);
    }
}
