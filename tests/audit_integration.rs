use std::{collections::BTreeSet, env, io::Write, time::Duration};
use anyhow::{anyhow, Result};
use tempfile::NamedTempFile;

use sentinel_audit::audit::AuditSession;
use sentinel_audit::probe::Prober;
use sentinel_audit::resp::{Connector, Reply, Session, TcpConnector};
use sentinel_audit::sentinel_config::load_sentinel_config;
use sentinel_audit::topology::ConfigIssue;

fn get_hostname_sentinel() -> String {
    match env::var("HOSTNAME_SENTINEL") {
        Ok(value) => value,
        Err(e) => panic!("Error reading environment variable HOSTNAME_SENTINEL: {:?}", e)
    }
}
fn get_port_sentinel() -> String {
    match env::var("PORT_SENTINEL") {
        Ok(value) => value,
        Err(e) => panic!("Error reading environment variable PORT_SENTINEL: {:?}", e)
    }
}

/// Answers PING on every endpoint in `reachable`.
struct ScriptedConnector {
    reachable: BTreeSet<String>,
}
struct ScriptedSession;

impl Session for ScriptedSession {
    fn execute(&mut self, args: &[&str]) -> Result<Reply> {
        match args {
            ["PING"] => Ok(Reply::Status("PONG".to_string())),
            ["AUTH", _] => Ok(Reply::Status("OK".to_string())),
            _ => Ok(Reply::Error("ERR unknown command".to_string())),
        }
    }
}

impl Connector for ScriptedConnector {
    fn connect(&self, endpoint: &str, _timeout: Duration) -> Result<Box<dyn Session>> {
        if self.reachable.contains(endpoint) {
            Ok(Box::new(ScriptedSession))
        } else {
            Err(anyhow!("Connection refused"))
        }
    }
}

fn config_file(config: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(config.as_bytes()).unwrap();
    file
}

fn audit_file(config: &str, reachable: &[&str]) -> AuditSession {
    let file = config_file(config);
    let topology = load_sentinel_config(file.path().to_str().unwrap()).unwrap();
    let connector = ScriptedConnector { reachable: reachable.iter().map(|r| r.to_string()).collect() };
    let prober = Prober::new(Box::new(connector), Duration::from_millis(100));
    let mut session = AuditSession::new(topology, prober, 4);
    session.run().unwrap();
    session
}

#[test]
fn healthy_pod_without_replicas() {
    let session = audit_file("\
bind 10.0.0.10
port 26379
sentinel monitor pod1 10.0.0.1 6379 2
sentinel known-sentinel pod1 10.0.0.11 26379
sentinel known-sentinel pod1 10.0.0.12 26379
", &["10.0.0.11:26379", "10.0.0.12:26379"]);
    assert!(session.issue_index.is_empty());
    assert!(session.pods_with_issues().is_empty());
}

#[test]
fn one_reachable_sentinel_for_quorum_two() {
    let session = audit_file("\
sentinel monitor pod1 10.0.0.1 6379 2
sentinel known-sentinel pod1 10.0.0.11 26379
", &["10.0.0.11:26379"]);
    assert_eq!(session.issue_index.issues_for("pod1"), vec![ConfigIssue::NotEnoughSentinels, ConfigIssue::NoQuorum]);
}

#[test]
fn unreachable_sentinel_is_reported() {
    let session = audit_file("\
sentinel monitor pod1 10.0.0.1 6379 2
sentinel known-sentinel pod1 10.0.0.11 26379
sentinel known-sentinel pod1 10.0.0.13 26379
", &["10.0.0.11:26379"]);
    assert_eq!(session.issue_index.issues_for("pod1"), vec![
        ConfigIssue::NotEnoughSentinels,
        ConfigIssue::NoQuorum,
        ConfigIssue::HasInvalidSentinels,
    ]);
    assert_eq!(session.topology.pods["pod1"].invalid_sentinels.len(), 1);
}

#[test]
fn shared_master_ip_and_replica() {
    let session = audit_file("\
sentinel monitor pod1 10.0.0.1 6379 0
sentinel known-slave pod1 10.0.0.5 6379
sentinel monitor pod2 10.0.0.1 6380 0
sentinel monitor pod3 10.0.0.3 6379 0
sentinel known-replica pod3 10.0.0.5 6379
sentinel monitor pod4 10.0.0.4 6379 0
", &["10.0.0.1:6379", "10.0.0.1:6380"]);
    assert_eq!(session.issue_index.pods_with(ConfigIssue::DuplicateMasterIp), &["pod1".to_string(), "pod2".to_string()]);
    assert_eq!(session.issue_index.pods_with(ConfigIssue::DuplicateSlaveIp), &["pod1".to_string(), "pod3".to_string()]);
    assert!(session.issue_index.issues_for("pod4").is_empty());
    assert!(session.removal_candidates.is_empty());
}

#[test]
fn missing_config_file_is_an_error() {
    let file = config_file("");
    let path = file.path().to_str().unwrap().to_string();
    drop(file);
    assert!(load_sentinel_config(&path).is_err());
}

#[test]
#[ignore]
fn audit_live_sentinel() {
    let hostname = get_hostname_sentinel();
    let port = get_port_sentinel();
    let file = config_file(&format!("bind {}\nport {}\n", hostname, port));
    let topology = load_sentinel_config(file.path().to_str().unwrap()).unwrap();
    let prober = Prober::new(Box::new(TcpConnector), Duration::from_millis(2000));
    prober.probe(&topology.local.name, None).unwrap();
    let mut session = AuditSession::new(topology, prober, 1);
    session.run().unwrap();
    assert!(session.issue_index.is_empty());
}
