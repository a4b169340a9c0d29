//! The impls and functions
//!
use std::{collections::BTreeSet, sync::{MutexGuard, PoisonError}, time::Duration};
use log::*;
use anyhow::{Result, Context, bail};
use crate::probe::{InvalidEndpoints, Prober};
use crate::resp::{Connector, Session};

impl InvalidEndpoints {
    pub fn new() -> Self {
        Default::default()
    }
    fn lock(&self) -> MutexGuard<'_, BTreeSet<String>> {
        // an insert never leaves a partial entry, a poisoned lock is still usable.
        self.endpoints.lock().unwrap_or_else(PoisonError::into_inner)
    }
    pub fn contains(&self, endpoint: &str) -> bool {
        self.lock().contains(endpoint)
    }
    pub fn insert(&self, endpoint: &str) {
        self.lock().insert(endpoint.to_string());
    }
    pub fn to_vec(&self) -> Vec<String> {
        self.lock().iter().cloned().collect()
    }
}

impl Prober {
    pub fn new(connector: Box<dyn Connector>, timeout: Duration) -> Self {
        Prober { connector, timeout }
    }
    /// Connect, and authenticate when a secret is set.
    pub fn open_session(
        &self,
        endpoint: &str,
        secret: Option<&str>,
    ) -> Result<Box<dyn Session>>
    {
        let mut session = self.connector.connect(endpoint, self.timeout)?;
        if let Some(secret) = secret {
            session.auth(secret)
                .with_context(|| format!("Cannot authenticate to: {}", endpoint))?;
        }
        Ok(session)
    }
    /// Check if the endpoint is alive. An error means unreachable.
    pub fn probe(
        &self,
        endpoint: &str,
        secret: Option<&str>,
    ) -> Result<()>
    {
        let mut session = self.open_session(endpoint, secret)?;
        session.ping()
            .with_context(|| format!("No PING reply from: {}", endpoint))
    }
    /// Like [Prober::probe], but an endpoint in `invalid_endpoints` is not probed again, and
    /// an endpoint failing the probe is added to it.
    pub fn probe_cached(
        &self,
        invalid_endpoints: &InvalidEndpoints,
        endpoint: &str,
        secret: Option<&str>,
    ) -> Result<()>
    {
        if invalid_endpoints.contains(endpoint) {
            bail!("Known invalid endpoint: {}", endpoint);
        }
        self.probe(endpoint, secret)
            .map_err(|e| {
                debug!("{} is unreachable: {:#}", endpoint, e);
                invalid_endpoints.insert(endpoint);
                e
            })
    }
    /// Read a single configuration parameter of a node, such as `maxmemory`.
    pub fn config_get(
        &self,
        endpoint: &str,
        secret: Option<&str>,
        key: &str,
    ) -> Result<String>
    {
        let mut session = self.open_session(endpoint, secret)?;
        session.config_get(key)?
            .remove(key)
            .with_context(|| format!("{} did not return configuration parameter {}", endpoint, key))
    }
    /// Sort sentinels into (confirmed, invalid).
    pub fn validate_sentinels(
        &self,
        sentinels: &BTreeSet<String>,
        invalid_endpoints: &InvalidEndpoints,
    ) -> (BTreeSet<String>, BTreeSet<String>)
    {
        let mut confirmed = BTreeSet::new();
        let mut invalid = BTreeSet::new();
        for sentinel in sentinels {
            match self.probe_cached(invalid_endpoints, sentinel, None) {
                Ok(()) => { confirmed.insert(sentinel.to_string()); },
                Err(e) => {
                    trace!("{}: {:#}", sentinel, e);
                    invalid.insert(sentinel.to_string());
                },
            }
        }
        (confirmed, invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use anyhow::anyhow;
    use crate::resp::Reply;

    struct CountingConnector {
        reachable: Vec<String>,
        password: Option<String>,
        attempts: Arc<Mutex<Vec<String>>>,
    }
    struct CountingSession {
        password: Option<String>,
    }

    impl Session for CountingSession {
        fn execute(&mut self, args: &[&str]) -> Result<Reply> {
            match args {
                ["AUTH", secret] => {
                    if self.password.as_deref() == Some(*secret) {
                        Ok(Reply::Status("OK".to_string()))
                    } else {
                        Ok(Reply::Error("ERR invalid password".to_string()))
                    }
                }
                ["PING"] => Ok(Reply::Status("PONG".to_string())),
                ["CONFIG", "GET", key] => Ok(Reply::Multi(Some(vec![
                    Reply::Bulk(Some(key.to_string())),
                    Reply::Bulk(Some("1048576".to_string())),
                ]))),
                _ => Ok(Reply::Error("ERR unknown command".to_string())),
            }
        }
    }

    impl Connector for CountingConnector {
        fn connect(&self, endpoint: &str, _timeout: Duration) -> Result<Box<dyn Session>> {
            self.attempts.lock().unwrap().push(endpoint.to_string());
            if self.reachable.iter().any(|r| r == endpoint) {
                Ok(Box::new(CountingSession { password: self.password.clone() }))
            } else {
                Err(anyhow!("Connection refused"))
            }
        }
    }

    fn prober(reachable: &[&str], password: Option<&str>) -> (Prober, Arc<Mutex<Vec<String>>>) {
        let attempts = Arc::new(Mutex::new(Vec::new()));
        let connector = CountingConnector {
            reachable: reachable.iter().map(|r| r.to_string()).collect(),
            password: password.map(|p| p.to_string()),
            attempts: attempts.clone(),
        };
        (Prober::new(Box::new(connector), Duration::from_millis(100)), attempts)
    }

    #[test]
    fn unit_probe_reachable() {
        let (prober, _) = prober(&["10.0.0.10:26379"], None);
        assert!(prober.probe("10.0.0.10:26379", None).is_ok());
        assert!(prober.probe("10.0.0.11:26379", None).is_err());
    }

    #[test]
    fn unit_probe_with_wrong_secret_fails() {
        let (prober, _) = prober(&["10.0.0.1:6379"], Some("right"));
        assert!(prober.probe("10.0.0.1:6379", Some("right")).is_ok());
        assert!(prober.probe("10.0.0.1:6379", Some("wrong")).is_err());
    }

    #[test]
    fn unit_probe_cached_does_not_probe_twice() {
        let (prober, attempts) = prober(&[], None);
        let invalid_endpoints = InvalidEndpoints::new();
        assert!(prober.probe_cached(&invalid_endpoints, "10.0.0.11:26379", None).is_err());
        let second = prober.probe_cached(&invalid_endpoints, "10.0.0.11:26379", None);
        assert!(format!("{}", second.unwrap_err()).contains("Known invalid endpoint"));
        assert_eq!(attempts.lock().unwrap().len(), 1);
        assert!(invalid_endpoints.contains("10.0.0.11:26379"));
    }

    #[test]
    fn unit_probe_cached_reachable_is_not_cached() {
        let (prober, attempts) = prober(&["10.0.0.10:26379"], None);
        let invalid_endpoints = InvalidEndpoints::new();
        assert!(prober.probe_cached(&invalid_endpoints, "10.0.0.10:26379", None).is_ok());
        assert!(prober.probe_cached(&invalid_endpoints, "10.0.0.10:26379", None).is_ok());
        assert_eq!(attempts.lock().unwrap().len(), 2);
        assert!(invalid_endpoints.to_vec().is_empty());
    }

    #[test]
    fn unit_validate_sentinels() {
        let (prober, _) = prober(&["10.0.0.10:26379", "10.0.0.11:26379"], None);
        let invalid_endpoints = InvalidEndpoints::new();
        let sentinels: BTreeSet<String> = ["10.0.0.10:26379", "10.0.0.11:26379", "10.0.0.12:26379"]
            .iter().map(|s| s.to_string()).collect();
        let (confirmed, invalid) = prober.validate_sentinels(&sentinels, &invalid_endpoints);
        assert_eq!(confirmed.len(), 2);
        assert_eq!(invalid.into_iter().collect::<Vec<_>>(), vec!["10.0.0.12:26379".to_string()]);
    }

    #[test]
    fn unit_config_get() {
        let (prober, _) = prober(&["10.0.0.1:6379"], None);
        assert_eq!(prober.config_get("10.0.0.1:6379", None, "maxmemory").unwrap(), "1048576");
        assert!(prober.config_get("10.0.0.2:6379", None, "maxmemory").is_err());
    }
}
