//! The structs
//!
use std::{collections::BTreeSet, sync::Mutex, time::Duration};
use crate::resp::Connector;

/// The endpoints that failed a probe.
///
/// Shared by the probing threads, every access takes the lock.
#[derive(Debug, Default)]
pub struct InvalidEndpoints {
    pub(crate) endpoints: Mutex<BTreeSet<String>>,
}

/// Probes endpoints using a [Connector].
pub struct Prober {
    pub(crate) connector: Box<dyn Connector>,
    pub timeout: Duration,
}
