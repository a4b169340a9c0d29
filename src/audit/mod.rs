//! Module for auditing a parsed sentinel configuration.
//!
//! An [AuditSession] owns everything an audit changes: the [crate::topology::Topology], the
//! cache of invalid endpoints, the issue index, and the removal candidates.
//! [AuditSession::run] performs a single pass:
//! 1. probe the known sentinels (for the known-sentinels report; this fills the cache).
//! 2. validate the sentinels of every pod, in parallel, and derive the per-pod findings:
//!    `HAS_INVALID_SENTINELS`, `NO_QUORUM` and `NOT_ENOUGH_SENTINELS`.
//! 3. when all pods are validated: look for master IPs shared between pods
//!    (`DUPLICATE_MASTER_IP`), and for replicas shared between pods or acting as a master
//!    (`DUPLICATE_SLAVE_IP`).
//!
//! A pass never stops at the first finding, and a failing probe is a finding, not an error.
//!
mod structs;
mod functions;

pub use structs::*;
pub use functions::*;
