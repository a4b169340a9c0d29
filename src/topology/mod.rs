//! Module with the in-memory model of the sentinel configuration.
//!
//! The model is filled once by [crate::sentinel_config], and then completed by the audit:
//! - [Topology]: the local sentinel identity ([LocalSentinel]), the pods ([PodConfig]) by
//!   name, and the registry of known sentinels.
//! - [PodConfig]: a pod as declared in the configuration, plus the confirmed and invalid
//!   sentinels found during the audit.
//! - [ConfigIssue]: the kinds of finding.
//! - [IssueIndex]: finding kind to the pods that have it.
//!
mod structs;
mod functions;

pub use structs::*;
pub use functions::*;
