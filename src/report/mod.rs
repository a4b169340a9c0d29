//! Module for printing the reports of an audit.
//!
//! The reports only read the audited [crate::audit::AuditSession]:
//! - baseconfig: the bind directive, the port and the directory of the local sentinel.
//! - known-sentinels: the known sentinels and whether they could be reached.
//! - pods: the findings per pod, or per finding with `--byerror`, and the removal candidates.
//! - runtime: the live view of the running local sentinel compared to its configuration.
//! - json: the audited model as JSON.
//! - all: baseconfig, known-sentinels, pods and runtime.
//!
//! The runtime report is the only report that talks to the network, failures there are
//! printed as part of the report.
//!
mod structs;
mod functions;

pub use structs::*;
pub use functions::*;
