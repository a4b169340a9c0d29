//! sentinel_audit: audit the configuration of a sentinel and the pods it monitors.
//!
//! The audit reads the local sentinel configuration file, probes every sentinel and master
//! it declares, and reports structural problems: not enough reachable sentinels for the
//! configured quorum, unreachable sentinels, and masters or replicas that are shared
//! between pods.
//!
//! The flow is:
//! - [sentinel_config] parses the configuration file into a [topology::Topology].
//! - [audit::AuditSession] validates the topology using a [probe::Prober], and fills
//!   the [topology::IssueIndex].
//! - [report] prints one or more named reports from the audited session.
//!
extern crate serde;
extern crate serde_json;
#[macro_use]
extern crate serde_derive;

use clap::Parser;

pub mod audit;
pub mod decoder;
pub mod probe;
pub mod report;
pub mod resp;
pub mod sentinel_config;
pub mod topology;
pub mod utility;

/// The configuration file a sentinel reads by default.
pub const DEFAULT_CONFIG_FILE: &str = "/etc/redis/sentinel.conf";
/// The number of threads used for probing in parallel.
pub const DEFAULT_PARALLEL: &str = "4";
/// The connect and read timeout for a single probe.
pub const DEFAULT_TIMEOUT_MS: &str = "2000";
/// The port a sentinel listens on if nothing else is configured.
pub const STANDARD_SENTINEL_PORT: u16 = 26379;

#[derive(Debug, Parser, Default, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Opts {
    /// reports to run, comma separated or repeated: baseconfig, known-sentinels, pods, runtime, json, all
    #[arg(short, long, value_delimiter = ',', default_value = "all")]
    pub report: Vec<String>,
    /// for each found configuration issue show all pods which have it
    #[arg(long)]
    pub byerror: bool,
    /// sentinel configuration file to audit
    #[arg(short, long, value_name = "path")]
    pub config_file: Option<String>,
    /// number of threads used for probing
    #[arg(long, value_name = "threads")]
    pub parallel: Option<String>,
    /// connect and read timeout for a single probe in milliseconds
    #[arg(long, value_name = "milliseconds")]
    pub timeout_ms: Option<String>,
    /// regex to select the pods shown in the reports
    #[arg(long, value_name = "regex")]
    pub pod_match: Option<String>,
    /// show the sentinels per pod
    #[arg(long)]
    pub details_enable: bool,
    /// write the set options to .env
    #[arg(long)]
    pub write_dotenv: bool,
}
