//! The impls and functions
//!
use std::{collections::BTreeMap, fmt::Display, io::{self, Write}, str::FromStr};
use chrono::Local;
use colored::*;
use itertools::Itertools;
use log::*;
use anyhow::{Result, Context, bail};
use crate::{Opts, STANDARD_SENTINEL_PORT, utility};
use crate::audit::{AuditSession, Reachability};
use crate::decoder::{decode_all, decode_master_address, MasterInfo, SentinelInfo, SlaveInfo};
use crate::report::{AuditSummary, PodSummary, Report, ReportOptions};
use crate::resp::Session;
use crate::topology::PodConfig;

impl FromStr for Report {
    type Err = anyhow::Error;

    fn from_str(name: &str) -> Result<Self> {
        match name.trim().to_lowercase().as_str() {
            "baseconfig" => Ok(Report::BaseConfig),
            "known-sentinels" => Ok(Report::KnownSentinels),
            "pods" => Ok(Report::Pods),
            "runtime" => Ok(Report::Runtime),
            "json" => Ok(Report::Json),
            _ => bail!("Unknown report '{}'", name),
        }
    }
}

impl Report {
    /// The reports run for `all`.
    pub const ALL: [Report; 4] = [Report::BaseConfig, Report::KnownSentinels, Report::Pods, Report::Runtime];

    pub fn expand(name: &str) -> Result<Vec<Report>> {
        if name.trim().eq_ignore_ascii_case("all") {
            Ok(Report::ALL.to_vec())
        } else {
            Ok(vec![name.parse()?])
        }
    }
    pub fn write(
        &self,
        session: &AuditSession,
        options: &ReportOptions,
        out: &mut impl Write,
    ) -> Result<()>
    {
        match self {
            Report::BaseConfig => write_base_config(session, out),
            Report::KnownSentinels => write_known_sentinels(session, out),
            Report::Pods => write_pods(session, options, out),
            Report::Runtime => write_runtime(session, options, out),
            Report::Json => write_json(session, options, out),
        }
    }
}

impl ReportOptions {
    pub fn from_opts(options: &Opts) -> Self {
        ReportOptions {
            by_error: options.byerror,
            details_enable: options.details_enable,
            pod_filter: utility::set_regex(&options.pod_match),
        }
    }
    fn shows(&self, pod: &str) -> bool {
        self.pod_filter.as_ref().map_or(true, |filter| filter.is_match(pod))
    }
}

/// Print the reports named in the options on stdout.
pub fn run_reports(
    session: &AuditSession,
    options: &Opts,
) -> Result<()>
{
    let report_options = ReportOptions::from_opts(options);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_reports(session, &options.report, &report_options, &mut out)
}

/// Write the named reports. An unknown name is logged, the other reports still run.
pub fn write_reports(
    session: &AuditSession,
    names: &[String],
    options: &ReportOptions,
    out: &mut impl Write,
) -> Result<()>
{
    let mut reports = Vec::new();
    for name in names {
        match Report::expand(name) {
            Ok(expanded) => reports.extend(expanded),
            Err(e) => error!("{}", e),
        }
    }
    let reports: Vec<Report> = reports.into_iter().unique().collect();
    debug!("reports: {:?}", reports);

    if reports.iter().any(|report| *report != Report::Json) {
        writeln!(out, "Configuration Audit Run for Sentinel '{}' at {}", session.topology.local.name, Local::now())?;
        writeln!(out)?;
    }
    for report in reports {
        report.write(session, options, out)?;
        writeln!(out)?;
    }
    out.flush().with_context(|| "Error writing reports")
}

pub fn write_base_config(
    session: &AuditSession,
    out: &mut impl Write,
) -> Result<()>
{
    let local = &session.topology.local;
    writeln!(out, "Base Configuration")?;
    writeln!(out, "==================")?;
    if local.host.is_empty() {
        warn!("Missing bind directive");
        writeln!(out, "Bind Statement Present: {}", "False".red())?;
    } else {
        writeln!(out, "Bind Statement Present: {} ({})", "True".green(), local.host)?;
    }
    if local.port == 0 {
        writeln!(out, "Port Statement Present: {}", "False".red())?;
    } else {
        writeln!(out, "Port: {}", local.port)?;
        if local.port != STANDARD_SENTINEL_PORT {
            writeln!(out, "{} Sentinel is running on non-standard port: {}", "WARNING:".yellow(), local.port)?;
        }
    }
    if !local.dir.is_empty() {
        writeln!(out, "Directory: {}", local.dir)?;
    }
    Ok(())
}

pub fn write_known_sentinels(
    session: &AuditSession,
    out: &mut impl Write,
) -> Result<()>
{
    writeln!(out, "Known Sentinels ({}):", session.sentinel_reachability.len())?;
    writeln!(out, "=====================")?;
    for (sentinel, reachability) in &session.sentinel_reachability {
        match reachability {
            Reachability::Available => writeln!(out, "{} ({})", sentinel, "Available".green())?,
            Reachability::Missing(error) => writeln!(out, "{} ({} - err: '{}')", sentinel, "MISSING".red(), error)?,
        }
    }
    Ok(())
}

pub fn write_pods(
    session: &AuditSession,
    options: &ReportOptions,
    out: &mut impl Write,
) -> Result<()>
{
    let pods = &session.topology.pods;
    writeln!(out, "Locally Configured Pods: {}", pods.len())?;
    writeln!(out, "{} of {} Pods have configuration issues", session.pods_with_issues().len(), pods.len())?;

    if options.by_error {
        for (issue, pod_names) in &session.issue_index.issues {
            let shown: Vec<&String> = pod_names.iter().filter(|name| options.shows(name)).collect();
            if shown.is_empty() {
                continue;
            }
            writeln!(out)?;
            writeln!(out, "Config Issue: '{}' ({})", issue, issue.code())?;
            writeln!(out, "Pods with issue {}", shown.len())?;
            writeln!(out, "=============================")?;
            for name in shown {
                writeln!(out, "  {}", name)?;
            }
        }
    } else {
        for pod in pods.values().filter(|pod| options.shows(&pod.name)) {
            let issues = session.issue_index.issues_for(&pod.name);
            if issues.is_empty() && !options.details_enable {
                continue;
            }
            writeln!(out)?;
            if issues.is_empty() {
                writeln!(out, "{} has no configuration issues ({})", describe_pod(pod), "OK".green())?;
            } else {
                writeln!(out, "{} has {} configuration issues", describe_pod(pod), issues.len().to_string().red())?;
            }
            for issue in issues {
                writeln!(out, "  - {}: {}", issue.code(), issue)?;
            }
            if options.details_enable {
                for sentinel in &pod.confirmed_sentinels {
                    writeln!(out, "    sentinel {} ({})", sentinel, "confirmed".green())?;
                }
                for sentinel in &pod.invalid_sentinels {
                    writeln!(out, "    sentinel {} ({})", sentinel, "invalid".red())?;
                }
                if !pod.slaves.is_empty() {
                    writeln!(out, "    slaves: {}", pod.slaves.iter().join(", "))?;
                }
            }
        }
    }

    let candidates: Vec<_> = session.removal_candidates
        .iter()
        .filter(|candidate| options.shows(&candidate.pod))
        .collect();
    if !candidates.is_empty() {
        writeln!(out)?;
        writeln!(out, "Removal Candidates ({}):", candidates.len())?;
        writeln!(out, "=====================")?;
        for candidate in candidates {
            writeln!(out, "  {} ({}): {}", candidate.pod, candidate.master_address, candidate.error)?;
        }
    }
    Ok(())
}

fn describe_pod(pod: &PodConfig) -> String {
    if pod.is_monitored() {
        format!("{} ({}, quorum {})", pod.name, pod.master_address(), pod.quorum)
    } else {
        format!("{} (no monitor directive)", pod.name)
    }
}

fn compare<T: PartialEq + Display>(
    out: &mut impl Write,
    label: &str,
    configured: T,
    running: T,
) -> io::Result<()>
{
    if configured == running {
        writeln!(out, "  {}: {}", label, running)
    } else {
        writeln!(out, "  {}: configured {}, running {} {}", label, configured, running, "MISMATCH".yellow())
    }
}

/// Compare the configuration with the view of the running local sentinel.
pub fn write_runtime(
    session: &AuditSession,
    options: &ReportOptions,
    out: &mut impl Write,
) -> Result<()>
{
    let local = &session.topology.local;
    writeln!(out, "Runtime Comparison")?;
    writeln!(out, "==================")?;
    if local.name.is_empty() {
        writeln!(out, "The address of the local sentinel is unknown, bind and port must be set")?;
        return Ok(());
    }

    let mut sentinel = match session.prober.open_session(&local.name, None) {
        Ok(sentinel) => sentinel,
        Err(e) => {
            warn!("Cannot connect to the local sentinel {}: {:#}", local.name, e);
            writeln!(out, "Cannot connect to the local sentinel {}: {:#}", local.name, e)?;
            return Ok(());
        }
    };
    let live_masters: Vec<MasterInfo> = match sentinel.sentinel_masters() {
        Ok(masters) => decode_all(&masters),
        Err(e) => {
            writeln!(out, "SENTINEL MASTERS failed on {}: {:#}", local.name, e)?;
            return Ok(());
        }
    };
    let live: BTreeMap<&str, &MasterInfo> = live_masters
        .iter()
        .map(|master| (master.name.as_str(), master))
        .collect();
    writeln!(out, "Pods loaded in {}: {}, configured: {}", local.name, live.len(), session.topology.pods.len())?;

    for pod in session.topology.pods.values().filter(|pod| options.shows(&pod.name)) {
        writeln!(out)?;
        match live.get(pod.name.as_str()) {
            Some(master) => write_runtime_pod(session, options, sentinel.as_mut(), pod, master, out)?,
            None => writeln!(out, "{} {}: configured but not loaded", "-".red(), pod.name)?,
        }
    }
    for name in live.keys().filter(|name| !session.topology.pods.contains_key(**name) && options.shows(name)) {
        writeln!(out)?;
        writeln!(out, "{} {}: loaded but not configured", "+".yellow(), name)?;
    }
    Ok(())
}

fn write_runtime_pod(
    session: &AuditSession,
    options: &ReportOptions,
    sentinel: &mut dyn Session,
    pod: &PodConfig,
    master: &MasterInfo,
    out: &mut impl Write,
) -> Result<()>
{
    writeln!(out, "{} {} ({})", "*".green(), pod.name, master.flags)?;
    compare(out, "quorum", pod.quorum as i64, master.quorum)?;

    let running_master = sentinel.sentinel_get_master_addr(&pod.name)
        .map_err(|e| debug!("get-master-addr-by-name {}: {:#}", pod.name, e))
        .ok()
        .and_then(|reply| decode_master_address(&reply))
        .map(|address| format!("{}:{}", address.host, address.port))
        .unwrap_or_else(|| format!("{}:{}", master.ip, master.port));
    compare(out, "master", pod.master_address(), running_master)?;

    match sentinel.sentinel_slaves(&pod.name) {
        Ok(reply) => {
            let slaves: Vec<SlaveInfo> = decode_all(&reply);
            compare(out, "slaves", pod.slaves.len(), slaves.len())?;
            if options.details_enable {
                for slave in slaves {
                    writeln!(out, "    slave {}:{} {} link {}", slave.host, slave.port, slave.flags, slave.master_link_status)?;
                }
            }
        }
        Err(e) => writeln!(out, "  slaves: unavailable ({:#})", e)?,
    }

    let local_name = session.topology.local.name.as_str();
    let configured_sentinels = pod.sentinels.iter().filter(|sentinel| *sentinel != local_name).count();
    match sentinel.sentinel_sentinels(&pod.name) {
        Ok(reply) => {
            let sentinels: Vec<SentinelInfo> = decode_all(&reply);
            compare(out, "sentinels", configured_sentinels, sentinels.len())?;
            if options.details_enable {
                for other in sentinels {
                    writeln!(out, "    sentinel {}:{} {}", other.ip, other.port, other.flags)?;
                }
            }
        }
        Err(e) => writeln!(out, "  sentinels: unavailable ({:#})", e)?,
    }

    match session.prober.config_get(&pod.master_address(), pod.auth_token.as_deref(), "maxmemory") {
        Ok(maxmemory) => writeln!(out, "  maxmemory: {}", maxmemory)?,
        Err(e) => writeln!(out, "  maxmemory: unavailable ({:#})", e)?,
    }
    Ok(())
}

pub fn write_json(
    session: &AuditSession,
    options: &ReportOptions,
    out: &mut impl Write,
) -> Result<()>
{
    let summary = AuditSummary {
        timestamp: Local::now(),
        local: &session.topology.local,
        known_sentinels: &session.sentinel_reachability,
        invalid_endpoints: session.invalid_endpoints.to_vec(),
        pods: session.topology.pods
            .values()
            .filter(|pod| options.shows(&pod.name))
            .map(|pod| PodSummary { pod, issues: session.issue_index.issues_for(&pod.name) })
            .collect(),
        issues: &session.issue_index,
        removal_candidates: &session.removal_candidates,
    };
    writeln!(out, "{}", serde_json::to_string_pretty(&summary).with_context(|| "Error serializing the audit")?)?;
    Ok(())
}
