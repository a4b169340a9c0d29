//! The impls and functions
//!
use std::{fs, io::{BufRead, BufReader}};
use log::*;
use anyhow::{Result, Context, bail};
use crate::topology::Topology;

/// Read the sentinel configuration file into a [Topology].
///
/// The file not being readable is the only error.
pub fn load_sentinel_config(
    path: &str,
) -> Result<Topology>
{
    info!("Loading sentinel configuration file: {}", path);
    let file = fs::File::open(path)
        .with_context(|| format!("Error opening sentinel configuration file: {}", path))?;
    let topology = read_sentinel_config(BufReader::new(file))
        .with_context(|| format!("Error reading sentinel configuration file: {}", path))?;
    info!("File load complete: {} pods, {} known sentinels", topology.pods.len(), topology.known_sentinels.len());
    Ok(topology)
}

/// Read sentinel configuration directives from a reader.
pub fn read_sentinel_config<R: BufRead>(
    reader: R,
) -> Result<Topology>
{
    let mut topology = Topology::new();

    for (number, line) in reader.split(b'\n').enumerate() {
        let line = line.with_context(|| format!("Error reading line {}", number + 1))?;
        // bytes that are not UTF-8 are replaced, a line is never fatal.
        let line = String::from_utf8_lossy(&line);
        let line = line.trim();
        // ignore empty lines and comments
        if line.is_empty() || line.contains('#') {
            continue;
        }
        if let Err(e) = parse_line(line, &mut topology) {
            warn!("line {}: misshapen directive: '{}': {}", number + 1, line, e);
        }
    }

    for pod in topology.pods.values().filter(|pod| !pod.is_monitored()) {
        warn!("Pod {} is referenced, but has no monitor directive", pod.name);
    }
    topology.build_known_sentinels();

    Ok(topology)
}

fn require(
    entries: &[&str],
    count: usize,
    usage: &str,
) -> Result<()>
{
    if entries.len() < count {
        bail!("missing arguments, expected: {}", usage);
    }
    Ok(())
}

fn endpoint(
    ip: &str,
    port: &str,
) -> Result<String>
{
    let port: u16 = port.parse()
        .with_context(|| format!("invalid port: {}", port))?;
    Ok(format!("{}:{}", ip, port))
}

fn parse_line(
    line: &str,
    topology: &mut Topology,
) -> Result<()>
{
    let entries: Vec<&str> = line.split_whitespace().collect();

    match entries[0] {
        "sentinel" => parse_sentinel_directive(&entries[1..], topology)?,
        "port" => {
            require(&entries, 2, "port <port>")?;
            let port: u16 = entries[1].parse()
                .with_context(|| format!("invalid port: {}", entries[1]))?;
            topology.local.set_port(port);
        }
        "bind" => {
            require(&entries, 2, "bind <address>")?;
            topology.local.set_host(entries[1]);
            info!("Local sentinel is listening on IP {}", entries[1]);
        }
        "dir" => {
            require(&entries, 2, "dir <path>")?;
            topology.local.dir = entries[1].to_string();
        }
        "maxclients" => {},
        _ => info!("Unhandled config directive: {}", line),
    }
    Ok(())
}

fn parse_sentinel_directive(
    entries: &[&str],
    topology: &mut Topology,
) -> Result<()>
{
    let Some(subdirective) = entries.first() else {
        bail!("sentinel directive without subdirective");
    };

    match *subdirective {
        "monitor" => {
            require(entries, 5, "sentinel monitor <pod> <ip> <port> <quorum>")?;
            let (name, ip) = (entries[1], entries[2]);
            let port: u16 = entries[3].parse()
                .with_context(|| format!("invalid port: {}", entries[3]))?;
            let quorum: usize = entries[4].parse()
                .with_context(|| format!("invalid quorum: {}", entries[4]))?;

            // the first pod monitoring a master address wins.
            let address = format!("{}:{}", ip, port);
            if let Some(existing) = topology.pod_by_master_address(&address) {
                if existing.name != name {
                    debug!("Pod {} monitors {}, which is monitored by pod {} already: ignored", name, address, existing.name);
                    return Ok(());
                }
            }

            let pod = topology.pod_entry(name);
            if pod.is_monitored() {
                warn!("Pod {} has multiple monitor directives, using the last one: {}", name, address);
            }
            pod.master_ip = ip.to_string();
            pod.master_port = port;
            pod.quorum = quorum;
        }
        "auth-pass" => {
            require(entries, 3, "sentinel auth-pass <pod> <secret>")?;
            topology.pod_entry(entries[1]).auth_token = Some(entries[2].to_string());
        }
        "known-sentinel" => {
            require(entries, 4, "sentinel known-sentinel <pod> <ip> <port>")?;
            let sentinel = endpoint(entries[2], entries[3])?;
            topology.pod_entry(entries[1]).sentinels.insert(sentinel);
        }
        "known-slave" | "known-replica" => {
            require(entries, 4, "sentinel known-slave <pod> <ip> <port>")?;
            let slave = endpoint(entries[2], entries[3])?;
            topology.pod_entry(entries[1]).slaves.push(slave);
        }
        "config-epoch" | "leader-epoch" | "current-epoch" | "down-after-milliseconds" | "maxclients" => {},
        _ => info!("Unhandled sentinel directive: {:?}", entries),
    }
    Ok(())
}
