//! The impls and functions
//!
use std::{collections::HashMap, io::{BufRead, BufReader, Read, Write}, net::{TcpStream, ToSocketAddrs}, time::Duration};
use log::*;
use anyhow::{Result, Context, bail};
use crate::resp::{Reply, RespConnection, TcpConnector};

/// An open session to a sentinel or node.
///
/// Only [Session::execute] has to be implemented, the typed commands are built on it.
pub trait Session {
    fn execute(&mut self, args: &[&str]) -> Result<Reply>;

    fn auth(&mut self, secret: &str) -> Result<()> {
        if self.execute(&["AUTH", secret])?.bool_value()? {
            Ok(())
        } else {
            bail!("AUTH was not accepted")
        }
    }
    fn ping(&mut self) -> Result<()> {
        match self.execute(&["PING"])? {
            Reply::Status(status) if status == "PONG" => Ok(()),
            Reply::Error(error) => bail!("PING failed: {}", error),
            other => bail!("Unexpected reply to PING: {:?}", other),
        }
    }
    fn config_get(&mut self, key: &str) -> Result<HashMap<String, String>> {
        self.execute(&["CONFIG", "GET", key])?.hash_value()
    }
    fn sentinel_masters(&mut self) -> Result<Vec<HashMap<String, String>>> {
        self.execute(&["SENTINEL", "MASTERS"])?.hash_list_value()
    }
    fn sentinel_slaves(&mut self, pod: &str) -> Result<Vec<HashMap<String, String>>> {
        self.execute(&["SENTINEL", "SLAVES", pod])?.hash_list_value()
    }
    fn sentinel_sentinels(&mut self, pod: &str) -> Result<Vec<HashMap<String, String>>> {
        self.execute(&["SENTINEL", "SENTINELS", pod])?.hash_list_value()
    }
    fn sentinel_get_master_addr(&mut self, pod: &str) -> Result<Vec<String>> {
        self.execute(&["SENTINEL", "get-master-addr-by-name", pod])?.list_value()
    }
}

/// Opens sessions to endpoints.
///
/// It is shared by the probing threads.
pub trait Connector: Send + Sync {
    fn connect(&self, endpoint: &str, timeout: Duration) -> Result<Box<dyn Session>>;
}

impl Reply {
    /// `+OK` and positive integers are true, other statuses and integers are false.
    pub fn bool_value(&self) -> Result<bool> {
        match self {
            Reply::Status(status) => Ok(status == "OK"),
            Reply::Integer(number) => Ok(*number > 0),
            Reply::Error(error) => bail!("{}", error),
            other => bail!("Reply is not a boolean: {:?}", other),
        }
    }
    pub fn list_value(&self) -> Result<Vec<String>> {
        match self {
            Reply::Multi(None) => Ok(Vec::new()),
            Reply::Multi(Some(items)) => {
                items.iter()
                    .map(|item| match item {
                        Reply::Bulk(Some(value)) | Reply::Status(value) => Ok(value.to_string()),
                        Reply::Integer(number) => Ok(number.to_string()),
                        other => bail!("List element is not a string: {:?}", other),
                    })
                    .collect()
            }
            Reply::Error(error) => bail!("{}", error),
            other => bail!("Reply is not a list: {:?}", other),
        }
    }
    /// A flat list of alternating keys and values.
    pub fn hash_value(&self) -> Result<HashMap<String, String>> {
        let list = self.list_value()?;
        if list.len() % 2 != 0 {
            bail!("Reply has an odd number of elements for a hash: {}", list.len());
        }
        Ok(list.chunks(2)
            .map(|pair| (pair[0].to_string(), pair[1].to_string()))
            .collect())
    }
    /// A list of hashes. Elements that are not a hash are skipped.
    pub fn hash_list_value(&self) -> Result<Vec<HashMap<String, String>>> {
        match self {
            Reply::Multi(None) => Ok(Vec::new()),
            Reply::Multi(Some(items)) => {
                Ok(items.iter()
                    .filter_map(|item| item.hash_value()
                        .map_err(|e| warn!("unable to get hash from list element, error: {}", e))
                        .ok())
                    .collect())
            }
            Reply::Error(error) => bail!("{}", error),
            other => bail!("Reply is not a list of hashes: {:?}", other),
        }
    }
}

/// Encode a command as a multi-bulk request.
pub fn encode_command(
    args: &[&str],
) -> Vec<u8>
{
    let mut request = format!("*{}\r\n", args.len()).into_bytes();
    for arg in args {
        request.extend_from_slice(format!("${}\r\n", arg.len()).as_bytes());
        request.extend_from_slice(arg.as_bytes());
        request.extend_from_slice(b"\r\n");
    }
    request
}

/// The largest bulk string a server sends (512MB).
pub const MAX_BULK_LENGTH: i64 = 512 * 1024 * 1024;
/// Multi-bulk replies grow beyond this as elements arrive.
const MULTI_BULK_PREALLOCATE: i64 = 64;

/// Read a single reply.
pub fn read_reply<R: BufRead>(
    reader: &mut R,
) -> Result<Reply>
{
    let mut line = String::new();
    let read = reader.read_line(&mut line)
        .with_context(|| "Error reading reply")?;
    if read == 0 {
        bail!("Connection closed");
    }
    let line = line.trim_end_matches(&['\r', '\n'][..]);
    let (prefix, content) = match (line.get(..1), line.get(1..)) {
        (Some(prefix), Some(content)) => (prefix, content),
        _ => bail!("Invalid reply line: '{}'", line),
    };

    match prefix {
        "+" => Ok(Reply::Status(content.to_string())),
        "-" => Ok(Reply::Error(content.to_string())),
        ":" => Ok(Reply::Integer(content.parse()
            .with_context(|| format!("Invalid integer reply: {}", content))?)),
        "$" => {
            let length: i64 = content.parse()
                .with_context(|| format!("Invalid bulk length: {}", content))?;
            if length < 0 {
                return Ok(Reply::Bulk(None));
            }
            if length > MAX_BULK_LENGTH {
                bail!("Bulk length {} exceeds the maximum of {}", length, MAX_BULK_LENGTH);
            }
            // the bulk data is followed by \r\n.
            let mut data = vec![0_u8; length as usize + 2];
            reader.read_exact(&mut data)
                .with_context(|| "Error reading bulk data")?;
            data.truncate(length as usize);
            Ok(Reply::Bulk(Some(String::from_utf8_lossy(&data).to_string())))
        }
        "*" => {
            let count: i64 = content.parse()
                .with_context(|| format!("Invalid multi-bulk count: {}", content))?;
            if count < 0 {
                return Ok(Reply::Multi(None));
            }
            let mut items = Vec::with_capacity(count.min(MULTI_BULK_PREALLOCATE) as usize);
            for _ in 0..count {
                items.push(read_reply(reader)?);
            }
            Ok(Reply::Multi(Some(items)))
        }
        _ => bail!("Unknown reply type: {}", line),
    }
}

impl Session for RespConnection {
    fn execute(&mut self, args: &[&str]) -> Result<Reply> {
        trace!("{}: {}", self.endpoint, args.first().unwrap_or(&""));
        self.writer.write_all(&encode_command(args))
            .with_context(|| format!("Error sending command to {}", self.endpoint))?;
        self.writer.flush()?;
        read_reply(&mut self.reader)
            .with_context(|| format!("Error reading reply from {}", self.endpoint))
    }
}

impl Connector for TcpConnector {
    fn connect(&self, endpoint: &str, timeout: Duration) -> Result<Box<dyn Session>> {
        let addresses = endpoint.to_socket_addrs()
            .with_context(|| format!("Cannot resolve address: {}", endpoint))?;

        let mut last_error = None;
        for address in addresses {
            match TcpStream::connect_timeout(&address, timeout) {
                Ok(stream) => {
                    stream.set_read_timeout(Some(timeout))?;
                    stream.set_write_timeout(Some(timeout))?;
                    let writer = stream.try_clone()?;
                    debug!("connected to {} ({})", endpoint, address);
                    return Ok(Box::new(RespConnection {
                        endpoint: endpoint.to_string(),
                        reader: BufReader::new(stream),
                        writer,
                    }));
                }
                Err(e) => {
                    debug!("cannot connect to {} ({}): {}", endpoint, address, e);
                    last_error = Some(e);
                }
            }
        }
        match last_error {
            Some(e) => Err(e).with_context(|| format!("Cannot connect to: {}", endpoint)),
            None => bail!("No address found for: {}", endpoint),
        }
    }
}
