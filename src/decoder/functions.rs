//! The impls and functions
//!
use std::collections::HashMap;
use log::*;
use crate::decoder::{Coercion, MasterAddress, ReplyRecord};

/// Decode a flat key/value reply into a record.
///
/// Fields whose attribute is missing or cannot be converted keep their zero value.
pub fn decode<T: ReplyRecord>(
    reply: &HashMap<String, String>,
) -> T
{
    let mut record = T::default();

    for field in T::FIELDS {
        let value = reply.get(field.key).map(String::as_str).unwrap_or_default();
        match &field.coercion {
            Coercion::Integer(set) => {
                if value.is_empty() { continue };
                match value.parse::<i64>() {
                    Ok(number) => set(&mut record, number),
                    Err(e) => debug!("field {} ({}): cannot convert '{}' to integer: {}", field.name, field.key, value, e),
                }
            }
            Coercion::Text(set) => set(&mut record, value.to_string()),
            Coercion::Boolean(set) => {
                if value.is_empty() { continue };
                match value.parse::<i64>() {
                    Ok(number) => set(&mut record, number > 0),
                    Err(e) => debug!("field {} ({}): cannot convert '{}' to boolean: {}", field.name, field.key, value, e),
                }
            }
        }
    }
    trace!("decoded {} fields", T::FIELDS.len());

    record
}

/// Decode every flat key/value reply of a list reply.
pub fn decode_all<T: ReplyRecord>(
    replies: &[HashMap<String, String>],
) -> Vec<T>
{
    replies.iter().map(decode::<T>).collect()
}

/// Decode the host and port list returned by `SENTINEL get-master-addr-by-name`.
///
/// An empty list means the sentinel does not know the pod.
pub fn decode_master_address(
    reply: &[String],
) -> Option<MasterAddress>
{
    let host = reply.first()?;
    let port = reply.get(1)
        .and_then(|port| port.parse::<i64>()
            .map_err(|e| debug!("bad port information for {}: '{}': {}", host, port, e))
            .ok())
        .unwrap_or_default();
    Some(MasterAddress { host: host.to_string(), port })
}
