//! The structs
//!
/// How the value of an attribute is converted, and where it is stored.
///
/// The function pointer stores the converted value into the field.
pub enum Coercion<T> {
    /// A base-10 signed integer.
    Integer(fn(&mut T, i64)),
    /// The value verbatim.
    Text(fn(&mut T, String)),
    /// An integer, true when greater than zero.
    Boolean(fn(&mut T, bool)),
}
/// The metadata of one field of a decoded record.
pub struct FieldSpec<T> {
    /// The name of the field in the record.
    pub name: &'static str,
    /// The attribute name in the sentinel reply.
    pub key: &'static str,
    pub coercion: Coercion<T>,
}
/// A record that can be decoded from a flat key/value reply.
pub trait ReplyRecord: Default + Sized + 'static {
    const FIELDS: &'static [FieldSpec<Self>];
}

macro_rules! field {
    ($field:ident, $key:literal, Integer) => {
        FieldSpec { name: stringify!($field), key: $key, coercion: Coercion::Integer(|record: &mut Self, value: i64| record.$field = value) }
    };
    ($field:ident, $key:literal, Text) => {
        FieldSpec { name: stringify!($field), key: $key, coercion: Coercion::Text(|record: &mut Self, value: String| record.$field = value) }
    };
    ($field:ident, $key:literal, Boolean) => {
        FieldSpec { name: stringify!($field), key: $key, coercion: Coercion::Boolean(|record: &mut Self, value: bool| record.$field = value) }
    };
}

/// The information a sentinel has about a master (pod).
///
/// ```text
/// 1) "name"
/// 2) "pod1"
/// 3) "ip"
/// 4) "10.0.0.1"
/// 5) "port"
/// 6) "6379"
/// ...
/// ```
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct MasterInfo {
    pub name: String,
    pub ip: String,
    pub port: i64,
    pub runid: String,
    pub flags: String,
    pub quorum: i64,
    pub num_slaves: i64,
    pub num_other_sentinels: i64,
    pub parallel_syncs: i64,
    pub down_after_milliseconds: i64,
    pub is_master_down: bool,
    pub last_ok_ping_reply: i64,
    pub last_ping_reply: i64,
    pub last_ping_sent: i64,
    pub role_reported: String,
    pub role_reported_time: i64,
    pub info_refresh: i64,
    pub failover_timeout: i64,
    pub config_epoch: i64,
}

impl ReplyRecord for MasterInfo {
    const FIELDS: &'static [FieldSpec<Self>] = &[
        field!(name, "name", Text),
        field!(ip, "ip", Text),
        field!(port, "port", Integer),
        field!(runid, "runid", Text),
        field!(flags, "flags", Text),
        field!(quorum, "quorum", Integer),
        field!(num_slaves, "num-slaves", Integer),
        field!(num_other_sentinels, "num-other-sentinels", Integer),
        field!(parallel_syncs, "parallel-syncs", Integer),
        field!(down_after_milliseconds, "down-after-milliseconds", Integer),
        field!(is_master_down, "is-master-down", Boolean),
        field!(last_ok_ping_reply, "last-ok-ping-reply", Integer),
        field!(last_ping_reply, "last-ping-reply", Integer),
        field!(last_ping_sent, "last-ping-sent", Integer),
        field!(role_reported, "role-reported", Text),
        field!(role_reported_time, "role-reported-time", Integer),
        field!(info_refresh, "info-refresh", Integer),
        field!(failover_timeout, "failover-timeout", Integer),
        field!(config_epoch, "config-epoch", Integer),
    ];
}

/// The information a sentinel has about a replica of a pod.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct SlaveInfo {
    pub name: String,
    pub host: String,
    pub port: i64,
    pub runid: String,
    pub flags: String,
    pub pending_commands: i64,
    pub is_master_down: bool,
    pub last_ok_ping_reply: i64,
    pub last_ping_reply: i64,
    pub last_ping_sent: i64,
    pub info_refresh: i64,
    pub role_reported: String,
    pub role_reported_time: i64,
    pub master_link_down_time: i64,
    pub master_link_status: String,
    pub master_host: String,
    pub master_port: i64,
    pub slave_priority: i64,
    pub slave_repl_offset: i64,
}

impl ReplyRecord for SlaveInfo {
    const FIELDS: &'static [FieldSpec<Self>] = &[
        field!(name, "name", Text),
        field!(host, "ip", Text),
        field!(port, "port", Integer),
        field!(runid, "runid", Text),
        field!(flags, "flags", Text),
        field!(pending_commands, "pending-commands", Integer),
        field!(is_master_down, "is-master-down", Boolean),
        field!(last_ok_ping_reply, "last-ok-ping-reply", Integer),
        field!(last_ping_reply, "last-ping-reply", Integer),
        field!(last_ping_sent, "last-ping-sent", Integer),
        field!(info_refresh, "info-refresh", Integer),
        field!(role_reported, "role-reported", Text),
        field!(role_reported_time, "role-reported-time", Integer),
        field!(master_link_down_time, "master-link-down-time", Integer),
        field!(master_link_status, "master-link-status", Text),
        field!(master_host, "master-host", Text),
        field!(master_port, "master-port", Integer),
        field!(slave_priority, "slave-priority", Integer),
        field!(slave_repl_offset, "slave-repl-offset", Integer),
    ];
}

/// The information a sentinel has about the other sentinels monitoring a pod.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct SentinelInfo {
    pub name: String,
    pub ip: String,
    pub port: i64,
    pub runid: String,
    pub flags: String,
    pub pending_commands: i64,
    pub last_ping_reply: i64,
    pub last_ping_sent: i64,
    pub last_ok_ping_reply: i64,
    pub down_after_milliseconds: i64,
    pub last_hello_message: i64,
    pub voted_leader: String,
    pub voted_leader_epoch: i64,
}

impl ReplyRecord for SentinelInfo {
    const FIELDS: &'static [FieldSpec<Self>] = &[
        field!(name, "name", Text),
        field!(ip, "ip", Text),
        field!(port, "port", Integer),
        field!(runid, "runid", Text),
        field!(flags, "flags", Text),
        field!(pending_commands, "pending-commands", Integer),
        field!(last_ping_reply, "last-ping-reply", Integer),
        field!(last_ping_sent, "last-ping-sent", Integer),
        field!(last_ok_ping_reply, "last-ok-ping-reply", Integer),
        field!(down_after_milliseconds, "down-after-milliseconds", Integer),
        field!(last_hello_message, "last-hello-message", Integer),
        field!(voted_leader, "voted-leader", Text),
        field!(voted_leader_epoch, "voted-leader-epoch", Integer),
    ];
}

/// The connection information of the current master of a pod, as returned by
/// `SENTINEL get-master-addr-by-name <pod>`.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct MasterAddress {
    pub host: String,
    pub port: i64,
}
