//! Module for talking to sentinels and nodes over the RESP protocol.
//!
//! This is a minimal blocking client: it connects with a bounded timeout, sends a command
//! as a multi-bulk request and reads back a single [Reply].
//! A [Reply] offers typed accessors for the reply shapes the audit consumes:
//! - boolean ([Reply::bool_value]),
//! - ordered list of strings ([Reply::list_value]),
//! - flat string-to-string mapping ([Reply::hash_value]),
//! - list of such mappings ([Reply::hash_list_value]).
//!
//! Connections are made through the [Connector] trait, so the audit can be run against
//! something else than the network.
//!
mod structs;
mod functions;

pub use structs::*;
pub use functions::*;
