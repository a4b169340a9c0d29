//! Module for decoding the flat key/value replies of a sentinel into typed records.
//!
//! The `SENTINEL MASTERS`, `SENTINEL SLAVES <pod>` and `SENTINEL SENTINELS <pod>` commands
//! return every instance as a flat list of attribute names and values.
//! The attributes change between sentinel versions: attributes get added, and older
//! versions do not report newer attributes.
//!
//! Every record type carries a static table of its fields ([FieldSpec]), which names the
//! attribute to read and how to convert it ([Coercion]). A single routine, [decode], walks
//! that table. Decoding is tolerant: an attribute that is missing or cannot be converted
//! leaves the field at its zero value, and never fails the record.
//!
//! The decoded records are:
//! - [MasterInfo]: an entry of `SENTINEL MASTERS`.
//! - [SlaveInfo]: an entry of `SENTINEL SLAVES <pod>`.
//! - [SentinelInfo]: an entry of `SENTINEL SENTINELS <pod>`.
//! - [MasterAddress]: the reply of `SENTINEL get-master-addr-by-name <pod>`.
//!
mod structs;
mod functions;

pub use structs::*;
pub use functions::*;
