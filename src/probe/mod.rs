//! Module for checking if sentinels and nodes can be reached.
//!
//! A probe opens a session with a bounded timeout, authenticates if a secret is given, and
//! sends `PING`. Any failure makes the endpoint unreachable.
//!
//! Endpoints that failed a probe are remembered in [InvalidEndpoints]: a sentinel that is
//! declared by many pods costs a single timeout, the next probes return
//! "known invalid endpoint" without network traffic. Nothing is ever removed from it
//! during an audit. A probe that fails is not retried.
//!
mod structs;
mod functions;

pub use structs::*;
pub use functions::*;
