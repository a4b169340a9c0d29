//! Module for reading the sentinel configuration file.
//!
//! The configuration file is line oriented. Blank lines and lines containing `#` are
//! ignored, every other line is a directive followed by its arguments.
//!
//! Top-level directives:
//! - `port <port>`, `bind <host>`: the local sentinel identity.
//! - `dir <path>`.
//! - `sentinel <subdirective> ...`:
//!   - `monitor <pod> <ip> <port> <quorum>`
//!   - `auth-pass <pod> <secret>`
//!   - `known-sentinel <pod> <ip> <port>`
//!   - `known-slave <pod> <ip> <port>`
//!   - `config-epoch`, `leader-epoch`, `current-epoch`, `down-after-milliseconds` and
//!     `maxclients` are accepted and not used.
//!
//! Everything else is logged and skipped, as are lines that miss arguments.
//! Only a file that cannot be read stops the audit.
//!
mod functions;

pub use functions::*;
