//! The structs
//!
use std::{io::BufReader, net::TcpStream};

/// A single decoded RESP reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// `+OK`
    Status(String),
    /// `-ERR message`
    Error(String),
    /// `:1`
    Integer(i64),
    /// `$3\r\nfoo`, `None` for the null bulk string (`$-1`).
    Bulk(Option<String>),
    /// `*2\r\n...`, `None` for the null multi-bulk (`*-1`).
    Multi(Option<Vec<Reply>>),
}

/// Connects over TCP.
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpConnector;

/// An open connection to a sentinel or node.
#[derive(Debug)]
pub struct RespConnection {
    pub(crate) endpoint: String,
    pub(crate) reader: BufReader<TcpStream>,
    pub(crate) writer: TcpStream,
}
