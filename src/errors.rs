//! All the errors defined by this crate.

use std::io;
use thiserror::Error;

/// An error from the Query protocol exchange.
///
/// Protocol-shape problems (a mismatched packet type or session id, a
/// truncated body) are *not* errors: those surface as an absent result
/// from [`QueryClient::basic_stat`](crate::QueryClient::basic_stat).
/// This enum covers the failures that end a query outright.
#[derive(Error, Debug)]
pub enum QueryError {
    /// The destination actively refused the datagram (ICMP
    /// port-unreachable). Retrying cannot help, so this is raised after
    /// a single attempt.
    #[error("the host at {host}:{port} is currently offline")]
    HostOffline {
        /// Hostname the query was addressed to.
        host: String,
        /// Port the query was addressed to.
        port: u16,
    },

    /// No usable response arrived within the full retry schedule,
    /// including the token-refresh cycle.
    #[error("a timeout occurred while communicating with the host at {host}:{port}")]
    ConnectionTimeout {
        /// Hostname the query was addressed to.
        host: String,
        /// Port the query was addressed to.
        port: u16,
    },

    /// Any other I/O failure from the underlying socket.
    #[error(transparent)]
    Io(#[from] io::Error),
}
