//! Best-effort delivery of one request/response pair over UDP.
//!
//! UDP gives no delivery guarantee, so every request is sent inside a
//! bounded retry loop: attempt *k* waits `2^k` seconds for a reply
//! before re-sending. The layer knows nothing about packet contents.

use crate::{errors::QueryError, socket::DatagramChannel};
use bytes::Bytes;
use std::{io, time::Duration};
use tokio::time::timeout;
use tracing::debug;

/// Number of times a request is re-sent after a response timeout.
pub(crate) const MAX_RESPONSE_RETRIES: u32 = 3;

/// Largest datagram the server may answer with.
const MAX_PACKET_LENGTH: usize = 65536;

/// One request/response exchange with the configured remote endpoint.
///
/// Stateless across calls; the remote host and port are held only for
/// error message text.
#[derive(Debug)]
pub(crate) struct Transport<D> {
    channel: D,
    host: String,
    port: u16,
}

impl<D> Transport<D>
where
    D: DatagramChannel + Send,
{
    pub fn new(channel: D, host: &str, port: u16) -> Self {
        Self {
            channel,
            host: host.to_string(),
            port,
        }
    }

    /// Send `payload` and wait for a reply, with an exponentially
    /// growing timeout per attempt.
    ///
    /// A refused destination fails immediately with
    /// [`QueryError::HostOffline`]; exhausting all
    /// `MAX_RESPONSE_RETRIES + 1` attempts fails with
    /// [`QueryError::ConnectionTimeout`].
    pub async fn send_and_receive(&mut self, payload: &[u8]) -> Result<Bytes, QueryError> {
        for attempt in 0..=MAX_RESPONSE_RETRIES {
            self.channel
                .send(payload)
                .await
                .map_err(|err| self.classify(err))?;

            let window = Duration::from_secs(1 << attempt);
            let mut buf = vec![0u8; MAX_PACKET_LENGTH];

            match timeout(window, self.channel.recv(&mut buf)).await {
                Ok(Ok(received)) => {
                    buf.truncate(received);
                    return Ok(Bytes::from(buf));
                }
                Ok(Err(err)) => return Err(self.classify(err)),
                Err(_) => {
                    debug!(attempt, ?window, "no response within window, retrying");
                }
            }
        }

        Err(QueryError::ConnectionTimeout {
            host: self.host.clone(),
            port: self.port,
        })
    }

    /// A refused connection means the host is not listening at all, so
    /// it is never retried.
    fn classify(&self, err: io::Error) -> QueryError {
        if err.kind() == io::ErrorKind::ConnectionRefused {
            QueryError::HostOffline {
                host: self.host.clone(),
                port: self.port,
            }
        } else {
            QueryError::Io(err)
        }
    }
}
