//! Implementation of the UDP [Query](https://wiki.vg/Query) protocol,
//! basic stat variant.
//!
//! A query is a two-phase exchange: a handshake obtains a challenge
//! token from the server, then a stat request echoes that token and is
//! answered with the server's status fields. Both phases correlate
//! request and response through the client's session id; a response
//! carrying the wrong type or session id is discarded as "no data"
//! rather than raised as an error.

mod packet;

use self::packet::{handshake_request, stat_request, QueryPacketType};
use crate::{errors::QueryError, packet::PacketReader, socket::DatagramChannel, transport::Transport};
use bytes::Bytes;
use serde::Serialize;
use std::fmt;
use tokio::{io, net::UdpSocket};
use tracing::{debug, warn};

/// Number of times the whole handshake + stat cycle is re-run when the
/// stat phase times out and the challenge token may have expired.
const MAX_TOKEN_RETRIES: u32 = 1;

/// Session id used unless one is chosen at construction.
const DEFAULT_SESSION_ID: [u8; 4] = [0x00, 0x00, 0x00, 0x01];

/// Response to a basic stat query.
///
/// Serialized field names follow the wire protocol's key names.
#[derive(Debug, Serialize)]
pub struct BasicStatResponse {
    /// The "motd" - message shown in the server list by the client.
    pub motd: String,

    /// The game type. Vanilla servers report `SMP`.
    #[serde(rename = "gametype")]
    pub game_type: String,

    /// Name of the server's default world.
    pub map: String,

    /// The number of players currently online.
    #[serde(rename = "numplayers")]
    pub num_players: u32,

    /// The maximum number of players allowed on the server.
    #[serde(rename = "maxplayers")]
    pub max_players: u32,

    /// Port the server reports listening on.
    #[serde(rename = "hostport")]
    pub host_port: u16,

    /// IP address the server reports listening on.
    #[serde(rename = "hostip")]
    pub host_ip: String,
}

impl fmt::Display for BasicStatResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            serde_json::to_string_pretty(self).map_err(|_| fmt::Error)?
        )
    }
}

/// Struct that stores the connection and protocol session state of a
/// Query exchange with one server.
///
/// Each client owns one UDP socket for its lifetime. Concurrent queries
/// should each use their own client so unrelated exchanges never share
/// a session id.
///
/// # Examples
///
/// ```no_run
/// use mc_udp_query::QueryClient;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let mut client = QueryClient::connect("localhost", 25565).await?;
///
///     if let Some(status) = client.basic_stat().await? {
///         println!("{status}");
///     }
///
///     client.close();
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct QueryClient<D = UdpSocket> {
    transport: Transport<D>,
    session_id: [u8; 4],
    challenge_token: Option<[u8; 4]>,
}

impl QueryClient {
    /// Construct a [`QueryClient`] addressing the given host and port,
    /// with the default session id.
    ///
    /// # Errors
    /// Returns `Err` if the underlying socket could not be bound or
    /// addressed to the remote endpoint.
    pub async fn connect(host: &str, port: u16) -> io::Result<Self> {
        Self::with_session_id(host, port, DEFAULT_SESSION_ID).await
    }

    /// Like [`connect`](Self::connect), but with a caller-chosen
    /// session id. The session id is fixed for the client's lifetime
    /// and echoed by the server in every response.
    ///
    /// # Errors
    /// Returns `Err` if the underlying socket could not be bound or
    /// addressed to the remote endpoint.
    pub async fn with_session_id(host: &str, port: u16, session_id: [u8; 4]) -> io::Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        socket.connect(format!("{host}:{port}")).await?;

        Ok(Self {
            transport: Transport::new(socket, host, port),
            session_id,
            challenge_token: None,
        })
    }
}

impl<D> QueryClient<D>
where
    D: DatagramChannel + Send,
{
    /// Perform a basic stat query.
    ///
    /// Returns `Ok(None)` when the server answered but the response did
    /// not decode to a usable result (wrong packet type or session id
    /// in either phase). The caller may simply retry the query.
    ///
    /// If the stat phase times out, the challenge token is assumed to
    /// have expired server-side and the whole handshake + stat cycle is
    /// re-run once before [`QueryError::ConnectionTimeout`] is surfaced.
    ///
    /// # Errors
    /// Returns [`QueryError::HostOffline`] if the destination refused
    /// the datagram, [`QueryError::ConnectionTimeout`] after the retry
    /// schedule is exhausted, or [`QueryError::Io`] for any other
    /// socket failure.
    pub async fn basic_stat(&mut self) -> Result<Option<BasicStatResponse>, QueryError> {
        let mut retries = 0;

        loop {
            let Some(token) = self.perform_handshake().await? else {
                debug!("handshake rejected, no challenge token obtained");
                return Ok(None);
            };

            let request = stat_request(self.session_id, token);

            match self.transport.send_and_receive(&request).await {
                Ok(reply) => return Ok(process_basic_stat_response(reply, self.session_id)),
                Err(err @ QueryError::ConnectionTimeout { .. }) => {
                    retries += 1;
                    if retries > MAX_TOKEN_RETRIES {
                        return Err(err);
                    }

                    warn!("stat response timed out, redoing handshake for a fresh token");
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Consume the client and release its socket.
    pub fn close(self) {
        drop(self);
    }

    /// Run the handshake phase and store the packed challenge token.
    async fn perform_handshake(&mut self) -> Result<Option<[u8; 4]>, QueryError> {
        let request = handshake_request(self.session_id);
        let reply = self.transport.send_and_receive(&request).await?;

        self.challenge_token = process_handshake_response(reply, self.session_id);

        Ok(self.challenge_token)
    }
}

/// Extract and pack the challenge token from a handshake reply.
///
/// Returns `None` unless the reply carries the handshake packet type
/// and echoes `session_id`.
fn process_handshake_response(reply: Bytes, session_id: [u8; 4]) -> Option<[u8; 4]> {
    let mut reader = PacketReader::new(reply);

    let packet_type = QueryPacketType::from_byte(*reader.read(1).first()?)?;
    if packet_type != QueryPacketType::Handshake {
        return None;
    }

    if reader.read(4) != session_id.as_slice() {
        return None;
    }

    pack_token(&reader.read_string_bytes())
}

/// Decode the stat reply body into a [`BasicStatResponse`].
///
/// Returns `None` unless the reply carries the stat packet type and
/// echoes `session_id`.
fn process_basic_stat_response(reply: Bytes, session_id: [u8; 4]) -> Option<BasicStatResponse> {
    let mut reader = PacketReader::new(reply);

    let packet_type = QueryPacketType::from_byte(*reader.read(1).first()?)?;
    if packet_type != QueryPacketType::Stat {
        return None;
    }

    if reader.read(4) != session_id.as_slice() {
        return None;
    }

    Some(BasicStatResponse {
        motd: reader.read_string(),
        game_type: reader.read_string(),
        map: reader.read_string(),
        num_players: reader.read_int(),
        max_players: reader.read_int(),
        host_port: reader.read_short(),
        host_ip: reader.read_string(),
    })
}

/// Pack the server's ASCII decimal challenge token into its 4-byte
/// big-endian form, left-padded with zero bytes.
///
/// Tokens that are not a decimal numeral, or do not fit in 4 bytes,
/// yield `None` and the handshake counts as failed.
fn pack_token(token: &[u8]) -> Option<[u8; 4]> {
    let text = std::str::from_utf8(token).ok()?;
    let value: u32 = text.parse().ok()?;

    Some(value.to_be_bytes())
}

/// Perform a one-shot basic stat query against the given host and port.
///
/// Connects a fresh [`QueryClient`], runs
/// [`basic_stat`](QueryClient::basic_stat), and closes the client.
///
/// # Arguments
/// * `host` - A string slice that holds the hostname of the server to query.
/// * `port` - The query port of that server.
///
/// # Errors
/// Returns `Err` on any condition that [`QueryClient::basic_stat`] does.
pub async fn stat_basic(host: &str, port: u16) -> Result<Option<BasicStatResponse>, QueryError> {
    let mut client = QueryClient::connect(host, port).await?;
    let response = client.basic_stat().await;
    client.close();

    response
}
