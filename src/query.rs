use std::fmt;
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use log::{debug, trace};
use parking_lot::Mutex;
use thiserror::Error;
use tokio::net::{lookup_host, UdpSocket};
use tokio::time::timeout;

use crate::error::SourceQueryError;
use crate::info::ServerInfo;
use crate::packet::{ChallengeToken, PacketType, RequestPacket, ResponsePacket, MAX_PACKET_SIZE};
use crate::players::Players;

/// Default query port of Source dedicated servers.
pub const DEFAULT_PORT: u16 = 27015;

/// How long to wait for any single reply unless told otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Where to send queries, and how long to wait for each reply.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    pub timeout: Duration,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Endpoint {
            host: host.into(),
            port,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EndpointParseError {
    #[error("no host given")]
    MissingHost,
    #[error("invalid port: {0}")]
    InvalidPort(#[from] std::num::ParseIntError),
    #[error("bracketed host must look like [v6addr] or [v6addr]:port")]
    InvalidBracket,
}

/// Accepts `host`, `host:port`, `v6addr`, and `[v6addr]:port`.
/// The port defaults to [DEFAULT_PORT].
impl FromStr for Endpoint {
    type Err = EndpointParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        let (host, port) = if let Some(rest) = s.strip_prefix('[') {
            let (host, after) = rest
                .split_once(']')
                .ok_or(EndpointParseError::InvalidBracket)?;
            if after.is_empty() {
                (host, None)
            } else {
                let port = after
                    .strip_prefix(':')
                    .ok_or(EndpointParseError::InvalidBracket)?;
                (host, Some(port))
            }
        } else if s.matches(':').count() == 1 {
            let (host, port) = s.split_once(':').unwrap_or((s, ""));
            (host, Some(port))
        } else {
            (s, None)
        };

        if host.is_empty() {
            return Err(EndpointParseError::MissingHost);
        }
        let port = match port {
            Some(port) => port.parse()?,
            None => DEFAULT_PORT,
        };

        Ok(Endpoint::new(host, port))
    }
}

/// Client for the A2S query protocol of one server.
///
/// Construction does no I/O. Every request opens its own socket, which is
/// closed when the request finishes, fails, or its future is dropped.
///
/// The challenge token used by [QueryClient::players] is cached between
/// calls. Concurrent first calls may each fetch a token; the last one to
/// arrive is kept, and both are valid for their own request.
#[derive(Debug)]
pub struct QueryClient {
    endpoint: Endpoint,
    challenge: Mutex<Option<ChallengeToken>>,
}

impl QueryClient {
    pub fn new(endpoint: Endpoint) -> Self {
        QueryClient {
            endpoint,
            challenge: Mutex::new(None),
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// The challenge token from the last [QueryClient::get_challenge], if any.
    pub fn cached_challenge(&self) -> Option<ChallengeToken> {
        self.challenge.lock().clone()
    }

    /// Forget the cached challenge so the next [QueryClient::players] fetches a new one.
    pub fn clear_challenge(&self) {
        self.challenge.lock().take();
    }

    fn unable_to_connect(&self, source: io::Error) -> SourceQueryError {
        SourceQueryError::UnableToConnect {
            endpoint: self.endpoint.to_string(),
            source,
        }
    }

    async fn open(&self) -> Result<UdpSocket, SourceQueryError> {
        let addr: SocketAddr = lookup_host((self.endpoint.host.as_str(), self.endpoint.port))
            .await
            .map_err(|e| self.unable_to_connect(e))?
            .next()
            .ok_or_else(|| {
                self.unable_to_connect(io::Error::new(
                    io::ErrorKind::NotFound,
                    "host resolved to no addresses",
                ))
            })?;

        // just arbitrarily bind any port, doesn't matter really
        let local: SocketAddr = match addr {
            SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        };
        let sock: UdpSocket = UdpSocket::bind(local)
            .await
            .map_err(|e| self.unable_to_connect(e))?;

        sock.connect(addr)
            .await
            .map_err(|e| self.unable_to_connect(e))?;

        Ok(sock)
    }

    /// Send one datagram and wait for exactly one reply.
    ///
    /// The endpoint timeout is applied twice, so a single call can take up
    /// to twice that long:
    /// - On resolving and connecting, failing with [SourceQueryError::UnableToConnect]
    /// - On receiving the reply, failing with [SourceQueryError::DidNotReceive]
    pub async fn send_receive(&self, payload: &[u8]) -> Result<Vec<u8>, SourceQueryError> {
        let timeout_dur: Duration = self.endpoint.timeout;

        let sock: UdpSocket = timeout(timeout_dur, self.open())
            .await
            .map_err(|_| {
                self.unable_to_connect(io::Error::new(
                    io::ErrorKind::TimedOut,
                    "timed out resolving or connecting",
                ))
            })??;

        trace!("sending {payload:02x?} to {}", self.endpoint);
        sock.send(payload)
            .await
            .map_err(|e| self.unable_to_connect(e))?;

        let mut resp_buf: [u8; MAX_PACKET_SIZE] = [0u8; MAX_PACKET_SIZE];
        let len = timeout(timeout_dur, sock.recv(&mut resp_buf))
            .await
            .map_err(|_| SourceQueryError::DidNotReceive {
                endpoint: self.endpoint.to_string(),
                timeout: timeout_dur,
            })?
            .map_err(|e| self.unable_to_connect(e))?;

        debug!(
            "received {len} bytes from {} for a {} byte request",
            self.endpoint,
            payload.len()
        );
        Ok(resp_buf[..len].to_vec())
    }

    async fn request(&self, packet: RequestPacket) -> Result<ResponsePacket, SourceQueryError> {
        let reply = self.send_receive(&packet.pack()).await?;
        ResponsePacket::unpack(&reply)
    }

    /// Query the server with A2S_INFO.
    ///
    /// If the server answers with S2C_CHALLENGE, the request is repeated
    /// once with the token appended before the reply is decoded.
    pub async fn get_info(&self) -> Result<ServerInfo, SourceQueryError> {
        let packet = self.request(RequestPacket::Info { challenge: None }).await?;

        // absolving challenge
        let packet = if packet.packet_type() == Some(PacketType::Challenge) {
            debug!("{} challenged the info request", self.endpoint);
            let challenge = ChallengeToken::new(packet.into_body());
            self.request(RequestPacket::Info {
                challenge: Some(challenge),
            })
            .await?
        } else {
            packet
        };

        ServerInfo::parse(&packet)
    }

    /// Ask the server for a fresh challenge token and cache it.
    pub async fn get_challenge(&self) -> Result<ChallengeToken, SourceQueryError> {
        let packet = self.request(RequestPacket::Challenge).await?;
        let challenge = ChallengeToken::new(packet.into_body());

        debug!(
            "caching {} byte challenge for {}",
            challenge.as_bytes().len(),
            self.endpoint
        );
        *self.challenge.lock() = Some(challenge.clone());
        Ok(challenge)
    }

    /// Query the server with A2S_PLAYER.
    ///
    /// Fetches a challenge first if none is cached. Each call is a new round
    /// trip; the returned iterator decodes the already received reply.
    pub async fn players(&self) -> Result<Players, SourceQueryError> {
        let challenge = match self.cached_challenge() {
            Some(challenge) => challenge,
            None => self.get_challenge().await?,
        };

        let packet = self.request(RequestPacket::Players { challenge }).await?;
        Players::parse(packet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_from_host_and_port() {
        let endpoint: Endpoint = "nyc-1.us.uncletopia.com:27016".parse().unwrap();
        assert_eq!(endpoint.host, "nyc-1.us.uncletopia.com");
        assert_eq!(endpoint.port, 27016);
        assert_eq!(endpoint.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn endpoint_port_defaults() {
        let endpoint: Endpoint = "127.0.0.1".parse().unwrap();
        assert_eq!(endpoint, Endpoint::new("127.0.0.1", DEFAULT_PORT));
    }

    #[test]
    fn endpoint_ipv6() {
        let endpoint: Endpoint = "[::1]:27020".parse().unwrap();
        assert_eq!(endpoint.host, "::1");
        assert_eq!(endpoint.port, 27020);
        assert_eq!(endpoint.to_string(), "[::1]:27020");

        let bare: Endpoint = "::1".parse().unwrap();
        assert_eq!(bare.host, "::1");
        assert_eq!(bare.port, DEFAULT_PORT);
    }

    #[test]
    fn endpoint_rejects_garbage() {
        assert_eq!(
            "".parse::<Endpoint>(),
            Err(EndpointParseError::MissingHost)
        );
        assert!(matches!(
            "host:port".parse::<Endpoint>(),
            Err(EndpointParseError::InvalidPort(_))
        ));
        assert!(matches!(
            "host:70000".parse::<Endpoint>(),
            Err(EndpointParseError::InvalidPort(_))
        ));
    }

    #[test]
    fn endpoint_rejects_bad_brackets() {
        assert_eq!(
            "[::1]x".parse::<Endpoint>(),
            Err(EndpointParseError::InvalidBracket)
        );
        assert_eq!(
            "[::1".parse::<Endpoint>(),
            Err(EndpointParseError::InvalidBracket)
        );
        assert_eq!(
            "[]:27015".parse::<Endpoint>(),
            Err(EndpointParseError::MissingHost)
        );
        assert!(matches!(
            "[::1]:".parse::<Endpoint>(),
            Err(EndpointParseError::InvalidPort(_))
        ));
    }

    #[test]
    fn construction_caches_nothing() {
        let client = QueryClient::new(
            Endpoint::new("localhost", 27015).with_timeout(Duration::from_millis(250)),
        );
        assert_eq!(client.endpoint().timeout, Duration::from_millis(250));
        assert!(client.cached_challenge().is_none());
    }
}
