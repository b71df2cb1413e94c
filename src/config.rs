//! Chat configuration.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// Lowest port accepted for either side of a chat.
pub const MIN_PORT: u16 = 1024;

/// Default port when none is given.
pub const DEFAULT_PORT: u16 = 8888;

/// Which side of the connection this process plays.
///
/// The role is fixed at configuration time; the handshake and session code
/// never re-branch on it per operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Bind a port and wait for the peer to connect.
    Server,
    /// Connect out to a listening peer.
    Client,
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "server" => Ok(Mode::Server),
            "client" => Ok(Mode::Client),
            other => Err(format!(
                "invalid mode '{}': use 'server' or 'client'",
                other
            )),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Server => write!(f, "server"),
            Mode::Client => write!(f, "client"),
        }
    }
}

/// Configuration for one chat endpoint.
///
/// The CLI layer validates these before the protocol code runs; `validate`
/// re-checks the invariants cheaply so library callers get the same errors.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Listener or initiator.
    pub mode: Mode,
    /// Peer address (required in client mode).
    pub ip: Option<IpAddr>,
    /// TCP port to bind (server) or connect to (client).
    pub port: u16,
    /// Shared password, supplied out-of-band to both peers.
    pub password: String,
}

impl ChatConfig {
    /// Check mode/address/port invariants.
    pub fn validate(&self) -> Result<(), String> {
        if self.port < MIN_PORT {
            return Err(format!(
                "port must be between {} and 65535, got {}",
                MIN_PORT, self.port
            ));
        }
        if self.mode == Mode::Client && self.ip.is_none() {
            return Err("client mode requires a peer IP address".to_string());
        }
        Ok(())
    }
}
