//! TCP transport for chat connections.
//!
//! One [`Connection`] exists per chat session. The handshake uses it whole;
//! the session then splits it into read and write halves so the receive and
//! send loops can run concurrently on disjoint sides of the duplex stream.

use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader, BufWriter, ReadHalf, WriteHalf};
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tracing::debug;

use crate::error::ChatError;

/// Buffered read half of a split connection, owned by the receive loop.
pub type ConnectionReader = BufReader<ReadHalf<TcpStream>>;

/// Buffered write half of a split connection, owned by the send loop.
pub type ConnectionWriter = BufWriter<WriteHalf<TcpStream>>;

/// A single bidirectional chat connection.
pub struct Connection {
    reader: ConnectionReader,
    writer: ConnectionWriter,
    peer_addr: String,
}

impl Connection {
    /// Wrap an established TCP stream.
    pub fn new(stream: TcpStream) -> Self {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        let (read_half, write_half) = tokio::io::split(stream);

        Self {
            reader: BufReader::new(read_half),
            writer: BufWriter::new(write_half),
            peer_addr,
        }
    }

    /// Connect out to a listening peer.
    pub async fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self, ChatError> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| ChatError::Transport(format!("Failed to connect: {}", e)))?;
        debug!(peer = %stream.peer_addr().map(|a| a.to_string()).unwrap_or_default(), "connected");
        Ok(Self::new(stream))
    }

    /// The peer's address, for display.
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }

    /// One bounded read, used only by the handshake (frames use
    /// `read_exact` through the split reader instead).
    pub async fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.reader.read(buf).await
    }

    /// Write raw bytes, used only by the handshake.
    pub async fn write_all(&mut self, data: &[u8]) -> std::io::Result<()> {
        self.writer.write_all(data).await
    }

    /// Flush buffered writes to the socket.
    pub async fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush().await
    }

    /// Shut the write side down, signalling EOF to the peer.
    pub async fn shutdown(&mut self) -> std::io::Result<()> {
        self.writer.flush().await?;
        self.writer.shutdown().await
    }

    /// Split into independent halves for the duplex session loops.
    ///
    /// The underlying socket closes once, when both halves have been
    /// dropped.
    pub fn into_split(self) -> (ConnectionReader, ConnectionWriter) {
        (self.reader, self.writer)
    }
}

/// TCP listener for accepting chat connections.
pub struct Listener {
    listener: TcpListener,
}

impl Listener {
    /// Bind to an address and start listening.
    pub async fn bind<A: ToSocketAddrs>(addr: A) -> Result<Self, ChatError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ChatError::Transport(format!("Failed to bind: {}", e)))?;
        Ok(Self { listener })
    }

    /// Accept the next incoming connection.
    pub async fn accept(&self) -> Result<Connection, ChatError> {
        let (stream, addr) = self
            .listener
            .accept()
            .await
            .map_err(|e| ChatError::Transport(format!("Failed to accept: {}", e)))?;
        debug!(peer = %addr, "accepted connection");
        Ok(Connection::new(stream))
    }

    /// The locally bound address.
    pub fn local_addr(&self) -> Result<std::net::SocketAddr, ChatError> {
        self.listener
            .local_addr()
            .map_err(|e| ChatError::Transport(format!("Failed to get local addr: {}", e)))
    }
}
