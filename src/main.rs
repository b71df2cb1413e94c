//! termchat — peer-to-peer encrypted terminal chat.
//!
//! This binary is the presentation and bootstrap layer: argument parsing,
//! console output, stdin reading and Ctrl-C handling. The protocol itself
//! (handshake, key derivation, framing, session loops) lives in the library.

use std::net::IpAddr;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use termchat::config::{ChatConfig, Mode, DEFAULT_PORT};
use termchat::protocol::handshake;
use termchat::session::{ChatSession, SessionEvent};
use termchat::transport::{Connection, Listener};
use termchat::ChatError;

/// Peer-to-peer encrypted terminal chat.
///
/// One side runs as server (listener), the other as client (initiator).
/// Both must be started with the same password; it authenticates the
/// connection and keys the encryption.
#[derive(Parser)]
#[command(name = "termchat")]
#[command(version)]
#[command(about = "Peer-to-peer encrypted terminal chat over TCP")]
struct Cli {
    /// Mode: server (wait for a peer) or client (connect to one)
    #[arg(short, long, default_value = "server")]
    mode: String,

    /// Peer IP address (client mode only)
    #[arg(short, long)]
    ip: Option<IpAddr>,

    /// TCP port (1024-65535)
    #[arg(short, long, default_value_t = DEFAULT_PORT, value_parser = clap::value_parser!(u16).range(1024..))]
    port: u16,

    /// Shared password (must match on both peers)
    #[arg(short = 'P', long)]
    password: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mode: Mode = cli.mode.parse().map_err(|e: String| anyhow::anyhow!(e))?;

    let config = ChatConfig {
        mode,
        ip: cli.ip,
        port: cli.port,
        password: cli.password,
    };
    config
        .validate()
        .map_err(|e| anyhow::anyhow!(e))
        .context("invalid configuration")?;

    match config.mode {
        Mode::Server => run_server(&config).await,
        Mode::Client => run_client(&config).await,
    }
}

/// Bind, accept, and gate connections until one passes the handshake.
async fn run_server(config: &ChatConfig) -> Result<()> {
    let listener = Listener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("failed to listen on port {}", config.port))?;

    let display_ip = local_ip_address::local_ip()
        .map(|ip| ip.to_string())
        .unwrap_or_else(|_| "127.0.0.1".to_string());
    println!("Listening on {}:{}", display_ip, config.port);

    loop {
        let mut conn = listener.accept().await?;
        info!(peer = %conn.peer_addr(), "incoming connection");

        match handshake::authenticate_listener(&mut conn, &config.password).await {
            Ok(()) => {
                println!("Peer connected from {}", conn.peer_addr());
                run_session(conn, &config.password).await;
                return Ok(());
            }
            Err(ChatError::HandshakeRejected) => {
                println!("Invalid connection attempt rejected");
                continue;
            }
            Err(e) => return Err(e).context("handshake failed"),
        }
    }
}

/// Connect out, authenticate, and chat.
async fn run_client(config: &ChatConfig) -> Result<()> {
    let ip = config.ip.expect("validated: client mode has an IP");
    let addr = (ip, config.port);

    let mut conn = Connection::connect(addr)
        .await
        .with_context(|| format!("failed to connect to {}:{}", ip, config.port))?;

    match handshake::authenticate_initiator(&mut conn, &config.password).await {
        Ok(()) => {
            println!("Successfully connected to {}:{}", ip, config.port);
        }
        Err(ChatError::HandshakeRejected) => {
            bail!("connection rejected by peer (password mismatch?)");
        }
        Err(e) => return Err(e).context("handshake failed"),
    }

    run_session(conn, &config.password).await;
    Ok(())
}

/// Wire the session core to stdin and stdout, then run it to completion.
async fn run_session(conn: Connection, password: &str) {
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let (line_tx, line_rx) = mpsc::unbounded_channel();

    let session = ChatSession::new(conn, password, event_tx, line_rx);

    // Stdin feeds the send loop; empty lines are dropped here, and closing
    // stdin (or this task ending) ends the session's send side.
    let stdin_task = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let line = line.trim().to_string();
            if line.is_empty() {
                continue;
            }
            if line_tx.send(line).is_err() {
                break;
            }
        }
    });

    // All presentation happens here, off the structured event stream.
    let printer = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match event {
                SessionEvent::Started { peer } => {
                    println!("Secure session established with {}", peer);
                    println!("Type a message and press Enter. Ctrl-C to quit.");
                }
                SessionEvent::MessageReceived(text) => {
                    println!("[Peer]: {}", text);
                }
                SessionEvent::Closed { reason } => {
                    debug!(%reason, "session closed");
                    println!("Connection interrupted");
                    break;
                }
            }
        }
    });

    tokio::select! {
        reason = session.run() => {
            debug!(%reason, "session finished");
            // Let the printer drain the Closed event before exiting.
            let _ = printer.await;
        }
        _ = tokio::signal::ctrl_c() => {
            println!();
            println!("Exiting");
            printer.abort();
        }
    }

    stdin_task.abort();
}
