//! keyrelayd binary
//!
//! Wires the hub, the WebSocket listener and the stdin trigger source
//! together. Pipe trigger names (one per line) into stdin from whatever
//! grabs the actual keys:
//!
//! ```bash
//! key-hook | keyrelayd --addr localhost:1337
//! ```

use std::net::SocketAddr;

use clap::Parser;
use keyrelay::hub::Hub;
use keyrelay::server::{RelayServer, ServerConfig};
use keyrelay::trigger::{TriggerMap, TriggerSource, NEXT_TRACK, PLAY_PAUSE, PREV_TRACK};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Media-key trigger relay broadcasting to WebSocket clients
#[derive(Parser, Debug)]
#[command(name = "keyrelayd")]
#[command(about = "Relays media-key triggers to connected WebSocket clients")]
#[command(version)]
struct Args {
    /// Address to listen on (host:port, bare IP, or 'localhost')
    #[arg(long, default_value = "localhost:1337")]
    addr: String,

    /// Trigger name for "next track"
    #[arg(long, default_value = "XF86AudioNext")]
    next_key: String,

    /// Trigger name for "previous track"
    #[arg(long, default_value = "XF86AudioPrev")]
    prev_key: String,

    /// Trigger name for "play"
    #[arg(long, default_value = "XF86AudioPlay")]
    play_key: String,

    /// Trigger name for "pause"
    #[arg(long, default_value = "XF86AudioPause")]
    pause_key: String,

    /// Maximum concurrent connections (0 = unlimited)
    #[arg(long, default_value = "0")]
    max_connections: usize,

    /// Log level (trace, debug, info, warn, error); RUST_LOG overrides
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn parse_bind_addr(arg: &str) -> Result<SocketAddr, String> {
    const DEFAULT_PORT: u16 = 1337;

    // Replace "localhost" with "127.0.0.1"
    let normalized = arg.replace("localhost", "127.0.0.1");

    // Try parsing as SocketAddr first (includes port)
    if let Ok(addr) = normalized.parse::<SocketAddr>() {
        return Ok(addr);
    }

    // Try parsing as IP address without port
    if let Ok(ip) = normalized.parse::<std::net::IpAddr>() {
        return Ok(SocketAddr::new(ip, DEFAULT_PORT));
    }

    Err(format!(
        "Invalid bind address: '{}'. Expected format: IP:PORT or IP or 'localhost'",
        arg
    ))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let bind_addr = parse_bind_addr(&args.addr)?;

    let map = TriggerMap::new()
        .bind(args.next_key, NEXT_TRACK)
        .bind(args.prev_key, PREV_TRACK)
        .bind(args.play_key, PLAY_PAUSE)
        .bind(args.pause_key, PLAY_PAUSE);

    let (hub, handle) = Hub::new();
    tokio::spawn(hub.run());
    tokio::spawn(TriggerSource::new(map, handle.clone()).run());

    let config = ServerConfig::with_addr(bind_addr).max_connections(args.max_connections);
    let server = RelayServer::new(config, handle);

    tracing::info!(addr = %server.bind_addr(), "Program initialized. Start pressing keys!");

    server
        .run_until(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bind_addr_full() {
        let addr = parse_bind_addr("127.0.0.1:1338").unwrap();
        assert_eq!(addr.port(), 1338);
    }

    #[test]
    fn test_parse_bind_addr_localhost() {
        let addr = parse_bind_addr("localhost:1337").unwrap();
        assert!(addr.ip().is_loopback());
        assert_eq!(addr.port(), 1337);
    }

    #[test]
    fn test_parse_bind_addr_bare_ip_gets_default_port() {
        let addr = parse_bind_addr("0.0.0.0").unwrap();
        assert_eq!(addr.port(), 1337);
    }

    #[test]
    fn test_parse_bind_addr_rejects_garbage() {
        assert!(parse_bind_addr("not-an-addr").is_err());
    }
}
