//! Simple tracking relay example with an in-memory location store
//!
//! Run with: cargo run --example simple_server [BIND_ADDR]
//!
//! Examples:
//!   cargo run --example simple_server                    # binds to 0.0.0.0:7878
//!   cargo run --example simple_server localhost          # binds to 127.0.0.1:7878
//!   cargo run --example simple_server 127.0.0.1:9000     # binds to 127.0.0.1:9000
//!
//! The status endpoint listens one port above the relay port.
//!
//! ## Talking to it
//!
//! Subscribe and report with netcat:
//!   nc localhost 7878
//!   {"event":"start_tracking","data":{"vehicleId":"V1"}}
//!   {"event":"location_update","data":{"vehicleId":"V1","latitude":-6.2088,"longitude":106.8456}}
//!   {"event":"stop_tracking","data":{"vehicleId":"V1"}}
//!   {"event":"get_stats"}
//!
//! Read the stateless snapshot:
//!   nc localhost 7879

use std::net::SocketAddr;
use std::sync::Arc;

use fleet_relay::persistence::MemoryLocationStore;
use fleet_relay::{RelayServer, ServerConfig};

/// Parse bind address from command line argument.
///
/// Accepts formats:
/// - "localhost" -> 127.0.0.1:7878
/// - "127.0.0.1" -> 127.0.0.1:7878
/// - "127.0.0.1:9000" -> 127.0.0.1:9000
fn parse_bind_addr(arg: &str) -> Result<SocketAddr, String> {
    const DEFAULT_PORT: u16 = 7878;

    let normalized = arg.replace("localhost", "127.0.0.1");

    if let Ok(addr) = normalized.parse::<SocketAddr>() {
        return Ok(addr);
    }

    if let Ok(ip) = normalized.parse::<std::net::IpAddr>() {
        return Ok(SocketAddr::new(ip, DEFAULT_PORT));
    }

    Err(format!(
        "Invalid bind address: '{}'. Expected format: IP:PORT or IP or 'localhost'",
        arg
    ))
}

fn print_usage() {
    eprintln!("Usage: simple_server [BIND_ADDR]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  BIND_ADDR    Address to bind to (default: 0.0.0.0:7878)");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    let bind_addr = match args.get(1) {
        Some(addr_str) => match parse_bind_addr(addr_str) {
            Ok(addr) => addr,
            Err(e) => {
                eprintln!("Error: {}", e);
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
        },
        None => "0.0.0.0:7878".parse().unwrap(),
    };

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fleet_relay=debug".parse()?)
                .add_directive("simple_server=debug".parse()?),
        )
        .init();

    // Seed a few vehicles into the demo store
    let store = Arc::new(MemoryLocationStore::new());
    for vehicle in ["V1", "V2", "V3"] {
        store.register_vehicle(vehicle).await;
    }

    let status_addr = SocketAddr::new(bind_addr.ip(), bind_addr.port() + 1);
    let config = ServerConfig::with_addr(bind_addr).status(status_addr);

    println!("Starting tracking relay on {}", config.bind_addr);
    println!("Status endpoint on {}", status_addr);
    println!();
    println!("Known vehicles: V1, V2, V3");
    println!("Try: nc {} {}", bind_addr.ip(), bind_addr.port());
    println!();

    let server = RelayServer::new(config, store);

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                eprintln!("Server error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            println!("\nShutting down...");
        }
    }

    Ok(())
}
