//! vblock Server Binary
//!
//! Creates the device and serves it over TCP.

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};
use vblock::network::Server;
use vblock::{Config, VBlock};

/// vblock Server
#[derive(Parser, Debug)]
#[command(name = "vblock-server")]
#[command(about = "4 KiB virtual block device with region locks, keys, mirroring and backups")]
#[command(version)]
struct Args {
    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:7410")]
    listen: String,

    /// Authorized key for writes into locked regions (repeatable, max 8)
    #[arg(short, long = "key", value_name = "KEY", allow_negative_numbers = true)]
    keys: Vec<i32>,

    /// Mirror every write into the secondary buffer
    #[arg(long)]
    mirror: bool,

    /// Maximum concurrent connections
    #[arg(short, long, default_value = "64")]
    max_connections: usize,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,vblock=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("vblock server v{}", vblock::VERSION);
    tracing::info!("Listen address: {}", args.listen);

    // Build config from args
    let config = Config::builder()
        .listen_addr(&args.listen)
        .authorized_keys(args.keys)
        .mirror_enabled(args.mirror)
        .max_connections(args.max_connections)
        .build();

    let device = match VBlock::open(config.clone()) {
        Ok(d) => Arc::new(d),
        Err(e) => {
            tracing::error!("Failed to create device: {}", e);
            std::process::exit(1);
        }
    };

    let server = Server::new(config, device);
    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
