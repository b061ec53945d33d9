//! respkv Server Binary
//!
//! Starts the TCP server for respkv.

use std::sync::Arc;

use clap::Parser;
use respkv::network::Server;
use respkv::{Config, ReplyStyle, Store, UnknownCommandPolicy};
use tracing_subscriber::{fmt, EnvFilter};

/// respkv Server
#[derive(Parser, Debug)]
#[command(name = "respkv-server")]
#[command(about = "In-memory key-value store speaking RESP")]
#[command(version)]
struct Args {
    /// Listen address (host:port)
    #[arg(short, long, default_value = "0.0.0.0:6379")]
    listen: String,

    /// Maximum concurrent connections
    #[arg(short, long, default_value = "1024")]
    max_connections: usize,

    /// Read deadline once a request has started, in ms (0 disables)
    #[arg(long, default_value = "5000")]
    read_timeout_ms: u64,

    /// Close connections idle for this long, in ms (0 disables)
    #[arg(long, default_value = "0")]
    idle_timeout_ms: u64,

    /// Number of lock stripes in the keyspace (power of two)
    #[arg(long, default_value = "16")]
    shards: usize,

    /// Reply `+PONG` and `$-1` instead of `$4 PONG` and `$5 (nil)`
    #[arg(long)]
    canonical_replies: bool,

    /// Answer unknown commands with an error instead of `+OK`
    #[arg(long)]
    strict_commands: bool,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,respkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("respkv server v{}", respkv::VERSION);
    tracing::info!("Listen address: {}", args.listen);

    let reply_style = if args.canonical_replies {
        ReplyStyle::Canonical
    } else {
        ReplyStyle::Compatible
    };
    let unknown_command_policy = if args.strict_commands {
        UnknownCommandPolicy::ReplyError
    } else {
        UnknownCommandPolicy::ReplyOk
    };

    // Build config from args
    let config = match Config::builder()
        .listen_addr(&args.listen)
        .max_connections(args.max_connections)
        .read_timeout_ms(args.read_timeout_ms)
        .idle_timeout_ms(args.idle_timeout_ms)
        .store_shards(args.shards)
        .reply_style(reply_style)
        .unknown_command_policy(unknown_command_policy)
        .build()
    {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(2);
        }
    };

    // One keyspace for the whole process, shared by every connection
    let store = Arc::new(Store::with_shards(config.store_shards));
    tracing::info!("Store initialized with {} shards", store.shard_count());

    let server = match Server::bind(config, store) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", args.listen, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
