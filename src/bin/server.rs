//! EventEase Server Binary
//!
//! Opens the ticket store and serves it over TCP.

use std::sync::Arc;

use clap::Parser;
use eventease::config::WalSyncStrategy;
use eventease::network::Server;
use eventease::{Config, DurableMap, Ticket, TicketService};
use tracing_subscriber::{fmt, EnvFilter};

/// EventEase Server
#[derive(Parser, Debug)]
#[command(name = "eventease-server")]
#[command(about = "Durable event ticket service")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./eventease_data")]
    data_dir: String,

    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:7878")]
    listen: String,

    /// Maximum queued connections
    #[arg(short, long, default_value = "1024")]
    max_connections: usize,

    /// Connection worker threads
    #[arg(short, long, default_value = "8")]
    workers: usize,

    /// WAL entries between checkpoints
    #[arg(short, long, default_value = "1024")]
    checkpoint_every: usize,

    /// fsync the WAL every N entries instead of on every write
    #[arg(long)]
    sync_every: Option<usize>,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,eventease=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("EventEase Server v{}", eventease::VERSION);
    tracing::info!("Data directory: {}", args.data_dir);
    tracing::info!("Listen address: {}", args.listen);

    let sync_strategy = match args.sync_every {
        Some(count) => WalSyncStrategy::EveryNEntries { count },
        None => WalSyncStrategy::EveryWrite,
    };

    // Build config from args
    let config = Config::builder()
        .data_dir(&args.data_dir)
        .listen_addr(&args.listen)
        .max_connections(args.max_connections)
        .worker_threads(args.workers)
        .checkpoint_threshold(args.checkpoint_every)
        .wal_sync_strategy(sync_strategy)
        .build();

    // The store lives for the whole process and is shared with every worker
    let store = match DurableMap::<Ticket>::open(config.clone()) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::error!("Failed to open store: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Store opened with {} tickets", store.len());

    let service = Arc::new(TicketService::new(store));

    let mut server = Server::new(config, service);
    // Runs until the process is killed; every WAL append is already flushed
    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
