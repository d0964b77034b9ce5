// Copyright (c) 2024 nostr-relay Contributors
// Distributed under the MIT software license

//! CLI entry point.

use std::net::IpAddr;
use std::sync::Arc;

use clap::Parser;
use nostr_relay::RelayBuilder;
use tracing_subscriber::EnvFilter;

/// Run a NIP-01 nostr relay.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Address to bind on.
    #[arg(long, default_value = "127.0.0.1")]
    addr: IpAddr,

    /// Port to bind on.
    #[arg(long, default_value_t = 7777)]
    port: u16,

    /// Backfill cap applied to a REQ that doesn't specify `limit`.
    #[arg(long, default_value_t = 100)]
    default_backfill_limit: usize,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let relay = RelayBuilder::new()
        .addr(args.addr)
        .port(args.port)
        .default_backfill_limit(args.default_backfill_limit)
        .build();
    let addr = relay.addr();

    let (shutdown_tx, shutdown_rx) = tokio::sync::broadcast::channel(1);
    let relay = Arc::new(relay);

    tracing::info!(%addr, "starting nostr-relay");

    tokio::select! {
        result = relay.run(shutdown_rx) => {
            if let Err(err) = result {
                tracing::error!(?err, "relay exited with an error");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("received ctrl-c, shutting down");
            let _ = shutdown_tx.send(());
        }
    }
}
