// src/main.rs
use clap::Parser;
use onion_relay::{NetworkConfig, OnionNetwork};

/// Runs a registry, a set of onion routers and a set of users on one host.
#[derive(Debug, Parser)]
#[command(name = "onion-relay", version)]
struct Args {
    /// Number of onion routers to start
    #[arg(default_value_t = 3)]
    relays: u32,

    /// Number of users to start
    #[arg(default_value_t = 2)]
    users: u32,

    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    #[arg(long, default_value_t = 8080)]
    registry_port: u16,

    #[arg(long, default_value_t = 4000)]
    base_relay_port: u16,

    #[arg(long, default_value_t = 3000)]
    base_user_port: u16,

    /// Hops per message
    #[arg(long, default_value_t = 3)]
    circuit_length: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let config = NetworkConfig {
        host: args.host,
        registry_port: args.registry_port,
        base_relay_port: args.base_relay_port,
        base_user_port: args.base_user_port,
        relay_count: args.relays,
        user_count: args.users,
        circuit_length: args.circuit_length,
    };

    let network = OnionNetwork::start(config).await?;
    log::info!(
        "Started {} onion routers and {} users",
        network.relays().len(),
        network.users().len()
    );

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    network.shutdown().await;

    Ok(())
}
