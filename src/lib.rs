// src/lib.rs

use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub use circuit::{select_circuit, Circuit, CircuitError};
pub use crypto::{CryptoError, KeyPair};
pub use directory::{DirectoryEntry, DirectoryError, DirectorySource, Registry, RegistryClient};
pub use onion::{build_onion, peel_layer, Address, AddressPlan, OnionError};
pub use relay::{Relay, RelayError, RelayState};
pub use transport::{HttpTransport, LocalNetwork, Transport, TransportError};
pub use user::{SendError, User};

use crate::server::{registry_router, relay_router, serve, user_router, RelayApp, UserApp};

#[derive(Debug, Clone)]
pub struct NetworkConfig {
    pub host: String,
    pub registry_port: u16,
    pub base_relay_port: u16,
    pub base_user_port: u16,
    pub relay_count: u32,
    pub user_count: u32,
    pub circuit_length: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            registry_port: 8080,
            base_relay_port: 4000,
            base_user_port: 3000,
            relay_count: 3,
            user_count: 2,
            circuit_length: 3,
        }
    }
}

impl NetworkConfig {
    pub fn test_config() -> Self {
        Self {
            registry_port: 18080,
            base_relay_port: 14000,
            base_user_port: 13000,
            ..Default::default()
        }
    }

    pub fn plan(&self) -> AddressPlan {
        AddressPlan {
            relay_base: self.base_relay_port as u64,
            user_base: self.base_user_port as u64,
        }
    }

    pub fn registry_url(&self) -> String {
        format!("http://{}:{}", self.host, self.registry_port)
    }

    fn port_for(&self, address: Address) -> Result<u16, Error> {
        u16::try_from(address.0)
            .map_err(|_| Error::Config(format!("address {} is not a TCP port", address)))
    }
}

/// A registry, its relays and its users, each served on its own port.
pub struct OnionNetwork {
    config: NetworkConfig,
    registry: Arc<Registry>,
    relays: Vec<Arc<Relay>>,
    users: Vec<Arc<User>>,
    tasks: ServerTasks,
}

impl OnionNetwork {
    /// Brings up the registry, then every relay (registering each one), then
    /// every user. If any step fails, servers already running are stopped
    /// before the error is returned.
    pub async fn start(config: NetworkConfig) -> Result<Self, Error> {
        let mut network = Self {
            config,
            registry: Arc::new(Registry::new()),
            relays: Vec::new(),
            users: Vec::new(),
            tasks: ServerTasks::default(),
        };

        if let Err(e) = network.launch().await {
            log::error!("Onion network failed to start: {}", e);
            network.shutdown().await;
            return Err(e);
        }
        Ok(network)
    }

    async fn launch(&mut self) -> Result<(), Error> {
        let config = self.config.clone();
        let plan = config.plan();
        let host = config.host.as_str();

        let listener = TcpListener::bind((host, config.registry_port)).await?;
        self.tasks.spawn(listener, registry_router(self.registry.clone()));
        log::info!("Registry listening on port {}", config.registry_port);

        let registry_client = Arc::new(RegistryClient::new(config.registry_url())?);
        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(config.host.clone())?);

        for node_id in 0..config.relay_count {
            let address = plan.relay(node_id)?;
            let relay = Arc::new(Relay::new(node_id, address)?);
            let listener = TcpListener::bind((host, config.port_for(address)?)).await?;
            let app = RelayApp {
                relay: relay.clone(),
                transport: transport.clone(),
            };
            self.tasks.spawn(listener, relay_router(app));
            log::info!("Onion router {} listening on port {}", node_id, address);

            registry_client.register(&relay.directory_entry()).await?;
            log::info!("Onion router {} registered with the registry", node_id);
            self.relays.push(relay);
        }

        for user_id in 0..config.user_count {
            let user = Arc::new(User::new(user_id, plan, config.circuit_length)?);
            let listener = TcpListener::bind((host, config.port_for(user.address())?)).await?;
            let app = UserApp {
                user: user.clone(),
                directory: registry_client.clone(),
                transport: transport.clone(),
            };
            self.tasks.spawn(listener, user_router(app));
            log::info!("User {} listening on port {}", user_id, user.address());
            self.users.push(user);
        }

        Ok(())
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn relays(&self) -> &[Arc<Relay>] {
        &self.relays
    }

    pub fn users(&self) -> &[Arc<User>] {
        &self.users
    }

    /// Stops every server. All listening ports are released on return.
    pub async fn shutdown(mut self) {
        log::info!("Shutting down onion network");
        self.tasks.shutdown().await;
    }
}

/// Spawned HTTP servers. Dropping the set aborts whatever is still running.
#[derive(Default)]
struct ServerTasks {
    handles: Vec<JoinHandle<()>>,
}

impl ServerTasks {
    fn spawn(&mut self, listener: TcpListener, router: axum::Router) {
        self.handles.push(tokio::spawn(async move {
            if let Err(e) = serve(listener, router).await {
                log::error!("HTTP server error: {}", e);
            }
        }));
    }

    async fn shutdown(&mut self) {
        let handles = std::mem::take(&mut self.handles);
        for handle in &handles {
            handle.abort();
        }
        for handle in handles {
            // Cancellation is the expected outcome here.
            let _ = handle.await;
        }
    }
}

impl Drop for ServerTasks {
    fn drop(&mut self) {
        for handle in &self.handles {
            handle.abort();
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),
    #[error("circuit error: {0}")]
    Circuit(#[from] CircuitError),
    #[error("onion error: {0}")]
    Onion(#[from] OnionError),
    #[error("directory error: {0}")]
    Directory(#[from] DirectoryError),
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("relay error: {0}")]
    Relay(#[from] RelayError),
    #[error("send error: {0}")]
    Send(#[from] SendError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("configuration error: {0}")]
    Config(String),
}

pub mod circuit;
pub mod crypto;
pub mod directory;
pub mod metrics;
pub mod onion;
pub mod relay;
pub mod server;
pub mod transport;
pub mod user;
