use log::{error, info};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use crate::client::{ClientRegistry, handle_client};
use crate::config::ServerConfig;
use crate::error::FileServerError;
use crate::server::ServerContext;

pub struct Server {
    registry: Arc<Mutex<ClientRegistry>>,
    listener: TcpListener,
    context: Arc<ServerContext>,
}

impl Server {
    /// Validates `config`, prepares storage and binds the control socket
    pub async fn new(config: ServerConfig) -> Result<Self, FileServerError> {
        config.validate()?;
        let context = ServerContext::from_config(config)?;
        Self::with_context(context).await
    }

    pub async fn with_context(context: ServerContext) -> Result<Self, FileServerError> {
        let socket = context.startup.control_socket();

        let listener = TcpListener::bind(&socket).await.map_err(|e| {
            error!("Failed to bind to {}: {}", socket, e);
            FileServerError::Io(e)
        })?;
        info!("Server bound to {}", socket);

        Ok(Self {
            registry: Arc::new(Mutex::new(ClientRegistry::new())),
            listener,
            context: Arc::new(context),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub async fn start(&self) {
        let max_clients = self.context.runtime.read().await.max_clients;
        info!(
            "Starting RAX file server on {} (max {} clients)",
            self.context.startup.control_socket(),
            max_clients
        );

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    info!("Accepted connection from {}", addr);
                    let registry = Arc::clone(&self.registry);
                    let context = Arc::clone(&self.context);

                    // Spawn a task for each client so accept loop doesn't block
                    tokio::spawn(async move {
                        handle_client(stream, addr, registry, context).await;
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                }
            }
        }
    }
}
