//! RAX File Server - Entry Point
//!
//! Per-user file storage over a line-based TCP protocol.

use log::{error, info};
use std::process;

use rax_file_server::{Server, ServerConfig};

#[tokio::main]
async fn main() {
    // RUST_LOG overrides the default filter
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("Launching file server...");

    let config = match ServerConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    let server = match Server::new(config).await {
        Ok(server) => server,
        Err(e) => {
            error!("Server startup failed: {}", e);
            process::exit(1);
        }
    };
    server.start().await;
}
