//! Hub bootstrap
//!
//! Wires everything together on the server side: restores the user registry
//! snapshot, seeds the well-known rooms, spawns the hub actor, and runs the
//! TCP and UDP listeners on the configured host/port. Both listeners feed
//! the one request queue. Shutdown comes from the console (an `exit` line)
//! or ctrl-c and lets the hub drain and persist before the process ends.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::{TcpListener, UdpSocket};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::endpoint;
use crate::error::AppError;
use crate::hub::{Hub, HubRequest};
use crate::snapshot;

/// Snapshot file name under the data directory.
const SNAPSHOT_FILE: &str = "users.json";

/// Server-side configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory holding the user registry snapshot
    pub data_dir: PathBuf,
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join(SNAPSHOT_FILE)
    }
}

/// Run the hub until shutdown is requested.
///
/// Binding either listener fails fast with an error; everything after that
/// is recovered in place and logged.
pub async fn run(config: ServerConfig) -> Result<(), AppError> {
    let snapshot_path = config.snapshot_path();
    let users = match snapshot::load(&snapshot_path).await {
        Ok(users) => {
            info!(
                "restored {} users from {}",
                users.len(),
                snapshot_path.display()
            );
            users
        }
        Err(e) => {
            warn!("could not restore user snapshot: {}", e);
            HashMap::new()
        }
    };

    let (request_tx, request_rx) = mpsc::unbounded_channel();
    let mut hub = Hub::new(request_rx, users, snapshot_path);
    hub.seed_rooms();
    let hub_task = tokio::spawn(hub.run());

    let addr = config.addr();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| AppError::Bind {
            addr: addr.clone(),
            source,
        })?;
    info!("starting TCP server on {}", addr);

    let udp_socket = Arc::new(UdpSocket::bind(&addr).await.map_err(|source| {
        AppError::Bind {
            addr: addr.clone(),
            source,
        }
    })?);
    info!("starting UDP server on {}", addr);

    let accept_tx = request_tx.clone();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    debug!("new connection from {}", peer);
                    let request_tx = accept_tx.clone();
                    tokio::spawn(async move {
                        if let Err(e) = endpoint::handle_connection(stream, request_tx).await {
                            error!("connection handler error: {}", e);
                        }
                    });
                }
                Err(e) => error!("failed to accept connection: {}", e),
            }
        }
    });

    tokio::spawn(endpoint::run_udp_endpoint(udp_socket, request_tx.clone()));

    wait_for_shutdown().await;

    info!("shutting down");
    let _ = request_tx.send(HubRequest::Shutdown);
    let _ = hub_task.await;
    Ok(())
}

/// Block until the operator asks to stop: an `exit` line on stdin or ctrl-c.
/// With stdin unavailable (closed or detached), only ctrl-c remains.
async fn wait_for_shutdown() {
    let mut console = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => return,
            line = console.next_line() => match line {
                Ok(Some(input)) if input.trim() == "exit" => return,
                Ok(Some(_)) => {}
                _ => {
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_addr_and_snapshot_path() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8000,
            data_dir: PathBuf::from("/tmp/roomhub"),
        };
        assert_eq!(config.addr(), "127.0.0.1:8000");
        assert_eq!(
            config.snapshot_path(),
            PathBuf::from("/tmp/roomhub/users.json")
        );
    }
}
