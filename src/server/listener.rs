//! Relay server listener
//!
//! Handles the TCP accept loop and spawns one connection task per client.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;

use crate::error::Result;
use crate::gateway::TrackingGateway;
use crate::persistence::LocationStore;
use crate::server::config::ServerConfig;
use crate::server::connection::Connection;
use crate::server::status;

/// Tracking relay server
pub struct RelayServer {
    config: ServerConfig,
    gateway: Arc<TrackingGateway>,
    connection_semaphore: Option<Arc<Semaphore>>,
}

impl RelayServer {
    /// Create a new server over the given persistence port
    pub fn new(config: ServerConfig, store: Arc<dyn LocationStore>) -> Self {
        let connection_semaphore = if config.max_connections > 0 {
            Some(Arc::new(Semaphore::new(config.max_connections)))
        } else {
            None
        };

        Self {
            config,
            gateway: Arc::new(TrackingGateway::new(store)),
            connection_semaphore,
        }
    }

    /// Get a reference to the shared gateway
    ///
    /// Useful for embedding: the gateway's `stats_snapshot` is callable from
    /// outside the persistent transport.
    pub fn gateway(&self) -> &Arc<TrackingGateway> {
        &self.gateway
    }

    /// Get the configured bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }

    /// Run the server
    ///
    /// This method blocks until the server is shut down.
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!(addr = %self.config.bind_addr, "tracking relay listening");

        let _status_handle = self.spawn_status_listener().await?;
        self.accept_loop(&listener).await
    }

    /// Run the server with graceful shutdown
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()>,
    {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!(addr = %self.config.bind_addr, "tracking relay listening");

        let status_handle = self.spawn_status_listener().await?;

        let result = tokio::select! {
            _ = shutdown => {
                tracing::info!("shutdown signal received");
                Ok(())
            }
            result = self.accept_loop(&listener) => result,
        };

        if let Some(handle) = status_handle {
            handle.abort();
        }
        result
    }

    async fn spawn_status_listener(&self) -> Result<Option<tokio::task::JoinHandle<()>>> {
        let Some(status_addr) = self.config.status_addr else {
            return Ok(None);
        };

        let listener = TcpListener::bind(status_addr).await?;
        tracing::info!(addr = %status_addr, "status endpoint listening");

        let gateway = Arc::clone(&self.gateway);
        Ok(Some(tokio::spawn(status::serve(listener, gateway))))
    }

    async fn accept_loop(&self, listener: &TcpListener) -> Result<()> {
        loop {
            match listener.accept().await {
                Ok((socket, peer_addr)) => {
                    self.handle_connection(socket, peer_addr);
                }
                Err(e) => {
                    tracing::error!(error = %e, "failed to accept connection");
                }
            }
        }
    }

    fn handle_connection(&self, socket: TcpStream, peer_addr: SocketAddr) {
        // Check connection limit
        let permit = if let Some(ref sem) = self.connection_semaphore {
            match sem.clone().try_acquire_owned() {
                Ok(permit) => Some(permit),
                Err(_) => {
                    tracing::warn!(peer = %peer_addr, "connection rejected: limit reached");
                    return;
                }
            }
        } else {
            None
        };

        if self.config.tcp_nodelay {
            if let Err(e) = socket.set_nodelay(true) {
                tracing::warn!(peer = %peer_addr, error = %e, "failed to set TCP_NODELAY");
            }
        }

        tracing::debug!(peer = %peer_addr, "new connection");

        let gateway = Arc::clone(&self.gateway);
        tokio::spawn(async move {
            // Permit is held for the connection's lifetime
            let _permit = permit;

            if let Err(e) = Connection::new(socket, gateway).run().await {
                tracing::debug!(peer = %peer_addr, error = %e, "connection error");
            }

            tracing::debug!(peer = %peer_addr, "connection closed");
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryLocationStore;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpStream;

    async fn local_server() -> (Arc<RelayServer>, SocketAddr, SocketAddr) {
        // Bind to ephemeral ports first so the test knows where to connect
        let relay_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let status_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let relay_addr = relay_listener.local_addr().unwrap();
        let status_addr = status_listener.local_addr().unwrap();
        drop(relay_listener);
        drop(status_listener);

        let store = Arc::new(MemoryLocationStore::new());
        store.register_vehicle("V1").await;

        let config = ServerConfig::with_addr(relay_addr).status(status_addr);
        let server = Arc::new(RelayServer::new(config, store));

        let task_server = Arc::clone(&server);
        tokio::spawn(async move {
            let _ = task_server.run().await;
        });

        (server, relay_addr, status_addr)
    }

    async fn connect_with_retry(addr: SocketAddr) -> TcpStream {
        for _ in 0..50 {
            if let Ok(stream) = TcpStream::connect(addr).await {
                return stream;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        panic!("server did not come up on {}", addr);
    }

    #[tokio::test]
    async fn test_serves_tcp_clients_and_status() {
        let (server, relay_addr, status_addr) = local_server().await;

        let stream = connect_with_retry(relay_addr).await;
        let (read_half, mut write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);

        let mut line = String::new();
        reader.read_line(&mut line).await.unwrap();
        assert!(line.contains("\"connected\""));

        write_half
            .write_all(b"{\"event\":\"start_tracking\",\"data\":{\"vehicleId\":\"V1\"}}\n")
            .await
            .unwrap();
        line.clear();
        reader.read_line(&mut line).await.unwrap();
        assert!(line.contains("\"tracking_started\""));

        // Stateless status read returns the same snapshot shape
        let status_stream = TcpStream::connect(status_addr).await.unwrap();
        let mut status_reader = BufReader::new(status_stream);
        line.clear();
        status_reader.read_line(&mut line).await.unwrap();
        let snapshot: crate::stats::StatsSnapshot = serde_json::from_str(&line).unwrap();
        assert_eq!(snapshot.connected_clients, 1);
        assert_eq!(snapshot.vehicles, vec!["V1".to_owned()]);

        assert_eq!(server.gateway().stats_snapshot().await.active_vehicles, 1);
    }
}
