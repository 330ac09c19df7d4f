//! Per-connection message loop
//!
//! Splits the transport stream into a buffered line reader and a writer
//! draining the connection's outbound queue. Acks are queued through the
//! same channel as broadcasts, so per-client output order matches the order
//! the gateway produced it.
//!
//! Generic over the stream so the loop can be driven by an in-memory duplex
//! pipe in tests as well as by a `TcpStream`.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

use crate::error::Result;
use crate::gateway::TrackingGateway;
use crate::protocol::message::{Ack, ClientMessage, ServerEvent};
use crate::protocol::wire::encode_event;
use crate::registry::ClientId;

/// One client connection being served
pub struct Connection<S> {
    stream: S,
    gateway: Arc<TrackingGateway>,
}

impl<S: AsyncRead + AsyncWrite + Unpin> Connection<S> {
    pub fn new(stream: S, gateway: Arc<TrackingGateway>) -> Self {
        Self { stream, gateway }
    }

    /// Serve the connection until the peer disconnects or the transport
    /// fails
    ///
    /// Registry/room teardown runs exactly once on every exit path.
    pub async fn run(self) -> Result<()> {
        let Self { stream, gateway } = self;

        let (read_half, mut write_half) = tokio::io::split(stream);
        let mut lines = BufReader::new(read_half).lines();

        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel();
        let client_id = gateway.connect(outbound_tx.clone()).await;

        let result = loop {
            tokio::select! {
                frame = outbound_rx.recv() => match frame {
                    Some(frame) => {
                        if let Err(err) = write_half.write_all(&frame).await {
                            break Err(err.into());
                        }
                    }
                    // All senders gone; nothing left to deliver
                    None => break Ok(()),
                },
                line = lines.next_line() => match line {
                    Ok(Some(line)) => {
                        Self::handle_line(&gateway, client_id, &outbound_tx, &line).await;
                    }
                    Ok(None) => break Ok(()),
                    Err(err) => break Err(err.into()),
                },
            }
        };

        gateway.disconnect(client_id).await;
        result
    }

    /// Parse one inbound line and route it through the gateway
    ///
    /// Malformed or unroutable messages are dropped without a reply.
    async fn handle_line(
        gateway: &TrackingGateway,
        client_id: ClientId,
        outbound: &mpsc::UnboundedSender<bytes::Bytes>,
        line: &str,
    ) {
        if line.trim().is_empty() {
            return;
        }

        let message: ClientMessage = match serde_json::from_str(line) {
            Ok(message) => message,
            Err(err) => {
                tracing::debug!(client_id, error = %err, "dropping unroutable message");
                return;
            }
        };

        let ack = gateway.dispatch(client_id, message).await;
        Self::queue_ack(client_id, outbound, ack);
    }

    fn queue_ack(client_id: ClientId, outbound: &mpsc::UnboundedSender<bytes::Bytes>, ack: Ack) {
        match encode_event(&ServerEvent::Ack(ack)) {
            // Send failure means the writer already stopped; teardown follows
            Ok(frame) => {
                let _ = outbound.send(frame);
            }
            Err(err) => tracing::error!(client_id, error = %err, "failed to encode ack"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryLocationStore;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, ReadHalf, WriteHalf};
    use tokio::task::JoinHandle;

    struct TestClient {
        reader: BufReader<ReadHalf<DuplexStream>>,
        writer: WriteHalf<DuplexStream>,
    }

    impl TestClient {
        async fn send(&mut self, line: &str) {
            self.writer.write_all(line.as_bytes()).await.unwrap();
            self.writer.write_all(b"\n").await.unwrap();
        }

        async fn next_event(&mut self) -> ServerEvent {
            let mut line = String::new();
            let n = self.reader.read_line(&mut line).await.unwrap();
            assert!(n > 0, "server closed the stream");
            serde_json::from_str(&line).unwrap()
        }
    }

    async fn serve(
        gateway: &Arc<TrackingGateway>,
    ) -> (TestClient, JoinHandle<Result<()>>) {
        let (client_side, server_side) = tokio::io::duplex(4096);
        let connection = Connection::new(server_side, Arc::clone(gateway));
        let task = tokio::spawn(connection.run());

        let (read_half, write_half) = tokio::io::split(client_side);
        let client = TestClient {
            reader: BufReader::new(read_half),
            writer: write_half,
        };
        (client, task)
    }

    async fn tracking_gateway(vehicles: &[&str]) -> Arc<TrackingGateway> {
        let store = Arc::new(MemoryLocationStore::new());
        for vehicle in vehicles {
            store.register_vehicle(vehicle).await;
        }
        Arc::new(TrackingGateway::new(store))
    }

    #[tokio::test]
    async fn test_full_session() {
        let gateway = tracking_gateway(&["V1"]).await;
        let (mut client, task) = serve(&gateway).await;

        assert!(matches!(
            client.next_event().await,
            ServerEvent::Connected { .. }
        ));

        client
            .send(r#"{"event":"start_tracking","data":{"vehicleId":"V1"}}"#)
            .await;
        assert!(matches!(
            client.next_event().await,
            ServerEvent::TrackingStarted { .. }
        ));
        match client.next_event().await {
            ServerEvent::Ack(ack) => assert!(ack.success),
            other => panic!("unexpected event: {:?}", other),
        }

        client
            .send(r#"{"event":"location_update","data":{"vehicleId":"V1","latitude":-6.2088,"longitude":106.8456}}"#)
            .await;
        match client.next_event().await {
            ServerEvent::LocationUpdated {
                vehicle_id,
                latitude,
                ..
            } => {
                assert_eq!(vehicle_id, "V1");
                assert_eq!(latitude, -6.2088);
            }
            other => panic!("unexpected event: {:?}", other),
        }
        assert!(matches!(
            client.next_event().await,
            ServerEvent::Ack(Ack { success: true, .. })
        ));

        client.send(r#"{"event":"get_stats"}"#).await;
        match client.next_event().await {
            ServerEvent::StatsData(snapshot) => {
                assert_eq!(snapshot.connected_clients, 1);
                assert_eq!(snapshot.vehicles, vec!["V1".to_owned()]);
            }
            other => panic!("unexpected event: {:?}", other),
        }
        assert!(matches!(client.next_event().await, ServerEvent::Ack(_)));

        // Disconnect: registry entry and room membership are released
        drop(client);
        task.await.unwrap().unwrap();
        let snapshot = gateway.stats_snapshot().await;
        assert_eq!(snapshot.connected_clients, 0);
        assert_eq!(snapshot.active_vehicles, 1);
    }

    #[tokio::test]
    async fn test_validation_failure_keeps_connection_open() {
        let gateway = tracking_gateway(&["V1"]).await;
        let (mut client, _task) = serve(&gateway).await;
        client.next_event().await; // connected

        client
            .send(r#"{"event":"location_update","data":{"vehicleId":"V1","latitude":91,"longitude":0}}"#)
            .await;
        assert!(matches!(client.next_event().await, ServerEvent::Error { .. }));
        assert!(matches!(
            client.next_event().await,
            ServerEvent::Ack(Ack { success: false, .. })
        ));

        // The connection still works afterwards
        client.send(r#"{"event":"get_stats"}"#).await;
        assert!(matches!(
            client.next_event().await,
            ServerEvent::StatsData(_)
        ));
    }

    #[tokio::test]
    async fn test_malformed_and_unknown_messages_dropped() {
        let gateway = tracking_gateway(&[]).await;
        let (mut client, _task) = serve(&gateway).await;
        client.next_event().await; // connected

        client.send("this is not json").await;
        client.send(r#"{"event":"warp_drive","data":{}}"#).await;
        client.send("").await;

        // No replies for any of the above; the next valid request is served
        client.send(r#"{"event":"get_stats"}"#).await;
        assert!(matches!(
            client.next_event().await,
            ServerEvent::StatsData(_)
        ));
    }

    #[tokio::test]
    async fn test_broadcast_between_connections() {
        let gateway = tracking_gateway(&["V7"]).await;
        let (mut subscriber, _sub_task) = serve(&gateway).await;
        let (mut reporter, _rep_task) = serve(&gateway).await;

        subscriber.next_event().await; // connected
        reporter.next_event().await; // connected

        subscriber
            .send(r#"{"event":"start_tracking","data":{"vehicleId":"V7"}}"#)
            .await;
        subscriber.next_event().await; // tracking_started
        subscriber.next_event().await; // ack

        reporter
            .send(r#"{"event":"location_update","data":{"vehicleId":"V7","latitude":52.52,"longitude":13.405}}"#)
            .await;
        assert!(matches!(
            reporter.next_event().await,
            ServerEvent::Ack(Ack { success: true, .. })
        ));

        match subscriber.next_event().await {
            ServerEvent::LocationUpdated {
                vehicle_id,
                longitude,
                ..
            } => {
                assert_eq!(vehicle_id, "V7");
                assert_eq!(longitude, 13.405);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
