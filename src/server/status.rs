//! Stateless status endpoint
//!
//! One snapshot per connection: accept, write the current stats as a single
//! JSON line, close. Intended for out-of-band monitoring next to the
//! persistent relay transport.

use std::sync::Arc;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;

use crate::error::Result;
use crate::gateway::TrackingGateway;
use crate::stats::StatsSnapshot;

/// Serve snapshot reads until the task is aborted
pub(crate) async fn serve(listener: TcpListener, gateway: Arc<TrackingGateway>) {
    loop {
        match listener.accept().await {
            Ok((mut socket, peer_addr)) => {
                let snapshot = gateway.stats_snapshot().await;
                tokio::spawn(async move {
                    if let Err(e) = write_snapshot(&mut socket, &snapshot).await {
                        tracing::debug!(peer = %peer_addr, error = %e, "status write failed");
                    }
                });
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to accept status connection");
            }
        }
    }
}

async fn write_snapshot<W: AsyncWrite + Unpin>(
    writer: &mut W,
    snapshot: &StatsSnapshot,
) -> Result<()> {
    let mut line = serde_json::to_vec(snapshot)?;
    line.push(b'\n');

    writer.write_all(&line).await?;
    writer.shutdown().await?;
    Ok(())
}
