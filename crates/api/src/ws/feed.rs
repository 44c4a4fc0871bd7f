use axum::extract::ws::{Message, WebSocket};
use futures::{Sink, SinkExt, StreamExt};
use shelfwatch_core::store::RecordStream;

use crate::response::DataResponse;

/// Manage a single feed connection after upgrade.
///
/// Splits the socket into a sink (outbound) and stream (inbound), then:
///   1. Spawns a sender task that forwards every snapshot to the sink.
///   2. Drains inbound frames on the current task until the client closes.
///   3. Aborts the sender, which drops the subscription.
pub async fn serve_feed(socket: WebSocket, snapshots: RecordStream, subject: String) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(conn_id = %conn_id, subject = %subject, "Feed connected");

    let (sink, mut stream) = socket.split();
    let send_task = tokio::spawn(forward_snapshots(sink, snapshots));

    // Clients never send anything meaningful; only watch for close.
    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "Feed receive error");
                break;
            }
        }
    }

    send_task.abort();
    tracing::info!(conn_id = %conn_id, "Feed disconnected");
}

/// Send each snapshot as a JSON text frame until the snapshots end or the
/// sink closes.
pub async fn forward_snapshots<K>(mut sink: K, mut snapshots: RecordStream)
where
    K: Sink<Message> + Unpin,
{
    while let Some(snapshot) = snapshots.next().await {
        let payload = match serde_json::to_string(&DataResponse { data: &snapshot }) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode feed snapshot");
                continue;
            }
        };
        if sink.send(Message::Text(payload.into())).await.is_err() {
            tracing::debug!("Feed sink closed");
            break;
        }
    }
}
