use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use uuid::Uuid;

use crate::actor::model::{InternalMessage, ResponseSignal, TaskRequest};
use crate::api::model::decode;

const RESPONSE_BUFFER: usize = 100;

/// Serves one client until it disconnects.
///
/// Requests run on a shared worker pool, so replies can arrive in a different
/// order than the requests were sent. Match them up by `id`.
pub async fn accept_connection(
    stream: TcpStream,
    tx: tokio::sync::broadcast::Sender<InternalMessage>,
) {
    let addr = match stream.peer_addr() {
        Ok(addr) => addr.to_string(),
        Err(_) => "unknown".to_string(),
    };
    let session = Uuid::new_v4();

    let ws_stream = match tokio_tungstenite::accept_async(stream).await {
        Ok(stream) => stream,
        Err(e) => {
            tracing::error!("WebSocket handshake failed for address {}: {}", addr, e);
            return;
        }
    };

    tracing::info!("Accepted session {} from {}", session, addr);

    let (mut write, mut read) = ws_stream.split();
    let (response_tx, mut response_rx) = tokio::sync::mpsc::channel::<ResponseSignal>(RESPONSE_BUFFER);

    let writer = tokio::spawn(async move {
        while let Some(response) = response_rx.recv().await {
            if let ResponseSignal::Stop = response {
                tracing::debug!("Stopping response writer for session {}", session);
                break;
            }

            if let Err(e) = write.send(Message::Text(response.to_string().into())).await {
                tracing::warn!("Failed to write response to session {}: {}", session, e);
                break;
            }
        }
        let _ = write.close().await;
    });

    while let Some(message) = read.next().await {
        let msg = match message {
            Ok(msg) => msg,
            Err(e) => {
                tracing::error!("Error reading message from {}: {}", session, e);
                break;
            }
        };
        if msg.is_close() {
            break;
        }
        if !msg.is_text() {
            continue;
        }
        let Ok(text) = msg.to_text() else {
            continue;
        };

        let (request_id, command) = match decode(text) {
            Ok(decoded) => decoded,
            Err((request_id, e)) => {
                tracing::warn!("Rejected message from {}: {}", session, e);
                if response_tx
                    .send(ResponseSignal::Error {
                        request_id,
                        message: e.to_string(),
                    })
                    .await
                    .is_err()
                {
                    break;
                }
                continue;
            }
        };

        if let Err(e) = tx.send(InternalMessage::TaskRequest(TaskRequest {
            owner: session,
            request_id: request_id.clone(),
            command,
            respond_to: response_tx.clone(),
        })) {
            tracing::error!("Failed to send task request: {}", e);
            let _ = response_tx
                .send(ResponseSignal::Error {
                    request_id,
                    message: "companion is not accepting requests".to_string(),
                })
                .await;
            break;
        }
    }

    let _ = response_tx.send(ResponseSignal::Stop).await;
    if tokio::time::timeout(tokio::time::Duration::from_secs(5), writer)
        .await
        .is_err()
    {
        tracing::warn!("Response writer for session {} did not finish in time", session);
    }
    tracing::info!("Session {} closed", session);
}
