//! WebSocket endpoint for the audio relay
//!
//! Every `audio-data` frame is answered with an `audio-received` frame that
//! echoes the payload with the server's timestamp.

use crate::relay::wire::{AudioReceipt, SocketMessage};
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use chrono::Utc;
use uuid::Uuid;

pub(super) async fn socket_handler(ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(handle_socket)
}

async fn handle_socket(mut socket: WebSocket) {
    let client = Uuid::new_v4();
    tracing::info!(%client, "Client connected");

    while let Some(frame) = socket.recv().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                tracing::warn!(%client, error = %e, "Socket receive failed");
                break;
            }
        };

        let payload = match serde_json::from_str::<SocketMessage>(&text) {
            Ok(SocketMessage::AudioData(payload)) => payload,
            Ok(other) => {
                tracing::debug!(%client, ?other, "Ignoring unexpected event");
                continue;
            }
            Err(e) => {
                tracing::warn!(%client, error = %e, "Undecodable socket frame");
                continue;
            }
        };

        tracing::info!(
            %client,
            size = payload.size,
            content_type = %payload.content_type,
            timestamp = %payload.timestamp,
            audio_len = payload.audio.len(),
            "Received audio data"
        );

        let receipt = SocketMessage::AudioReceived(AudioReceipt::for_payload(payload, Utc::now()));
        let reply = match serde_json::to_string(&receipt) {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(%client, error = %e, "Failed to encode receipt");
                continue;
            }
        };
        if socket.send(Message::Text(reply)).await.is_err() {
            break;
        }
    }

    tracing::info!(%client, "Client disconnected");
}
