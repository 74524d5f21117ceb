//! Transports that carry finished clips to the peer

use super::clip::AudioClip;
use super::wire::{AudioPayload, SocketMessage};
use super::RelayError;
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};

/// Delivery of clips to the peer
#[async_trait]
pub trait ClipTransport: Send + Sync {
    fn is_connected(&self) -> bool;

    /// Send one clip. Fails with `NotConnected` instead of queueing.
    async fn send(&self, clip: &AudioClip) -> Result<(), RelayError>;
}

#[async_trait]
impl<T: ClipTransport + ?Sized> ClipTransport for Arc<T> {
    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    async fn send(&self, clip: &AudioClip) -> Result<(), RelayError> {
        (**self).send(clip).await
    }
}

/// Persistent WebSocket connection to the relay peer.
///
/// A writer task drains outgoing frames and a reader task logs receipts.
/// Either task ending marks the session disconnected. Dropping the session
/// closes the socket.
#[derive(Debug)]
pub struct SocketSession {
    outgoing: Option<mpsc::UnboundedSender<String>>,
    connected: Arc<AtomicBool>,
    receipts: Arc<AtomicUsize>,
}

impl SocketSession {
    pub async fn connect(url: &str) -> Result<Self, RelayError> {
        let (socket, _) = connect_async(url).await?;
        tracing::info!(url, "Socket connected");

        let (mut sink, mut stream) = socket.split();
        let (outgoing, mut outgoing_rx) = mpsc::unbounded_channel::<String>();
        let connected = Arc::new(AtomicBool::new(true));
        let receipts = Arc::new(AtomicUsize::new(0));

        let writer_connected = connected.clone();
        tokio::spawn(async move {
            while let Some(text) = outgoing_rx.recv().await {
                if let Err(e) = sink.send(Message::Text(text.into())).await {
                    tracing::warn!(error = %e, "Socket write failed");
                    break;
                }
            }
            writer_connected.store(false, Ordering::SeqCst);
            let _ = sink.close().await;
        });

        let reader_connected = connected.clone();
        let reader_receipts = receipts.clone();
        tokio::spawn(async move {
            while let Some(frame) = stream.next().await {
                match frame {
                    Ok(Message::Text(text)) => match serde_json::from_str::<SocketMessage>(&text) {
                        Ok(SocketMessage::AudioReceived(receipt)) => {
                            let count = reader_receipts.fetch_add(1, Ordering::SeqCst) + 1;
                            tracing::info!(
                                size = receipt.size,
                                timestamp = %receipt.timestamp,
                                message = %receipt.message,
                                count,
                                "Clip receipt"
                            );
                        }
                        Ok(other) => tracing::debug!(?other, "Ignoring unexpected socket event"),
                        Err(e) => tracing::warn!(error = %e, "Undecodable socket frame"),
                    },
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!(error = %e, "Socket read failed");
                        break;
                    }
                }
            }
            reader_connected.store(false, Ordering::SeqCst);
            tracing::info!("Socket disconnected");
        });

        Ok(Self {
            outgoing: Some(outgoing),
            connected,
            receipts,
        })
    }

    /// A session that was never connected; every send is skipped
    pub fn offline() -> Self {
        Self {
            outgoing: None,
            connected: Arc::new(AtomicBool::new(false)),
            receipts: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Receipts acknowledged by the peer so far
    pub fn receipts(&self) -> usize {
        self.receipts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClipTransport for SocketSession {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn send(&self, clip: &AudioClip) -> Result<(), RelayError> {
        let Some(outgoing) = self.outgoing.as_ref().filter(|_| self.is_connected()) else {
            return Err(RelayError::NotConnected);
        };
        let frame = serde_json::to_string(&SocketMessage::AudioData(AudioPayload::from(clip)))?;
        outgoing.send(frame).map_err(|_| RelayError::NotConnected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{create_router, AppState};
    use crate::db::Database;
    use chrono::Utc;
    use std::time::Duration;
    use tokio::net::TcpListener;

    async fn spawn_server() -> String {
        let db = Database::open_in_memory().unwrap();
        let app = create_router(AppState::new(Arc::new(db), None));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("ws://{addr}/socket")
    }

    fn clip() -> AudioClip {
        AudioClip {
            bytes: vec![1, 2, 3, 4],
            size: 4,
            content_type: "audio/wav".to_string(),
            captured_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_session_counts_receipts() {
        let session = SocketSession::connect(&spawn_server().await).await.unwrap();
        assert!(session.is_connected());

        session.send(&clip()).await.unwrap();
        session.send(&clip()).await.unwrap();

        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while session.receipts() < 2 && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(session.receipts(), 2);
    }

    #[tokio::test]
    async fn test_offline_session_rejects_sends() {
        let session = SocketSession::offline();
        assert!(!session.is_connected());
        assert!(matches!(
            session.send(&clip()).await,
            Err(RelayError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn test_connect_failure() {
        assert!(SocketSession::connect("ws://127.0.0.1:1/socket").await.is_err());
    }
}
