//! Chunked audio relay
//!
//! Captures audio from a source, cuts it into fixed-length WAV clips and
//! forwards each clip over a persistent socket to a peer that echoes a
//! receipt. When the socket is down clips are dropped with a warning and
//! capture carries on.

mod capture;
mod clip;
mod source;
mod transport;
pub mod wire;

pub use capture::{AudioRelay, CaptureHandle, CaptureSummary, DEFAULT_CHUNK_PERIOD};
pub use clip::{AudioClip, WAV_CONTENT_TYPE};
#[cfg(feature = "mic")]
pub use source::MicSource;
pub use source::{AudioSource, InputStream, WavFileSource};
pub use transport::{ClipTransport, SocketSession};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("audio input unavailable: {0}")]
    Input(String),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("socket error: {0}")]
    Socket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("failed to encode socket message: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("socket not connected")]
    NotConnected,
}
