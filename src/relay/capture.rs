//! Chunked capture loop

use super::clip::AudioClip;
use super::source::{AudioSource, InputStream};
use super::transport::ClipTransport;
use super::RelayError;
use chrono::Utc;
use hound::WavSpec;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tokio_util::sync::{CancellationToken, DropGuard};

/// Default clip length
pub const DEFAULT_CHUNK_PERIOD: Duration = Duration::from_secs(4);

/// What a finished capture did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureSummary {
    pub clips_sent: usize,
    /// Clips dropped because the transport was unavailable
    pub clips_skipped: usize,
    /// Samples in the partial buffer thrown away at stop
    pub samples_discarded: usize,
}

/// Cuts captured audio into fixed-length clips and hands them to a transport
pub struct AudioRelay<T> {
    transport: Arc<T>,
    chunk_period: Duration,
}

impl<T: ClipTransport + 'static> AudioRelay<T> {
    pub fn new(transport: Arc<T>, chunk_period: Duration) -> Self {
        Self {
            transport,
            chunk_period,
        }
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Open the source and start cutting clips every chunk period.
    ///
    /// The input stays open across clip boundaries; each clip is cut from the
    /// running buffer, so no audio is lost between clips.
    pub fn start_capture(&self, source: &mut dyn AudioSource) -> Result<CaptureHandle, RelayError> {
        if self.chunk_period.is_zero() {
            return Err(RelayError::Input("chunk period must be positive".to_string()));
        }
        let input = source.open()?;
        let cancel = CancellationToken::new();

        tracing::info!(
            chunk_secs = self.chunk_period.as_secs_f64(),
            connected = self.transport.is_connected(),
            "Capture started"
        );

        let task = tokio::spawn(run_capture(
            input,
            self.transport.clone(),
            self.chunk_period,
            cancel.clone(),
        ));

        Ok(CaptureHandle {
            cancel_on_drop: cancel.drop_guard(),
            task,
        })
    }
}

/// A running capture. Dropping it also stops the capture.
pub struct CaptureHandle {
    cancel_on_drop: DropGuard,
    task: JoinHandle<CaptureSummary>,
}

impl CaptureHandle {
    /// Stop capturing, discard the partial buffer and release the input
    pub async fn stop(self) -> CaptureSummary {
        drop(self.cancel_on_drop);
        match self.task.await {
            Ok(summary) => summary,
            Err(e) => {
                tracing::error!(error = %e, "Capture task failed");
                CaptureSummary::default()
            }
        }
    }
}

async fn run_capture<T: ClipTransport>(
    mut input: InputStream,
    transport: Arc<T>,
    period: Duration,
    cancel: CancellationToken,
) -> CaptureSummary {
    let mut summary = CaptureSummary::default();
    let mut buffer: Vec<i16> = Vec::new();
    let mut ticker = interval_at(Instant::now() + period, period);
    let mut input_open = true;
    let spec = input.spec;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let samples = std::mem::take(&mut buffer);
                if samples.is_empty() {
                    tracing::debug!("No audio in this window, nothing to send");
                    continue;
                }
                send_clip(&*transport, spec, &samples, &mut summary).await;
            }
            chunk = input.samples.recv(), if input_open => match chunk {
                Some(samples) => buffer.extend(samples),
                None => {
                    tracing::debug!("Audio input ended");
                    input_open = false;
                }
            },
        }
    }

    summary.samples_discarded = buffer.len();
    drop(input);
    tracing::info!(
        clips_sent = summary.clips_sent,
        clips_skipped = summary.clips_skipped,
        samples_discarded = summary.samples_discarded,
        "Capture stopped"
    );
    summary
}

async fn send_clip<T: ClipTransport + ?Sized>(
    transport: &T,
    spec: WavSpec,
    samples: &[i16],
    summary: &mut CaptureSummary,
) {
    if !transport.is_connected() {
        tracing::warn!(samples = samples.len(), "Socket not connected, skipping clip");
        summary.clips_skipped += 1;
        return;
    }

    let clip = match AudioClip::encode_wav(spec, samples, Utc::now()) {
        Ok(clip) => clip,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to encode clip, skipping");
            summary.clips_skipped += 1;
            return;
        }
    };

    match transport.send(&clip).await {
        Ok(()) => {
            tracing::debug!(size = clip.size, "Clip sent");
            summary.clips_sent += 1;
        }
        Err(e) => {
            tracing::warn!(error = %e, "Clip send failed, skipping");
            summary.clips_skipped += 1;
        }
    }
}
