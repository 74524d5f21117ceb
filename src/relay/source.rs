//! Audio inputs the relay can capture from

use super::RelayError;
use hound::{SampleFormat, WavReader, WavSpec};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// An open input: interleaved 16-bit samples arrive on `samples` until the
/// stream is dropped, which releases the underlying device or file.
pub struct InputStream {
    pub spec: WavSpec,
    pub samples: mpsc::UnboundedReceiver<Vec<i16>>,
    _release: Box<dyn Send>,
}

impl InputStream {
    /// `release` is dropped together with the stream
    pub fn new(
        spec: WavSpec,
        samples: mpsc::UnboundedReceiver<Vec<i16>>,
        release: impl Send + 'static,
    ) -> Self {
        Self {
            spec,
            samples,
            _release: Box::new(release),
        }
    }
}

impl std::fmt::Debug for InputStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputStream")
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}

/// Something that can be opened for capture
pub trait AudioSource: Send {
    fn open(&mut self) -> Result<InputStream, RelayError>;
}

/// Replays a WAV file at real-time pace, as if it were a microphone
#[derive(Debug, Clone)]
pub struct WavFileSource {
    path: PathBuf,
}

/// Pacing granularity of file playback
const STEPS_PER_SECOND: u32 = 10;

impl WavFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_samples(&self) -> Result<(WavSpec, Vec<i16>), RelayError> {
        let reader = WavReader::open(&self.path).map_err(|e| {
            RelayError::Input(format!("failed to open {}: {e}", self.path.display()))
        })?;
        let spec = reader.spec();

        let samples: Vec<i16> = match (spec.sample_format, spec.bits_per_sample) {
            (SampleFormat::Int, 16) => reader.into_samples::<i16>().collect::<Result<_, _>>()?,
            (SampleFormat::Float, 32) => reader
                .into_samples::<f32>()
                .map(|s| s.map(float_to_i16))
                .collect::<Result<_, _>>()?,
            (format, bits) => {
                return Err(RelayError::Input(format!(
                    "unsupported WAV encoding: {format:?} at {bits} bits"
                )))
            }
        };

        let spec = WavSpec {
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
            ..spec
        };
        Ok((spec, samples))
    }
}

#[allow(clippy::cast_possible_truncation)]
fn float_to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16
}

impl AudioSource for WavFileSource {
    /// Spawns the pacing task, so this must be called inside a tokio runtime
    fn open(&mut self) -> Result<InputStream, RelayError> {
        let (spec, samples) = self.read_samples()?;
        let frames_per_step = (spec.sample_rate / STEPS_PER_SECOND).max(1) as usize;
        let per_step = frames_per_step * usize::from(spec.channels);

        tracing::info!(
            path = %self.path.display(),
            sample_rate = spec.sample_rate,
            channels = spec.channels,
            samples = samples.len(),
            "Opened WAV file source"
        );

        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        tokio::spawn(async move {
            let mut ticker =
                tokio::time::interval(Duration::from_secs(1) / STEPS_PER_SECOND);
            for chunk in samples.chunks(per_step) {
                tokio::select! {
                    () = token.cancelled() => return,
                    _ = ticker.tick() => {}
                }
                if tx.send(chunk.to_vec()).is_err() {
                    return;
                }
            }
            tracing::debug!("WAV file source exhausted");
        });

        Ok(InputStream::new(spec, rx, cancel.drop_guard()))
    }
}

#[cfg(feature = "mic")]
pub use mic::MicSource;

#[cfg(feature = "mic")]
mod mic {
    use super::{float_to_i16, AudioSource, InputStream, RelayError};
    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use hound::{SampleFormat, WavSpec};
    use tokio::sync::mpsc;

    /// Captures from the default input device
    #[derive(Debug, Default)]
    pub struct MicSource;

    impl AudioSource for MicSource {
        fn open(&mut self) -> Result<InputStream, RelayError> {
            let host = cpal::default_host();
            let device = host
                .default_input_device()
                .ok_or_else(|| RelayError::Input("no input device available".to_string()))?;
            let config: cpal::StreamConfig = device
                .default_input_config()
                .map_err(|e| RelayError::Input(format!("failed to get input config: {e}")))?
                .into();

            tracing::info!(
                device = %device.name().unwrap_or_else(|_| "Unknown".to_string()),
                sample_rate = config.sample_rate.0,
                channels = config.channels,
                "Using input device"
            );

            let spec = WavSpec {
                channels: config.channels,
                sample_rate: config.sample_rate.0,
                bits_per_sample: 16,
                sample_format: SampleFormat::Int,
            };

            // cpal streams are not Send on every platform, so the stream
            // lives on its own thread until the release sender is dropped.
            let (tx, rx) = mpsc::unbounded_channel();
            let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();
            let (ready_tx, ready_rx) = std::sync::mpsc::channel();
            std::thread::spawn(move || {
                let stream = device.build_input_stream(
                    &config,
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        let _ = tx.send(data.iter().copied().map(float_to_i16).collect());
                    },
                    |err| tracing::error!(error = %err, "Audio input stream error"),
                    None,
                );
                let stream = match stream {
                    Ok(stream) => stream,
                    Err(e) => {
                        let _ = ready_tx.send(Err(format!("failed to build input stream: {e}")));
                        return;
                    }
                };
                if let Err(e) = stream.play() {
                    let _ = ready_tx.send(Err(format!("failed to start input stream: {e}")));
                    return;
                }
                let _ = ready_tx.send(Ok(()));
                // Blocks until the InputStream is dropped
                let _ = release_rx.recv();
                drop(stream);
                tracing::info!("Stopped audio recording");
            });

            ready_rx
                .recv()
                .map_err(|_| RelayError::Input("input thread exited".to_string()))?
                .map_err(RelayError::Input)?;

            Ok(InputStream::new(spec, rx, release_tx))
        }
    }
}
