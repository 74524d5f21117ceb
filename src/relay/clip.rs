//! Finished audio clips

use super::RelayError;
use chrono::{DateTime, Utc};
use hound::{WavSpec, WavWriter};
use std::io::Cursor;

/// Content type of every clip the relay produces
pub const WAV_CONTENT_TYPE: &str = "audio/wav";

/// One fixed-duration segment of captured audio, ready to send
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    pub bytes: Vec<u8>,
    pub size: usize,
    pub content_type: String,
    pub captured_at: DateTime<Utc>,
}

impl AudioClip {
    /// Encode interleaved 16-bit samples as a complete WAV file
    pub fn encode_wav(
        spec: WavSpec,
        samples: &[i16],
        captured_at: DateTime<Utc>,
    ) -> Result<Self, RelayError> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut cursor, spec)?;
            for &sample in samples {
                writer.write_sample(sample)?;
            }
            writer.finalize()?;
        }

        let bytes = cursor.into_inner();
        Ok(Self {
            size: bytes.len(),
            bytes,
            content_type: WAV_CONTENT_TYPE.to_string(),
            captured_at,
        })
    }
}
