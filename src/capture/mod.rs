//! Voice capture seam.
//!
//! A capture device is started, accumulates audio, and on stop yields one
//! finalized [`VoicePayload`]. Partial chunks never leave the device.

#[cfg(feature = "microphone")]
mod microphone;

use std::io::Cursor;
use std::path::Path;

use thiserror::Error;

#[cfg(feature = "microphone")]
pub use microphone::MicrophoneRecorder;

const WAV_MIME: &str = "audio/wav";
const WAV_FILENAME: &str = "voice.wav";
const WAV_BITS: u16 = 32;
const WAV_CHANNELS: u16 = 1;
const EMPTY_WAV_SAMPLE_RATE: u32 = 16_000;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("microphone permission denied: {0}")]
    PermissionDenied(String),
    #[error("no input device available")]
    NoDevice,
    #[error("audio capture unavailable: {0}")]
    Unavailable(String),
    #[error("audio stream error: {0}")]
    Stream(String),
    #[error("wav encoding failed: {0}")]
    Encode(String),
    #[error("recording already started")]
    AlreadyRecording,
    #[error("failed to read recording: {0}")]
    Io(#[from] std::io::Error),
}

/// A finalized audio recording ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoicePayload {
    bytes: Vec<u8>,
    mime_type: String,
    file_name: String,
}

impl VoicePayload {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
            file_name: file_name.into(),
        }
    }

    /// A WAV recording named `voice.wav`.
    pub fn wav(bytes: Vec<u8>) -> Self {
        Self::new(bytes, WAV_MIME, WAV_FILENAME)
    }

    /// A WAV container holding zero samples.
    pub fn empty_wav() -> Self {
        let bytes = encode_wav(&[], EMPTY_WAV_SAMPLE_RATE).unwrap_or_default();
        Self::wav(bytes)
    }

    /// Reads a recording from disk, guessing the MIME type from the extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CaptureError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(WAV_FILENAME)
            .to_string();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        Ok(Self::new(bytes, mime_for_extension(extension.as_deref()), file_name))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

fn mime_for_extension(extension: Option<&str>) -> &'static str {
    match extension {
        Some("mp3") => "audio/mpeg",
        Some("ogg") | Some("oga") => "audio/ogg",
        Some("webm") => "audio/webm",
        Some("m4a") | Some("mp4") => "audio/mp4",
        Some("flac") => "audio/flac",
        _ => WAV_MIME,
    }
}

/// Encodes mono f32 samples as a 32-bit float WAV file.
pub fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, CaptureError> {
    let spec = hound::WavSpec {
        channels: WAV_CHANNELS,
        sample_rate,
        bits_per_sample: WAV_BITS,
        sample_format: hound::SampleFormat::Float,
    };
    let mut cursor = Cursor::new(Vec::new());
    let mut writer =
        hound::WavWriter::new(&mut cursor, spec).map_err(|e| CaptureError::Encode(e.to_string()))?;
    for sample in samples {
        writer
            .write_sample(*sample)
            .map_err(|e| CaptureError::Encode(e.to_string()))?;
    }
    writer
        .finalize()
        .map_err(|e| CaptureError::Encode(e.to_string()))?;
    Ok(cursor.into_inner())
}

/// A device that records one utterance at a time.
pub trait AudioCapture {
    /// Opens the device and begins accumulating audio.
    fn start(&mut self) -> Result<(), CaptureError>;

    /// Stops the device and returns everything captured since `start`.
    ///
    /// Always yields a payload; a recording with no audio is an empty WAV.
    fn stop(&mut self) -> VoicePayload;
}

/// Capture backend used when no microphone support is compiled in.
#[derive(Debug, Default)]
pub struct UnavailableCapture;

impl AudioCapture for UnavailableCapture {
    fn start(&mut self) -> Result<(), CaptureError> {
        Err(CaptureError::Unavailable(
            "built without the `microphone` feature".to_string(),
        ))
    }

    fn stop(&mut self) -> VoicePayload {
        VoicePayload::empty_wav()
    }
}
