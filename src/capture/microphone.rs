use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use parking_lot::Mutex;

use super::{encode_wav, AudioCapture, CaptureError, VoicePayload};

const DEFAULT_MAX_RECORD_SECONDS: u32 = 60;
const I16_SCALE: f32 = 1.0 / i16::MAX as f32;
const U16_SCALE: f32 = 1.0 / u16::MAX as f32;
const U16_RANGE: f32 = 2.0;
const U16_OFFSET: f32 = 1.0;

#[derive(Clone)]
struct SampleBuffer {
    samples: Arc<Mutex<Vec<f32>>>,
    channels: usize,
    max_samples: usize,
}

impl SampleBuffer {
    fn push_f32(&self, input: &[f32]) {
        let iter = input.iter().step_by(self.channels).copied();
        self.push_samples(iter);
    }

    fn push_i16(&self, input: &[i16]) {
        let iter = input
            .iter()
            .step_by(self.channels)
            .map(|s| *s as f32 * I16_SCALE);
        self.push_samples(iter);
    }

    fn push_u16(&self, input: &[u16]) {
        let iter = input
            .iter()
            .step_by(self.channels)
            .map(|s| (*s as f32 * U16_SCALE) * U16_RANGE - U16_OFFSET);
        self.push_samples(iter);
    }

    fn push_samples<I>(&self, input: I)
    where
        I: Iterator<Item = f32>,
    {
        let mut guard = self.samples.lock();
        let remaining = self.max_samples.saturating_sub(guard.len());
        if remaining == 0 {
            return;
        }
        guard.extend(input.take(remaining));
    }
}

/// Records mono audio from the default input device.
///
/// The device is opened on `start`, so a missing microphone or a denied
/// permission surfaces there rather than at construction.
pub struct MicrophoneRecorder {
    max_record_seconds: u32,
    samples: Arc<Mutex<Vec<f32>>>,
    stream: Option<cpal::Stream>,
    sample_rate: u32,
}

impl MicrophoneRecorder {
    pub fn new(max_record_seconds: u32) -> Self {
        Self {
            max_record_seconds: if max_record_seconds == 0 {
                DEFAULT_MAX_RECORD_SECONDS
            } else {
                max_record_seconds
            },
            samples: Arc::new(Mutex::new(Vec::new())),
            stream: None,
            sample_rate: 0,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.stream.is_some()
    }

    fn open_stream(&mut self) -> Result<cpal::Stream, CaptureError> {
        let host = cpal::default_host();
        let device = host.default_input_device().ok_or(CaptureError::NoDevice)?;
        let supported = device
            .default_input_config()
            .map_err(|e| CaptureError::PermissionDenied(e.to_string()))?;
        let sample_format = supported.sample_format();
        let config: cpal::StreamConfig = supported.into();
        let channels = usize::from(config.channels);
        if channels == 0 {
            return Err(CaptureError::Stream(
                "input device reported zero channels".to_string(),
            ));
        }
        self.sample_rate = config.sample_rate.0;
        let buffer = SampleBuffer {
            samples: Arc::clone(&self.samples),
            channels,
            max_samples: max_samples(self.sample_rate, self.max_record_seconds),
        };
        let result = match sample_format {
            cpal::SampleFormat::F32 => device.build_input_stream(
                &config,
                move |data: &[f32], _| buffer.push_f32(data),
                log_stream_error,
                None,
            ),
            cpal::SampleFormat::I16 => device.build_input_stream(
                &config,
                move |data: &[i16], _| buffer.push_i16(data),
                log_stream_error,
                None,
            ),
            cpal::SampleFormat::U16 => device.build_input_stream(
                &config,
                move |data: &[u16], _| buffer.push_u16(data),
                log_stream_error,
                None,
            ),
            other => {
                return Err(CaptureError::Stream(format!(
                    "unsupported input sample format {other:?}"
                )))
            }
        };
        result.map_err(|e| match e {
            cpal::BuildStreamError::DeviceNotAvailable => CaptureError::NoDevice,
            other => CaptureError::PermissionDenied(other.to_string()),
        })
    }

    fn take_samples(&self) -> Vec<f32> {
        let mut guard = self.samples.lock();
        std::mem::take(&mut *guard)
    }
}

impl AudioCapture for MicrophoneRecorder {
    fn start(&mut self) -> Result<(), CaptureError> {
        if self.stream.is_some() {
            return Err(CaptureError::AlreadyRecording);
        }
        self.samples.lock().clear();
        let stream = self.open_stream()?;
        stream
            .play()
            .map_err(|e| CaptureError::Stream(e.to_string()))?;
        log::debug!("microphone recording started at {} Hz", self.sample_rate);
        self.stream = Some(stream);
        Ok(())
    }

    fn stop(&mut self) -> VoicePayload {
        self.stream.take();
        let samples = self.take_samples();
        log::debug!("microphone recording stopped with {} samples", samples.len());
        match encode_wav(&samples, self.sample_rate.max(1)) {
            Ok(bytes) => VoicePayload::wav(bytes),
            Err(err) => {
                log::error!("dropping recording after encode failure: {err}");
                VoicePayload::empty_wav()
            }
        }
    }
}

fn max_samples(sample_rate: u32, seconds: u32) -> usize {
    let rate = usize::try_from(sample_rate).unwrap_or(usize::MAX);
    let secs = usize::try_from(seconds).unwrap_or(usize::MAX);
    rate.saturating_mul(secs)
}

fn log_stream_error(err: cpal::StreamError) {
    log::warn!("audio input error: {err}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_keeps_first_channel_and_caps_length() {
        let samples = Arc::new(Mutex::new(Vec::new()));
        let buffer = SampleBuffer {
            samples: Arc::clone(&samples),
            channels: 2,
            max_samples: 3,
        };
        buffer.push_f32(&[0.1, 9.0, 0.2, 9.0]);
        buffer.push_i16(&[i16::MAX, 0, 0, 0]);
        assert_eq!(*samples.lock(), vec![0.1, 0.2, 1.0]);
    }

    #[test]
    fn stop_without_start_yields_empty_wav() {
        let mut recorder = MicrophoneRecorder::new(5);
        let payload = recorder.stop();
        assert_eq!(payload.mime_type(), "audio/wav");
        assert!(!payload.is_empty());
        assert!(!recorder.is_recording());
    }

    #[test]
    fn zero_duration_falls_back_to_default() {
        let recorder = MicrophoneRecorder::new(0);
        assert_eq!(recorder.max_record_seconds, DEFAULT_MAX_RECORD_SECONDS);
        assert_eq!(max_samples(16_000, 2), 32_000);
    }
}
