//! Audio output using cpal
//!
//! One stream per playback request. The previous stream is dropped only once
//! its replacement is playing.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Stream, StreamConfig};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::audio::{AudioConverter, DecodedAudio};
use crate::error::{CwavError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkStatus {
    Playing,
    Idle,
    Failed(String),
}

/// Audio output subsystem seen by the player
pub trait AudioSink {
    /// (Re)initialize the output and start playing `audio`, replacing anything already playing.
    ///
    /// On error the output is left as it was.
    fn start(&mut self, audio: &DecodedAudio, volume: f32) -> Result<()>;

    fn status(&self) -> SinkStatus;
}

/// Samples shared with the audio callback
struct PlaybackBuffer {
    samples: Vec<f32>,
    position: AtomicUsize,
    error: Mutex<Option<String>>,
}

impl PlaybackBuffer {
    fn new(samples: Vec<f32>) -> Self {
        Self {
            samples,
            position: AtomicUsize::new(0),
            error: Mutex::new(None),
        }
    }

    fn fill<T: cpal::SizedSample + cpal::FromSample<f32>>(&self, data: &mut [T]) {
        let start = self.position.load(Ordering::Acquire).min(self.samples.len());
        let available = &self.samples[start..];
        let count = available.len().min(data.len());

        for (out, &sample) in data.iter_mut().zip(available) {
            *out = T::from_sample(sample);
        }
        for out in data[count..].iter_mut() {
            *out = T::from_sample(0.0f32);
        }
        self.position.store(start + count, Ordering::Release);
    }

    fn set_error(&self, message: String) {
        if let Ok(mut slot) = self.error.lock() {
            slot.get_or_insert(message);
        }
    }

    fn status(&self) -> SinkStatus {
        if let Some(message) = self.error.lock().ok().and_then(|slot| slot.clone()) {
            return SinkStatus::Failed(message);
        }
        if self.position.load(Ordering::Acquire) >= self.samples.len() {
            SinkStatus::Idle
        } else {
            SinkStatus::Playing
        }
    }
}

/// Default output device through cpal; nothing is opened until the first `start`
#[derive(Default)]
pub struct CpalOutput {
    stream: Option<Stream>,
    buffer: Option<Arc<PlaybackBuffer>>,
}

impl CpalOutput {
    pub fn new() -> Self {
        Self::default()
    }

    fn build_stream<T: cpal::SizedSample + cpal::FromSample<f32>>(
        device: &cpal::Device,
        config: &StreamConfig,
        buffer: Arc<PlaybackBuffer>,
    ) -> Result<Stream> {
        let data_buffer = buffer.clone();
        device
            .build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    data_buffer.fill(data);
                },
                move |err| {
                    log::error!("Audio output error: {}", err);
                    buffer.set_error(err.to_string());
                },
                None,
            )
            .map_err(|e| CwavError::playback(format!("Failed to build output stream: {}", e)))
    }
}

impl AudioSink for CpalOutput {
    fn start(&mut self, audio: &DecodedAudio, volume: f32) -> Result<()> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| CwavError::playback("No output device available"))?;
        let supported = device
            .default_output_config()
            .map_err(|e| CwavError::playback(format!("Failed to get default output config: {}", e)))?;

        let sample_rate = supported.sample_rate().0;
        let channels = supported.channels();
        log::debug!(
            "Output device: {} ({} Hz, {} ch, {:?})",
            device.name().unwrap_or_else(|_| "unknown".into()),
            sample_rate,
            channels,
            supported.sample_format()
        );

        let samples = AudioConverter::prepare_for_output(audio, sample_rate, channels, volume)?;
        let buffer = Arc::new(PlaybackBuffer::new(samples));
        let config: StreamConfig = supported.config();

        let stream = match supported.sample_format() {
            cpal::SampleFormat::F32 => Self::build_stream::<f32>(&device, &config, buffer.clone())?,
            cpal::SampleFormat::I16 => Self::build_stream::<i16>(&device, &config, buffer.clone())?,
            cpal::SampleFormat::U16 => Self::build_stream::<u16>(&device, &config, buffer.clone())?,
            cpal::SampleFormat::I32 => Self::build_stream::<i32>(&device, &config, buffer.clone())?,
            format => {
                return Err(CwavError::playback(format!("Unsupported sample format: {:?}", format)));
            }
        };

        stream
            .play()
            .map_err(|e| CwavError::playback(format!("Failed to start stream: {}", e)))?;

        if self.stream.replace(stream).is_some() {
            log::debug!("Previous audio stream replaced");
        }
        self.buffer = Some(buffer);
        Ok(())
    }

    fn status(&self) -> SinkStatus {
        match &self.buffer {
            Some(buffer) => buffer.status(),
            None => SinkStatus::Idle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_drains_then_idles() {
        let buffer = PlaybackBuffer::new(vec![0.5, -0.5, 0.25]);
        assert_eq!(buffer.status(), SinkStatus::Playing);

        let mut out = [1.0f32; 2];
        buffer.fill(&mut out);
        assert_eq!(out, [0.5, -0.5]);
        assert_eq!(buffer.status(), SinkStatus::Playing);

        let mut out = [1.0f32; 4];
        buffer.fill(&mut out);
        assert_eq!(out, [0.25, 0.0, 0.0, 0.0]);
        assert_eq!(buffer.status(), SinkStatus::Idle);
    }

    #[test]
    fn test_buffer_converts_sample_type() {
        let buffer = PlaybackBuffer::new(vec![0.5, -0.5]);
        let mut out = [0i16; 2];
        buffer.fill(&mut out);
        assert_eq!(out[0], 16384);
        assert_eq!(out[1], -16384);
    }

    #[test]
    fn test_first_error_is_kept() {
        let buffer = PlaybackBuffer::new(vec![0.0; 8]);
        buffer.set_error("device unplugged".into());
        buffer.set_error("second".into());
        assert_eq!(buffer.status(), SinkStatus::Failed("device unplugged".into()));
    }

    #[test]
    fn test_unstarted_output_is_idle() {
        let output = CpalOutput::new();
        assert_eq!(output.status(), SinkStatus::Idle);
    }
}
