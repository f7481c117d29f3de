//! In-memory WAV decoding

use std::io::Cursor;

use hound::{SampleFormat, WavReader};
use ndarray::Array2;

use crate::error::{CwavError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Int8,
    Int16,
    Int24,
    Int32,
    Float32,
}

impl AudioFormat {
    pub fn name(&self) -> &'static str {
        match self {
            AudioFormat::Int8 => "int8",
            AudioFormat::Int16 => "int16",
            AudioFormat::Int24 => "int24",
            AudioFormat::Int32 => "int32",
            AudioFormat::Float32 => "float32",
        }
    }

    pub fn bits_per_sample(&self) -> u16 {
        match self {
            AudioFormat::Int8 => 8,
            AudioFormat::Int16 => 16,
            AudioFormat::Int24 => 24,
            AudioFormat::Int32 | AudioFormat::Float32 => 32,
        }
    }

    fn from_spec(spec: &hound::WavSpec) -> Result<Self> {
        match (spec.sample_format, spec.bits_per_sample) {
            (SampleFormat::Int, 8) => Ok(AudioFormat::Int8),
            (SampleFormat::Int, 16) => Ok(AudioFormat::Int16),
            (SampleFormat::Int, 24) => Ok(AudioFormat::Int24),
            (SampleFormat::Int, 32) => Ok(AudioFormat::Int32),
            (SampleFormat::Float, 32) => Ok(AudioFormat::Float32),
            (format, bits) => Err(CwavError::audio(format!(
                "Unsupported sample format: {:?} {}-bit", format, bits
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AudioHeader {
    pub sample_rate: u32,
    pub channels: u16,
    pub format: AudioFormat,
    pub total_frames: usize,
    pub duration: f64,
}

impl AudioHeader {
    pub fn new(sample_rate: u32, channels: u16, format: AudioFormat, total_frames: usize) -> Self {
        let duration = if sample_rate == 0 { 0.0 } else { total_frames as f64 / sample_rate as f64 };
        Self {
            sample_rate,
            channels,
            format,
            total_frames,
            duration,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(CwavError::audio("Sample rate cannot be 0"));
        }
        if self.channels == 0 {
            return Err(CwavError::audio("Channel count cannot be 0"));
        }
        Ok(())
    }
}

/// Decoded PCM: one row per frame, one column per channel, samples in [-1.0, 1.0]
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    pub header: AudioHeader,
    pub frames: Array2<f32>,
}

impl DecodedAudio {
    /// Decode a complete WAV file held in memory
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = WavReader::new(Cursor::new(bytes))
            .map_err(|e| CwavError::audio(format!("Cannot create WAV reader: {}", e)))?;

        let spec = reader.spec();
        let format = AudioFormat::from_spec(&spec)?;
        let channels = spec.channels as usize;

        let samples: Vec<f32> = match format {
            AudioFormat::Float32 => reader
                .samples::<f32>()
                .collect::<std::result::Result<_, _>>()
                .map_err(|e| CwavError::audio(format!("Failed to read sample: {}", e)))?,
            _ => {
                let scale = 1.0 / (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 * scale))
                    .collect::<std::result::Result<_, _>>()
                    .map_err(|e| CwavError::audio(format!("Failed to read sample: {}", e)))?
            }
        };

        let header = AudioHeader::new(spec.sample_rate, spec.channels, format, samples.len() / channels.max(1));
        header.validate()?;

        Self::from_interleaved(header, samples)
    }

    /// Build from interleaved samples; a trailing partial frame is dropped
    pub fn from_interleaved(header: AudioHeader, mut samples: Vec<f32>) -> Result<Self> {
        let channels = header.channels as usize;
        if channels == 0 {
            return Err(CwavError::audio("Channel count cannot be 0"));
        }
        let frames = samples.len() / channels;
        samples.truncate(frames * channels);
        let frames = Array2::from_shape_vec((frames, channels), samples)
            .map_err(|e| CwavError::audio(format!("Invalid sample layout: {}", e)))?;
        let header = AudioHeader::new(header.sample_rate, header.channels, header.format, frames.nrows());
        Ok(Self { header, frames })
    }

    pub fn sample_rate(&self) -> u32 {
        self.header.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.header.channels
    }

    pub fn total_frames(&self) -> usize {
        self.frames.nrows()
    }

    pub fn duration(&self) -> f64 {
        self.header.duration
    }

    pub fn format(&self) -> AudioFormat {
        self.header.format
    }

    pub fn is_empty(&self) -> bool {
        self.frames.nrows() == 0
    }

    /// Row-major interleaved copy of the frames
    pub fn to_interleaved(&self) -> Vec<f32> {
        self.frames.iter().copied().collect()
    }
}
