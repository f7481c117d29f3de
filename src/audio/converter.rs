//! Audio Format Converter - adapts decoded audio to the output device

use ndarray::{Array1, Array2, ArrayView1};
use crate::audio::DecodedAudio;
use crate::error::{CwavError, Result};

pub struct AudioConverter;

impl AudioConverter {
    /// Convert sample rate using linear interpolation
    pub fn convert_sample_rate(audio: &DecodedAudio, target_sample_rate: u32) -> Result<DecodedAudio> {
        if target_sample_rate == 0 {
            return Err(CwavError::audio("Target sample rate cannot be 0"));
        }
        if audio.sample_rate() == target_sample_rate || audio.is_empty() {
            let mut same = audio.clone();
            same.header.sample_rate = target_sample_rate;
            return Ok(same);
        }

        let ratio = target_sample_rate as f64 / audio.sample_rate() as f64;
        let new_length = ((audio.total_frames() as f64 * ratio) as usize).max(1);

        let mut frames = Array2::zeros((new_length, audio.frames.ncols()));
        for (channel, column) in audio.frames.columns().into_iter().enumerate() {
            let resampled = Self::resample_channel(column, new_length, ratio)?;
            frames.column_mut(channel).assign(&resampled);
        }

        let mut new_audio = audio.clone();
        new_audio.header.sample_rate = target_sample_rate;
        new_audio.header.total_frames = new_length;
        new_audio.header.duration = new_length as f64 / target_sample_rate as f64;
        new_audio.frames = frames;
        Ok(new_audio)
    }

    /// Map channels to the device layout.
    ///
    /// Mono is copied to every output; many-to-mono averages; otherwise output
    /// channel `n` takes input channel `n % input_channels`.
    pub fn convert_channels(audio: &DecodedAudio, target_channels: u16) -> Result<DecodedAudio> {
        if target_channels == 0 {
            return Err(CwavError::audio("Target channel count cannot be 0"));
        }
        if audio.channels() == target_channels {
            return Ok(audio.clone());
        }

        let input = audio.frames.ncols();
        let target = target_channels as usize;
        let rows = audio.frames.nrows();

        let frames = if target == 1 {
            match audio.frames.mean_axis(ndarray::Axis(1)) {
                Some(mean) => mean.insert_axis(ndarray::Axis(1)),
                None => Array2::zeros((rows, 1)),
            }
        } else {
            let mut out = Array2::zeros((rows, target));
            for channel in 0..target {
                out.column_mut(channel).assign(&audio.frames.column(channel % input));
            }
            out
        };

        let mut new_audio = audio.clone();
        new_audio.header.channels = target_channels;
        new_audio.frames = frames;
        Ok(new_audio)
    }

    /// Resample, remap, apply volume and interleave for an output stream
    pub fn prepare_for_output(
        audio: &DecodedAudio,
        sample_rate: u32,
        channels: u16,
        volume: f32,
    ) -> Result<Vec<f32>> {
        let resampled = Self::convert_sample_rate(audio, sample_rate)?;
        let mapped = Self::convert_channels(&resampled, channels)?;
        Ok(mapped
            .frames
            .iter()
            .map(|&s| if s.is_finite() { (s * volume).clamp(-1.0, 1.0) } else { 0.0 })
            .collect())
    }

    fn resample_channel(data: ArrayView1<f32>, new_length: usize, ratio: f64) -> Result<Array1<f32>> {
        if data.is_empty() {
            return Err(CwavError::audio("Input data is empty"));
        }

        let old_length = data.len();
        let mut new_data = Array1::zeros(new_length);

        for i in 0..new_length {
            let old_pos = i as f64 / ratio;
            let old_index = old_pos.floor() as usize;
            let fraction = old_pos - old_index as f64;

            new_data[i] = if old_index >= old_length - 1 {
                data[old_length - 1]
            } else {
                data[old_index] + (data[old_index + 1] - data[old_index]) * fraction as f32
            };
        }

        Ok(new_data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{AudioFormat, AudioHeader};

    fn audio(sample_rate: u32, channels: u16, samples: Vec<f32>) -> DecodedAudio {
        let header = AudioHeader::new(sample_rate, channels, AudioFormat::Float32, 0);
        DecodedAudio::from_interleaved(header, samples).unwrap()
    }

    #[test]
    fn test_resample_same_rate() {
        let input = audio(16000, 1, vec![0.1, 0.2, 0.3]);
        let result = AudioConverter::convert_sample_rate(&input, 16000).unwrap();
        assert_eq!(result.sample_rate(), 16000);
        assert_eq!(result.total_frames(), 3);
    }

    #[test]
    fn test_resample_upsample() {
        let input = audio(8000, 1, vec![0.0, 1.0]);
        let result = AudioConverter::convert_sample_rate(&input, 16000).unwrap();
        assert_eq!(result.sample_rate(), 16000);
        assert_eq!(result.total_frames(), 4);
        assert!((result.frames[[1, 0]] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_mono_to_stereo() {
        let input = audio(8000, 1, vec![0.1, 0.2]);
        let result = AudioConverter::convert_channels(&input, 2).unwrap();
        assert_eq!(result.channels(), 2);
        assert_eq!(result.to_interleaved(), vec![0.1, 0.1, 0.2, 0.2]);
    }

    #[test]
    fn test_stereo_to_mono() {
        let input = audio(8000, 2, vec![0.2, 0.4, -1.0, 1.0]);
        let result = AudioConverter::convert_channels(&input, 1).unwrap();
        let samples = result.to_interleaved();
        assert!((samples[0] - 0.3).abs() < 1e-6);
        assert!(samples[1].abs() < 1e-6);
    }

    #[test]
    fn test_prepare_for_output_applies_volume() {
        let input = audio(8000, 1, vec![0.8, -0.8]);
        let out = AudioConverter::prepare_for_output(&input, 8000, 2, 0.5).unwrap();
        assert_eq!(out.len(), 4);
        assert!((out[0] - 0.4).abs() < 1e-6);
        assert!((out[3] + 0.4).abs() < 1e-6);
    }
}
