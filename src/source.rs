//! Source audio: the immutable decoded asset the whole session works from.

use crate::error::DecodeError;

/// A decoded audio asset: 1 or 2 planar channels of normalized f32 samples
/// at a fixed sample rate. Built once per user file selection and replaced
/// wholesale on the next one; never mutated in place.
#[derive(Debug, Clone)]
pub struct SourceAudio {
    sample_rate: u32,
    channels: Vec<Vec<f32>>,
}

impl SourceAudio {
    pub fn new(channels: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self, DecodeError> {
        if sample_rate == 0 {
            return Err(DecodeError::UnsupportedSampleRate(sample_rate));
        }
        if channels.is_empty() || channels.len() > 2 {
            return Err(DecodeError::UnsupportedChannelCount(channels.len() as u16));
        }
        let frames = channels[0].len();
        if frames == 0 {
            return Err(DecodeError::EmptySource);
        }
        if channels.iter().any(|c| c.len() != frames) {
            return Err(DecodeError::ChannelLengthMismatch);
        }
        Ok(SourceAudio {
            sample_rate,
            channels,
        })
    }

    /// Build from interleaved samples, as handed across the WASM boundary.
    pub fn from_interleaved(
        samples: &[f32],
        channel_count: u16,
        sample_rate: u32,
    ) -> Result<Self, DecodeError> {
        match channel_count {
            1 => Self::new(vec![samples.to_vec()], sample_rate),
            2 => {
                let mut left = Vec::with_capacity(samples.len() / 2);
                let mut right = Vec::with_capacity(samples.len() / 2);
                for frame in samples.chunks_exact(2) {
                    left.push(frame[0]);
                    right.push(frame[1]);
                }
                Self::new(vec![left, right], sample_rate)
            }
            n => Err(DecodeError::UnsupportedChannelCount(n)),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Number of sample frames per channel.
    pub fn frames(&self) -> usize {
        self.channels[0].len()
    }

    /// Duration in seconds at the native sample rate.
    pub fn duration(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }

    pub fn channel(&self, index: usize) -> &[f32] {
        &self.channels[index]
    }

    /// Read a sample with linear interpolation at a fractional frame position.
    /// Positions outside the buffer read as silence.
    pub fn sample_at(&self, channel: usize, position: f64) -> f32 {
        let data = &self.channels[channel];
        if position < 0.0 {
            return 0.0;
        }

        let idx = position as usize;
        if idx >= data.len() - 1 {
            return if idx < data.len() { data[idx] } else { 0.0 };
        }

        let frac = (position - idx as f64) as f32;
        data[idx] * (1.0 - frac) + data[idx + 1] * frac
    }
}
