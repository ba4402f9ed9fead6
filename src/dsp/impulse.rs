//! Impulse response synthesis.
//!
//! The reverb character is white noise shaped by a power-law decay envelope:
//! sample j of each channel is `uniform(-1, 1) * (1 - j/len)^2.5`. No
//! frequency-dependent filtering is applied; the exponent is the whole sound.

use rand::Rng;

use crate::error::RenderError;

/// Envelope exponent. Chosen by ear; changing it changes the reverb tail.
const DECAY_EXPONENT: f32 = 2.5;

/// A synthesized stereo impulse response.
#[derive(Debug, Clone)]
pub struct ImpulseResponse {
    pub sample_rate: u32,
    pub left: Vec<f32>,
    pub right: Vec<f32>,
}

impl ImpulseResponse {
    /// Samples per channel.
    pub fn len(&self) -> usize {
        self.left.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    pub fn channel(&self, index: usize) -> &[f32] {
        if index == 0 { &self.left } else { &self.right }
    }
}

/// The decay envelope scalar at sample `j` of `len`: 1.0 at the first sample,
/// monotonically non-increasing down to ~0.0 at the last.
#[inline]
fn decay_envelope(j: usize, len: usize) -> f32 {
    (1.0 - j as f32 / len as f32).powf(DECAY_EXPONENT)
}

/// Synthesize a stereo impulse response of `round(sample_rate * decay)` samples
/// per channel, noise drawn independently per channel and per sample.
///
/// Pure in (decay, sample_rate, rng): a seeded rng reproduces the buffer
/// exactly, which is what makes offline renders testable byte-for-byte.
pub fn synthesize<R: Rng>(
    decay_seconds: f32,
    sample_rate: u32,
    rng: &mut R,
) -> Result<ImpulseResponse, RenderError> {
    if !decay_seconds.is_finite() || decay_seconds <= 0.0 {
        return Err(RenderError::InvalidDecay(decay_seconds));
    }

    let len = ((sample_rate as f64 * decay_seconds as f64).round() as usize).max(1);

    let mut channels = [Vec::with_capacity(len), Vec::with_capacity(len)];
    for channel in &mut channels {
        for j in 0..len {
            let noise: f32 = rng.gen_range(-1.0..1.0);
            channel.push(noise * decay_envelope(j, len));
        }
    }
    let [left, right] = channels;

    Ok(ImpulseResponse {
        sample_rate,
        left,
        right,
    })
}
