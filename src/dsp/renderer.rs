//! Offline renderer: drives the signal graph to completion and serializes
//! the result to a WAV byte buffer (16-bit PCM).

use std::sync::Arc;

use log::debug;
use rand::Rng;

use crate::error::RenderError;
use crate::params::EffectParams;
use crate::source::SourceAudio;

use super::BLOCK_SIZE;
use super::graph::SignalGraph;

/// The materialized output of an offline render: same channel count and
/// sample rate as the source. Samples may exceed [-1, 1] from gain
/// summation; they are clamped at encode time, not here.
#[derive(Debug, Clone)]
pub struct RenderedBuffer {
    pub sample_rate: u32,
    pub channels: Vec<Vec<f32>>,
}

impl RenderedBuffer {
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn frames(&self) -> usize {
        self.channels.first().map_or(0, |c| c.len())
    }
}

/// Render the full effect offline. The output length is fixed to the
/// original source frame count: at speed < 1 the stretched signal is
/// truncated to fit, at speed > 1 the tail is silence. The export is sized
/// before rendering so the header never needs patching.
pub fn render<R: Rng>(
    source: &Arc<SourceAudio>,
    params: &EffectParams,
    rng: &mut R,
) -> Result<RenderedBuffer, RenderError> {
    params.validate()?;

    let frames = source.frames();
    let channel_count = source.channel_count();
    let mut graph = SignalGraph::build(Arc::clone(source), params, false, 0.0, rng)?;

    let mut channels = vec![vec![0.0f32; frames]; channel_count];
    let mut block = vec![vec![0.0f32; BLOCK_SIZE]; channel_count];
    let mut offset = 0;
    while offset < frames {
        graph.process_block(&mut block);
        let n = BLOCK_SIZE.min(frames - offset);
        for (ch, data) in channels.iter_mut().enumerate() {
            data[offset..offset + n].copy_from_slice(&block[ch][..n]);
        }
        offset += n;
    }

    debug!(
        "rendered {frames} frames x {channel_count} ch at {} Hz (speed {}, wet {}, decay {}s)",
        source.sample_rate(),
        params.speed,
        params.reverb_wet,
        params.reverb_decay
    );

    Ok(RenderedBuffer {
        sample_rate: source.sample_rate(),
        channels,
    })
}

/// Render and encode in one step.
pub fn render_wav<R: Rng>(
    source: &Arc<SourceAudio>,
    params: &EffectParams,
    rng: &mut R,
) -> Result<Vec<u8>, RenderError> {
    let buffer = render(source, params, rng)?;
    Ok(encode_wav(&buffer))
}

/// Encode a rendered buffer as a canonical 44-byte-header WAV file:
/// RIFF/WAVE with a 16-byte `fmt ` chunk (integer PCM, 16 bits) and one
/// `data` chunk of interleaved little-endian samples.
pub fn encode_wav(buffer: &RenderedBuffer) -> Vec<u8> {
    let channels = buffer.channel_count() as u16;
    let sample_rate = buffer.sample_rate;
    let bits_per_sample: u16 = 16;
    let byte_rate = sample_rate * channels as u32 * (bits_per_sample as u32 / 8);
    let block_align = channels * (bits_per_sample / 8);
    let data_size = (buffer.frames() * buffer.channel_count() * 2) as u32;
    let file_size = 36 + data_size;

    let mut buf = Vec::with_capacity(44 + data_size as usize);

    // RIFF header
    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&file_size.to_le_bytes());
    buf.extend_from_slice(b"WAVE");

    // fmt chunk
    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes()); // chunk size
    buf.extend_from_slice(&1u16.to_le_bytes()); // PCM format
    buf.extend_from_slice(&channels.to_le_bytes());
    buf.extend_from_slice(&sample_rate.to_le_bytes());
    buf.extend_from_slice(&byte_rate.to_le_bytes());
    buf.extend_from_slice(&block_align.to_le_bytes());
    buf.extend_from_slice(&bits_per_sample.to_le_bytes());

    // data chunk
    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_size.to_le_bytes());
    for frame in 0..buffer.frames() {
        for channel in &buffer.channels {
            buf.extend_from_slice(&quantize_i16(channel[frame]).to_le_bytes());
        }
    }

    buf
}

/// Clamp to [-1, 1] and quantize with the asymmetric full-scale mapping:
/// negative values scale by 32768 (so -1.0 reaches -32768), non-negative
/// values by 32767.
#[inline]
fn quantize_i16(sample: f32) -> i16 {
    let s = sample.clamp(-1.0, 1.0);
    if s < 0.0 {
        (s * 32768.0) as i16
    } else {
        (s * 32767.0) as i16
    }
}
