//! Wet-path convolution stage.
//!
//! Uniform partitioned overlap-add convolution: the impulse response is split
//! into block-sized partitions stored as half-spectra, each input block is
//! pushed onto a frequency-delay line, and the output block is the inverse
//! transform of the multiply-accumulated spectra plus the carry from the
//! previous block. The impulse can be swapped while running without
//! resetting the carry, so a decay change never rebuilds the graph.

use std::collections::VecDeque;
use std::sync::Arc;

use realfft::num_complex::Complex;
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};

use super::BLOCK_SIZE;
use super::impulse::ImpulseResponse;

const FFT_SIZE: usize = BLOCK_SIZE * 2;
const NUM_BINS: usize = FFT_SIZE / 2 + 1;

/// Per-channel convolution state.
struct ChannelState {
    /// Frequency-delay line, most recent input block spectrum first.
    fdl: VecDeque<Vec<Complex<f32>>>,
    /// Second half of the previous inverse transform, overlap-added into the
    /// next output block.
    carry: Vec<f32>,
}

pub struct Convolver {
    forward: Arc<dyn RealToComplex<f32>>,
    inverse: Arc<dyn ComplexToReal<f32>>,
    /// Partition spectra: `[channel][partition][bin]`. Channel i convolves
    /// against impulse channel min(i, 1), so mono sources use the left IR.
    partitions: Vec<Vec<Vec<Complex<f32>>>>,
    states: Vec<ChannelState>,
    fft_in: Vec<f32>,
    spectrum: Vec<Complex<f32>>,
    acc: Vec<Complex<f32>>,
    time_out: Vec<f32>,
}

impl Convolver {
    pub fn new(impulse: &ImpulseResponse, channel_count: usize) -> Self {
        let mut planner = RealFftPlanner::<f32>::new();
        let forward = planner.plan_fft_forward(FFT_SIZE);
        let inverse = planner.plan_fft_inverse(FFT_SIZE);

        let partitions: Vec<_> = (0..channel_count)
            .map(|ch| partition_spectra(impulse.channel(ch.min(1)), &forward))
            .collect();
        let states = (0..channel_count)
            .map(|_| ChannelState {
                fdl: VecDeque::new(),
                carry: vec![0.0; BLOCK_SIZE],
            })
            .collect();

        Convolver {
            forward,
            inverse,
            partitions,
            states,
            fft_in: vec![0.0; FFT_SIZE],
            spectrum: vec![Complex::new(0.0, 0.0); NUM_BINS],
            acc: vec![Complex::new(0.0, 0.0); NUM_BINS],
            time_out: vec![0.0; FFT_SIZE],
        }
    }

    /// Number of partitions per channel.
    pub fn partition_count(&self) -> usize {
        self.partitions.first().map_or(0, |p| p.len())
    }

    /// Replace the impulse response in place. The frequency-delay line and
    /// carry survive, so already-buffered input keeps flowing through the
    /// new response without a gap.
    pub fn set_impulse(&mut self, impulse: &ImpulseResponse) {
        for (ch, parts) in self.partitions.iter_mut().enumerate() {
            *parts = partition_spectra(impulse.channel(ch.min(1)), &self.forward);
        }
        let count = self.partition_count();
        for state in &mut self.states {
            state.fdl.truncate(count);
        }
    }

    /// Convolve one block of one channel. `input` and `output` are both
    /// `BLOCK_SIZE` frames.
    pub fn process_block(&mut self, channel: usize, input: &[f32], output: &mut [f32]) {
        debug_assert_eq!(input.len(), BLOCK_SIZE);
        debug_assert_eq!(output.len(), BLOCK_SIZE);

        self.fft_in[..BLOCK_SIZE].copy_from_slice(input);
        self.fft_in[BLOCK_SIZE..].fill(0.0);
        self.forward
            .process(&mut self.fft_in, &mut self.spectrum)
            .ok();

        let parts = &self.partitions[channel];
        let state = &mut self.states[channel];
        state.fdl.push_front(self.spectrum.clone());
        state.fdl.truncate(parts.len());

        for bin in self.acc.iter_mut() {
            *bin = Complex::new(0.0, 0.0);
        }
        for (block_spectrum, part) in state.fdl.iter().zip(parts) {
            for ((a, b), acc) in block_spectrum.iter().zip(part).zip(self.acc.iter_mut()) {
                *acc += *a * *b;
            }
        }

        // DC and Nyquist bins must stay purely real for the inverse transform
        self.acc[0].im = 0.0;
        self.acc[NUM_BINS - 1].im = 0.0;

        self.inverse.process(&mut self.acc, &mut self.time_out).ok();

        let scale = 1.0 / FFT_SIZE as f32;
        for i in 0..BLOCK_SIZE {
            output[i] = self.time_out[i] * scale + state.carry[i];
            state.carry[i] = self.time_out[BLOCK_SIZE + i] * scale;
        }
    }
}

/// Split an impulse channel into block-sized partitions and transform each
/// into a zero-padded half-spectrum.
fn partition_spectra(
    ir: &[f32],
    forward: &Arc<dyn RealToComplex<f32>>,
) -> Vec<Vec<Complex<f32>>> {
    ir.chunks(BLOCK_SIZE)
        .map(|segment| {
            let mut padded = vec![0.0f32; FFT_SIZE];
            padded[..segment.len()].copy_from_slice(segment);
            let mut spectrum = vec![Complex::new(0.0, 0.0); NUM_BINS];
            forward.process(&mut padded, &mut spectrum).ok();
            spectrum
        })
        .collect()
}
