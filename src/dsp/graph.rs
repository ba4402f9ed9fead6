//! The wet/dry signal graph.
//!
//! One source feeds two branches: a dry branch with gain `1 - wet`, and a
//! convolution branch with gain `wet`. Both sum into a master stage with
//! fixed unit gain with no normalization or limiting, so summed samples may
//! leave [-1, 1]; the WAV encoder clamps at quantization time.
//!
//! A graph instance serves exactly one start-to-completion run. There is no
//! restart: pausing tears the instance down and resuming builds a new one.
//! Speed and wet level can be mutated on a running instance, and a decay
//! change swaps only the impulse response inside the convolution stage.

use std::sync::Arc;

use rand::Rng;

use crate::error::RenderError;
use crate::params::EffectParams;
use crate::source::SourceAudio;

use super::BLOCK_SIZE;
use super::convolver::Convolver;
use super::impulse::{self, ImpulseResponse};

/// Master stage gain. The sum of the branches is passed through unscaled.
const MASTER_GAIN: f32 = 1.0;

pub struct SignalGraph {
    source: Arc<SourceAudio>,
    /// Fractional read position in source frames, shared across channels.
    position: f64,
    speed: f64,
    looping: bool,
    dry_gain: f32,
    wet_gain: f32,
    convolver: Convolver,
    dry_block: Vec<Vec<f32>>,
    wet_block: Vec<f32>,
    source_done: bool,
}

impl SignalGraph {
    /// Wire a fresh graph: validates the parameters, synthesizes a new
    /// impulse response from `rng`, and places the read head at
    /// `offset_seconds`. Live instances loop; offline instances run the
    /// source once and then report `finished`.
    pub fn build<R: Rng>(
        source: Arc<SourceAudio>,
        params: &EffectParams,
        looping: bool,
        offset_seconds: f64,
        rng: &mut R,
    ) -> Result<Self, RenderError> {
        params.validate()?;
        let impulse = impulse::synthesize(params.reverb_decay, source.sample_rate(), rng)?;
        let convolver = Convolver::new(&impulse, source.channel_count());

        let channel_count = source.channel_count();
        let position = offset_seconds.max(0.0) * source.sample_rate() as f64;

        Ok(SignalGraph {
            position,
            speed: params.speed as f64,
            looping,
            dry_gain: 1.0 - params.reverb_wet,
            wet_gain: params.reverb_wet,
            convolver,
            dry_block: vec![vec![0.0; BLOCK_SIZE]; channel_count],
            wet_block: vec![0.0; BLOCK_SIZE],
            source_done: false,
            source,
        })
    }

    pub fn dry_gain(&self) -> f32 {
        self.dry_gain
    }

    pub fn wet_gain(&self) -> f32 {
        self.wet_gain
    }

    /// A non-looping graph is finished once the read head has passed the end
    /// of the source. Looping graphs never finish on their own.
    pub fn finished(&self) -> bool {
        !self.looping && self.source_done
    }

    /// In-place playback-rate update on a running instance.
    pub fn set_speed(&mut self, speed: f32) -> Result<(), RenderError> {
        if !speed.is_finite() || speed <= 0.0 {
            return Err(RenderError::InvalidSpeed(speed));
        }
        self.speed = speed as f64;
        Ok(())
    }

    /// In-place wet/dry update on a running instance; keeps `dry = 1 - wet`.
    pub fn set_wet_level(&mut self, wet: f32) -> Result<(), RenderError> {
        if !wet.is_finite() || !(0.0..=1.0).contains(&wet) {
            return Err(RenderError::InvalidWetLevel(wet));
        }
        self.wet_gain = wet;
        self.dry_gain = 1.0 - wet;
        Ok(())
    }

    /// Swap the impulse response inside the convolution stage without
    /// touching the rest of the graph.
    pub fn set_impulse(&mut self, impulse: &ImpulseResponse) {
        self.convolver.set_impulse(impulse);
    }

    /// Produce one `BLOCK_SIZE`-frame block per channel into `out`.
    pub fn process_block(&mut self, out: &mut [Vec<f32>]) {
        let frames = self.source.frames() as f64;
        let channel_count = self.source.channel_count();

        for i in 0..BLOCK_SIZE {
            let pos = if self.looping {
                self.position.rem_euclid(frames)
            } else {
                self.position
            };
            for ch in 0..channel_count {
                self.dry_block[ch][i] = self.source.sample_at(ch, pos);
            }
            self.position += self.speed;
        }
        if !self.looping && self.position >= frames {
            self.source_done = true;
        }

        for (ch, out_channel) in out.iter_mut().enumerate() {
            self.convolver
                .process_block(ch, &self.dry_block[ch], &mut self.wet_block);
            for i in 0..BLOCK_SIZE {
                out_channel[i] = (self.dry_block[ch][i] * self.dry_gain
                    + self.wet_block[i] * self.wet_gain)
                    * MASTER_GAIN;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn ramp_source(frames: usize) -> Arc<SourceAudio> {
        let data: Vec<f32> = (0..frames).map(|i| (i as f32 / frames as f32) - 0.5).collect();
        Arc::new(SourceAudio::new(vec![data], 44100).unwrap())
    }

    fn params(speed: f32, wet: f32, decay: f32) -> EffectParams {
        EffectParams {
            speed,
            reverb_wet: wet,
            reverb_decay: decay,
        }
    }

    fn drive(graph: &mut SignalGraph, channels: usize, blocks: usize) -> Vec<Vec<f32>> {
        let mut out = vec![Vec::new(); channels];
        let mut block = vec![vec![0.0f32; BLOCK_SIZE]; channels];
        for _ in 0..blocks {
            graph.process_block(&mut block);
            for (ch, data) in out.iter_mut().enumerate() {
                data.extend_from_slice(&block[ch]);
            }
        }
        out
    }

    #[test]
    fn gains_are_exact_complements() {
        let mut rng = StdRng::seed_from_u64(1);
        for wet in [0.0f32, 0.25, 0.4, 0.9, 1.0] {
            let graph = SignalGraph::build(
                ramp_source(64),
                &params(1.0, wet, 0.01),
                false,
                0.0,
                &mut rng,
            )
            .unwrap();
            assert_eq!(graph.wet_gain(), wet);
            assert_eq!(graph.dry_gain(), 1.0 - wet);
        }
    }

    #[test]
    fn dry_only_unit_speed_is_identity() {
        let mut rng = StdRng::seed_from_u64(2);
        let source = ramp_source(300);
        let mut graph =
            SignalGraph::build(Arc::clone(&source), &params(1.0, 0.0, 0.01), false, 0.0, &mut rng)
                .unwrap();

        let out = drive(&mut graph, 1, 3);
        for i in 0..300 {
            assert_eq!(out[0][i], source.channel(0)[i], "sample {i}");
        }
        // Past the source end the non-looping graph emits silence
        for &s in &out[0][300..] {
            assert_eq!(s, 0.0);
        }
        assert!(graph.finished());
    }

    #[test]
    fn double_speed_reads_every_other_frame() {
        let mut rng = StdRng::seed_from_u64(3);
        let source = ramp_source(BLOCK_SIZE * 2);
        let mut graph =
            SignalGraph::build(Arc::clone(&source), &params(2.0, 0.0, 0.01), false, 0.0, &mut rng)
                .unwrap();

        let out = drive(&mut graph, 1, 1);
        for i in 0..BLOCK_SIZE {
            assert_eq!(out[0][i], source.channel(0)[2 * i], "frame {i}");
        }
        assert!(graph.finished());
    }

    #[test]
    fn looping_graph_wraps_and_never_finishes() {
        let mut rng = StdRng::seed_from_u64(4);
        let source = ramp_source(100);
        let mut graph =
            SignalGraph::build(Arc::clone(&source), &params(1.0, 0.0, 0.01), true, 0.0, &mut rng)
                .unwrap();

        let out = drive(&mut graph, 1, 2);
        for i in 0..BLOCK_SIZE * 2 {
            assert_eq!(out[0][i], source.channel(0)[i % 100], "frame {i}");
        }
        assert!(!graph.finished());
    }

    #[test]
    fn starts_at_requested_offset() {
        let mut rng = StdRng::seed_from_u64(5);
        let source = ramp_source(44100);
        // 0.5 s at 44100 Hz = frame 22050
        let mut graph =
            SignalGraph::build(Arc::clone(&source), &params(1.0, 0.0, 0.01), false, 0.5, &mut rng)
                .unwrap();

        let out = drive(&mut graph, 1, 1);
        assert_eq!(out[0][0], source.channel(0)[22050]);
    }

    #[test]
    fn live_updates_mutate_in_place() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut graph = SignalGraph::build(
            ramp_source(256),
            &params(1.0, 0.4, 0.01),
            true,
            0.0,
            &mut rng,
        )
        .unwrap();

        graph.set_wet_level(0.75).unwrap();
        assert_eq!(graph.wet_gain(), 0.75);
        assert_eq!(graph.dry_gain(), 0.25);

        graph.set_speed(0.5).unwrap();
        assert!(graph.set_speed(0.0).is_err());
        assert!(graph.set_wet_level(1.5).is_err());

        let replacement = impulse::synthesize(0.02, 44100, &mut rng).unwrap();
        graph.set_impulse(&replacement);
        let mut block = vec![vec![0.0f32; BLOCK_SIZE]];
        graph.process_block(&mut block);
        assert!(block[0].iter().all(|s| s.is_finite()));
    }

    #[test]
    fn invalid_params_fail_graph_construction() {
        let mut rng = StdRng::seed_from_u64(7);
        let source = ramp_source(64);
        assert!(matches!(
            SignalGraph::build(Arc::clone(&source), &params(0.0, 0.4, 2.5), false, 0.0, &mut rng),
            Err(RenderError::InvalidSpeed(_))
        ));
        assert!(matches!(
            SignalGraph::build(Arc::clone(&source), &params(1.0, 0.4, 0.0), false, 0.0, &mut rng),
            Err(RenderError::InvalidDecay(_))
        ));
    }
}
