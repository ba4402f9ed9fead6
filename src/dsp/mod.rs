//! DSP core: pure Rust signal processing for the slowed + reverb effect.
//!
//! The same graph topology powers both live playback (block-by-block pulls
//! from the device callback) and the offline renderer (WAV export). All
//! processing is deterministic given the injected noise source.

pub mod convolver;
pub mod graph;
pub mod impulse;
pub mod renderer;
pub mod waveform;

/// Frames per processing block, for both live pulls and offline rendering.
pub const BLOCK_SIZE: usize = 128;
