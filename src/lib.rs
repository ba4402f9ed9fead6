pub mod decode;
pub mod dsp;
pub mod error;
pub mod params;
pub mod session;
pub mod source;
pub mod tracker;

use std::sync::Arc;

use rand::thread_rng;
use wasm_bindgen::prelude::*;

pub use crate::error::SlowverbError;
pub use crate::params::EffectParams;
pub use crate::session::{Session, SessionEvent};
pub use crate::source::SourceAudio;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// WASM-exposed: return the slowverb-core version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

/// Apply the slowed + reverb effect offline and encode the result as WAV
/// bytes.
pub fn render_to_wav(
    source: &Arc<SourceAudio>,
    params: &EffectParams,
) -> Result<Vec<u8>, SlowverbError> {
    Ok(dsp::renderer::render_wav(source, params, &mut thread_rng())?)
}

/// WASM-exposed: render interleaved f32 samples to a slowed + reverb WAV
/// byte array. `params` is a `{ speed, reverbWet, reverbDecay }` object;
/// missing fields take their defaults.
#[wasm_bindgen]
pub fn render_slowed_reverb(
    samples: &[f32],
    channel_count: u16,
    sample_rate: u32,
    params: JsValue,
) -> Result<Vec<u8>, JsValue> {
    let source = SourceAudio::from_interleaved(samples, channel_count, sample_rate)
        .map_err(|e| JsValue::from_str(&format!("{e}")))?;
    let params: EffectParams = if params.is_undefined() || params.is_null() {
        EffectParams::default()
    } else {
        serde_wasm_bindgen::from_value(params).map_err(|e| JsValue::from_str(&format!("{e}")))?
    };
    dsp::renderer::render_wav(&Arc::new(source), &params, &mut thread_rng())
        .map_err(|e| JsValue::from_str(&format!("{e}")))
}

/// WASM-exposed: decode file bytes and summarize the first channel into
/// 200 normalized amplitude buckets for drawing.
#[wasm_bindgen]
pub fn waveform_from_bytes(bytes: &[u8]) -> Result<Vec<f32>, JsValue> {
    let source = decode::decode_bytes(bytes).map_err(|e| JsValue::from_str(&format!("{e}")))?;
    Ok(dsp::waveform::waveform_summary(&source))
}

/// WASM-exposed: suggested download name for an exported file.
#[wasm_bindgen]
pub fn download_file_name(original: Option<String>) -> String {
    let original = original.unwrap_or_else(|| session::FALLBACK_DOWNLOAD_NAME.to_string());
    format!("slowed_reverb_{original}")
}
