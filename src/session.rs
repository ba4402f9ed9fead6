//! The audio session: one loaded asset, one set of parameters, at most one
//! live graph instance, and the offline render entry point.
//!
//! All mutation flows through this object (there is no ambient global
//! state). The single-threaded cooperative model: only one of live playback
//! or offline rendering is active at a time, and starting a render first
//! stops playback.

use std::sync::Arc;
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender};
use log::{debug, info};
use rand::thread_rng;

use crate::dsp::graph::SignalGraph;
use crate::dsp::{impulse, renderer, waveform};
use crate::error::{PlaybackError, RenderError, SlowverbError};
use crate::params::EffectParams;
use crate::source::SourceAudio;
use crate::tracker::PositionTracker;

/// Download name used when the source file name is unknown.
pub const FALLBACK_DOWNLOAD_NAME: &str = "audio.wav";

/// A monotonic seconds source. Injected so tests can drive time by hand.
pub trait Clock {
    fn now(&self) -> f64;
}

/// Wall-clock seconds since construction.
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        MonotonicClock {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Events the UI collaborator polls for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// A live graph instance ran to its natural end. Never sent for an
    /// instance that was explicitly torn down.
    PlaybackFinished,
}

struct LiveInstance {
    graph: SignalGraph,
    /// One-shot completion sender. Taken on natural completion; cleared on
    /// explicit teardown so the signal cannot fire afterwards.
    done_tx: Option<Sender<SessionEvent>>,
}

pub struct Session<C: Clock = MonotonicClock> {
    clock: C,
    source: Option<Arc<SourceAudio>>,
    file_name: Option<String>,
    params: EffectParams,
    waveform: Vec<f32>,
    tracker: PositionTracker,
    live: Option<LiveInstance>,
    rendering: bool,
    event_tx: Sender<SessionEvent>,
    event_rx: Receiver<SessionEvent>,
}

impl Session<MonotonicClock> {
    pub fn new() -> Self {
        Self::with_clock(MonotonicClock::new())
    }
}

impl Default for Session<MonotonicClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> Session<C> {
    pub fn with_clock(clock: C) -> Self {
        let (event_tx, event_rx) = crossbeam_channel::bounded(16);
        Session {
            clock,
            source: None,
            file_name: None,
            params: EffectParams::default(),
            waveform: Vec::new(),
            tracker: PositionTracker::new(0.0),
            live: None,
            rendering: false,
            event_tx,
            event_rx,
        }
    }

    /// Replace the loaded asset. Call only after decoding succeeded: the
    /// previous asset survives a failed decode because it is never handed
    /// here. Stops playback, recomputes the waveform summary, resets the
    /// playhead.
    pub fn load_source(&mut self, source: SourceAudio, file_name: Option<String>) {
        self.stop();
        debug!(
            "loading source: {} ch, {} Hz, {:.2}s ({})",
            source.channel_count(),
            source.sample_rate(),
            source.duration(),
            file_name.as_deref().unwrap_or("unnamed")
        );
        self.waveform = waveform::waveform_summary(&source);
        self.tracker = PositionTracker::new(source.duration());
        self.file_name = file_name;
        self.source = Some(Arc::new(source));
    }

    // ---- status surface ----

    pub fn is_playing(&self) -> bool {
        self.live.is_some()
    }

    pub fn is_rendering(&self) -> bool {
        self.rendering
    }

    /// Current playback position in seconds (wraps at the source duration).
    pub fn position(&self) -> f64 {
        self.tracker.position(self.clock.now())
    }

    /// The per-file waveform thumbnail (empty until a source is loaded).
    pub fn waveform(&self) -> &[f32] {
        &self.waveform
    }

    pub fn params(&self) -> EffectParams {
        self.params
    }

    pub fn has_source(&self) -> bool {
        self.source.is_some()
    }

    /// Poll for the next session event, if any.
    pub fn poll_event(&self) -> Option<SessionEvent> {
        self.event_rx.try_recv().ok()
    }

    // ---- transport ----

    pub fn toggle_play(&mut self) -> Result<(), PlaybackError> {
        if self.is_playing() {
            self.stop();
            Ok(())
        } else {
            self.play()
        }
    }

    /// Build a fresh looping graph at the current playhead and start the
    /// tracker. A running session stays running.
    pub fn play(&mut self) -> Result<(), PlaybackError> {
        if self.live.is_some() {
            return Ok(());
        }
        let source = self.source.as_ref().ok_or(PlaybackError::NoSourceLoaded)?;

        let now = self.clock.now();
        let offset = self.tracker.position(now);
        let graph = SignalGraph::build(
            Arc::clone(source),
            &self.params,
            true,
            offset,
            &mut thread_rng(),
        )
        .map_err(PlaybackError::Graph)?;

        self.live = Some(LiveInstance {
            graph,
            done_tx: Some(self.event_tx.clone()),
        });
        self.tracker.start(now);
        info!("playback started at {offset:.3}s");
        Ok(())
    }

    /// Stop playback: capture the exact resume offset, suppress the
    /// completion signal, and tear the graph instance down. Synchronous and
    /// idempotent; stopping a stopped session is a no-op.
    pub fn stop(&mut self) {
        if self.tracker.is_running() {
            let offset = self.tracker.pause(self.clock.now());
            debug!("playback stopped at {offset:.3}s");
        }
        if let Some(mut live) = self.live.take() {
            live.done_tx = None;
        }
    }

    /// Jump the playhead to a fraction of the duration. While playing, the
    /// live instance is torn down and a new one starts at the target.
    pub fn seek(&mut self, fraction: f64) -> Result<(), PlaybackError> {
        let source = self.source.as_ref().ok_or(PlaybackError::NoSourceLoaded)?;
        let seconds = fraction.clamp(0.0, 1.0) * source.duration();

        let was_playing = self.is_playing();
        if was_playing {
            self.stop();
        }
        self.tracker.seek(self.clock.now(), seconds);
        if was_playing {
            self.play()?;
        }
        Ok(())
    }

    // ---- parameter updates ----

    /// Update the playback rate; a live instance is mutated in place.
    pub fn set_speed(&mut self, speed: f32) -> Result<(), RenderError> {
        if !speed.is_finite() || speed <= 0.0 {
            return Err(RenderError::InvalidSpeed(speed));
        }
        self.params.speed = speed;
        if let Some(live) = &mut self.live {
            live.graph.set_speed(speed)?;
        }
        Ok(())
    }

    /// Update the wet/dry mix; a live instance is mutated in place.
    pub fn set_wet_level(&mut self, wet: f32) -> Result<(), RenderError> {
        if !wet.is_finite() || !(0.0..=1.0).contains(&wet) {
            return Err(RenderError::InvalidWetLevel(wet));
        }
        self.params.reverb_wet = wet;
        if let Some(live) = &mut self.live {
            live.graph.set_wet_level(wet)?;
        }
        Ok(())
    }

    /// Update the reverb decay. During playback only the impulse response
    /// is re-synthesized and swapped into the convolution stage; the graph
    /// itself keeps running.
    pub fn set_reverb_decay(&mut self, decay: f32) -> Result<(), RenderError> {
        if !decay.is_finite() || decay <= 0.0 {
            return Err(RenderError::InvalidDecay(decay));
        }
        self.params.reverb_decay = decay;
        if let (Some(live), Some(source)) = (&mut self.live, &self.source) {
            let replacement =
                impulse::synthesize(decay, source.sample_rate(), &mut thread_rng())?;
            live.graph.set_impulse(&replacement);
        }
        Ok(())
    }

    // ---- audio device pull point ----

    /// Fill one planar block per channel. The external device collaborator
    /// calls this from its output callback; when stopped it gets silence.
    /// A non-looping instance that reaches its natural end emits
    /// `PlaybackFinished` exactly once and resets the playhead to zero.
    pub fn fill_block(&mut self, out: &mut [Vec<f32>]) {
        match &mut self.live {
            Some(live) => {
                live.graph.process_block(out);
                if live.graph.finished() {
                    if let Some(done_tx) = live.done_tx.take() {
                        let _ = done_tx.try_send(SessionEvent::PlaybackFinished);
                    }
                    self.live = None;
                    self.tracker.reset();
                }
            }
            None => {
                for channel in out.iter_mut() {
                    channel.fill(0.0);
                }
            }
        }
    }

    // ---- offline render ----

    /// Render the effect offline and encode it as WAV bytes. Stops any
    /// active playback first; refuses to start while another render is
    /// outstanding. The busy flag is cleared on success and failure alike.
    pub fn render_wav(&mut self) -> Result<Vec<u8>, SlowverbError> {
        if self.rendering {
            return Err(RenderError::RenderInProgress.into());
        }
        let source = self
            .source
            .clone()
            .ok_or(SlowverbError::Render(RenderError::NoSourceLoaded))?;

        self.stop();
        self.rendering = true;
        info!("offline render started: {}", self.download_name());
        let result = renderer::render_wav(&source, &self.params, &mut thread_rng());
        self.rendering = false;

        result.map_err(SlowverbError::Render)
    }

    /// Suggested file name for the exported WAV.
    pub fn download_name(&self) -> String {
        let original = self.file_name.as_deref().unwrap_or(FALLBACK_DOWNLOAD_NAME);
        format!("slowed_reverb_{original}")
    }

    #[cfg(test)]
    /// Start a non-looping instance so tests can drive natural completion.
    fn play_once(&mut self) -> Result<(), PlaybackError> {
        let source = self.source.as_ref().ok_or(PlaybackError::NoSourceLoaded)?;
        let now = self.clock.now();
        let graph = SignalGraph::build(
            Arc::clone(source),
            &self.params,
            false,
            self.tracker.position(now),
            &mut thread_rng(),
        )
        .map_err(PlaybackError::Graph)?;
        self.live = Some(LiveInstance {
            graph,
            done_tx: Some(self.event_tx.clone()),
        });
        self.tracker.start(now);
        Ok(())
    }
}
