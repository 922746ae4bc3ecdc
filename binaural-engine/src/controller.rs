//! Playback controller: the `Idle`/`Playing` state machine.
//!
//! The controller is the only caller of [`AudioGraph::ensure_ready`], and it
//! reaches it only from [`PlaybackController::toggle`], so the hardware
//! resource is acquired on the first explicit play action and never before.
//! Changes made while nothing is built are kept as pending intent and applied
//! when the graph catches up.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::analysis::AnalysisTap;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::graph::{AudioContext, AudioGraph};
use crate::host::AudioHost;
use crate::noise::{NoiseBed, NoiseColor};
use crate::pair::{OscillatorPair, PairStatus, ToneTargets};
use crate::settings::SessionSettings;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    #[default]
    Idle,
    Playing,
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PlaybackState::Idle => "idle",
            PlaybackState::Playing => "playing",
        })
    }
}

/// Carrier and beat frequency, in Hz.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tuning {
    pub base: f32,
    pub beat: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self { base: 200.0, beat: 10.0 }
    }
}

impl Tuning {
    #[inline] pub fn left(&self) -> f32 { self.base }
    #[inline] pub fn right(&self) -> f32 { self.base + self.beat }
}

/// Owns the session graph and drives it from user actions.
pub struct PlaybackController<H: AudioHost> {
    graph: AudioGraph<H>,
    pair: OscillatorPair,
    noise: NoiseBed,
    state: PlaybackState,
    tuning: Tuning,
    audible_noise_volume: f32,
}

impl<H: AudioHost> PlaybackController<H> {
    pub fn new(host: H, config: &EngineConfig) -> Self {
        Self {
            graph: AudioGraph::new(host, config.graph_defaults()),
            pair: OscillatorPair::new(),
            noise: NoiseBed::new(NoiseColor::Off, config.noise_buffer_secs, config.noise_seed),
            state: PlaybackState::Idle,
            tuning: config.initial_tuning,
            audible_noise_volume: config.audible_noise_volume,
        }
    }

    /// Play/pause. From `Idle` this acquires the context on first use,
    /// resumes it, builds what is missing and applies the latest tuning.
    /// From `Playing` it suspends without tearing anything down.
    ///
    /// On error the state is unchanged and the call may simply be retried.
    pub fn toggle(&mut self) -> Result<PlaybackState> {
        match self.state {
            PlaybackState::Idle => self.play()?,
            PlaybackState::Playing => {
                if let Some(ctx) = self.graph.context_mut() {
                    ctx.suspend()?;
                }
                self.state = PlaybackState::Idle;
                info!("playback paused");
            }
        }
        Ok(self.state)
    }

    fn play(&mut self) -> Result<()> {
        let Tuning { base, beat } = self.tuning;
        let ctx = self.graph.ensure_ready()?;
        ctx.resume()?;
        if !self.pair.start(ctx, base, beat) {
            self.pair.retune(ctx, base, beat);
        }
        self.noise.ensure(ctx);
        self.state = PlaybackState::Playing;
        info!(base, beat, context = ctx.id(), "playback started");
        Ok(())
    }

    /// Pause and tear the tone pair down. The next `toggle()` builds a new pair.
    ///
    /// The context is suspended before the stop is queued, so no block is
    /// rendered between the discard and the pause. If suspending fails the
    /// pair is left live and the call may be retried.
    pub fn stop(&mut self) -> Result<()> {
        if let Some(ctx) = self.graph.context_mut() {
            ctx.suspend()?;
            self.pair.stop(ctx);
        }
        if self.state != PlaybackState::Idle {
            info!("playback stopped");
        }
        self.state = PlaybackState::Idle;
        Ok(())
    }

    /// Record the new tuning; ramp the live tones to it if playing.
    pub fn retune(&mut self, base: f32, beat: f32) {
        self.tuning = Tuning { base, beat };
        match (self.state, self.graph.context()) {
            (PlaybackState::Playing, Some(ctx)) => {
                self.pair.retune(ctx, base, beat);
            }
            _ => debug!(base, beat, "not playing; tuning kept as pending"),
        }
    }

    /// Apply a coaching answer through the same path as [`retune`](Self::retune).
    pub fn apply_settings(&mut self, settings: &SessionSettings) {
        info!(target_state = %settings.target_state, "applying session settings");
        let t = settings.tuning();
        self.retune(t.base, t.beat);
    }

    pub fn set_master_volume(&mut self, level: f32) {
        self.graph.defaults_mut().master_volume = level;
        if let Some(ctx) = self.graph.context_mut() {
            ctx.set_master_gain(level);
        }
    }

    pub fn set_noise_volume(&mut self, level: f32) {
        self.graph.defaults_mut().noise_volume = level;
        if let Some(ctx) = self.graph.context_mut() {
            self.noise.set_volume(ctx, level);
        }
    }

    /// Select a noise color. Going from `Off` to an audible color while the
    /// noise volume is zero raises it to the audible default; the new volume
    /// is returned in that case so a UI can reflect it.
    pub fn set_noise_color(&mut self, color: NoiseColor) -> Option<f32> {
        let raised = (self.noise.color() == NoiseColor::Off && color.is_audible() && self.noise_volume() <= 0.0)
            .then_some(self.audible_noise_volume);
        if let Some(level) = raised {
            debug!(level, "raising silent noise volume");
            self.set_noise_volume(level);
        }

        self.noise.select(self.graph.context(), color);
        if self.state == PlaybackState::Playing {
            if let Some(ctx) = self.graph.context_mut() {
                self.noise.ensure(ctx);
            }
        }
        raised
    }

    /// Release the audio resource and end the session.
    pub fn close(mut self) {
        self.graph.release();
    }

    #[inline] pub fn state(&self) -> PlaybackState { self.state }
    #[inline] pub fn is_playing(&self) -> bool { self.state == PlaybackState::Playing }
    #[inline] pub fn tuning(&self) -> Tuning { self.tuning }
    #[inline] pub fn pair_state(&self) -> PairStatus { self.pair.status() }
    #[inline] pub fn pairs_built(&self) -> u32 { self.pair.builds() }
    #[inline] pub fn tone_targets(&self) -> Option<ToneTargets> { self.pair.targets() }
    #[inline] pub fn noise_color(&self) -> NoiseColor { self.noise.color() }
    #[inline] pub fn noise(&self) -> &NoiseBed { &self.noise }
    #[inline] pub fn context(&self) -> Option<&AudioContext<H::Stream>> { self.graph.context() }
    #[inline] pub fn graph(&self) -> &AudioGraph<H> { &self.graph }

    /// Master volume target, whether live or pending.
    pub fn master_volume(&self) -> f32 {
        self.graph
            .context()
            .map_or(self.graph.defaults().master_volume, |ctx| ctx.master_gain().target())
    }

    /// Noise volume target, whether live or pending.
    pub fn noise_volume(&self) -> f32 {
        self.graph
            .context()
            .map_or(self.graph.defaults().noise_volume, |ctx| ctx.noise_gain().target())
    }

    /// Visualizer handle; `None` until the first play.
    pub fn analysis(&self) -> Option<Arc<AnalysisTap>> {
        self.graph.context().map(AudioContext::analysis)
    }
}

impl<H: AudioHost> Drop for PlaybackController<H> {
    fn drop(&mut self) {
        self.graph.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ContextState;
    use crate::host::{OfflineHost, OfflineStream, OutputStream};
    use crate::render::Renderer;
    use parking_lot::Mutex;

    /// Offline host whose stream renders one last block while it is being
    /// suspended, like a device callback already in flight.
    #[derive(Clone)]
    struct TrailingHost {
        inner: OfflineHost,
        trailing: Arc<Mutex<Vec<f32>>>,
    }

    struct TrailingStream {
        inner: OfflineStream,
        host: OfflineHost,
        trailing: Arc<Mutex<Vec<f32>>>,
    }

    impl OutputStream for TrailingStream {
        fn sample_rate(&self) -> f32 { self.inner.sample_rate() }

        fn resume(&mut self) -> Result<()> { self.inner.resume() }

        fn suspend(&mut self) -> Result<()> {
            let (left, _) = self.host.render_stereo(64);
            self.trailing.lock().extend(left);
            self.inner.suspend()
        }
    }

    impl AudioHost for TrailingHost {
        type Stream = TrailingStream;

        fn open(&mut self, renderer: Renderer) -> Result<TrailingStream> {
            let inner = self.inner.open(renderer)?;
            Ok(TrailingStream { inner, host: self.inner.clone(), trailing: Arc::clone(&self.trailing) })
        }
    }

    fn controller() -> (OfflineHost, PlaybackController<OfflineHost>) {
        let host = OfflineHost::new(48_000.0);
        let config = EngineConfig { noise_seed: Some(1), ..EngineConfig::default() };
        (host.clone(), PlaybackController::new(host, &config))
    }

    #[test]
    fn nothing_is_acquired_before_first_toggle() {
        let (host, mut c) = controller();
        c.retune(300.0, 20.0);
        c.set_master_volume(0.7);
        c.set_noise_color(NoiseColor::White);
        assert_eq!(host.opened(), 0);
        assert!(c.analysis().is_none());
        assert_eq!(c.master_volume(), 0.7);
    }

    #[test]
    fn toggle_twice_pauses_without_rebuilding() {
        let (host, mut c) = controller();
        assert_eq!(c.toggle().unwrap(), PlaybackState::Playing);
        assert!(host.is_running());
        assert_eq!(c.toggle().unwrap(), PlaybackState::Idle);
        assert!(!host.is_running());
        assert_eq!(c.pair_state(), PairStatus::Live);
        assert_eq!(c.context().map(AudioContext::state), Some(ContextState::Suspended));
        c.toggle().unwrap();
        assert_eq!(c.pairs_built(), 1);
        assert_eq!(c.graph().contexts_acquired(), 1);
    }

    #[test]
    fn pending_tuning_applies_on_play() {
        let (_host, mut c) = controller();
        c.retune(150.0, 6.0);
        assert!(c.tone_targets().is_none());
        c.toggle().unwrap();
        let t = c.tone_targets().unwrap();
        assert_eq!((t.left, t.right), (150.0, 156.0));
    }

    #[test]
    fn retune_while_paused_waits_for_play() {
        let (_host, mut c) = controller();
        c.toggle().unwrap();
        c.toggle().unwrap();
        c.retune(300.0, 20.0);
        assert_eq!(c.tone_targets().map(|t| t.left), Some(200.0));
        c.toggle().unwrap();
        let t = c.tone_targets().unwrap();
        assert_eq!((t.left, t.right), (300.0, 320.0));
    }

    #[test]
    fn selecting_color_from_off_raises_silent_volume() {
        let (_host, mut c) = controller();
        c.set_noise_volume(0.0);
        assert_eq!(c.set_noise_color(NoiseColor::White), Some(0.2));
        assert_eq!(c.noise_volume(), 0.2);
        c.set_noise_volume(0.0);
        assert_eq!(c.set_noise_color(NoiseColor::White), None);
        assert_eq!(c.noise_volume(), 0.0);
    }

    #[test]
    fn audible_color_while_playing_builds_noise_once() {
        let (_host, mut c) = controller();
        c.toggle().unwrap();
        assert!(!c.noise().is_built());
        c.set_noise_color(NoiseColor::Pink);
        let id = c.noise().source_id();
        assert!(id.is_some());
        c.set_noise_color(NoiseColor::Off);
        assert_eq!(c.noise().bed_level(), Some(0.0));
        c.set_noise_color(NoiseColor::Brown);
        assert_eq!(c.noise().source_id(), id);
        assert_eq!(c.noise().bed_level(), Some(1.0));
    }

    #[test]
    fn stop_tears_pair_down_and_next_play_rebuilds() {
        let (_host, mut c) = controller();
        c.toggle().unwrap();
        let first = c.tone_targets().unwrap();
        c.stop().unwrap();
        assert_eq!(c.state(), PlaybackState::Idle);
        assert_eq!(c.pair_state(), PairStatus::Stopped);
        c.toggle().unwrap();
        let second = c.tone_targets().unwrap();
        assert_ne!(first.left_id, second.left_id);
        assert_eq!(c.pairs_built(), 2);
    }

    #[test]
    fn stop_lets_the_last_block_finish_the_waveform() {
        let host = TrailingHost { inner: OfflineHost::new(48_000.0), trailing: Arc::default() };
        let mut c = PlaybackController::new(host.clone(), &EngineConfig::default());
        c.toggle().unwrap();
        let (mut left, _) = host.inner.render_stereo(100);
        c.stop().unwrap();
        let tail = host.trailing.lock().clone();
        assert_eq!(tail.len(), 64);
        assert!(tail.iter().any(|&s| s != 0.0));
        left.extend(tail);
        // a 0.5-amplitude 200 Hz sine moves about 0.013 per sample
        let step = left.windows(2).map(|w| (w[1] - w[0]).abs()).fold(0.0_f32, f32::max);
        assert!(step < 0.02, "step {step}");
        assert_eq!(c.pair_state(), PairStatus::Stopped);
    }

    #[test]
    fn close_releases_the_device() {
        let (host, mut c) = controller();
        c.toggle().unwrap();
        assert!(host.is_open());
        c.close();
        assert!(!host.is_open());
    }
}
