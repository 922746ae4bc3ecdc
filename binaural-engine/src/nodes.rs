//! Render-side building blocks (nodes).
//!
//! These live on the audio thread once handed over. They are constructed on
//! the control thread (allocations happen there) and moved in through the
//! command queue; per-sample work is allocation-free.
//!
//! Contents:
//! - `Voice`     : one mono sample per tick
//! - `Osc`       : phase-continuous sine oscillator
//! - `PanLaw`    : constant-power panning helper
//! - `ToneVoice` : oscillator + frequency ramp + fixed pan
//! - `PairVoice` : the left/right tone pair mixed onto the stereo bus
//! - `NoiseVoice`: looping buffer player with a bed-level ramp

use std::sync::Arc;

use binaural_core::dsp::{sine01, wrap_phase01};
use binaural_core::ramp::Ramp;

use crate::params::NodeId;

/// Anything that can produce one mono sample at a time.
pub trait Voice {
    fn next(&mut self, sr: f32) -> f32;
}

/// Free-running sine oscillator. Frequency is supplied per sample so a ramp
/// can drive it; phase never resets, so retuning is continuous.
#[derive(Copy, Clone, Debug, Default)]
pub struct Osc {
    phase: f32, // [0,1)
}

impl Osc {
    #[inline] pub fn new() -> Self { Self { phase: 0.0 } }

    /// Return the current sample and advance by `freq_hz / sr`.
    #[inline]
    pub fn next(&mut self, freq_hz: f32, sr: f32) -> f32 {
        let s = sine01(self.phase);
        self.phase = wrap_phase01(self.phase + freq_hz.max(0.0) / sr);
        s
    }

    #[inline] pub fn phase01(&self) -> f32 { self.phase }
}

/// Constant-power panner helper.
#[derive(Copy, Clone, Debug)]
pub struct PanLaw;
impl PanLaw {
    /// Return (left, right) gains given `pan` in [-1..1], where -1 = hard left, +1 = hard right.
    #[inline]
    pub fn gains(pan: f32) -> (f32, f32) {
        // constant power using sine/cosine taper
        let p = (pan.clamp(-1.0, 1.0) + 1.0) * 0.25 * core::f32::consts::PI; // map to [0, π/2]
        (p.cos(), p.sin())
    }
}

/// One tone source bound to its panner.
#[derive(Copy, Clone, Debug)]
pub struct ToneVoice {
    id: NodeId,
    osc: Osc,
    frequency: Ramp,
    gains: (f32, f32),
}

impl ToneVoice {
    pub(crate) fn new(id: NodeId, freq_hz: f32, pan: f32) -> Self {
        Self { id, osc: Osc::new(), frequency: Ramp::new(freq_hz), gains: PanLaw::gains(pan) }
    }

    #[inline] pub fn id(&self) -> NodeId { self.id }
    #[inline] pub fn frequency(&self) -> &Ramp { &self.frequency }
    #[inline] pub(crate) fn frequency_mut(&mut self) -> &mut Ramp { &mut self.frequency }
    #[inline] pub fn pan_gains(&self) -> (f32, f32) { self.gains }
}

impl Voice for ToneVoice {
    #[inline]
    fn next(&mut self, sr: f32) -> f32 {
        let f = self.frequency.next();
        self.osc.next(f, sr)
    }
}

/// Left and right tones, each panned, summed onto the stereo bus.
#[derive(Copy, Clone, Debug)]
pub struct PairVoice {
    left: ToneVoice,
    right: ToneVoice,
}

impl PairVoice {
    pub(crate) fn new(left: ToneVoice, right: ToneVoice) -> Self { Self { left, right } }

    #[inline]
    pub fn next(&mut self, sr: f32) -> (f32, f32) {
        let a = self.left.next(sr);
        let b = self.right.next(sr);
        let (al, ar) = self.left.gains;
        let (bl, br) = self.right.gains;
        (a * al + b * bl, a * ar + b * br)
    }

    pub(crate) fn tone_mut(&mut self, id: NodeId) -> Option<&mut ToneVoice> {
        if self.left.id == id {
            Some(&mut self.left)
        } else if self.right.id == id {
            Some(&mut self.right)
        } else {
            None
        }
    }

    #[inline] pub fn left(&self) -> &ToneVoice { &self.left }
    #[inline] pub fn right(&self) -> &ToneVoice { &self.right }
}

/// Looping player over a shared, immutable noise buffer.
#[derive(Clone, Debug)]
pub struct NoiseVoice {
    id: NodeId,
    buffer: Arc<[f32]>,
    pos: usize,
    level: Ramp,
}

impl NoiseVoice {
    pub(crate) fn new(id: NodeId, buffer: Arc<[f32]>, level: f32) -> Self {
        Self { id, buffer, pos: 0, level: Ramp::new(level) }
    }

    #[inline] pub fn id(&self) -> NodeId { self.id }
    #[inline] pub(crate) fn level_mut(&mut self) -> &mut Ramp { &mut self.level }
}

impl Voice for NoiseVoice {
    #[inline]
    fn next(&mut self, _sr: f32) -> f32 {
        let g = self.level.next();
        let Some(&s) = self.buffer.get(self.pos) else {
            return 0.0;
        };
        self.pos += 1;
        if self.pos >= self.buffer.len() {
            self.pos = 0;
        }
        s * g
    }
}
