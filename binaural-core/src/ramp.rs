//! Exponential parameter ramps.
//!
//! `Ramp` is the one smoothing primitive of the engine: every live scalar
//! (tone frequency, gain, bed level) is a `Ramp` on the render side and is
//! only ever changed through [`Ramp::set_target`].
//!
//! Per sample: `y += (target - y) * (1 - a)`, `a = exp(-1/(tau*sr))`.
//! A new target supersedes the ramp in progress; there is no cancellation.

use crate::dsp::{abs, time_constant_coeff};

/// Remaining distance below which a ramp snaps onto its target.
const SETTLE_EPS: f32 = 1.0e-6;

/// First-order lag toward a target value.
#[derive(Copy, Clone, Debug)]
pub struct Ramp {
    target: f32,
    // value - target; decaying the offset keeps precision near large targets
    offset: f32,
    alpha:  f32,
}

impl Ramp {
    /// A settled ramp sitting at `initial`. Construction is not a mutation.
    #[inline]
    pub fn new(initial: f32) -> Self {
        Self { target: initial, offset: 0.0, alpha: 0.0 }
    }

    /// Start approaching `target` with time constant `tau_secs` at `sr`.
    #[inline]
    pub fn set_target(&mut self, target: f32, tau_secs: f32, sr: f32) {
        self.offset = (self.target + self.offset) - target;
        self.target = target;
        self.alpha = time_constant_coeff(tau_secs, sr);
    }

    /// Advance one sample and return the new value.
    #[inline]
    pub fn next(&mut self) -> f32 {
        self.offset *= self.alpha;
        if abs(self.offset) < SETTLE_EPS {
            self.offset = 0.0;
        }
        self.target + self.offset
    }

    #[inline] pub fn value(&self) -> f32 { self.target + self.offset }
    #[inline] pub fn target(&self) -> f32 { self.target }
    #[inline] pub fn is_settled(&self) -> bool { self.offset == 0.0 }
}
