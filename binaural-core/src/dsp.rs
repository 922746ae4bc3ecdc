//! Generic DSP utilities and math helpers.
//!
//! Design goals:
//! - `no_std` ready (guarded by the crate feature `no-std`)
//! - Math backend selection that works in both `std` and `no_std` contexts
//! - Optional `fast-math` approximation for the oscillator hot path
//! - Clean, side-effect free helpers that are easy to test
//!
//! Conventions:
//! - All functions are `#[inline]` where useful to help the optimizer.
//! - Time constants are in **seconds**, rates in **Hz**.

#![allow(clippy::excessive_precision)]

use core::f32::consts::PI;

use cfg_if::cfg_if;

// ----------------------------- Math backend selection -----------------------------

cfg_if! {
    // micromath preferred if explicitly requested (works in no_std)
    if #[cfg(feature = "micromath")] {
        use micromath::F32Ext as _;
        #[inline] fn m_sin(x: f32) -> f32 { x.sin() }
        #[inline] fn m_exp(x: f32) -> f32 { x.exp() }
        #[inline] fn m_sqrt(x: f32) -> f32 { x.sqrt() }
        #[inline] fn m_ln(x: f32) -> f32 { x.ln() }
        #[inline] fn m_floor(x: f32) -> f32 { x.floor() }
    // libm (C math) in no_std
    } else if #[cfg(feature = "no-std")] {
        #[inline] fn m_sin(x: f32) -> f32 { libm::sinf(x) }
        #[inline] fn m_exp(x: f32) -> f32 { libm::expf(x) }
        #[inline] fn m_sqrt(x: f32) -> f32 { libm::sqrtf(x) }
        #[inline] fn m_ln(x: f32) -> f32 { libm::logf(x) }
        #[inline] fn m_floor(x: f32) -> f32 { libm::floorf(x) }
    // std backend
    } else {
        #[inline] fn m_sin(x: f32) -> f32 { x.sin() }
        #[inline] fn m_exp(x: f32) -> f32 { x.exp() }
        #[inline] fn m_sqrt(x: f32) -> f32 { x.sqrt() }
        #[inline] fn m_ln(x: f32) -> f32 { x.ln() }
        #[inline] fn m_floor(x: f32) -> f32 { x.floor() }
    }
}

// --------------------------------- Constants -------------------------------------

/// 2π (commonly useful)
pub const TAU: f32 = 2.0 * PI;

/// Floor below which a linear level reads as silence.
pub const EPS_SMALL: f32 = 1.0e-20;

// --------------------------------- Utilities -------------------------------------

#[inline]
pub fn abs(x: f32) -> f32 {
    if x < 0.0 { -x } else { x }
}

/// Wrap phase into [0, 1).
#[inline]
pub fn wrap_phase01(p: f32) -> f32 {
    let w = p - m_floor(p);
    if w >= 1.0 { 0.0 } else { w }
}

// --------------------------------- dB / linear -----------------------------------

/// Convert dB to linear gain: lin = 10^(db/20).
#[inline]
pub fn db_to_lin(db: f32) -> f32 {
    if db <= -120.0 { 0.0 } else { m_exp(0.11512925464970229_f32 * db) } // ln(10)/20
}

/// Convert linear gain to dB: db = 20*log10(lin).
#[inline]
pub fn lin_to_db(lin: f32) -> f32 {
    if lin <= EPS_SMALL { -120.0 }
    else { 8.685889638065036553_f32 * m_ln(lin) } // 20/ln(10)
}

// --------------------------------- Sine -------------------------------------------

/// Sine of a normalized phase in [0, 1).
///
/// With `fast-math` this uses a 5th-order odd polynomial after range reduction
/// into [-π, π] (max abs error ~1e-3); otherwise the exact backend sine.
#[inline]
pub fn sine01(phase01: f32) -> f32 {
    cfg_if! {
        if #[cfg(feature = "fast-math")] {
            // phase01 in [0,1) -> x in [-π, π)
            let xr = TAU * phase01 - if phase01 >= 0.5 { TAU } else { 0.0 };
            let x2 = xr * xr;
            xr * (0.999_979_313_3 + x2 * (-0.166_624_432_0 + x2 * 0.008_308_978_98))
        } else {
            m_sin(TAU * phase01)
        }
    }
}

// --------------------------------- Exponentials / smoothing ----------------------

/// Per-sample retention coefficient for a first-order lag with time constant
/// `tau_secs` at sample rate `sr`: `a = exp(-1 / (tau * sr))`.
///
/// The discrete form used throughout the engine is
/// `y[n+1] = x + (y[n] - x) * a`, i.e. after `tau` seconds ~63% (1 - 1/e) of
/// the distance to the target has been covered.
///
/// A non-positive `tau` yields `0.0`, which makes the lag transparent.
#[inline]
pub fn time_constant_coeff(tau_secs: f32, sr: f32) -> f32 {
    if tau_secs <= 0.0 || sr <= 0.0 { return 0.0; }
    m_exp(-1.0 / (tau_secs * sr))
}

// --------------------------------- Simple meters ---------------------------------

/// Peak and RMS level of a block of samples. Returns `(0.0, 0.0)` for an empty block.
#[inline]
pub fn peak_rms(block: &[f32]) -> (f32, f32) {
    if block.is_empty() {
        return (0.0, 0.0);
    }
    let mut peak = 0.0_f32;
    let mut sum = 0.0_f32;
    for &s in block {
        let a = abs(s);
        if a > peak { peak = a; }
        sum += s * s;
    }
    #[allow(clippy::cast_precision_loss)]
    let mean = sum / block.len() as f32;
    (peak, m_sqrt(mean))
}

// --------------------------------- Tests (std only) ------------------------------
