#![cfg_attr(not(feature = "std"), no_std)]
//! Binaural Core — no_std-ready DSP primitives for the binaural session engine.
//!
//! Features
//! - `std`      : (default) use the Rust standard library
//! - `no-std`   : build with `#![no_std]` and use the `libm` math backend
//! - `micromath`: use `micromath` as the math backend instead
//! - `fast-math`: polynomial sine for the oscillator hot path
//!
//! Modules
//! - [`dsp`]  : math backend, utils (db/lin, time-constant coefficients, sine, meters)
//! - [`ramp`] : exponential ramp-to-target primitive used for every live parameter
//!
//! No heap allocations; everything here is plain sample-by-sample state.

pub mod dsp;
pub mod ramp;

/// Commonly used types/functions for convenience:
pub mod prelude {
    pub use crate::dsp::{
        db_to_lin, lin_to_db, peak_rms, sine01, time_constant_coeff, wrap_phase01, TAU,
    };
    pub use crate::ramp::Ramp;
}

#[cfg(test)]
mod smoke {

    #[test]
    fn prelude_exists() {
        use crate::prelude::*;
        let _ = db_to_lin(-6.0);
        let mut r = Ramp::new(0.0);
        r.set_target(1.0, 0.05, 48_000.0);
        let _ = r.next();
    }
}
