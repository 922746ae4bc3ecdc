//! Binaural session engine: lazily built audio graph, oscillator pair, noise
//! bed and play/pause control.
//!
//! Crate layout:
//! - [`controller`] : `PlaybackController`, the entry point for user actions
//! - [`graph`]      : lazy acquisition of the `AudioContext` and fixed stages
//! - [`pair`]       : the start-once binaural tone pair
//! - [`noise`]      : noise colors, buffer generation, the noise bed
//! - [`params`]     : parameter identities and the ramp policy
//! - [`render`]     : render-thread graph and the command queue
//! - [`nodes`]      : per-sample building blocks (oscillators, players)
//! - [`analysis`]   : read-only time-domain tap for visualizers
//! - [`host`]       : host traits and the pull-driven `OfflineHost`
//! - [`realtime`]   : CPAL host (feature `realtime`)
//!
//! The render thread never allocates and never blocks on the control thread.

pub mod analysis;
pub mod config;
pub mod controller;
pub mod error;
pub mod graph;
pub mod host;
pub mod nodes;
pub mod noise;
pub mod pair;
pub mod params;
pub mod render;
pub mod settings;

cfg_if::cfg_if! {
    if #[cfg(feature = "realtime")] {
        pub mod realtime;
        pub use realtime::{CpalHost, CpalStream};
    }
}

pub use analysis::AnalysisTap;
pub use config::EngineConfig;
pub use controller::{PlaybackController, PlaybackState, Tuning};
pub use error::{EngineError, Result, SettingsError};
pub use graph::{AudioContext, AudioGraph, ContextState};
pub use host::{AudioHost, OfflineHost, OutputStream};
pub use noise::{NoiseColor, NoiseRecipe};
pub use pair::{PairStatus, ToneTargets};
pub use params::{NodeId, RampPolicy};
pub use settings::SessionSettings;
