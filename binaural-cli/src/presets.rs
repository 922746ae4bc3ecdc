//! Preset catalog, brainwave band labels and input ranges.

use binaural_engine::SessionSettings;

pub const BASE_RANGE: (f32, f32) = (60.0, 900.0);
pub const BEAT_RANGE: (f32, f32) = (0.5, 50.0);

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Preset {
    pub id: &'static str,
    pub name: &'static str,
    pub base: f32,
    pub beat: f32,
    pub description: &'static str,
}

pub static PRESETS: [Preset; 5] = [
    Preset { id: "deep-sleep",           name: "Deep Sleep",           base: 100.0, beat: 2.0,  description: "Dreamless sleep, restoration, healing." },
    Preset { id: "deep-meditation",      name: "Deep Meditation",      base: 150.0, beat: 6.0,  description: "Creativity, dreaming, reduced anxiety." },
    Preset { id: "relaxed-focus",        name: "Relaxed Focus",        base: 200.0, beat: 10.0, description: "Positive thinking, fast learning, flow state." },
    Preset { id: "active-concentration", name: "Active Concentration", base: 300.0, beat: 20.0, description: "Problem solving, memory, alertness." },
    Preset { id: "peak-performance",     name: "Peak Performance",     base: 400.0, beat: 40.0, description: "Cognitive enhancement, memory recall." },
];

pub const DEFAULT_PRESET: &str = "relaxed-focus";

pub fn find(id: &str) -> Option<&'static Preset> {
    let id = id.trim();
    PRESETS.iter().find(|p| p.id.eq_ignore_ascii_case(id))
}

/// Brainwave band a beat frequency falls into.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Band {
    Delta,
    Theta,
    Alpha,
    Beta,
    Gamma,
}

// upper bounds (exclusive), ascending
const BANDS: [(f32, Band); 4] = [(4.0, Band::Delta), (8.0, Band::Theta), (13.0, Band::Alpha), (30.0, Band::Beta)];

impl Band {
    pub fn of(beat_hz: f32) -> Band {
        BANDS.iter().find(|(hi, _)| beat_hz < *hi).map_or(Band::Gamma, |&(_, b)| b)
    }

    pub fn label(self) -> &'static str {
        match self {
            Band::Delta => "Delta (0.5-4Hz)",
            Band::Theta => "Theta (4-8Hz)",
            Band::Alpha => "Alpha (8-13Hz)",
            Band::Beta => "Beta (13-30Hz)",
            Band::Gamma => "Gamma (30Hz+)",
        }
    }
}

#[inline]
pub fn clamp_base(hz: f32) -> f32 {
    hz.clamp(BASE_RANGE.0, BASE_RANGE.1)
}

#[inline]
pub fn clamp_beat(hz: f32) -> f32 {
    hz.clamp(BEAT_RANGE.0, BEAT_RANGE.1)
}

#[inline]
pub fn clamp_volume(v: f32) -> f32 {
    v.clamp(0.0, 1.0)
}

/// Pull a coaching answer into the player's ranges.
pub fn clamp_settings(mut settings: SessionSettings) -> SessionSettings {
    settings.base_frequency = clamp_base(settings.base_frequency);
    settings.beat_frequency = clamp_beat(settings.beat_frequency);
    settings
}
