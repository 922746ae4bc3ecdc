//! Noise bed: one looping, buffer-backed source under the tones.
//!
//! Colors dispatch through a small recipe table. Pink and Brown currently
//! share the white generator: color selection changes the bed's mix
//! behaviour (Off mutes it, any other color unmutes it) but not the
//! buffer's spectrum. The buffer is generated once per source instance.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::graph::AudioContext;
use crate::host::OutputStream;
use crate::nodes::NoiseVoice;
use crate::params::{NodeId, Param, ParamId};
use crate::render::Command;

/// Background noise selection.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoiseColor {
    #[default]
    Off,
    White,
    Pink,
    Brown,
}

/// How a color is rendered.
#[derive(Copy, Clone, Debug)]
pub struct NoiseRecipe {
    pub color: NoiseColor,
    /// Whether selecting this color asks for a noise source at all.
    pub audible: bool,
    /// Bed level the source ramps to when this color is selected.
    pub bed_level: f32,
    generate: fn(&mut StdRng, &mut [f32]),
}

impl NoiseRecipe {
    /// Fill `out` with fresh noise for this recipe.
    pub fn generate(&self, rng: &mut StdRng, out: &mut [f32]) {
        (self.generate)(rng, out);
    }
}

/// Independent uniform samples in [-1, 1].
fn fill_uniform(rng: &mut StdRng, out: &mut [f32]) {
    for s in out {
        *s = rng.gen_range(-1.0..=1.0);
    }
}

static RECIPES: [NoiseRecipe; 4] = [
    NoiseRecipe { color: NoiseColor::Off,   audible: false, bed_level: 0.0, generate: fill_uniform },
    NoiseRecipe { color: NoiseColor::White, audible: true,  bed_level: 1.0, generate: fill_uniform },
    NoiseRecipe { color: NoiseColor::Pink,  audible: true,  bed_level: 1.0, generate: fill_uniform },
    NoiseRecipe { color: NoiseColor::Brown, audible: true,  bed_level: 1.0, generate: fill_uniform },
];

impl NoiseColor {
    pub const ALL: [NoiseColor; 4] = [NoiseColor::Off, NoiseColor::White, NoiseColor::Pink, NoiseColor::Brown];

    #[inline]
    pub fn recipe(self) -> &'static NoiseRecipe {
        &RECIPES[self as usize]
    }

    #[inline]
    pub fn is_audible(self) -> bool {
        self.recipe().audible
    }

    pub fn label(self) -> &'static str {
        match self {
            NoiseColor::Off => "Off",
            NoiseColor::White => "White",
            NoiseColor::Pink => "Pink",
            NoiseColor::Brown => "Brown",
        }
    }
}

impl fmt::Display for NoiseColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Unknown noise color name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown noise color `{0}` (expected off, white, pink or brown)")]
pub struct ParseNoiseColorError(String);

impl FromStr for NoiseColor {
    type Err = ParseNoiseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NoiseColor::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseNoiseColorError(s.to_string()))
    }
}

/// Generate a buffer of `secs` seconds at `sr` using `color`'s recipe.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn noise_buffer(color: NoiseColor, secs: f32, sr: f32, seed: Option<u64>) -> Vec<f32> {
    let len = (secs.max(0.0) * sr).round() as usize;
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut buf = vec![0.0; len];
    color.recipe().generate(&mut rng, &mut buf);
    buf
}

#[derive(Debug)]
struct NoiseSource {
    id: NodeId,
    buffer: Arc<[f32]>,
    level: Param,
}

/// Control-side owner of the noise source and the selected color.
#[derive(Debug)]
pub struct NoiseBed {
    color: NoiseColor,
    buffer_secs: f32,
    seed: Option<u64>,
    source: Option<NoiseSource>,
}

impl NoiseBed {
    pub fn new(color: NoiseColor, buffer_secs: f32, seed: Option<u64>) -> Self {
        Self { color, buffer_secs, seed, source: None }
    }

    #[inline] pub fn color(&self) -> NoiseColor { self.color }
    #[inline] pub fn is_built(&self) -> bool { self.source.is_some() }
    pub fn source_id(&self) -> Option<NodeId> { self.source.as_ref().map(|s| s.id) }

    /// The looping buffer, once a source exists.
    pub fn buffer(&self) -> Option<&[f32]> {
        self.source.as_ref().map(|s| &*s.buffer)
    }

    /// Current bed level target (0 when muted by `Off`).
    pub fn bed_level(&self) -> Option<f32> {
        self.source.as_ref().map(|s| s.level.target())
    }

    /// Build and start the source on first call with an audible color.
    /// Returns `true` only when a source was built.
    pub fn ensure<S: OutputStream>(&mut self, ctx: &mut AudioContext<S>) -> bool {
        if self.source.is_some() || !self.color.is_audible() {
            return false;
        }
        let buffer: Arc<[f32]> = noise_buffer(self.color, self.buffer_secs, ctx.sample_rate(), self.seed).into();
        let id = ctx.alloc_node();
        let bed_level = self.color.recipe().bed_level;
        ctx.queue().send(Command::AddNoise(NoiseVoice::new(id, Arc::clone(&buffer), bed_level)));
        info!(node = id.raw(), samples = buffer.len(), color = %self.color, "noise source started");
        self.source = Some(NoiseSource { id, buffer, level: Param::new(ParamId::NoiseLevel(id), bed_level) });
        true
    }

    /// Record the selected color and, if a source exists, ramp its bed level.
    pub fn select<S: OutputStream>(&mut self, ctx: Option<&AudioContext<S>>, color: NoiseColor) {
        let previous = self.color;
        self.color = color;
        if previous == color {
            return;
        }
        if let (Some(src), Some(ctx)) = (self.source.as_mut(), ctx) {
            ctx.ramp(&mut src.level, color.recipe().bed_level);
        }
    }

    /// Ramp the noise gain stage.
    pub fn set_volume<S: OutputStream>(&self, ctx: &mut AudioContext<S>, level: f32) {
        ctx.set_noise_gain(level);
    }
}
