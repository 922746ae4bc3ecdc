//! The binaural oscillator pair.
//!
//! Two sine tones, hard-panned to opposite ears. The right tone always
//! targets `left + beat`. A pair is started at most once; after `stop` a
//! fresh pair with new node identities must be built.

use serde::Serialize;
use tracing::{debug, info};

use crate::graph::AudioContext;
use crate::host::OutputStream;
use crate::nodes::{PairVoice, ToneVoice};
use crate::params::{NodeId, Param, ParamId};
use crate::render::Command;

const LEFT_PAN: f32 = -1.0;
const RIGHT_PAN: f32 = 1.0;

/// Lifecycle of the pair.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PairStatus {
    #[default]
    Unbuilt,
    Live,
    Stopped,
}

/// Committed frequency targets of a live pair.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ToneTargets {
    pub left: f32,
    pub right: f32,
    pub left_id: NodeId,
    pub right_id: NodeId,
}

impl ToneTargets {
    #[inline]
    pub fn beat(&self) -> f32 {
        self.right - self.left
    }
}

#[derive(Debug)]
struct Tones {
    left: Param,
    right: Param,
}

/// Control-side owner of the tone pair.
#[derive(Debug, Default)]
pub struct OscillatorPair {
    status: PairStatus,
    tones: Option<Tones>,
    builds: u32,
}

impl OscillatorPair {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline] pub fn status(&self) -> PairStatus { self.status }
    #[inline] pub fn is_live(&self) -> bool { self.status == PairStatus::Live }

    /// How many pairs have been built over this owner's lifetime.
    #[inline] pub fn builds(&self) -> u32 { self.builds }

    pub fn targets(&self) -> Option<ToneTargets> {
        let t = self.tones.as_ref()?;
        let (ParamId::ToneFrequency(left_id), ParamId::ToneFrequency(right_id)) = (t.left.id(), t.right.id()) else {
            return None;
        };
        Some(ToneTargets { left: t.left.target(), right: t.right.target(), left_id, right_id })
    }

    /// Build both tones and start rendering them. A live pair is left alone.
    /// Returns `true` when a new pair was built.
    pub fn start<S: OutputStream>(&mut self, ctx: &mut AudioContext<S>, base: f32, beat: f32) -> bool {
        if self.is_live() {
            debug!("pair already live; start ignored");
            return false;
        }
        let right_hz = base + beat;
        let left_id = ctx.alloc_node();
        let right_id = ctx.alloc_node();
        let voice = PairVoice::new(
            ToneVoice::new(left_id, base, LEFT_PAN),
            ToneVoice::new(right_id, right_hz, RIGHT_PAN),
        );
        ctx.queue().send(Command::AddPair(voice));

        self.tones = Some(Tones {
            left: Param::new(ParamId::ToneFrequency(left_id), base),
            right: Param::new(ParamId::ToneFrequency(right_id), right_hz),
        });
        self.status = PairStatus::Live;
        self.builds += 1;
        info!(left = base, right = right_hz, left_node = left_id.raw(), right_node = right_id.raw(), "tone pair started");
        true
    }

    /// Ramp both tones to the new tuning. Ignored unless the pair is live.
    pub fn retune<S: OutputStream>(&mut self, ctx: &AudioContext<S>, base: f32, beat: f32) -> bool {
        match self.tones.as_mut() {
            Some(t) if self.status == PairStatus::Live => {
                ctx.ramp(&mut t.left, base);
                ctx.ramp(&mut t.right, base + beat);
                true
            }
            _ => {
                debug!(base, beat, "no live pair; retune ignored");
                false
            }
        }
    }

    /// Stop both tones. The render side discards them at the start of its
    /// next block, so the context should already be suspended.
    pub fn stop<S: OutputStream>(&mut self, ctx: &AudioContext<S>) -> bool {
        if !self.is_live() {
            return false;
        }
        ctx.queue().send(Command::StopPair);
        self.tones = None;
        self.status = PairStatus::Stopped;
        info!("tone pair stopped");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{AudioGraph, GraphDefaults};
    use crate::host::OfflineHost;
    use crate::params::RampPolicy;

    fn graph() -> (OfflineHost, AudioGraph<OfflineHost>) {
        let host = OfflineHost::new(48_000.0);
        let defaults = GraphDefaults { master_volume: 0.5, noise_volume: 0.1, fft_size: 256, policy: RampPolicy::default() };
        (host.clone(), AudioGraph::new(host, defaults))
    }

    #[test]
    fn start_sets_offset_targets() {
        let (_host, mut g) = graph();
        let ctx = g.ensure_ready().unwrap();
        let mut pair = OscillatorPair::new();
        assert!(pair.start(ctx, 200.0, 10.0));
        let t = pair.targets().unwrap();
        assert_eq!((t.left, t.right), (200.0, 210.0));
        assert_ne!(t.left_id, t.right_id);
        assert_eq!(pair.status(), PairStatus::Live);
    }

    #[test]
    fn second_start_is_a_no_op() {
        let (_host, mut g) = graph();
        let ctx = g.ensure_ready().unwrap();
        let mut pair = OscillatorPair::new();
        pair.start(ctx, 200.0, 10.0);
        let ids = pair.targets().map(|t| (t.left_id, t.right_id));
        assert!(!pair.start(ctx, 300.0, 20.0));
        assert_eq!(pair.targets().map(|t| (t.left_id, t.right_id)), ids);
        assert_eq!(pair.builds(), 1);
    }

    #[test]
    fn retune_keeps_nodes_and_offset() {
        let (_host, mut g) = graph();
        let ctx = g.ensure_ready().unwrap();
        let mut pair = OscillatorPair::new();
        pair.start(ctx, 200.0, 10.0);
        let before = pair.targets().unwrap();
        assert!(pair.retune(ctx, 200.0, 40.0));
        let after = pair.targets().unwrap();
        assert_eq!(after.right, 240.0);
        assert_eq!(after.beat(), 40.0);
        assert_eq!((after.left_id, after.right_id), (before.left_id, before.right_id));
    }

    #[test]
    fn retune_before_start_is_ignored() {
        let (_host, mut g) = graph();
        let ctx = g.ensure_ready().unwrap();
        let mut pair = OscillatorPair::new();
        assert!(!pair.retune(ctx, 300.0, 5.0));
        assert!(pair.targets().is_none());
    }

    #[test]
    fn rebuild_after_stop_uses_fresh_ids() {
        let (_host, mut g) = graph();
        let ctx = g.ensure_ready().unwrap();
        let mut pair = OscillatorPair::new();
        pair.start(ctx, 200.0, 10.0);
        let first = pair.targets().unwrap();
        assert!(pair.stop(ctx));
        assert_eq!(pair.status(), PairStatus::Stopped);
        assert!(!pair.retune(ctx, 220.0, 10.0));
        assert!(pair.start(ctx, 150.0, 6.0));
        let second = pair.targets().unwrap();
        assert_ne!(first.left_id, second.left_id);
        assert_ne!(first.right_id, second.right_id);
        assert_eq!((second.left, second.right), (150.0, 156.0));
        assert_eq!(pair.builds(), 2);
    }
}
