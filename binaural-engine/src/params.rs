//! Parameter identities and the ramp policy.
//!
//! A [`Param`] is the control-side view of a render-side [`Ramp`](binaural_core::ramp::Ramp):
//! it remembers the last committed target and is the only way to change it.
//! Every write goes out as a `SetTarget` command carrying the time constant
//! chosen by the [`RampPolicy`] for that parameter's kind.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::render::{Command, CommandQueue};

/// Identity of a node in one audio context. Never reused within a context.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    #[cfg(test)]
    #[inline] pub(crate) fn from_raw(raw: u32) -> Self { Self(raw) }
    #[inline] pub fn raw(self) -> u32 { self.0 }
}

/// Monotonic node id allocator owned by an audio context.
#[derive(Debug, Default)]
pub(crate) struct NodeIds {
    next: u32,
}

impl NodeIds {
    pub(crate) fn alloc(&mut self) -> NodeId {
        self.next += 1;
        NodeId(self.next)
    }
}

/// What a parameter controls; decides its time constant.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ParamKind {
    Frequency,
    Gain,
}

/// Addressable render-side parameters.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ParamId {
    MasterGain,
    NoiseGain,
    /// Bed level of one noise source (mute/unmute by color).
    NoiseLevel(NodeId),
    ToneFrequency(NodeId),
}

impl ParamId {
    #[inline]
    pub fn kind(self) -> ParamKind {
        match self {
            ParamId::ToneFrequency(_) => ParamKind::Frequency,
            ParamId::MasterGain | ParamId::NoiseGain | ParamId::NoiseLevel(_) => ParamKind::Gain,
        }
    }
}

/// Time constants (seconds) of the exponential approach, per parameter kind.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RampPolicy {
    pub tone_tau_secs: f32,
    pub gain_tau_secs: f32,
}

impl Default for RampPolicy {
    fn default() -> Self {
        Self { tone_tau_secs: 0.1, gain_tau_secs: 0.05 }
    }
}

impl RampPolicy {
    #[inline]
    pub fn tau(&self, kind: ParamKind) -> f32 {
        match kind {
            ParamKind::Frequency => self.tone_tau_secs,
            ParamKind::Gain => self.gain_tau_secs,
        }
    }
}

/// Control-side handle of one live parameter.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Param {
    id: ParamId,
    target: f32,
}

impl Param {
    pub(crate) fn new(id: ParamId, initial: f32) -> Self {
        Self { id, target: initial }
    }

    #[inline] pub fn id(&self) -> ParamId { self.id }

    /// Last committed target (the render side may still be approaching it).
    #[inline] pub fn target(&self) -> f32 { self.target }

    pub(crate) fn ramp_to(&mut self, value: f32, policy: &RampPolicy, queue: &CommandQueue) {
        let tau = policy.tau(self.id.kind());
        debug!(param = ?self.id, from = self.target, to = value, tau, "ramp target");
        self.target = value;
        queue.send(Command::SetTarget { param: self.id, value, tau });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::command_channel;

    #[test]
    fn policy_picks_tau_by_kind() {
        let p = RampPolicy::default();
        assert_eq!(p.tau(ParamId::ToneFrequency(NodeId(1)).kind()), 0.1);
        assert_eq!(p.tau(ParamId::MasterGain.kind()), 0.05);
        assert_eq!(p.tau(ParamId::NoiseLevel(NodeId(2)).kind()), 0.05);
    }

    #[test]
    fn ramp_to_commits_target_and_sends_command() {
        let (queue, rx) = command_channel();
        let mut gain = Param::new(ParamId::MasterGain, 0.5);
        gain.ramp_to(0.25, &RampPolicy::default(), &queue);
        assert_eq!(gain.target(), 0.25);
        match rx.try_recv() {
            Ok(Command::SetTarget { param, value, tau }) => {
                assert_eq!(param, ParamId::MasterGain);
                assert_eq!(value, 0.25);
                assert_eq!(tau, 0.05);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn node_ids_are_unique() {
        let mut ids = NodeIds::default();
        let a = ids.alloc();
        let b = ids.alloc();
        assert_ne!(a, b);
    }
}
