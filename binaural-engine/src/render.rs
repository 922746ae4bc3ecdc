//! The render side of the session graph.
//!
//! A [`Renderer`] is handed to the host when the audio context is acquired
//! and from then on only runs inside the host's render callback. The control
//! thread talks to it exclusively through [`Command`]s, drained at the start
//! of every block:
//!
//! ```text
//!   PairVoice ─┐
//!              ├─> master gain ─> analysis tap ─> output
//!   NoiseVoice ─> noise gain ─┘
//! ```

use std::sync::Arc;

use binaural_core::ramp::Ramp;
use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::warn;

use crate::analysis::{AnalysisTap, TapWriter};
use crate::nodes::{NoiseVoice, PairVoice, Voice};
use crate::params::ParamId;

/// Control → render messages.
#[derive(Debug)]
pub(crate) enum Command {
    /// Connect and start a freshly built tone pair.
    AddPair(PairVoice),
    /// Stop the tone pair; it is discarded, never restarted.
    StopPair,
    /// Connect and start the looping noise source.
    AddNoise(NoiseVoice),
    SetTarget { param: ParamId, value: f32, tau: f32 },
}

/// Sending half of the command queue, owned by the audio context.
#[derive(Clone, Debug)]
pub(crate) struct CommandQueue {
    tx: Sender<Command>,
}

impl CommandQueue {
    /// Non-blocking; if the render side has been released the command is dropped.
    pub(crate) fn send(&self, cmd: Command) {
        if self.tx.send(cmd).is_err() {
            warn!("render side released; command dropped");
        }
    }
}

pub(crate) fn command_channel() -> (CommandQueue, Receiver<Command>) {
    let (tx, rx) = unbounded();
    (CommandQueue { tx }, rx)
}

/// Render-thread half of the session graph.
pub struct Renderer {
    rx: Receiver<Command>,
    sr: f32,
    master: Ramp,
    noise_gain: Ramp,
    pair: Option<PairVoice>,
    noise: Option<NoiseVoice>,
    tap: TapWriter,
}

impl core::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Renderer")
            .field("sr", &self.sr)
            .field("pair", &self.pair.is_some())
            .field("noise", &self.noise.is_some())
            .finish_non_exhaustive()
    }
}

impl Renderer {
    pub(crate) fn new(rx: Receiver<Command>, master: f32, noise_gain: f32, tap: Arc<AnalysisTap>) -> Self {
        Self {
            rx,
            sr: 48_000.0,
            master: Ramp::new(master),
            noise_gain: Ramp::new(noise_gain),
            pair: None,
            noise: None,
            tap: TapWriter::new(tap),
        }
    }

    /// Communicate the stream's sample rate. Hosts call this before the first block.
    #[inline]
    pub fn reset(&mut self, sr: f32) {
        self.sr = sr.max(1.0);
    }

    #[inline] pub fn sample_rate(&self) -> f32 { self.sr }

    /// Render `frames` stereo frames, handing each `(left, right)` pair to `emit`.
    pub fn process_with(&mut self, frames: usize, mut emit: impl FnMut(f32, f32)) {
        self.drain_commands();
        for _ in 0..frames {
            let (l, r) = self.next_frame();
            self.tap.push(0.5 * (l + r));
            emit(l.clamp(-1.0, 1.0), r.clamp(-1.0, 1.0));
        }
        self.tap.publish();
    }

    /// Render into an interleaved f32 buffer with `channels` channels.
    pub fn process_interleaved(&mut self, out: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        let mut frames = out.chunks_exact_mut(channels);
        let n = frames.len();
        self.process_with(n, |l, r| {
            if let Some(frame) = frames.next() {
                write_frame(frame, l, r, |s| s);
            }
        });
    }

    fn drain_commands(&mut self) {
        while let Ok(cmd) = self.rx.try_recv() {
            self.apply(cmd);
        }
    }

    fn apply(&mut self, cmd: Command) {
        match cmd {
            Command::AddPair(pair) => self.pair = Some(pair),
            Command::StopPair => self.pair = None,
            Command::AddNoise(noise) => self.noise = Some(noise),
            Command::SetTarget { param, value, tau } => self.set_target(param, value, tau),
        }
    }

    fn set_target(&mut self, param: ParamId, value: f32, tau: f32) {
        let sr = self.sr;
        let ramp = match param {
            ParamId::MasterGain => Some(&mut self.master),
            ParamId::NoiseGain => Some(&mut self.noise_gain),
            ParamId::NoiseLevel(id) => self
                .noise
                .as_mut()
                .filter(|n| n.id() == id)
                .map(NoiseVoice::level_mut),
            ParamId::ToneFrequency(id) => self
                .pair
                .as_mut()
                .and_then(|p| p.tone_mut(id))
                .map(|t| t.frequency_mut()),
        };
        // stale ids (a stopped pair) are ignored
        if let Some(ramp) = ramp {
            ramp.set_target(value, tau, sr);
        }
    }

    #[inline]
    fn next_frame(&mut self) -> (f32, f32) {
        let sr = self.sr;
        let (mut l, mut r) = match self.pair.as_mut() {
            Some(pair) => pair.next(sr),
            None => (0.0, 0.0),
        };
        let bed = self.noise.as_mut().map_or(0.0, |n| n.next(sr)) * self.noise_gain.next();
        l += bed;
        r += bed;
        let g = self.master.next();
        (l * g, r * g)
    }
}

/// Spread one stereo frame over a device frame of any width.
/// Mono devices get the average; channels past the second are silent.
#[inline]
pub fn write_frame<T: Copy>(frame: &mut [T], l: f32, r: f32, conv: impl Fn(f32) -> T) {
    match frame {
        [] => {}
        [mono] => *mono = conv(0.5 * (l + r)),
        [left, right, rest @ ..] => {
            *left = conv(l);
            *right = conv(r);
            for ch in rest {
                *ch = conv(0.0);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::ToneVoice;
    use crate::params::NodeId;

    fn renderer(master: f32) -> (CommandQueue, Renderer, Arc<AnalysisTap>) {
        let (queue, rx) = command_channel();
        let tap = Arc::new(AnalysisTap::new(64));
        let mut r = Renderer::new(rx, master, 0.0, Arc::clone(&tap));
        r.reset(48_000.0);
        (queue, r, tap)
    }

    fn pair(left: u32, right: u32) -> PairVoice {
        PairVoice::new(
            ToneVoice::new(NodeId::from_raw(left), 200.0, -1.0),
            ToneVoice::new(NodeId::from_raw(right), 210.0, 1.0),
        )
    }

    #[test]
    fn silent_without_sources() {
        let (_q, mut r, _tap) = renderer(0.5);
        let mut out = vec![1.0; 64];
        r.process_interleaved(&mut out, 2);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn pair_renders_on_both_ears_and_feeds_tap() {
        let (q, mut r, tap) = renderer(0.5);
        q.send(Command::AddPair(pair(1, 2)));
        let mut out = vec![0.0; 2 * 256];
        r.process_interleaved(&mut out, 2);
        let left_peak = out.iter().step_by(2).fold(0.0_f32, |m, s| m.max(s.abs()));
        let right_peak = out.iter().skip(1).step_by(2).fold(0.0_f32, |m, s| m.max(s.abs()));
        assert!(left_peak > 0.4 && left_peak <= 0.5 + 1e-6, "left_peak={left_peak}");
        assert!(right_peak > 0.4 && right_peak <= 0.5 + 1e-6, "right_peak={right_peak}");
        assert!(tap.snapshot().iter().any(|&s| s != 0.0));
    }

    #[test]
    fn stop_discards_pair_and_ignores_stale_targets() {
        let (q, mut r, _tap) = renderer(1.0);
        q.send(Command::AddPair(pair(1, 2)));
        q.send(Command::StopPair);
        q.send(Command::SetTarget { param: ParamId::ToneFrequency(NodeId::from_raw(1)), value: 300.0, tau: 0.1 });
        let mut out = vec![0.0; 32];
        r.process_interleaved(&mut out, 2);
        assert!(out.iter().all(|&s| s == 0.0));
        assert!(r.pair.is_none());
    }

    #[test]
    fn frequency_targets_ramp_instead_of_jumping() {
        let (q, mut r, _tap) = renderer(1.0);
        q.send(Command::AddPair(pair(1, 2)));
        q.send(Command::SetTarget { param: ParamId::ToneFrequency(NodeId::from_raw(2)), value: 240.0, tau: 0.1 });
        let mut out = vec![0.0; 2 * 480];
        r.process_interleaved(&mut out, 2);
        let right = r.pair.as_ref().map(|p| p.right().frequency().value()).unwrap_or_default();
        // 10 ms into a 100 ms time constant: well short of the target
        assert!(right > 210.0 && right < 215.0, "right={right}");
        assert_eq!(r.pair.as_ref().map(|p| p.right().frequency().target()), Some(240.0));
    }

    #[test]
    fn write_frame_handles_device_widths() {
        let mut mono = [0.0_f32; 1];
        write_frame(&mut mono, 1.0, 0.0, |s| s);
        assert_eq!(mono, [0.5]);
        let mut quad = [9.0_f32; 4];
        write_frame(&mut quad, 0.25, -0.25, |s| s);
        assert_eq!(quad, [0.25, -0.25, 0.0, 0.0]);
    }
}
