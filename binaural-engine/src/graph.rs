//! Audio graph manager.
//!
//! Owns the lazily acquired [`AudioContext`]: the host stream plus the fixed
//! part of the topology (master gain, noise gain, analysis tap). Acquisition
//! only happens through [`AudioGraph::ensure_ready`], which the playback
//! controller calls from its user-initiated `toggle()` path.
//!
//! ```text
//!   NoiseSource -> NoiseGain -> MasterGain -> AnalysisTap -> output
//!   (tone pair, attached later)  ^
//! ```

use std::sync::Arc;

use tracing::info;

use crate::analysis::AnalysisTap;
use crate::error::Result;
use crate::host::{AudioHost, OutputStream};
use crate::params::{NodeId, NodeIds, Param, ParamId, RampPolicy};
use crate::render::{command_channel, CommandQueue, Renderer};

/// Running state of an acquired context.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ContextState {
    Running,
    Suspended,
}

/// Values the fixed stages are built with. Until a context exists, volume
/// changes land here so the first build uses the latest values.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GraphDefaults {
    pub master_volume: f32,
    pub noise_volume: f32,
    pub fft_size: usize,
    pub policy: RampPolicy,
}

/// One acquired rendering context: the capability every node operation needs.
#[derive(Debug)]
pub struct AudioContext<S: OutputStream> {
    id: u64,
    stream: S,
    sample_rate: f32,
    state: ContextState,
    queue: CommandQueue,
    ids: NodeIds,
    policy: RampPolicy,
    master: Param,
    noise_gain: Param,
    tap_id: NodeId,
    tap: Arc<AnalysisTap>,
}

impl<S: OutputStream> AudioContext<S> {
    #[inline] pub fn id(&self) -> u64 { self.id }
    #[inline] pub fn sample_rate(&self) -> f32 { self.sample_rate }
    #[inline] pub fn state(&self) -> ContextState { self.state }
    #[inline] pub fn master_gain(&self) -> &Param { &self.master }
    #[inline] pub fn noise_gain(&self) -> &Param { &self.noise_gain }
    #[inline] pub fn tap_id(&self) -> NodeId { self.tap_id }
    #[inline] pub fn policy(&self) -> &RampPolicy { &self.policy }

    /// Read-only handle for visualizers.
    pub fn analysis(&self) -> Arc<AnalysisTap> {
        Arc::clone(&self.tap)
    }

    /// Request the host to start rendering.
    pub fn resume(&mut self) -> Result<()> {
        if self.state != ContextState::Running {
            self.stream.resume()?;
            self.state = ContextState::Running;
            info!(context = self.id, "audio context resumed");
        }
        Ok(())
    }

    /// Request the host to stop rendering; nodes stay in place.
    pub fn suspend(&mut self) -> Result<()> {
        if self.state != ContextState::Suspended {
            self.stream.suspend()?;
            self.state = ContextState::Suspended;
            info!(context = self.id, "audio context suspended");
        }
        Ok(())
    }

    pub fn set_master_gain(&mut self, level: f32) {
        self.master.ramp_to(level, &self.policy, &self.queue);
    }

    pub fn set_noise_gain(&mut self, level: f32) {
        self.noise_gain.ramp_to(level, &self.policy, &self.queue);
    }

    /// Ramp a parameter owned by a node of this context.
    pub(crate) fn ramp(&self, param: &mut Param, value: f32) {
        param.ramp_to(value, &self.policy, &self.queue);
    }

    pub(crate) fn alloc_node(&mut self) -> NodeId {
        self.ids.alloc()
    }

    pub(crate) fn queue(&self) -> &CommandQueue {
        &self.queue
    }
}

/// Lazily acquires and owns the session's audio context.
#[derive(Debug)]
pub struct AudioGraph<H: AudioHost> {
    host: H,
    defaults: GraphDefaults,
    context: Option<AudioContext<H::Stream>>,
    acquired: u64,
}

impl<H: AudioHost> AudioGraph<H> {
    pub fn new(host: H, defaults: GraphDefaults) -> Self {
        Self { host, defaults, context: None, acquired: 0 }
    }

    /// Return the context, acquiring the hardware resource and building the
    /// fixed stages on first use. Idempotent; a failure leaves no context behind.
    pub fn ensure_ready(&mut self) -> Result<&mut AudioContext<H::Stream>> {
        let ctx = match self.context.take() {
            Some(ctx) => ctx,
            None => self.acquire()?,
        };
        Ok(self.context.insert(ctx))
    }

    fn acquire(&mut self) -> Result<AudioContext<H::Stream>> {
        let d = self.defaults;
        let (queue, rx) = command_channel();
        let tap = Arc::new(AnalysisTap::new(d.fft_size));
        let renderer = Renderer::new(rx, d.master_volume, d.noise_volume, Arc::clone(&tap));
        let stream = self.host.open(renderer)?;

        let mut ids = NodeIds::default();
        let tap_id = ids.alloc();
        self.acquired += 1;
        let ctx = AudioContext {
            id: self.acquired,
            sample_rate: stream.sample_rate(),
            stream,
            state: ContextState::Suspended,
            queue,
            ids,
            policy: d.policy,
            master: Param::new(ParamId::MasterGain, d.master_volume),
            noise_gain: Param::new(ParamId::NoiseGain, d.noise_volume),
            tap_id,
            tap,
        };
        info!(context = ctx.id, sample_rate = ctx.sample_rate, master = d.master_volume, noise = d.noise_volume, "audio context acquired");
        Ok(ctx)
    }

    #[inline] pub fn is_ready(&self) -> bool { self.context.is_some() }
    #[inline] pub fn context(&self) -> Option<&AudioContext<H::Stream>> { self.context.as_ref() }
    #[inline] pub fn context_mut(&mut self) -> Option<&mut AudioContext<H::Stream>> { self.context.as_mut() }
    #[inline] pub fn defaults(&self) -> &GraphDefaults { &self.defaults }
    #[inline] pub(crate) fn defaults_mut(&mut self) -> &mut GraphDefaults { &mut self.defaults }
    #[inline] pub fn host(&self) -> &H { &self.host }

    /// Number of contexts acquired over this graph's lifetime.
    #[inline] pub fn contexts_acquired(&self) -> u64 { self.acquired }

    /// Release the hardware resource (session end).
    pub fn release(&mut self) {
        if let Some(ctx) = self.context.take() {
            info!(context = ctx.id, "audio context released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::host::OfflineHost;

    fn defaults() -> GraphDefaults {
        GraphDefaults { master_volume: 0.5, noise_volume: 0.1, fft_size: 2048, policy: RampPolicy::default() }
    }

    #[test]
    fn ensure_ready_is_idempotent() {
        let host = OfflineHost::new(48_000.0);
        let mut graph = AudioGraph::new(host.clone(), defaults());
        let (id, tap_id, tap) = {
            let ctx = graph.ensure_ready().unwrap();
            (ctx.id(), ctx.tap_id(), ctx.analysis())
        };
        let ctx = graph.ensure_ready().unwrap();
        assert_eq!(ctx.id(), id);
        assert_eq!(ctx.tap_id(), tap_id);
        assert!(Arc::ptr_eq(&ctx.analysis(), &tap));
        assert_eq!(graph.contexts_acquired(), 1);
        assert_eq!(host.opened(), 1);
    }

    #[test]
    fn fresh_context_is_suspended_with_default_gains() {
        let mut graph = AudioGraph::new(OfflineHost::new(48_000.0), defaults());
        let ctx = graph.ensure_ready().unwrap();
        assert_eq!(ctx.state(), ContextState::Suspended);
        assert_eq!(ctx.master_gain().target(), 0.5);
        assert_eq!(ctx.noise_gain().target(), 0.1);
        assert_eq!(ctx.analysis().fft_size(), 2048);
    }

    #[test]
    fn failed_acquisition_leaves_no_context_and_can_retry() {
        let host = OfflineHost::new(48_000.0);
        host.set_available(false);
        let mut graph = AudioGraph::new(host.clone(), defaults());
        assert!(matches!(graph.ensure_ready(), Err(EngineError::ResourceUnavailable(_))));
        assert!(!graph.is_ready());
        host.set_available(true);
        assert!(graph.ensure_ready().is_ok());
        assert_eq!(graph.contexts_acquired(), 1);
    }

    #[test]
    fn suspend_resume_toggle_running_state() {
        let host = OfflineHost::new(48_000.0);
        let mut graph = AudioGraph::new(host.clone(), defaults());
        let ctx = graph.ensure_ready().unwrap();
        ctx.resume().unwrap();
        assert!(host.is_running());
        ctx.suspend().unwrap();
        assert!(!host.is_running());
        assert_eq!(ctx.state(), ContextState::Suspended);
        graph.release();
        assert!(!host.is_open());
    }
}
