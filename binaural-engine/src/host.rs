//! Hosts own the hardware resource and the render thread.
//!
//! The engine never renders by itself: on acquisition it hands its
//! [`Renderer`] to an [`AudioHost`], which drives it from whatever real-time
//! callback mechanism it has, and gets back an [`OutputStream`] it can
//! suspend, resume or drop (release).
//!
//! [`OfflineHost`] is the pull-driven host: the caller renders blocks
//! explicitly. It backs the tests and the C ABI.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::render::{write_frame, Renderer};

/// A running (or suspended) output stream. Dropping it releases the resource.
pub trait OutputStream {
    fn sample_rate(&self) -> f32;

    /// Ask the host to start pulling audio. Returns once the request is issued.
    fn resume(&mut self) -> Result<()>;

    /// Ask the host to stop pulling audio. Nodes are left untouched.
    fn suspend(&mut self) -> Result<()>;
}

/// Source of output streams.
pub trait AudioHost {
    type Stream: OutputStream;

    /// Acquire the output resource and move `renderer` onto the render side.
    /// Implementations must call [`Renderer::reset`] with the stream's rate
    /// before the first block. The stream starts suspended.
    fn open(&mut self, renderer: Renderer) -> Result<Self::Stream>;
}

#[derive(Debug, Default)]
struct Offline {
    renderer: Option<Renderer>,
    running: bool,
    unavailable: bool,
    opened: usize,
}

/// Pull-driven host. Clones share the same device slot, so a test (or an
/// FFI caller) can keep one clone to render while the controller owns another.
#[derive(Clone, Debug)]
pub struct OfflineHost {
    sample_rate: f32,
    shared: Arc<Mutex<Offline>>,
}

impl OfflineHost {
    pub fn new(sample_rate: f32) -> Self {
        Self { sample_rate: sample_rate.max(1.0), shared: Arc::new(Mutex::new(Offline::default())) }
    }

    /// Simulate a missing device: subsequent `open` calls fail.
    pub fn set_available(&self, available: bool) {
        self.shared.lock().unavailable = !available;
    }

    #[inline] pub fn sample_rate(&self) -> f32 { self.sample_rate }

    /// How many times a stream has been opened on this host.
    pub fn opened(&self) -> usize { self.shared.lock().opened }

    pub fn is_open(&self) -> bool { self.shared.lock().renderer.is_some() }

    pub fn is_running(&self) -> bool {
        let s = self.shared.lock();
        s.running && s.renderer.is_some()
    }

    /// Render one interleaved block. A suspended or closed stream yields
    /// silence and does not advance. Returns whether audio was rendered.
    pub fn render(&self, out: &mut [f32], channels: usize) -> bool {
        let mut s = self.shared.lock();
        let running = s.running;
        match s.renderer.as_mut() {
            Some(renderer) if running => {
                renderer.process_interleaved(out, channels);
                true
            }
            _ => {
                out.fill(0.0);
                false
            }
        }
    }

    /// Render `frames` stereo frames into separate left/right buffers.
    pub fn render_stereo(&self, frames: usize) -> (Vec<f32>, Vec<f32>) {
        let mut left = Vec::with_capacity(frames);
        let mut right = Vec::with_capacity(frames);
        let mut s = self.shared.lock();
        let running = s.running;
        match s.renderer.as_mut() {
            Some(renderer) if running => renderer.process_with(frames, |l, r| {
                let mut frame = [0.0_f32; 2];
                write_frame(&mut frame, l, r, |x| x);
                left.push(frame[0]);
                right.push(frame[1]);
            }),
            _ => {
                left.resize(frames, 0.0);
                right.resize(frames, 0.0);
            }
        }
        (left, right)
    }
}

impl AudioHost for OfflineHost {
    type Stream = OfflineStream;

    fn open(&mut self, mut renderer: Renderer) -> Result<OfflineStream> {
        let mut s = self.shared.lock();
        if s.unavailable {
            return Err(EngineError::ResourceUnavailable("offline device marked unavailable".into()));
        }
        renderer.reset(self.sample_rate);
        s.renderer = Some(renderer);
        s.running = false;
        s.opened += 1;
        debug!(sample_rate = self.sample_rate, "offline stream opened");
        Ok(OfflineStream { sample_rate: self.sample_rate, shared: Arc::clone(&self.shared) })
    }
}

/// Stream handle of an [`OfflineHost`].
#[derive(Debug)]
pub struct OfflineStream {
    sample_rate: f32,
    shared: Arc<Mutex<Offline>>,
}

impl OutputStream for OfflineStream {
    fn sample_rate(&self) -> f32 { self.sample_rate }

    fn resume(&mut self) -> Result<()> {
        self.shared.lock().running = true;
        Ok(())
    }

    fn suspend(&mut self) -> Result<()> {
        self.shared.lock().running = false;
        Ok(())
    }
}

impl Drop for OfflineStream {
    fn drop(&mut self) {
        let mut s = self.shared.lock();
        s.running = false;
        s.renderer = None;
        debug!("offline stream released");
    }
}
