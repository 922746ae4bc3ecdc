//! Read-only analysis tap for visualizers.
//!
//! The render thread writes every output sample (stereo averaged to mono)
//! into a ring and, once per block, publishes the most recent window into
//! the shared [`AnalysisTap`] with `try_lock`: if a reader holds the lock
//! the block is simply not published. Readers copy out on demand and only
//! ever see a complete window.

use std::sync::Arc;

use parking_lot::Mutex;

/// Shared snapshot of the latest time-domain window.
#[derive(Debug)]
pub struct AnalysisTap {
    fft_size: usize,
    window: Mutex<Vec<f32>>,
}

impl AnalysisTap {
    pub(crate) fn new(fft_size: usize) -> Self {
        let fft_size = fft_size.max(1);
        Self { fft_size, window: Mutex::new(vec![0.0; fft_size]) }
    }

    /// Window length in samples.
    #[inline] pub fn fft_size(&self) -> usize { self.fft_size }

    /// Half the window; the customary length of the byte buffer handed to visualizers.
    #[inline] pub fn frequency_bin_count(&self) -> usize { self.fft_size / 2 }

    /// Copy the oldest `min(out.len(), fft_size)` samples of the window. Returns the count.
    pub fn float_time_domain_data(&self, out: &mut [f32]) -> usize {
        let window = self.window.lock();
        let n = out.len().min(window.len());
        out[..n].copy_from_slice(&window[..n]);
        n
    }

    /// Same as [`float_time_domain_data`](Self::float_time_domain_data) but
    /// quantized to bytes centred on 128: `floor(128 * (1 + s))` clamped to `0..=255`.
    pub fn byte_time_domain_data(&self, out: &mut [u8]) -> usize {
        let window = self.window.lock();
        let n = out.len().min(window.len());
        for (b, &s) in out[..n].iter_mut().zip(window.iter()) {
            *b = to_byte(s);
        }
        n
    }

    /// Owned copy of the whole window.
    pub fn snapshot(&self) -> Vec<f32> {
        self.window.lock().clone()
    }
}

#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_byte(s: f32) -> u8 {
    (128.0 * (1.0 + s)).floor().clamp(0.0, 255.0) as u8
}

/// Render-side writer feeding an [`AnalysisTap`].
#[derive(Debug)]
pub(crate) struct TapWriter {
    ring: Vec<f32>,
    head: usize,
    tap: Arc<AnalysisTap>,
}

impl TapWriter {
    pub(crate) fn new(tap: Arc<AnalysisTap>) -> Self {
        Self { ring: vec![0.0; tap.fft_size()], head: 0, tap }
    }

    #[inline]
    pub(crate) fn push(&mut self, s: f32) {
        self.ring[self.head] = s;
        self.head += 1;
        if self.head == self.ring.len() {
            self.head = 0;
        }
    }

    /// Publish oldest-to-newest; skipped when a reader holds the lock.
    pub(crate) fn publish(&self) {
        let Some(mut window) = self.tap.window.try_lock() else {
            return;
        };
        let tail = self.ring.len() - self.head;
        window[..tail].copy_from_slice(&self.ring[self.head..]);
        window[tail..].copy_from_slice(&self.ring[..self.head]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_reads_as_midpoint_bytes() {
        let tap = AnalysisTap::new(8);
        let mut bytes = [0u8; 4];
        assert_eq!(tap.byte_time_domain_data(&mut bytes), 4);
        assert_eq!(bytes, [128; 4]);
    }

    #[test]
    fn byte_quantization_clamps() {
        assert_eq!(to_byte(1.0), 255);
        assert_eq!(to_byte(-1.0), 0);
        assert_eq!(to_byte(2.0), 255);
        assert_eq!(to_byte(-0.5), 64);
    }

    #[test]
    fn publish_orders_oldest_first() {
        let tap = Arc::new(AnalysisTap::new(4));
        let mut w = TapWriter::new(Arc::clone(&tap));
        for s in [0.1, 0.2, 0.3, 0.4, 0.5, 0.6] {
            w.push(s);
        }
        w.publish();
        assert_eq!(tap.snapshot(), vec![0.3, 0.4, 0.5, 0.6]);
    }

    #[test]
    fn publish_skips_while_reader_holds_lock() {
        let tap = Arc::new(AnalysisTap::new(2));
        let mut w = TapWriter::new(Arc::clone(&tap));
        w.push(0.5);
        {
            let _guard = tap.window.lock();
            w.publish();
        }
        assert_eq!(tap.snapshot(), vec![0.0, 0.0]);
        w.publish();
        assert_eq!(tap.snapshot(), vec![0.0, 0.5]);
    }

    #[test]
    fn bin_count_is_half_window() {
        let tap = AnalysisTap::new(2048);
        assert_eq!(tap.fft_size(), 2048);
        assert_eq!(tap.frequency_bin_count(), 1024);
    }
}
