//! C ABI wrapper for the binaural session engine.
//!
//! The host application owns the audio callback: it creates a session,
//! drives play/pause and tuning from its UI thread and pulls interleaved
//! samples with `binaural_render_interleaved_f32` from its audio callback.
//!
//! ABI notes
//! - All functions are `extern "C"` and `#[no_mangle]`.
//! - Opaque handle type: `BinauralSession` (heap-allocated; destroy it with
//!   `binaural_destroy`).
//! - Every function accepts a null handle and does nothing (or returns 0/-1).
//!
//! Threading
//! - The object is NOT thread-safe; serialize calls on one handle.

use binaural_engine::{EngineConfig, NoiseColor, OfflineHost, PlaybackController, PlaybackState};

/// Opaque session we hand to C.
pub struct BinauralSession {
    host: OfflineHost,
    controller: PlaybackController<OfflineHost>,
}

impl BinauralSession {
    fn new(sample_rate: f32) -> Self {
        let host = OfflineHost::new(sample_rate);
        let controller = PlaybackController::new(host.clone(), &EngineConfig::default());
        Self { host, controller }
    }
}

fn session<'a>(ptr: *mut BinauralSession) -> Option<&'a mut BinauralSession> {
    // SAFETY: callers pass either null or a pointer from `binaural_create`
    // that has not been destroyed.
    unsafe { ptr.as_mut() }
}

// --- Creation / destruction -------------------------------------------------------

/// Create a session rendering at `sample_rate`. Nothing is played until
/// `binaural_toggle` is called.
#[no_mangle]
pub extern "C" fn binaural_create(sample_rate: f32) -> *mut BinauralSession {
    let sr = if sample_rate.is_finite() && sample_rate > 0.0 { sample_rate } else { 48_000.0 };
    Box::into_raw(Box::new(BinauralSession::new(sr)))
}

/// Destroy a session previously returned by `binaural_create`.
#[no_mangle]
pub extern "C" fn binaural_destroy(session: *mut BinauralSession) {
    if !session.is_null() {
        // SAFETY: pointer came from `Box::into_raw` in `binaural_create`.
        unsafe { drop(Box::from_raw(session)) };
    }
}

// --- Transport -------------------------------------------------------------------

/// Play/pause. Returns 1 when now playing, 0 when now idle, -1 on error
/// (null handle or the output could not be acquired).
#[no_mangle]
pub extern "C" fn binaural_toggle(session_ptr: *mut BinauralSession) -> i32 {
    let Some(s) = session(session_ptr) else { return -1 };
    match s.controller.toggle() {
        Ok(PlaybackState::Playing) => 1,
        Ok(PlaybackState::Idle) => 0,
        Err(_) => -1,
    }
}

/// Stop the tones; the next toggle rebuilds them. Returns 0, or -1 on error.
#[no_mangle]
pub extern "C" fn binaural_stop(session_ptr: *mut BinauralSession) -> i32 {
    let Some(s) = session(session_ptr) else { return -1 };
    match s.controller.stop() {
        Ok(()) => 0,
        Err(_) => -1,
    }
}

#[no_mangle]
pub extern "C" fn binaural_is_playing(session_ptr: *mut BinauralSession) -> i32 {
    session(session_ptr).map_or(0, |s| i32::from(s.controller.is_playing()))
}

// --- Parameters ------------------------------------------------------------------

/// Set carrier and beat frequency (Hz). Applied immediately while playing,
/// otherwise at the next toggle.
#[no_mangle]
pub extern "C" fn binaural_retune(session_ptr: *mut BinauralSession, base_hz: f32, beat_hz: f32) {
    if !(base_hz.is_finite() && beat_hz.is_finite()) {
        return;
    }
    if let Some(s) = session(session_ptr) {
        s.controller.retune(base_hz.max(0.0), beat_hz.max(0.0));
    }
}

#[no_mangle]
pub extern "C" fn binaural_set_master_volume(session_ptr: *mut BinauralSession, volume: f32) {
    if let Some(s) = session(session_ptr) {
        let v = if volume.is_finite() { volume.clamp(0.0, 1.0) } else { 0.0 };
        s.controller.set_master_volume(v);
    }
}

#[no_mangle]
pub extern "C" fn binaural_set_noise_volume(session_ptr: *mut BinauralSession, volume: f32) {
    if let Some(s) = session(session_ptr) {
        let v = if volume.is_finite() { volume.clamp(0.0, 1.0) } else { 0.0 };
        s.controller.set_noise_volume(v);
    }
}

/// Select the noise color: 0 off, 1 white, 2 pink, 3 brown.
/// Returns the resulting noise volume, or -1 for an unknown color.
#[no_mangle]
pub extern "C" fn binaural_set_noise_color(session_ptr: *mut BinauralSession, color: u32) -> f32 {
    let Some(s) = session(session_ptr) else { return -1.0 };
    let Some(&c) = usize::try_from(color).ok().and_then(|i| NoiseColor::ALL.get(i)) else {
        return -1.0;
    };
    s.controller.set_noise_color(c);
    s.controller.noise_volume()
}

// --- Rendering -------------------------------------------------------------------

/// Render `frames` frames into an interleaved f32 buffer with `channels`
/// channels. Mono gets the average of both ears; channels past the second
/// are silent. While idle the buffer is filled with silence.
///
/// Returns the number of frames written (0 on error).
#[no_mangle]
pub extern "C" fn binaural_render_interleaved_f32(
    session_ptr: *mut BinauralSession,
    out_interleaved: *mut f32,
    frames: u32,
    channels: u32,
) -> u32 {
    let Some(s) = session(session_ptr) else { return 0 };
    if out_interleaved.is_null() || frames == 0 || channels == 0 {
        return 0;
    }
    let ch = channels as usize;
    // SAFETY: caller guarantees `frames * channels` writable floats.
    let out = unsafe { std::slice::from_raw_parts_mut(out_interleaved, frames as usize * ch) };
    s.host.render(out, ch);
    frames
}

/// Copy the latest analysis window as bytes centred on 128.
/// Returns the number of bytes written (0 before the first play).
#[no_mangle]
pub extern "C" fn binaural_analysis_bytes(session_ptr: *mut BinauralSession, out: *mut u8, len: u32) -> u32 {
    let Some(s) = session(session_ptr) else { return 0 };
    if out.is_null() || len == 0 {
        return 0;
    }
    let Some(tap) = s.controller.analysis() else { return 0 };
    // SAFETY: caller guarantees `len` writable bytes.
    let out = unsafe { std::slice::from_raw_parts_mut(out, len as usize) };
    u32::try_from(tap.byte_time_domain_data(out)).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_handles_are_harmless() {
        let null = std::ptr::null_mut();
        assert_eq!(binaural_toggle(null), -1);
        assert_eq!(binaural_is_playing(null), 0);
        binaural_retune(null, 200.0, 10.0);
        assert_eq!(binaural_render_interleaved_f32(null, std::ptr::null_mut(), 16, 2), 0);
        binaural_destroy(null);
    }

    #[test]
    fn renders_after_toggle() {
        let s = binaural_create(48_000.0);
        let mut buf = vec![0.0_f32; 2 * 512];
        assert_eq!(binaural_render_interleaved_f32(s, buf.as_mut_ptr(), 512, 2), 512);
        assert!(buf.iter().all(|&x| x == 0.0));

        assert_eq!(binaural_toggle(s), 1);
        assert_eq!(binaural_is_playing(s), 1);
        // fill the whole 2048-sample analysis window
        for _ in 0..4 {
            binaural_render_interleaved_f32(s, buf.as_mut_ptr(), 512, 2);
        }
        assert!(buf.iter().any(|&x| x != 0.0));

        let mut bytes = vec![0_u8; 1024];
        assert_eq!(binaural_analysis_bytes(s, bytes.as_mut_ptr(), 1024), 1024);
        assert!(bytes.iter().any(|&b| b != 128));

        assert_eq!(binaural_toggle(s), 0);
        binaural_destroy(s);
    }

    #[test]
    fn noise_color_from_off_raises_silent_volume() {
        let s = binaural_create(44_100.0);
        binaural_set_noise_volume(s, 0.0);
        assert!((binaural_set_noise_color(s, 1) - 0.2).abs() < 1e-6);
        assert_eq!(binaural_set_noise_color(s, 9), -1.0);
        binaural_destroy(s);
    }
}
