//! CPAL-backed host: the render callback runs on the device's audio thread.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{debug, info, warn};

use crate::error::{EngineError, Result};
use crate::host::{AudioHost, OutputStream};
use crate::render::{write_frame, Renderer};

fn unavailable(e: impl std::fmt::Display) -> EngineError {
    EngineError::ResourceUnavailable(e.to_string())
}

/// Output device request. Everything unset falls back to the system default.
#[derive(Debug, Clone, Default)]
pub struct CpalHost {
    device_name: Option<String>,
    sample_rate: Option<u32>,
    channels: Option<u16>,
}

impl CpalHost {
    pub fn new() -> Self { Self::default() }

    #[must_use]
    pub fn with_device(mut self, name: Option<String>) -> Self { self.device_name = name; self }
    #[must_use]
    pub fn with_sample_rate(mut self, sr: Option<u32>) -> Self { self.sample_rate = sr; self }
    #[must_use]
    pub fn with_channels(mut self, ch: Option<u16>) -> Self { self.channels = ch; self }

    /// Names of all output devices of the default host.
    pub fn output_device_names() -> Result<Vec<String>> {
        let host = cpal::default_host();
        let mut names = Vec::new();
        for dev in host.output_devices().map_err(unavailable)? {
            names.push(dev.name().map_err(unavailable)?);
        }
        Ok(names)
    }

    fn pick_device(&self) -> Result<cpal::Device> {
        let host = cpal::default_host();
        if let Some(name) = &self.device_name {
            for d in host.output_devices().map_err(unavailable)? {
                if d.name().map_err(unavailable)? == *name { return Ok(d); }
            }
            return Err(unavailable(format!("requested device not found: {name}")));
        }
        host.default_output_device()
            .ok_or_else(|| unavailable("no default output device"))
    }

    fn choose_config(&self, device: &cpal::Device) -> Result<cpal::SupportedStreamConfig> {
        let (req_sr, req_ch) = (self.sample_rate, self.channels);
        // If nothing requested, default is already concrete.
        if req_sr.is_none() && req_ch.is_none() {
            return device.default_output_config().map_err(unavailable);
        }

        // Pick a SupportedStreamConfigRange first; prefer stereo when unspecified.
        let want_ch = req_ch.unwrap_or(2);
        let mut best: Option<(u64, cpal::SupportedStreamConfigRange)> = None;
        for range in device.supported_output_configs().map_err(unavailable)? {
            let ch     = range.channels();
            let sr_min = range.min_sample_rate().0;
            let sr_max = range.max_sample_rate().0;

            let ch_pen = u64::from(ch.abs_diff(want_ch));
            let sr_pen = match req_sr {
                Some(sr) => if (sr_min..=sr_max).contains(&sr) { 0 } else { u64::from(sr_min.abs_diff(sr).min(sr_max.abs_diff(sr))) },
                None => 0,
            };

            let score = sr_pen.saturating_mul(1000) + ch_pen;
            if best.as_ref().map_or(true, |(s, _)| score < *s) {
                best = Some((score, range));
            }
        }

        let (_, range) = best.ok_or_else(|| unavailable("no supported output configs"))?;

        // Choose a concrete sample rate and convert the range into a concrete config.
        let pick_sr = match req_sr {
            Some(sr) => cpal::SampleRate(sr.clamp(range.min_sample_rate().0, range.max_sample_rate().0)),
            None => range.max_sample_rate(),
        };

        Ok(range.with_sample_rate(pick_sr))
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    cfg: &cpal::StreamConfig,
    mut renderer: Renderer,
) -> Result<cpal::Stream>
where
    T: cpal::Sample + cpal::FromSample<f32> + cpal::SizedSample + Send + 'static,
{
    let channels = usize::from(cfg.channels.max(1));
    let err_fn = |e: cpal::StreamError| warn!(error = %e, "output stream error");

    device
        .build_output_stream(
            cfg,
            move |output: &mut [T], _| {
                let mut frames = output.chunks_exact_mut(channels);
                let n = frames.len();
                renderer.process_with(n, |l, r| {
                    if let Some(frame) = frames.next() {
                        write_frame(frame, l, r, |s| T::from_sample(s));
                    }
                });
            },
            err_fn,
            None,
        )
        .map_err(unavailable)
}

impl AudioHost for CpalHost {
    type Stream = CpalStream;

    fn open(&mut self, mut renderer: Renderer) -> Result<CpalStream> {
        let device = self.pick_device()?;
        let device_name = device.name().unwrap_or_else(|_| "<unnamed>".into());
        let sup_cfg = self.choose_config(&device)?;
        let sample_format = sup_cfg.sample_format();
        let mut cfg = sup_cfg.config();

        if let Some(sr) = self.sample_rate { cfg.sample_rate = cpal::SampleRate(sr); }
        if let Some(ch) = self.channels    { cfg.channels    = ch; }

        #[allow(clippy::cast_precision_loss)]
        let sr = cfg.sample_rate.0 as f32;
        renderer.reset(sr);

        let stream = match sample_format {
            cpal::SampleFormat::F32 => build_stream::<f32>(&device, &cfg, renderer)?,
            cpal::SampleFormat::I16 => build_stream::<i16>(&device, &cfg, renderer)?,
            cpal::SampleFormat::U16 => build_stream::<u16>(&device, &cfg, renderer)?,
            other => return Err(unavailable(format!("unsupported device sample format: {other:?}"))),
        };

        // some backends start streams immediately; contexts open suspended
        if let Err(e) = stream.pause() {
            debug!(error = %e, "backend cannot pause a fresh stream");
        }

        info!(device = %device_name, sample_rate = sr, channels = cfg.channels, ?sample_format, "output stream opened");
        Ok(CpalStream { stream, sample_rate: sr })
    }
}

/// Live CPAL stream. Dropping it closes the device.
pub struct CpalStream {
    stream: cpal::Stream,
    sample_rate: f32,
}

impl OutputStream for CpalStream {
    fn sample_rate(&self) -> f32 { self.sample_rate }

    fn resume(&mut self) -> Result<()> {
        self.stream.play().map_err(|e| EngineError::Stream(e.to_string()))
    }

    fn suspend(&mut self) -> Result<()> {
        self.stream.pause().map_err(|e| EngineError::Stream(e.to_string()))
    }
}
