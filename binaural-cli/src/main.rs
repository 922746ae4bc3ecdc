//! binaural: real-time binaural beat player with an interactive control loop.

mod commands;
mod presets;
mod scope;

use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use binaural_engine::{CpalHost, EngineConfig, NoiseColor, PlaybackController, SessionSettings, Tuning};
use clap::Parser;
use crossbeam_channel::{unbounded, RecvTimeoutError};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use commands::Cmd;
use presets::Band;

type Session = PlaybackController<CpalHost>;

const TICK: Duration = Duration::from_millis(250);
const METER_EVERY: Duration = Duration::from_secs(1);

#[derive(Parser, Debug)]
#[command(name = "binaural")]
#[command(about = "Real-time binaural beat player")]
#[command(version)]
struct Args {
    /// List output devices and exit
    #[arg(long)]
    list_devices: bool,

    /// Output device name (uses the default device if not specified)
    #[arg(long)]
    device: Option<String>,

    /// Requested sample rate in Hz
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Requested channel count
    #[arg(long)]
    channels: Option<u16>,

    /// Start from a preset id (see `presets` in the control loop)
    #[arg(long)]
    preset: Option<String>,

    /// Carrier frequency in Hz (60-900), overrides the preset
    #[arg(long)]
    base: Option<f32>,

    /// Beat frequency in Hz (0.5-50), overrides the preset
    #[arg(long)]
    beat: Option<f32>,

    /// Master volume (0-1)
    #[arg(long)]
    volume: Option<f32>,

    /// Noise color: off, white, pink or brown
    #[arg(long, default_value = "off")]
    noise: NoiseColor,

    /// Noise volume (0-1)
    #[arg(long)]
    noise_volume: Option<f32>,

    /// Exit after this many seconds
    #[arg(long)]
    duration: Option<u64>,

    /// Start playing right away
    #[arg(long)]
    play: bool,

    /// Print a level meter once per second while playing
    #[arg(long)]
    meter: bool,

    /// Engine configuration JSON file
    #[arg(long)]
    config: Option<PathBuf>,
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let text = std::fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
    EngineConfig::from_json(&text).with_context(|| format!("parsing config {}", path.display()))
}

fn initial_tuning(args: &Args, config: &EngineConfig) -> Result<Tuning> {
    let mut t = match args.preset.as_deref() {
        Some(id) => {
            let p = presets::find(id).ok_or_else(|| anyhow!("unknown preset `{id}`"))?;
            Tuning { base: p.base, beat: p.beat }
        }
        None => config.initial_tuning,
    };
    if let Some(base) = args.base {
        t.base = base;
    }
    if let Some(beat) = args.beat {
        t.beat = beat;
    }
    Ok(Tuning { base: presets::clamp_base(t.base), beat: presets::clamp_beat(t.beat) })
}

fn list_output_devices() -> Result<()> {
    println!("Available output devices:");
    for name in CpalHost::output_device_names().context("enumerating output devices")? {
        println!("- {name}");
    }
    Ok(())
}

fn print_presets() {
    for p in &presets::PRESETS {
        println!("  {:<22} {:>5.0} Hz / {:>4.1} Hz  {:<16} {}", p.id, p.base, p.beat, Band::of(p.beat).label(), p.description);
    }
}

fn print_status(session: &Session) {
    let t = session.tuning();
    println!(
        "{} | L {:.1} Hz  R {:.1} Hz  beat {:.1} Hz ({}) | vol {:.2} | noise {} @ {:.2} | pair {:?}",
        session.state(),
        t.left(),
        t.right(),
        t.beat,
        Band::of(t.beat).label(),
        session.master_volume(),
        session.noise_color(),
        session.noise_volume(),
        session.pair_state(),
    );
}

fn retune(session: &mut Session, base: f32, beat: f32) {
    let (base, beat) = (presets::clamp_base(base), presets::clamp_beat(beat));
    session.retune(base, beat);
    println!("tuning {base:.1} Hz + {beat:.1} Hz -> {}", Band::of(beat).label());
}

fn set_noise(session: &mut Session, color: NoiseColor) {
    if let Some(level) = session.set_noise_color(color) {
        println!("noise volume raised to {level:.2}");
    }
    println!("noise {color}");
}

fn handle(session: &mut Session, cmd: Cmd) -> Result<()> {
    match cmd {
        Cmd::Toggle => {
            let state = session.toggle().context("play/pause failed")?;
            println!("{state}");
        }
        Cmd::Stop => session.stop().context("stop failed")?,
        Cmd::Base(hz) => {
            let beat = session.tuning().beat;
            retune(session, hz, beat);
        }
        Cmd::Beat(hz) => {
            let base = session.tuning().base;
            retune(session, base, hz);
        }
        Cmd::Preset(id) => {
            let p = presets::find(&id).ok_or_else(|| anyhow!("unknown preset `{id}`"))?;
            println!("{}: {}", p.name, p.description);
            retune(session, p.base, p.beat);
        }
        Cmd::Presets => print_presets(),
        Cmd::Volume(v) => session.set_master_volume(presets::clamp_volume(v)),
        Cmd::Noise(color) => set_noise(session, color),
        Cmd::NoiseVolume(v) => session.set_noise_volume(presets::clamp_volume(v)),
        Cmd::Coach(json) => {
            let settings = presets::clamp_settings(
                SessionSettings::from_json(&json).context("coaching answer rejected")?,
            );
            println!("{}: {}", settings.target_state, settings.description);
            session.apply_settings(&settings);
            let beat = settings.beat_frequency;
            println!("tuning {:.1} Hz + {beat:.1} Hz -> {}", settings.base_frequency, Band::of(beat).label());
        }
        Cmd::Scope => match session.analysis() {
            Some(tap) => println!("{}", scope::render(&tap, 72, 11)),
            None => println!("nothing rendered yet"),
        },
        Cmd::Status => print_status(session),
        Cmd::Help => println!("{}", commands::HELP),
        Cmd::Quit => {}
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if args.list_devices {
        return list_output_devices();
    }

    let mut config = load_config(args.config.as_deref())?;
    config.initial_tuning = initial_tuning(&args, &config)?;
    if let Some(v) = args.volume {
        config.master_volume = presets::clamp_volume(v);
    }
    if let Some(v) = args.noise_volume {
        config.noise_volume = presets::clamp_volume(v);
    }

    let host = CpalHost::new()
        .with_device(args.device.clone())
        .with_sample_rate(args.sample_rate)
        .with_channels(args.channels);
    let mut session = Session::new(host, &config);
    if args.noise != NoiseColor::Off {
        set_noise(&mut session, args.noise);
    }

    println!("binaural: real-time binaural beat player\n");
    print_status(&session);
    println!("type `help` for commands\n");

    if args.play {
        if let Err(e) = handle(&mut session, Cmd::Toggle) {
            error!("{e:#}");
        }
    }

    let (tx, rx) = unbounded::<String>();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    let deadline = args.duration.map(|d| Instant::now() + Duration::from_secs(d));
    if let Some(d) = args.duration {
        info!(seconds = d, "auto-stop armed");
    }
    let mut stdin_open = true;
    let mut last_meter = Instant::now();

    loop {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            info!("duration reached");
            break;
        }

        let next = if stdin_open {
            rx.recv_timeout(TICK)
        } else {
            std::thread::sleep(TICK);
            Err(RecvTimeoutError::Timeout)
        };
        match next {
            Ok(line) => match commands::parse(&line) {
                Ok(Some(Cmd::Quit)) => break,
                Ok(Some(cmd)) => {
                    if let Err(e) = handle(&mut session, cmd) {
                        error!("{e:#}");
                    }
                }
                Ok(None) => {}
                Err(e) => warn!("{e:#}"),
            },
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                // stdin closed: keep playing only if a duration bounds the run
                if deadline.is_none() {
                    break;
                }
                stdin_open = false;
            }
        }

        if args.meter && session.is_playing() && last_meter.elapsed() >= METER_EVERY {
            last_meter = Instant::now();
            if let Some(tap) = session.analysis() {
                eprintln!("{}", scope::meter(&tap));
            }
        }
    }

    session.close();
    Ok(())
}
