//! Interactive command parsing for the control loop.

use anyhow::{anyhow, bail, Context, Result};
use binaural_engine::NoiseColor;

#[derive(Clone, Debug, PartialEq)]
pub enum Cmd {
    Toggle,
    Stop,
    Base(f32),
    Beat(f32),
    Preset(String),
    Presets,
    Volume(f32),
    Noise(NoiseColor),
    NoiseVolume(f32),
    Coach(String),
    Scope,
    Status,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  play | pause          toggle playback
  stop                  stop the tones (next play rebuilds them)
  base <hz>             carrier frequency (60-900)
  beat <hz>             beat frequency (0.5-50)
  preset <id>           apply a preset
  presets               list presets
  vol <0..1>            master volume
  noise <color>         off | white | pink | brown
  nvol <0..1>           noise volume
  coach <json>          apply a coaching answer
  scope                 print the current waveform
  status                print the session state
  help                  this text
  quit                  exit";

fn number(arg: Option<&str>, what: &str) -> Result<f32> {
    let raw = arg.ok_or_else(|| anyhow!("missing {what}"))?;
    let v: f32 = raw.parse().with_context(|| format!("invalid {what}: {raw}"))?;
    if !v.is_finite() {
        bail!("invalid {what}: {raw}");
    }
    Ok(v)
}

/// Parse one input line. Empty lines yield `Ok(None)`.
pub fn parse(line: &str) -> Result<Option<Cmd>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();
    let arg = (!rest.is_empty()).then_some(rest);

    let cmd = match word.to_ascii_lowercase().as_str() {
        "play" | "pause" | "p" => Cmd::Toggle,
        "stop" => Cmd::Stop,
        "base" => Cmd::Base(number(arg, "base frequency")?),
        "beat" => Cmd::Beat(number(arg, "beat frequency")?),
        "preset" => Cmd::Preset(arg.ok_or_else(|| anyhow!("missing preset id"))?.to_string()),
        "presets" => Cmd::Presets,
        "vol" | "volume" => Cmd::Volume(number(arg, "volume")?),
        "noise" => Cmd::Noise(arg.ok_or_else(|| anyhow!("missing noise color"))?.parse()?),
        "nvol" => Cmd::NoiseVolume(number(arg, "noise volume")?),
        "coach" => Cmd::Coach(arg.ok_or_else(|| anyhow!("missing settings json"))?.to_string()),
        "scope" => Cmd::Scope,
        "status" => Cmd::Status,
        "help" | "?" => Cmd::Help,
        "quit" | "exit" | "q" => Cmd::Quit,
        other => bail!("unknown command `{other}` (try `help`)"),
    };
    Ok(Some(cmd))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_commands() {
        assert_eq!(parse("play").unwrap(), Some(Cmd::Toggle));
        assert_eq!(parse("  PAUSE ").unwrap(), Some(Cmd::Toggle));
        assert_eq!(parse("").unwrap(), None);
        assert_eq!(parse("quit").unwrap(), Some(Cmd::Quit));
    }

    #[test]
    fn parses_arguments() {
        assert_eq!(parse("base 150").unwrap(), Some(Cmd::Base(150.0)));
        assert_eq!(parse("beat 6.5").unwrap(), Some(Cmd::Beat(6.5)));
        assert_eq!(parse("noise Pink").unwrap(), Some(Cmd::Noise(NoiseColor::Pink)));
        assert_eq!(parse("preset deep-sleep").unwrap(), Some(Cmd::Preset("deep-sleep".into())));
    }

    #[test]
    fn coach_keeps_json_intact() {
        let json = r#"{"baseFrequency": 150, "beatFrequency": 6, "targetState": "Theta"}"#;
        assert_eq!(parse(&format!("coach {json}")).unwrap(), Some(Cmd::Coach(json.into())));
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse("base").is_err());
        assert!(parse("base fast").is_err());
        assert!(parse("vol NaN").is_err());
        assert!(parse("noise blue").is_err());
        assert!(parse("dance").is_err());
    }
}
