//! Text rendering of the analysis tap: a waveform scope and a level meter.

use binaural_core::dsp::{lin_to_db, peak_rms};
use binaural_engine::AnalysisTap;

const LEVELS: &[u8] = b" .:-=+*#%@";

/// Draw `width` columns by `rows` lines from the tap's byte window.
pub fn render(tap: &AnalysisTap, width: usize, rows: usize) -> String {
    let mut bytes = vec![128_u8; tap.frequency_bin_count()];
    let n = tap.byte_time_domain_data(&mut bytes);
    draw(&bytes[..n], width, rows)
}

#[allow(clippy::cast_possible_truncation)]
fn draw(bytes: &[u8], width: usize, rows: usize) -> String {
    let (width, rows) = (width.max(1), rows.max(1));
    let mut grid = vec![vec![b' '; width]; rows];
    if !bytes.is_empty() {
        for (col, cells) in (0..width).map(|c| (c, c * bytes.len() / width)) {
            let v = usize::from(bytes[cells]);
            // 255 at the top row, 0 at the bottom
            let row = (rows - 1) - (v * (rows - 1) / 255);
            grid[row][col] = b'*';
        }
    }
    let mid = rows / 2;
    for cell in grid[mid].iter_mut().filter(|c| **c == b' ') {
        *cell = b'-';
    }
    grid.into_iter()
        .map(|r| String::from_utf8_lossy(&r).into_owned())
        .collect::<Vec<_>>()
        .join("\n")
}

/// One-line level meter: peak and RMS in dBFS plus a bar.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub fn meter(tap: &AnalysisTap) -> String {
    let (peak, rms) = peak_rms(&tap.snapshot());
    let bar_len = 30;
    let filled = ((lin_to_db(rms) + 60.0).clamp(0.0, 60.0) / 60.0 * bar_len as f32) as usize;
    let shade = LEVELS[(peak.clamp(0.0, 1.0) * (LEVELS.len() - 1) as f32) as usize] as char;
    format!(
        "[meter] peak {:>6.1} dBFS  rms {:>6.1} dBFS |{}{}|",
        lin_to_db(peak),
        lin_to_db(rms),
        shade.to_string().repeat(filled),
        " ".repeat(bar_len - filled)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_draws_a_flat_line() {
        let out = draw(&[128; 64], 16, 5);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[2].chars().filter(|&c| c == '*').count(), 16);
    }

    #[test]
    fn extremes_hit_top_and_bottom() {
        let out = draw(&[255, 0], 2, 3);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0].as_bytes()[0], b'*');
        assert_eq!(lines[2].as_bytes()[1], b'*');
    }

    #[test]
    fn empty_window_still_draws_axis() {
        let out = draw(&[], 8, 3);
        assert_eq!(out.lines().nth(1), Some("--------"));
    }
}
