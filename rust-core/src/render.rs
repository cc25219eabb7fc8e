//! Terminal bar display
//!
//! One column per band, levels scaled between the configured dB floor and
//! ceiling, with an axis line of frequency labels underneath.

use crate::config::DisplaySection;
use crate::spectrum::{FrequencyTick, SpectrumFrame};

const FULL: char = '█';
const EMPTY: char = ' ';

/// Fraction of the column filled for `db`, clamped to [0, 1]
pub fn normalize_db(db: f32, min_db: f32, max_db: f32) -> f32 {
    if !(db > min_db) {
        return 0.0;
    }
    ((db - min_db) / (max_db - min_db)).min(1.0)
}

/// Filled rows per column
pub fn bar_heights(decibels: &[f32], display: &DisplaySection) -> Vec<usize> {
    decibels
        .iter()
        .map(|&db| {
            let level = normalize_db(db, display.min_db, display.max_db);
            (level * display.height as f32).round() as usize
        })
        .collect()
}

/// Render a frame as `display.height` bar rows plus one label row
///
/// # Arguments
/// * `frame` - Analyzed frame; one column per entry of `decibels`
/// * `display` - Level range and bar height
/// * `ticks` - Axis labels, positioned by `FrequencyTick::position`
pub fn render_bars(frame: &SpectrumFrame, display: &DisplaySection, ticks: &[FrequencyTick]) -> String {
    let heights = bar_heights(&frame.decibels, display);
    let columns = heights.len();
    let mut out = String::with_capacity((columns + 1) * (display.height + 1));

    for row in (0..display.height).rev() {
        out.extend(heights.iter().map(|&h| if h > row { FULL } else { EMPTY }));
        out.push('\n');
    }

    out.push_str(&axis_line(columns, ticks));
    out.push('\n');
    out
}

/// Labels placed at their column, skipping any that would overlap the previous one
fn axis_line(columns: usize, ticks: &[FrequencyTick]) -> String {
    let mut line = vec![EMPTY; columns];
    let mut next_free = 0;

    for tick in ticks {
        if columns == 0 {
            break;
        }
        let column = ((tick.position * columns as f32).floor().max(0.0) as usize).min(columns - 1);
        let label: Vec<char> = tick.label.chars().collect();
        if column < next_free || column + label.len() > columns {
            continue;
        }
        line[column..column + label.len()].copy_from_slice(&label);
        next_free = column + label.len() + 1;
    }

    line.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectrum::fft::MIN_DECIBELS;

    fn display(height: usize) -> DisplaySection {
        DisplaySection {
            height,
            ..DisplaySection::default()
        }
    }

    fn tick(position: f32, label: &str) -> FrequencyTick {
        FrequencyTick {
            frequency: 0.0,
            position,
            label: label.to_string(),
        }
    }

    #[test]
    fn test_normalize_db() {
        assert_eq!(normalize_db(MIN_DECIBELS, -32.0, 64.0), 0.0);
        assert_eq!(normalize_db(-32.0, -32.0, 64.0), 0.0);
        assert_eq!(normalize_db(16.0, -32.0, 64.0), 0.5);
        assert_eq!(normalize_db(100.0, -32.0, 64.0), 1.0);
        assert_eq!(normalize_db(f32::NAN, -32.0, 64.0), 0.0);
    }

    #[test]
    fn test_render_bars() {
        let frame = SpectrumFrame {
            decibels: vec![-120.0, 16.0, 64.0],
            ..SpectrumFrame::default()
        };
        let text = render_bars(&frame, &display(4), &[]);
        let rows: Vec<&str> = text.lines().collect();

        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0], "  █");
        assert_eq!(rows[1], "  █");
        assert_eq!(rows[2], " ██");
        assert_eq!(rows[3], " ██");
        assert_eq!(rows[4], "   ");
    }

    #[test]
    fn test_axis_labels() {
        let line = axis_line(12, &[tick(0.0, "20"), tick(0.1, "50"), tick(0.5, "1k"), tick(0.95, "20k")]);

        // "50" would touch "20" and "20k" would run off the end
        assert_eq!(line, "20    1k    ");
    }
}
