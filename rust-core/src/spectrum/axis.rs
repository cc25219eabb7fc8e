//! Frequency axis ticks for band displays

use super::bands::{BandScale, BandSpec};
use super::error::{Result, SpectrumError};

/// Most tick steps a linear axis may span
pub const MAX_TICKS: usize = 64;

/// A labelled point on the frequency axis
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyTick {
    /// Frequency in Hz
    pub frequency: f32,

    /// Offset along the band axis, 0.0 at `min_frequency`, 1.0 at `max_frequency`
    pub position: f32,

    /// Short label, e.g. "500" or "5k"
    pub label: String,
}

/// Offset of `frequency` along the band axis of `spec`
pub fn frequency_position(spec: &BandSpec, frequency: f32) -> f32 {
    let (min, max) = (spec.min_frequency as f64, spec.max_frequency as f64);
    let f = frequency as f64;
    let position = match spec.scale {
        BandScale::Linear => (f - min) / (max - min),
        BandScale::Logarithmic => (f / min).ln() / (max / min).ln(),
    };
    position as f32
}

/// Ticks inside `[min_frequency, max_frequency]`
///
/// Linear axes get a tick every `step_hz`, and a step that fits more than
/// `MAX_TICKS` times into the axis is rejected. Logarithmic axes ignore the step and
/// use the 1-2-5 series per decade.
pub fn frequency_ticks(spec: &BandSpec, step_hz: f32, nyquist: f32) -> Result<Vec<FrequencyTick>> {
    spec.validate(nyquist)?;
    if !(step_hz.is_finite() && step_hz > 0.0) {
        return Err(SpectrumError::InvalidConfiguration(format!(
            "tick step must be positive (got {})",
            step_hz
        )));
    }

    let frequencies = match spec.scale {
        BandScale::Linear => linear_series(spec, step_hz)?,
        BandScale::Logarithmic => decade_series(spec),
    };

    Ok(frequencies
        .into_iter()
        .map(|frequency| FrequencyTick {
            frequency,
            position: frequency_position(spec, frequency),
            label: format_frequency(frequency),
        })
        .collect())
}

fn linear_series(spec: &BandSpec, step: f32) -> Result<Vec<f32>> {
    let first = (spec.min_frequency as f64 / step as f64).ceil();
    let last = (spec.max_frequency as f64 / step as f64).floor();
    if last - first > MAX_TICKS as f64 {
        return Err(SpectrumError::InvalidConfiguration(format!(
            "tick step {} Hz gives more than {} steps over {}..{} Hz",
            step, MAX_TICKS, spec.min_frequency, spec.max_frequency
        )));
    }

    Ok((first as u32..=last as u32)
        .map(|i| i as f32 * step)
        .filter(|&f| f > 0.0)
        .collect())
}

fn decade_series(spec: &BandSpec) -> Vec<f32> {
    let mut ticks = Vec::new();
    let mut decade = 10f32.powi(spec.min_frequency.log10().floor() as i32);
    while decade <= spec.max_frequency {
        for mantissa in [1.0, 2.0, 5.0] {
            let f = mantissa * decade;
            if f >= spec.min_frequency && f <= spec.max_frequency {
                ticks.push(f);
            }
        }
        decade *= 10.0;
    }
    ticks
}

/// "500", "1k", "2.5k"
pub fn format_frequency(frequency: f32) -> String {
    if frequency >= 1000.0 {
        let khz = frequency / 1000.0;
        if (khz - khz.round()).abs() < 1e-3 {
            format!("{}k", khz.round() as u32)
        } else {
            format!("{:.1}k", khz)
        }
    } else {
        format!("{}", frequency.round() as u32)
    }
}
