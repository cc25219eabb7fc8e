//! Band mapping
//!
//! Condenses the linearly spaced FFT bins into a caller-chosen number of
//! display bands over a frequency window, with linear or logarithmic edges.

use super::error::{Result, SpectrumError};
use serde::{Deserialize, Serialize};

/// Spacing of band edges along the frequency axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BandScale {
    #[default]
    Linear,
    Logarithmic,
}

/// A band layout request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandSpec {
    /// Lower edge of the first band in Hz
    pub min_frequency: f32,

    /// Upper edge of the last band in Hz
    pub max_frequency: f32,

    /// Number of output bands
    pub band_count: usize,

    pub scale: BandScale,
}

impl BandSpec {
    pub fn new(min_frequency: f32, max_frequency: f32, band_count: usize, scale: BandScale) -> Self {
        Self {
            min_frequency,
            max_frequency,
            band_count,
            scale,
        }
    }

    pub fn linear(min_frequency: f32, max_frequency: f32, band_count: usize) -> Self {
        Self::new(min_frequency, max_frequency, band_count, BandScale::Linear)
    }

    pub fn logarithmic(min_frequency: f32, max_frequency: f32, band_count: usize) -> Self {
        Self::new(min_frequency, max_frequency, band_count, BandScale::Logarithmic)
    }

    /// Check the request against a Nyquist frequency
    pub fn validate(&self, nyquist: f32) -> Result<()> {
        let min = self.min_frequency;
        let max = self.max_frequency;

        let in_range = min >= 0.0 && min < max && max <= nyquist;
        let log_ok = self.scale == BandScale::Linear || min > 0.0;
        if !(in_range && log_ok) {
            return Err(SpectrumError::InvalidRange { min, max, nyquist });
        }

        if self.band_count == 0 {
            return Err(SpectrumError::InvalidBandCount(self.band_count));
        }

        Ok(())
    }

    /// Edge k of `band_count + 1`, computed in f64
    fn edge(&self, k: usize) -> f64 {
        let min = self.min_frequency as f64;
        let max = self.max_frequency as f64;
        let count = self.band_count as f64;

        if k == self.band_count {
            return max;
        }

        match self.scale {
            BandScale::Linear => min + (max - min) * k as f64 / count,
            BandScale::Logarithmic => min * (max / min).powf(k as f64 / count),
        }
    }
}

/// Band edges in Hz, `band_count + 1` values from min to max
pub fn band_edges(spec: &BandSpec, nyquist: f32) -> Result<Vec<f32>> {
    spec.validate(nyquist)?;
    Ok((0..=spec.band_count).map(|k| spec.edge(k) as f32).collect())
}

/// Representative frequency of each band
///
/// Arithmetic midpoint for linear spacing, geometric for logarithmic.
pub fn band_centers(spec: &BandSpec, nyquist: f32) -> Result<Vec<f32>> {
    spec.validate(nyquist)?;
    Ok((0..spec.band_count)
        .map(|k| {
            let (lo, hi) = (spec.edge(k), spec.edge(k + 1));
            let center = match spec.scale {
                BandScale::Linear => 0.5 * (lo + hi),
                BandScale::Logarithmic => (lo * hi).sqrt(),
            };
            center as f32
        })
        .collect())
}

/// Map raw bin magnitudes onto display bands
///
/// # Arguments
/// * `magnitudes` - One value per bin, bin `i` centered at `(i + 0.5) * bandwidth`
/// * `bandwidth` - Bin width in Hz; `magnitudes.len() * bandwidth` is Nyquist
/// * `spec` - Band layout
///
/// # Returns
/// `spec.band_count` values, lowest band first. A band averages the bins whose
/// centers fall in its half-open interval; a band too narrow to contain any
/// center is linearly interpolated between its two nearest bins.
pub fn map_bands(magnitudes: &[f32], bandwidth: f32, spec: &BandSpec) -> Result<Vec<f32>> {
    let nyquist = magnitudes.len() as f32 * bandwidth;
    spec.validate(nyquist)?;

    let bandwidth = bandwidth as f64;
    let mut bands = Vec::with_capacity(spec.band_count);

    let mut lo = spec.edge(0);
    for k in 0..spec.band_count {
        let hi = spec.edge(k + 1);
        bands.push(aggregate(magnitudes, bandwidth, lo, hi));
        lo = hi;
    }

    Ok(bands)
}

fn aggregate(magnitudes: &[f32], bandwidth: f64, lo: f64, hi: f64) -> f32 {
    let start = first_center_at_or_above(lo, bandwidth, magnitudes.len());
    let end = first_center_at_or_above(hi, bandwidth, magnitudes.len());

    if end > start {
        let sum: f64 = magnitudes[start..end].iter().map(|&m| m as f64).sum();
        (sum / (end - start) as f64) as f32
    } else {
        interpolate(magnitudes, bandwidth, 0.5 * (lo + hi))
    }
}

/// Index of the first bin whose center is >= `frequency`, capped at `bins`
fn first_center_at_or_above(frequency: f64, bandwidth: f64, bins: usize) -> usize {
    let position = (frequency / bandwidth - 0.5).ceil();
    if position <= 0.0 {
        0
    } else {
        (position as usize).min(bins)
    }
}

/// Blend the two bins around `frequency` by distance to their centers
fn interpolate(magnitudes: &[f32], bandwidth: f64, frequency: f64) -> f32 {
    let last = magnitudes.len() - 1;
    let position = (frequency / bandwidth - 0.5).clamp(0.0, last as f64);

    let i0 = position.floor() as usize;
    let i1 = (i0 + 1).min(last);
    let t = (position - i0 as f64) as f32;

    magnitudes[i0] * (1.0 - t) + magnitudes[i1] * t
}
