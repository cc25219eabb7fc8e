//! FFT engine using realfft for real-valued signals
//!
//! Owns every buffer it needs so `forward` never allocates. One engine serves
//! one stream of fixed-size frames.

use super::bands::{self, BandSpec};
use super::error::{Result, SpectrumError};
use super::windowing::WindowCache;
use crate::filters::windows::WindowType;
use num_complex::Complex;
use realfft::{RealFftPlanner, RealToComplex};
use std::sync::Arc;

/// Power floor used by `to_decibels`
pub const MIN_POWER: f32 = 1e-12;

/// `10 * log10(MIN_POWER)`
pub const MIN_DECIBELS: f32 = -120.0;

/// Spectral transform engine for real-valued mono frames
pub struct FftEngine {
    /// FFT size (number of samples per frame)
    fft_size: usize,

    /// Sample rate in Hz
    sample_rate: f32,

    /// Real FFT processor
    r2c: Arc<dyn RealToComplex<f32>>,

    /// Window selection and cached coefficients
    window: WindowCache,

    /// Reusable input buffer (windowed frame, clobbered by the FFT)
    input_buffer: Vec<f32>,

    /// Reusable output buffer (complex spectrum, fft_size/2 + 1 bins)
    output_buffer: Vec<Complex<f32>>,

    /// FFT scratch space
    scratch: Vec<Complex<f32>>,

    /// |X[k]|² for k = 0..fft_size/2
    magnitudes: Vec<f32>,

    /// Set by the first successful `forward`
    has_result: bool,
}

impl FftEngine {
    /// Create new FFT engine
    ///
    /// # Arguments
    /// * `fft_size` - Frame length, a power of two no smaller than 2
    /// * `sample_rate` - Sample rate of the incoming frames in Hz
    pub fn new(fft_size: usize, sample_rate: f32) -> Result<Self> {
        if fft_size < 2 || !fft_size.is_power_of_two() {
            return Err(SpectrumError::InvalidConfiguration(format!(
                "FFT size must be a power of two >= 2 (got {})",
                fft_size
            )));
        }
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(SpectrumError::InvalidConfiguration(format!(
                "sample rate must be positive (got {})",
                sample_rate
            )));
        }

        let mut planner = RealFftPlanner::<f32>::new();
        let r2c = planner.plan_fft_forward(fft_size);

        let input_buffer = r2c.make_input_vec();
        let output_buffer = r2c.make_output_vec();
        let scratch = r2c.make_scratch_vec();

        log::debug!(
            "FFT engine ready: size={} sample_rate={} Hz bandwidth={} Hz",
            fft_size,
            sample_rate,
            sample_rate / fft_size as f32
        );

        Ok(Self {
            fft_size,
            sample_rate,
            r2c,
            window: WindowCache::default(),
            input_buffer,
            output_buffer,
            scratch,
            magnitudes: vec![0.0; fft_size / 2],
            has_result: false,
        })
    }

    /// Select the analysis window; takes effect on the next `forward`
    pub fn set_window_type(&mut self, window_type: WindowType) {
        self.window.set_window_type(window_type);
    }

    pub fn window_type(&self) -> WindowType {
        self.window.window_type()
    }

    /// Transform one frame and store its power spectrum
    ///
    /// # Arguments
    /// * `samples` - Exactly `fft_size` mono samples
    ///
    /// On a length mismatch the previous result (if any) is left untouched.
    pub fn forward(&mut self, samples: &[f32]) -> Result<()> {
        if samples.len() != self.fft_size {
            return Err(SpectrumError::InvalidInput {
                expected: self.fft_size,
                actual: samples.len(),
            });
        }

        self.window.apply(samples, &mut self.input_buffer);

        self.r2c
            .process_with_scratch(
                &mut self.input_buffer,
                &mut self.output_buffer,
                &mut self.scratch,
            )
            .map_err(|e| SpectrumError::Transform(e.to_string()))?;

        // Power per bin; the Nyquist bin is not kept
        for (mag, bin) in self.magnitudes.iter_mut().zip(self.output_buffer.iter()) {
            *mag = bin.norm_sqr();
        }

        self.has_result = true;
        Ok(())
    }

    /// Width of each bin in Hz
    pub fn bandwidth(&self) -> f32 {
        self.sample_rate / self.fft_size as f32
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Number of magnitude bins (fft_size / 2)
    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    pub fn nyquist_frequency(&self) -> f32 {
        self.sample_rate / 2.0
    }

    /// Whether `forward` has succeeded at least once
    pub fn has_result(&self) -> bool {
        self.has_result
    }

    /// Power spectrum of the last frame
    pub fn magnitudes(&self) -> Result<&[f32]> {
        self.ensure_result()?;
        Ok(&self.magnitudes)
    }

    /// Magnitude of a single bin
    pub fn magnitude_at_band(&self, index: usize) -> Result<f32> {
        self.ensure_result()?;
        self.magnitudes
            .get(index)
            .copied()
            .ok_or(SpectrumError::IndexOutOfRange {
                index: index as i64,
                bins: self.bin_count(),
            })
    }

    /// Magnitude of the bin containing `frequency`
    ///
    /// Frequencies at or above Nyquist, or below zero, surface as
    /// `IndexOutOfRange`.
    pub fn magnitude_at_frequency(&self, frequency: f32) -> Result<f32> {
        self.ensure_result()?;
        let index = self.bin_for_frequency(frequency)?;
        self.magnitude_at_band(index)
    }

    /// Center frequency of bin `index` in Hz
    ///
    /// No range check; callers pass indices in `0..bin_count()`.
    pub fn frequency_for_band(&self, index: usize) -> Result<f32> {
        self.ensure_result()?;
        let bandwidth = self.bandwidth();
        Ok(bandwidth * index as f32 + bandwidth / 2.0)
    }

    /// Sum of bin magnitudes over `[low, high]` Hz
    ///
    /// With `use_db`, each bin contributes `max(0, to_decibels(m))` instead of
    /// its linear power.
    pub fn sum_magnitudes(&self, low: f32, high: f32, use_db: bool) -> Result<f32> {
        let (first, last) = self.bin_span(low, high)?;
        Ok(self.magnitudes[first..=last]
            .iter()
            .map(|&m| if use_db { Self::to_decibels(m).max(0.0) } else { m })
            .sum())
    }

    /// Mean bin magnitude over `[low, high]` Hz
    pub fn average_magnitude(&self, low: f32, high: f32) -> Result<f32> {
        let (first, last) = self.bin_span(low, high)?;
        let total: f32 = self.magnitudes[first..=last].iter().sum();
        Ok(total / (last - first + 1) as f32)
    }

    /// Condense the last result into display bands
    pub fn map_bands(&self, spec: &BandSpec) -> Result<Vec<f32>> {
        let magnitudes = self.magnitudes()?;
        bands::map_bands(magnitudes, self.bandwidth(), spec)
    }

    /// Convert a power value to decibels, floored at -120 dB
    pub fn to_decibels(magnitude: f32) -> f32 {
        if !(magnitude > MIN_POWER) {
            return MIN_DECIBELS;
        }
        (10.0 * magnitude.log10()).max(MIN_DECIBELS)
    }

    fn ensure_result(&self) -> Result<()> {
        if self.has_result {
            Ok(())
        } else {
            Err(SpectrumError::PrecededFft)
        }
    }

    fn bin_for_frequency(&self, frequency: f32) -> Result<usize> {
        let position = (frequency / self.bandwidth()).floor();
        if position >= 0.0 && position < self.bin_count() as f32 {
            Ok(position as usize)
        } else {
            Err(SpectrumError::IndexOutOfRange {
                index: position as i64,
                bins: self.bin_count(),
            })
        }
    }

    /// Inclusive bin range covering `[low, high]` Hz
    fn bin_span(&self, low: f32, high: f32) -> Result<(usize, usize)> {
        self.ensure_result()?;
        let nyquist = self.nyquist_frequency();
        if !(low >= 0.0 && low <= high && high < nyquist) {
            return Err(SpectrumError::InvalidRange {
                min: low,
                max: high,
                nyquist,
            });
        }
        Ok((self.bin_for_frequency(low)?, self.bin_for_frequency(high)?))
    }

    #[cfg(test)]
    pub(crate) fn window_rebuilds(&self) -> usize {
        self.window.rebuilds()
    }
}
