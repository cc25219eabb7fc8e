//! TOML configuration for the analyzer and the terminal display
//!
//! Every field has a default, so a partial file (or none at all) is fine.

use crate::filters::WindowType;
use crate::spectrum::axis::MAX_TICKS;
use crate::spectrum::{AnalyzerConfig, BandScale, BandSpec, FftEngine, SpectrumError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Longest ring buffer a config may ask for
pub const MAX_BUFFER_SECONDS: f32 = 60.0;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid analyzer settings: {0}")]
    Analyzer(#[from] SpectrumError),

    #[error("Invalid setting: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analyzer: AnalyzerSection,
    #[serde(default)]
    pub bands: BandsSection,
    #[serde(default)]
    pub capture: CaptureSection,
    #[serde(default)]
    pub display: DisplaySection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerSection {
    #[serde(default = "default_fft_size")]
    pub fft_size: usize,
    #[serde(default = "default_sample_rate")]
    pub sample_rate: f32,
    #[serde(default = "default_window")]
    pub window: WindowType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandsSection {
    /// Report raw bins instead of bands when false
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_min_frequency")]
    pub min_frequency: f32,
    #[serde(default = "default_max_frequency")]
    pub max_frequency: f32,
    #[serde(default = "default_band_count")]
    pub count: usize,
    #[serde(default = "default_scale")]
    pub scale: BandScale,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureSection {
    #[serde(default = "default_true")]
    pub dc_rejection: bool,
    /// Ring buffer length in seconds of audio
    #[serde(default = "default_buffer_seconds")]
    pub buffer_seconds: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplaySection {
    /// Level drawn as an empty column
    #[serde(default = "default_min_db")]
    pub min_db: f32,
    /// Level drawn as a full column
    #[serde(default = "default_max_db")]
    pub max_db: f32,
    /// Bar height in rows
    #[serde(default = "default_height")]
    pub height: usize,
    /// Spacing of axis labels on a linear axis
    #[serde(default = "default_tick_step")]
    pub tick_step_hz: f32,
    #[serde(default = "default_refresh_ms")]
    pub refresh_ms: u64,
}

impl Default for AnalyzerSection {
    fn default() -> Self {
        Self {
            fft_size: default_fft_size(),
            sample_rate: default_sample_rate(),
            window: default_window(),
        }
    }
}

impl Default for BandsSection {
    fn default() -> Self {
        Self {
            enabled: true,
            min_frequency: default_min_frequency(),
            max_frequency: default_max_frequency(),
            count: default_band_count(),
            scale: default_scale(),
        }
    }
}

impl Default for CaptureSection {
    fn default() -> Self {
        Self {
            dc_rejection: true,
            buffer_seconds: default_buffer_seconds(),
        }
    }
}

impl Default for DisplaySection {
    fn default() -> Self {
        Self {
            min_db: default_min_db(),
            max_db: default_max_db(),
            height: default_height(),
            tick_step_hz: default_tick_step(),
            refresh_ms: default_refresh_ms(),
        }
    }
}

fn default_fft_size() -> usize { 1024 }
fn default_sample_rate() -> f32 { 44100.0 }
fn default_window() -> WindowType { WindowType::Hanning }
fn default_true() -> bool { true }
fn default_min_frequency() -> f32 { 20.0 }
fn default_max_frequency() -> f32 { 20000.0 }
fn default_band_count() -> usize { 64 }
fn default_scale() -> BandScale { BandScale::Logarithmic }
fn default_buffer_seconds() -> f32 { 2.0 }
fn default_min_db() -> f32 { -32.0 }
fn default_max_db() -> f32 { 64.0 }
fn default_height() -> usize { 16 }
fn default_tick_step() -> f32 { 5000.0 }
fn default_refresh_ms() -> u64 { 50 }

impl Config {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Band layout, or `None` when bands are disabled
    pub fn band_spec(&self) -> Option<BandSpec> {
        self.bands.enabled.then(|| {
            BandSpec::new(
                self.bands.min_frequency,
                self.bands.max_frequency,
                self.bands.count,
                self.bands.scale,
            )
        })
    }

    /// Axis the display labels: the band layout, or every bin up to Nyquist
    pub fn display_axis(&self) -> BandSpec {
        self.band_spec().unwrap_or_else(|| {
            BandSpec::linear(
                0.0,
                self.analyzer.sample_rate / 2.0,
                self.analyzer.fft_size / 2,
            )
        })
    }

    pub fn analyzer_config(&self) -> AnalyzerConfig {
        AnalyzerConfig {
            fft_size: self.analyzer.fft_size,
            sample_rate: self.analyzer.sample_rate,
            window_type: self.analyzer.window,
            bands: self.band_spec(),
        }
    }

    /// Reject settings the engine or display would fail on later
    pub fn validate(&self) -> Result<(), ConfigError> {
        let engine = FftEngine::new(self.analyzer.fft_size, self.analyzer.sample_rate)?;
        if let Some(spec) = self.band_spec() {
            spec.validate(engine.nyquist_frequency())?;
        }

        if !(self.display.min_db < self.display.max_db) {
            return Err(ConfigError::Invalid(format!(
                "display.min_db ({}) must be below display.max_db ({})",
                self.display.min_db, self.display.max_db
            )));
        }
        if self.display.height == 0 {
            return Err(ConfigError::Invalid("display.height must be at least 1".into()));
        }
        if !(self.capture.buffer_seconds > 0.0 && self.capture.buffer_seconds <= MAX_BUFFER_SECONDS) {
            return Err(ConfigError::Invalid(format!(
                "capture.buffer_seconds must be in (0, {}] (got {})",
                MAX_BUFFER_SECONDS, self.capture.buffer_seconds
            )));
        }

        let axis = self.display_axis();
        let step = self.display.tick_step_hz;
        let span = axis.max_frequency - axis.min_frequency;
        let too_dense = axis.scale == BandScale::Linear && step < span / MAX_TICKS as f32;
        if !(step.is_finite() && step > 0.0) || too_dense {
            return Err(ConfigError::Invalid(format!(
                "display.tick_step_hz must be at least {} Hz for a {} Hz axis (got {})",
                span / MAX_TICKS as f32,
                span,
                step
            )));
        }

        Ok(())
    }

    /// Ring buffer capacity in samples, never less than two frames
    ///
    /// The duration is capped at `MAX_BUFFER_SECONDS` even on an unvalidated config.
    pub fn buffer_capacity(&self, sample_rate: f32) -> usize {
        let seconds = self.capture.buffer_seconds.clamp(0.0, MAX_BUFFER_SECONDS) as f64;
        let samples = (seconds * sample_rate as f64).ceil() as usize;
        samples.max(2 * self.analyzer.fft_size)
    }
}

/// Load and validate a config file
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = Config::from_toml_str(&content)?;
    config.validate()?;
    Ok(config)
}
