//! Spectral analysis: FFT engine, band mapping and axis layout

pub mod error;
pub mod fft;
pub mod windowing;
pub mod bands;
pub mod axis;
pub mod analysis;

pub use error::SpectrumError;
pub use fft::FftEngine;
pub use windowing::WindowCache;
pub use bands::{BandScale, BandSpec, map_bands};
pub use axis::{FrequencyTick, frequency_ticks};
pub use analysis::{AnalyzerConfig, SpectrumAnalyzer, SpectrumFrame};
