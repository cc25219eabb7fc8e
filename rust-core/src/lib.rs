//! Bandscope - Real-Time Audio Spectrum Analyzer Core
//!
//! Windowed real FFT over fixed-size frames, squared-magnitude spectra and
//! their reduction to linear or logarithmic display bands.

pub mod audio;
pub mod config;
pub mod filters;
pub mod render;
pub mod spectrum;

pub use config::{Config, ConfigError};
pub use filters::WindowType;
pub use spectrum::{
    AnalyzerConfig, BandScale, BandSpec, FftEngine, SpectrumAnalyzer, SpectrumError, SpectrumFrame,
};
