//! Errors raised by the transform engine and band mapper

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpectrumError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Expected a frame of {expected} samples, got {actual}")]
    InvalidInput { expected: usize, actual: usize },

    #[error("No transform has been performed yet, call forward() first")]
    PrecededFft,

    #[error("Bin index {index} is outside 0..{bins}")]
    IndexOutOfRange { index: i64, bins: usize },

    #[error("Invalid frequency range [{min}, {max}] Hz (Nyquist: {nyquist} Hz)")]
    InvalidRange { min: f32, max: f32, nyquist: f32 },

    #[error("Band count must be at least 1 (got {0})")]
    InvalidBandCount(usize),

    #[error("FFT processing failed: {0}")]
    Transform(String),
}

pub type Result<T> = std::result::Result<T, SpectrumError>;
