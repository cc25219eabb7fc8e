//! Window functions for spectral analysis
//!
//! Tapering curves applied to a frame before the FFT to reduce spectral leakage

use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Window function types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowType {
    /// No windowing, the frame is analyzed as-is
    #[default]
    None,

    /// Hann window: w[n] = 0.5 - 0.5*cos(2πn/(M-1))
    /// Mainlobe width: 8π/M, Sidelobe attenuation: ~31 dB
    Hanning,

    /// Hamming window: w[n] = 0.54 - 0.46*cos(2πn/(M-1))
    /// Mainlobe width: 8π/M, Sidelobe attenuation: ~43 dB
    Hamming,
}

impl WindowType {
    /// Raised-cosine coefficients (a0, a1) for w[n] = a0 - a1*cos(2πn/(M-1))
    fn raised_cosine(&self) -> Option<(f32, f32)> {
        match self {
            WindowType::None => None,
            WindowType::Hanning => Some((0.5, 0.5)),
            WindowType::Hamming => Some((0.54, 0.46)),
        }
    }
}

/// Generate symmetric window coefficients
///
/// # Arguments
/// * `window_type` - Type of window function
/// * `length` - Number of samples (M)
///
/// # Returns
/// Vector of window coefficients w[n] for n = 0..M-1. `WindowType::None`
/// yields all ones.
pub fn generate_window(window_type: WindowType, length: usize) -> Vec<f32> {
    let (a0, a1) = match window_type.raised_cosine() {
        Some(coeffs) => coeffs,
        None => return vec![1.0; length],
    };

    if length < 2 {
        return vec![1.0; length];
    }

    let denom = (length - 1) as f32;
    (0..length)
        .map(|n| {
            let angle = 2.0 * PI * n as f32 / denom;
            a0 - a1 * angle.cos()
        })
        .collect()
}
