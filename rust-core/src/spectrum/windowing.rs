//! Windowing for spectral analysis
//!
//! Applies windows to time-domain frames before FFT to reduce spectral leakage.
//! Coefficients are built on first use and reused until the type or length changes.

use crate::filters::windows::{WindowType, generate_window};

/// Lazily built, cached window coefficients
#[derive(Debug, Clone)]
pub struct WindowCache {
    window_type: WindowType,

    /// Coefficients for `built_for`, empty until first use
    coefficients: Vec<f32>,

    /// (type, length) the coefficients were generated for
    built_for: Option<(WindowType, usize)>,

    /// Number of times the coefficients were regenerated
    rebuilds: usize,
}

impl WindowCache {
    pub fn new(window_type: WindowType) -> Self {
        Self {
            window_type,
            coefficients: Vec::new(),
            built_for: None,
            rebuilds: 0,
        }
    }

    pub fn window_type(&self) -> WindowType {
        self.window_type
    }

    /// Select a new window; coefficients are regenerated on the next `apply`
    pub fn set_window_type(&mut self, window_type: WindowType) {
        self.window_type = window_type;
    }

    /// Coefficients for the current type at `length`, rebuilding if stale
    pub fn coefficients(&mut self, length: usize) -> &[f32] {
        let wanted = (self.window_type, length);
        if self.built_for != Some(wanted) {
            log::trace!("building {:?} window of length {}", self.window_type, length);
            self.coefficients = generate_window(self.window_type, length);
            self.built_for = Some(wanted);
            self.rebuilds += 1;
        }
        &self.coefficients
    }

    /// Write `signal[i] * w[i]` into `output`
    ///
    /// With `WindowType::None` the signal is copied unchanged and no
    /// coefficients are built. Both slices must have the same length.
    pub fn apply(&mut self, signal: &[f32], output: &mut [f32]) {
        debug_assert_eq!(signal.len(), output.len());

        if self.window_type == WindowType::None {
            output.copy_from_slice(signal);
            return;
        }

        let window = self.coefficients(signal.len());
        for ((out, &s), &w) in output.iter_mut().zip(signal.iter()).zip(window.iter()) {
            *out = s * w;
        }
    }

    /// Number of times coefficients have been generated
    pub fn rebuilds(&self) -> usize {
        self.rebuilds
    }
}

impl Default for WindowCache {
    fn default() -> Self {
        Self::new(WindowType::None)
    }
}
