//! High-level spectrum analyzer
//!
//! Combines the FFT engine with band mapping and dB conversion, producing
//! one display-ready frame per input frame

use super::bands::{band_centers, BandSpec};
use super::error::Result;
use super::fft::FftEngine;
use crate::filters::windows::WindowType;
use serde::{Deserialize, Serialize};

/// Spectrum analyzer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// FFT size (number of samples, power of 2)
    pub fft_size: usize,

    /// Sample rate in Hz
    pub sample_rate: f32,

    /// Window type for spectral analysis
    pub window_type: WindowType,

    /// Band layout; `None` reports every raw bin
    pub bands: Option<BandSpec>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            fft_size: 1024,
            sample_rate: 44100.0,
            window_type: WindowType::Hanning,
            bands: None,
        }
    }
}

/// One analyzed frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpectrumFrame {
    /// Stream time of the first sample in seconds
    pub timestamp: f64,

    /// Power per band (or per bin without a band layout)
    pub magnitudes: Vec<f32>,

    /// Representative frequency of each entry in Hz
    pub frequencies: Vec<f32>,

    /// `magnitudes` converted with `FftEngine::to_decibels`
    pub decibels: Vec<f32>,
}

/// Real-time spectrum analyzer
pub struct SpectrumAnalyzer {
    config: AnalyzerConfig,
    fft_engine: FftEngine,
    frequencies: Vec<f32>,
}

impl SpectrumAnalyzer {
    /// Create new spectrum analyzer
    ///
    /// Fails if the engine rejects the size or rate, or the band layout does
    /// not fit below Nyquist.
    pub fn new(config: AnalyzerConfig) -> Result<Self> {
        let mut fft_engine = FftEngine::new(config.fft_size, config.sample_rate)?;
        fft_engine.set_window_type(config.window_type);
        let frequencies = Self::frequency_axis(&fft_engine, config.bands.as_ref())?;

        Ok(Self {
            config,
            fft_engine,
            frequencies,
        })
    }

    /// Analyze one frame
    ///
    /// # Arguments
    /// * `frame` - Exactly `fft_size` samples
    /// * `timestamp` - Stream time of `frame[0]` in seconds
    pub fn analyze(&mut self, frame: &[f32], timestamp: f64) -> Result<SpectrumFrame> {
        self.fft_engine.forward(frame)?;

        let magnitudes = match &self.config.bands {
            Some(spec) => self.fft_engine.map_bands(spec)?,
            None => self.fft_engine.magnitudes()?.to_vec(),
        };
        let decibels = magnitudes.iter().map(|&m| FftEngine::to_decibels(m)).collect();

        Ok(SpectrumFrame {
            timestamp,
            magnitudes,
            frequencies: self.frequencies.clone(),
            decibels,
        })
    }

    /// Update configuration
    ///
    /// The FFT plan is rebuilt only when size or sample rate change. On error
    /// the previous configuration stays in effect.
    pub fn update_config(&mut self, config: AnalyzerConfig) -> Result<()> {
        let needs_new_fft = config.fft_size != self.config.fft_size
            || config.sample_rate != self.config.sample_rate;

        if needs_new_fft {
            let engine = FftEngine::new(config.fft_size, config.sample_rate)?;
            let frequencies = Self::frequency_axis(&engine, config.bands.as_ref())?;
            self.fft_engine = engine;
            self.frequencies = frequencies;
        } else {
            self.frequencies = Self::frequency_axis(&self.fft_engine, config.bands.as_ref())?;
        }

        self.fft_engine.set_window_type(config.window_type);
        self.config = config;
        Ok(())
    }

    /// Get current configuration
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Underlying engine, for raw bin queries against the last frame
    pub fn engine(&self) -> &FftEngine {
        &self.fft_engine
    }

    /// Number of entries in each `SpectrumFrame`
    pub fn num_bands(&self) -> usize {
        self.frequencies.len()
    }

    fn frequency_axis(engine: &FftEngine, bands: Option<&BandSpec>) -> Result<Vec<f32>> {
        match bands {
            Some(spec) => band_centers(spec, engine.nyquist_frequency()),
            None => {
                let bw = engine.bandwidth();
                Ok((0..engine.bin_count())
                    .map(|i| i as f32 * bw + bw / 2.0)
                    .collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectrum::bands::BandScale;
    use crate::spectrum::error::SpectrumError;
    use std::f64::consts::PI;

    fn tone(freq_hz: f64, sample_rate: f64, len: usize) -> Vec<f32> {
        (0..len)
            .map(|n| (2.0 * PI * freq_hz * n as f64 / sample_rate).sin() as f32)
            .collect()
    }

    #[test]
    fn test_analyzer_raw_bins() {
        let mut analyzer = SpectrumAnalyzer::new(AnalyzerConfig {
            fft_size: 1024,
            sample_rate: 48000.0,
            window_type: WindowType::Hamming,
            bands: None,
        })
        .unwrap();

        let frame = analyzer.analyze(&tone(1000.0, 48000.0, 1024), 0.5).unwrap();

        assert_eq!(frame.magnitudes.len(), 512);
        assert_eq!(frame.frequencies.len(), 512);
        assert_eq!(frame.decibels.len(), 512);
        assert_eq!(frame.timestamp, 0.5);

        let (peak_idx, _) = frame
            .magnitudes
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
            .unwrap();

        // Peak should be near 1 kHz
        assert!((frame.frequencies[peak_idx] - 1000.0).abs() < 100.0);
    }

    #[test]
    fn test_analyzer_bands() {
        let mut analyzer = SpectrumAnalyzer::new(AnalyzerConfig {
            bands: Some(BandSpec::logarithmic(20.0, 20000.0, 24)),
            ..AnalyzerConfig::default()
        })
        .unwrap();

        assert_eq!(analyzer.num_bands(), 24);

        let frame = analyzer.analyze(&tone(440.0, 44100.0, 1024), 0.0).unwrap();
        assert_eq!(frame.magnitudes.len(), 24);

        let (loudest, _) = frame
            .magnitudes
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
            .unwrap();
        let edges = crate::spectrum::bands::band_edges(
            analyzer.config().bands.as_ref().unwrap(),
            22050.0,
        )
        .unwrap();

        // The band holding 440 Hz, give or take one for window spread
        let expected = edges.windows(2).position(|e| e[0] <= 440.0 && 440.0 < e[1]).unwrap();
        assert!(loudest.abs_diff(expected) <= 1);
    }

    #[test]
    fn test_silence_in_db() {
        let mut analyzer = SpectrumAnalyzer::new(AnalyzerConfig::default()).unwrap();
        let frame = analyzer.analyze(&[0.0; 1024], 0.0).unwrap();
        assert!(frame.decibels.iter().all(|&db| db == crate::spectrum::fft::MIN_DECIBELS));
    }

    #[test]
    fn test_rejects_bad_band_layout() {
        let result = SpectrumAnalyzer::new(AnalyzerConfig {
            bands: Some(BandSpec::new(0.0, 20000.0, 10, BandScale::Logarithmic)),
            ..AnalyzerConfig::default()
        });
        assert!(matches!(result, Err(SpectrumError::InvalidRange { .. })));
    }

    #[test]
    fn test_update_config() {
        let mut analyzer = SpectrumAnalyzer::new(AnalyzerConfig::default()).unwrap();

        analyzer
            .update_config(AnalyzerConfig {
                fft_size: 2048,
                bands: Some(BandSpec::linear(0.0, 22050.0, 64)),
                ..AnalyzerConfig::default()
            })
            .unwrap();
        assert_eq!(analyzer.engine().fft_size(), 2048);
        assert_eq!(analyzer.num_bands(), 64);

        // Old frame size is now rejected
        assert!(matches!(
            analyzer.analyze(&[0.0; 1024], 0.0),
            Err(SpectrumError::InvalidInput { expected: 2048, actual: 1024 })
        ));

        // A bad update leaves the analyzer as it was
        let err = analyzer.update_config(AnalyzerConfig {
            fft_size: 1000,
            ..AnalyzerConfig::default()
        });
        assert!(err.is_err());
        assert_eq!(analyzer.config().fft_size, 2048);
    }
}
