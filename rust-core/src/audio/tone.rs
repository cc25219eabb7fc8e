//! Deterministic test-tone source
//!
//! Stands in for a capture device: produces a sine (optionally with a DC
//! offset) in callback-sized blocks, continuous in phase across blocks.

use super::buffer::AudioProducer;
use std::f64::consts::TAU;

/// Sine generator
#[derive(Debug, Clone)]
pub struct ToneGenerator {
    frequency: f64,
    amplitude: f32,
    dc_offset: f32,
    sample_rate: f64,

    /// Phase in cycles, kept in [0, 1)
    phase: f64,
}

impl ToneGenerator {
    /// # Arguments
    /// * `frequency` - Tone frequency in Hz
    /// * `amplitude` - Peak amplitude
    /// * `sample_rate` - Output sample rate in Hz
    pub fn new(frequency: f32, amplitude: f32, sample_rate: f32) -> Self {
        Self {
            frequency: frequency as f64,
            amplitude,
            dc_offset: 0.0,
            sample_rate: sample_rate as f64,
            phase: 0.0,
        }
    }

    /// Add a constant bias to every sample
    pub fn with_dc_offset(mut self, dc_offset: f32) -> Self {
        self.dc_offset = dc_offset;
        self
    }

    /// Fill `buffer` with the next samples of the tone
    pub fn fill(&mut self, buffer: &mut [f32]) {
        let step = self.frequency / self.sample_rate;
        for sample in buffer.iter_mut() {
            *sample = self.amplitude * (TAU * self.phase).sin() as f32 + self.dc_offset;
            self.phase = (self.phase + step).fract();
        }
    }

    /// Generate `len` samples and push them into `producer`
    ///
    /// # Returns
    /// Samples accepted by the ring buffer
    pub fn push_block(&mut self, producer: &mut AudioProducer, len: usize) -> usize {
        let mut block = vec![0.0; len];
        self.fill(&mut block);
        producer.write(&block)
    }

    pub fn frequency(&self) -> f32 {
        self.frequency as f32
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate as f32
    }
}
