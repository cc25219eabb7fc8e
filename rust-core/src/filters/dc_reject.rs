//! DC offset rejection
//!
//! One-pole high-pass that strips the constant bias many microphones add,
//! keeping bin 0 from dominating the spectrum

/// Default pole distance from the unit circle
pub const DEFAULT_POLE: f32 = 0.975;

/// Stateful DC blocker: y[n] = x[n] - x[n-1] + R*y[n-1]
///
/// State carries across blocks so consecutive buffers filter as one stream.
#[derive(Debug, Clone)]
pub struct DcRejectionFilter {
    pole: f32,
    prev_input: f32,
    prev_output: f32,
}

impl DcRejectionFilter {
    /// Create a new DC blocker
    ///
    /// # Arguments
    /// * `pole` - Pole radius R in (0, 1); closer to 1 means a lower cutoff
    pub fn new(pole: f32) -> Self {
        Self {
            pole,
            prev_input: 0.0,
            prev_output: 0.0,
        }
    }

    /// Process single sample
    #[inline]
    pub fn process_sample(&mut self, input: f32) -> f32 {
        let output = input - self.prev_input + self.pole * self.prev_output;
        self.prev_input = input;
        self.prev_output = output;
        output
    }

    /// Process a block in-place
    pub fn process_block_inplace(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process_sample(*sample);
        }
    }

    /// Clear the filter history
    pub fn reset(&mut self) {
        self.prev_input = 0.0;
        self.prev_output = 0.0;
    }

    pub fn pole(&self) -> f32 {
        self.pole
    }
}

impl Default for DcRejectionFilter {
    fn default() -> Self {
        Self::new(DEFAULT_POLE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_input_decays() {
        let mut filter = DcRejectionFilter::default();
        let mut buffer = vec![0.5; 1024];
        filter.process_block_inplace(&mut buffer);

        // First sample passes the step, the tail settles toward zero
        assert!((buffer[0] - 0.5).abs() < 1e-6);
        assert!(buffer[1023].abs() < 1e-6);
    }

    #[test]
    fn test_state_carries_across_blocks() {
        let mut split = DcRejectionFilter::default();
        let mut whole = DcRejectionFilter::default();

        let signal: Vec<f32> = (0..64).map(|n| (n as f32 * 0.3).sin() + 0.2).collect();

        let mut a = signal[..32].to_vec();
        let mut b = signal[32..].to_vec();
        split.process_block_inplace(&mut a);
        split.process_block_inplace(&mut b);

        let mut full = signal.clone();
        whole.process_block_inplace(&mut full);

        a.extend_from_slice(&b);
        for (x, y) in a.iter().zip(full.iter()) {
            assert!((x - y).abs() < 1e-6);
        }
    }

    #[test]
    fn test_reset() {
        let mut filter = DcRejectionFilter::default();
        filter.process_sample(1.0);
        filter.reset();
        assert_eq!(filter.process_sample(0.0), 0.0);
    }
}
