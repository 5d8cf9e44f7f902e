use crate::prelude::Cf32;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

/// Helper that wraps the `rustfft` planner for reuse on fixed-size
/// complex blocks.
pub struct FftHelper {
    size: usize,
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
}

impl FftHelper {
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let forward = planner.plan_fft_forward(size);
        let inverse = planner.plan_fft_inverse(size);
        Self {
            size,
            forward,
            inverse,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// In-place forward transform. The buffer length must equal `size`.
    pub fn forward(&self, buffer: &mut [Cf32]) {
        debug_assert_eq!(buffer.len(), self.size);
        self.forward.process(buffer);
    }

    /// In-place inverse transform, scaled by 1/N so that
    /// `inverse(forward(x)) == x`.
    pub fn inverse(&self, buffer: &mut [Cf32]) {
        debug_assert_eq!(buffer.len(), self.size);
        self.inverse.process(buffer);
        let scale = 1.0 / self.size as f32;
        for value in buffer.iter_mut() {
            *value *= scale;
        }
    }
}
