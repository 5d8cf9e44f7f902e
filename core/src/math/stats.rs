use crate::prelude::Cf32;

pub struct StatsHelper;

impl StatsHelper {
    /// Mean power of a complex sample block.
    pub fn mean_power(samples: &[Cf32]) -> f32 {
        if samples.is_empty() {
            return 0.0;
        }
        samples.iter().map(|s| s.norm_sqr()).sum::<f32>() / samples.len() as f32
    }

    /// RMS magnitude of a complex sample block.
    pub fn rms(samples: &[Cf32]) -> f32 {
        Self::mean_power(samples).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rms_of_empty_block_is_zero() {
        assert_eq!(StatsHelper::rms(&[]), 0.0);
    }

    #[test]
    fn rms_of_unit_circle_samples_is_one() {
        let samples = vec![
            Cf32::new(1.0, 0.0),
            Cf32::new(0.0, 1.0),
            Cf32::new(-1.0, 0.0),
            Cf32::new(0.0, -1.0),
        ];
        assert!((StatsHelper::rms(&samples) - 1.0).abs() < 1e-6);
    }
}
