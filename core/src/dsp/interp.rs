use crate::dsp::design::rrc_taps;
use crate::prelude::{Cf32, DspError, DspResult};
use std::collections::VecDeque;

/// Polyphase FIR interpolator producing `k` output samples per input
/// symbol. Each of the `k` branches is a decimated slice of the prototype
/// response, so one symbol push costs `k` short dot products.
pub struct FirInterpolator {
    k: usize,
    branches: Vec<Vec<f32>>,
    history: VecDeque<Cf32>,
}

impl FirInterpolator {
    pub fn new(k: usize, taps: &[f32]) -> DspResult<Self> {
        if k == 0 {
            return Err(DspError::InvalidParameter(
                "interpolator: k must be positive".into(),
            ));
        }
        if taps.is_empty() {
            return Err(DspError::InvalidParameter(
                "interpolator: empty tap vector".into(),
            ));
        }
        let branch_len = taps.len().div_ceil(k);
        let mut branches = vec![Vec::with_capacity(branch_len); k];
        for (i, &h) in taps.iter().enumerate() {
            branches[i % k].push(h);
        }
        for branch in branches.iter_mut() {
            branch.resize(branch_len, 0.0);
        }
        let history = VecDeque::from(vec![Cf32::new(0.0, 0.0); branch_len]);
        Ok(Self {
            k,
            branches,
            history,
        })
    }

    /// Root-raised-cosine pulse-shaping interpolator.
    pub fn rrc(k: usize, m: usize, beta: f32, dt: f32) -> DspResult<Self> {
        let taps = rrc_taps(k, m, beta, dt)?;
        Self::new(k, &taps)
    }

    pub fn samples_per_symbol(&self) -> usize {
        self.k
    }

    /// Pushes one symbol and writes `k` interpolated samples into `out`.
    pub fn execute(&mut self, symbol: Cf32, out: &mut [Cf32]) -> DspResult<()> {
        if out.len() < self.k {
            return Err(DspError::InvalidInput(format!(
                "interpolator: output slice holds {} samples, need {}",
                out.len(),
                self.k
            )));
        }
        self.history.pop_back();
        self.history.push_front(symbol);
        for (p, branch) in self.branches.iter().enumerate() {
            let mut acc = Cf32::new(0.0, 0.0);
            for (&h, &x) in branch.iter().zip(self.history.iter()) {
                acc += x * h;
            }
            out[p] = acc;
        }
        Ok(())
    }

    pub fn reset(&mut self) {
        for value in self.history.iter_mut() {
            *value = Cf32::new(0.0, 0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn impulse_response_reproduces_taps() {
        let taps = [0.25f32, 0.5, 1.0, 0.5, 0.25, 0.1];
        let mut interp = FirInterpolator::new(2, &taps).unwrap();
        let mut produced = Vec::new();
        let mut out = [Cf32::new(0.0, 0.0); 2];
        interp.execute(Cf32::new(1.0, 0.0), &mut out).unwrap();
        produced.extend_from_slice(&out);
        for _ in 0..2 {
            interp.execute(Cf32::new(0.0, 0.0), &mut out).unwrap();
            produced.extend_from_slice(&out);
        }
        for (i, &h) in taps.iter().enumerate() {
            assert!((produced[i].re - h).abs() < 1e-6, "tap {i}");
            assert!(produced[i].im.abs() < 1e-6);
        }
    }

    #[test]
    fn rrc_interpolator_peaks_at_filter_delay() {
        let (k, m) = (2usize, 3usize);
        let mut interp = FirInterpolator::rrc(k, m, 0.3, 0.0).unwrap();
        let mut out = [Cf32::new(0.0, 0.0); 2];
        let mut peak_index = 0;
        let mut peak = 0.0f32;
        let mut n = 0;
        interp.execute(Cf32::new(1.0, 0.0), &mut out).unwrap();
        for _ in 0..(2 * m + 1) {
            for &y in out.iter() {
                if y.re.abs() > peak {
                    peak = y.re.abs();
                    peak_index = n;
                }
                n += 1;
            }
            interp.execute(Cf32::new(0.0, 0.0), &mut out).unwrap();
        }
        assert_eq!(peak_index, k * m);
    }

    #[test]
    fn rejects_undersized_output_slice() {
        let mut interp = FirInterpolator::new(4, &[1.0; 8]).unwrap();
        let mut out = [Cf32::new(0.0, 0.0); 2];
        assert!(interp.execute(Cf32::new(1.0, 0.0), &mut out).is_err());
    }
}
