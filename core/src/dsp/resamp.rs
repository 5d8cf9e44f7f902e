use crate::dsp::design::lowpass_taps;
use crate::prelude::{Cf32, DspError, DspResult};
use std::collections::VecDeque;

/// Arbitrary-rate polyphase resampler.
///
/// A bank of `npfb` filters sampled from one long lowpass prototype covers
/// the fractional delays between input samples; a timing accumulator picks
/// the nearest branch for each output. Rates above and below unity are both
/// supported.
pub struct ArbResampler {
    rate: f64,
    npfb: usize,
    branches: Vec<Vec<f32>>,
    history: VecDeque<Cf32>,
    tau: f64,
}

impl ArbResampler {
    /// `rate` is outputs per input, `m` the prototype semilength in input
    /// samples, `fc` the normalized cutoff, `atten_db` the stopband
    /// attenuation and `npfb` the number of filter-bank branches.
    pub fn new(rate: f64, m: usize, fc: f32, atten_db: f32, npfb: usize) -> DspResult<Self> {
        if rate <= 0.0 || !rate.is_finite() {
            return Err(DspError::InvalidParameter(format!(
                "resampler: rate {rate} must be positive"
            )));
        }
        if m == 0 || npfb == 0 {
            return Err(DspError::InvalidParameter(
                "resampler: semilength and bank size must be positive".into(),
            ));
        }
        let proto_len = 2 * m * npfb + 1;
        let proto = lowpass_taps(proto_len, fc / npfb as f32, atten_db)?;

        let branch_len = 2 * m + 1;
        let mut branches = vec![Vec::with_capacity(branch_len); npfb];
        for (i, &h) in proto.iter().enumerate() {
            // scale restores unity gain per branch
            branches[i % npfb].push(h * npfb as f32);
        }
        for branch in branches.iter_mut() {
            branch.resize(branch_len, 0.0);
        }
        let history = VecDeque::from(vec![Cf32::new(0.0, 0.0); branch_len]);
        Ok(Self {
            rate,
            npfb,
            branches,
            history,
            tau: 0.0,
        })
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Upper bound on the number of outputs a single `execute` can write.
    pub fn max_output_len(&self) -> usize {
        self.rate.ceil() as usize + 1
    }

    /// Consumes one input sample and writes zero or more resampled outputs
    /// into `out`, returning the number written.
    pub fn execute(&mut self, x: Cf32, out: &mut [Cf32]) -> DspResult<usize> {
        if out.len() < self.max_output_len() {
            return Err(DspError::InvalidInput(format!(
                "resampler: output slice holds {} samples, need {}",
                out.len(),
                self.max_output_len()
            )));
        }
        self.history.pop_back();
        self.history.push_front(x);

        let mut written = 0;
        while self.tau < 1.0 {
            let index = ((self.tau * self.npfb as f64) as usize).min(self.npfb - 1);
            let branch = &self.branches[index];
            let mut acc = Cf32::new(0.0, 0.0);
            for (&h, &s) in branch.iter().zip(self.history.iter()) {
                acc += s * h;
            }
            out[written] = acc;
            written += 1;
            self.tau += 1.0 / self.rate;
        }
        self.tau -= 1.0;
        Ok(written)
    }

    pub fn reset(&mut self) {
        for value in self.history.iter_mut() {
            *value = Cf32::new(0.0, 0.0);
        }
        self.tau = 0.0;
    }
}
