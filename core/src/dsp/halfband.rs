use crate::math::window::{kaiser_beta, kaiser_window, sinc};
use crate::prelude::{Cf32, DspError, DspResult};
use std::collections::VecDeque;

/// Half-band filter usable as a 2x interpolator or a 2x decimator.
///
/// The impulse response is a Kaiser-windowed sinc at a quarter-rate cutoff,
/// `4*m + 1` taps long with semilength `2*m`. Every even offset from the
/// center tap is an exact zero crossing, the center tap is 1/2.
pub struct Halfband {
    taps: Vec<f32>,
    window: VecDeque<Cf32>,
}

impl Halfband {
    pub fn new(m: usize, atten_db: f32) -> DspResult<Self> {
        if m == 0 {
            return Err(DspError::InvalidParameter(
                "halfband: semilength must be at least 1".into(),
            ));
        }
        let h_len = 4 * m + 1;
        let center = 2 * m;
        let win = kaiser_window(h_len, kaiser_beta(atten_db));
        let taps: Vec<f32> = (0..h_len)
            .map(|i| {
                let n = i as f32 - center as f32;
                0.5 * sinc(n / 2.0) * win[i]
            })
            .collect();
        let window = VecDeque::from(vec![Cf32::new(0.0, 0.0); h_len]);
        Ok(Self { taps, window })
    }

    fn push(&mut self, x: Cf32) {
        self.window.pop_back();
        self.window.push_front(x);
    }

    fn dot(&self) -> Cf32 {
        let mut acc = Cf32::new(0.0, 0.0);
        for (&h, &x) in self.taps.iter().zip(self.window.iter()) {
            acc += x * h;
        }
        acc
    }

    /// Interpolates one input into two output samples (zero-stuffing
    /// followed by the half-band response, with the 2x gain folded in).
    pub fn interp(&mut self, x: Cf32) -> [Cf32; 2] {
        self.push(x);
        let y0 = self.dot() * 2.0;
        self.push(Cf32::new(0.0, 0.0));
        let y1 = self.dot() * 2.0;
        [y0, y1]
    }

    /// Decimates a pair of input samples into one output sample.
    pub fn decim(&mut self, x: &[Cf32; 2]) -> Cf32 {
        self.push(x[0]);
        self.push(x[1]);
        self.dot()
    }

    pub fn reset(&mut self) {
        for value in self.window.iter_mut() {
            *value = Cf32::new(0.0, 0.0);
        }
    }
}
