//! Preamble construction shared by the frame generator and synchronizer.
//!
//! The PLCP preamble holds two S0 symbols whose energy sits only on
//! even-centered subcarriers, so their time waveform repeats with period
//! M/2 (the property the detector correlates against), followed by one S1
//! symbol occupying every enabled subcarrier for channel estimation.

use crate::math::fft::FftHelper;
use crate::ofdm::subcarriers::SubcarrierType;
use crate::prelude::Cf32;

const S0_SEED: u8 = 0b0101_1010;
const S1_SEED: u8 = 0b0011_1001;

/// Seven-bit linear-feedback shift register used for deterministic pilot
/// and preamble phases. Both ends of the link derive the same sequence.
#[derive(Debug, Clone)]
pub struct PnSequence {
    state: u8,
}

impl PnSequence {
    pub fn new(seed: u8) -> Self {
        // a zero state would lock the register
        let state = seed & 0x7f;
        Self {
            state: if state == 0 { 1 } else { state },
        }
    }

    /// Next chip as a BPSK value, +1 or -1.
    pub fn next_chip(&mut self) -> f32 {
        let bit = (self.state >> 6) ^ ((self.state >> 5) & 1) & 1;
        self.state = ((self.state << 1) | bit) & 0x7f;
        if bit & 1 == 1 {
            -1.0
        } else {
            1.0
        }
    }
}

fn centered_index(i: usize, m: usize) -> isize {
    if i < m / 2 {
        i as isize
    } else {
        i as isize - m as isize
    }
}

/// S0 frequency-domain sequence: QPSK chips on enabled even-centered
/// subcarriers, zero elsewhere.
pub fn s0_freq(allocation: &[SubcarrierType]) -> Vec<Cf32> {
    let m = allocation.len();
    let mut pn = PnSequence::new(S0_SEED);
    (0..m)
        .map(|i| {
            if allocation[i] != SubcarrierType::Null && centered_index(i, m) % 2 == 0 {
                Cf32::new(pn.next_chip(), pn.next_chip()) * std::f32::consts::FRAC_1_SQRT_2
            } else {
                Cf32::new(0.0, 0.0)
            }
        })
        .collect()
}

/// S1 frequency-domain sequence: QPSK chips on every enabled subcarrier.
pub fn s1_freq(allocation: &[SubcarrierType]) -> Vec<Cf32> {
    let mut pn = PnSequence::new(S1_SEED);
    allocation
        .iter()
        .map(|&sc| {
            if sc != SubcarrierType::Null {
                Cf32::new(pn.next_chip(), pn.next_chip()) * std::f32::consts::FRAC_1_SQRT_2
            } else {
                Cf32::new(0.0, 0.0)
            }
        })
        .collect()
}

/// Inverse transform of a frequency-domain sequence, scaled to unit RMS.
pub fn to_time_domain(fft: &FftHelper, freq: &[Cf32]) -> Vec<Cf32> {
    let mut time = freq.to_vec();
    fft.inverse(&mut time);
    let power: f32 = time.iter().map(|s| s.norm_sqr()).sum::<f32>() / time.len() as f32;
    if power > 0.0 {
        let scale = 1.0 / power.sqrt();
        for value in time.iter_mut() {
            *value *= scale;
        }
    }
    time
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ofdm::subcarriers::default_allocation;

    #[test]
    fn pn_sequence_is_deterministic_and_balanced() {
        let chips: Vec<f32> = {
            let mut pn = PnSequence::new(S0_SEED);
            (0..127).map(|_| pn.next_chip()).collect()
        };
        let again: Vec<f32> = {
            let mut pn = PnSequence::new(S0_SEED);
            (0..127).map(|_| pn.next_chip()).collect()
        };
        assert_eq!(chips, again);
        let sum: f32 = chips.iter().sum();
        assert!(sum.abs() < 127.0 * 0.5, "sequence badly unbalanced");
    }

    #[test]
    fn s0_time_waveform_repeats_at_half_period() {
        let allocation = default_allocation(64).unwrap();
        let fft = FftHelper::new(64);
        let s0 = to_time_domain(&fft, &s0_freq(&allocation));
        for i in 0..32 {
            assert!((s0[i] - s0[i + 32]).norm() < 1e-4, "sample {i}");
        }
    }

    #[test]
    fn s1_occupies_every_enabled_subcarrier() {
        let allocation = default_allocation(64).unwrap();
        let s1 = s1_freq(&allocation);
        for (i, &sc) in allocation.iter().enumerate() {
            if sc == SubcarrierType::Null {
                assert_eq!(s1[i].norm(), 0.0);
            } else {
                assert!((s1[i].norm() - 1.0).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn preamble_time_waveforms_have_unit_rms() {
        let allocation = default_allocation(64).unwrap();
        let fft = FftHelper::new(64);
        for freq in [s0_freq(&allocation), s1_freq(&allocation)] {
            let time = to_time_domain(&fft, &freq);
            let power: f32 =
                time.iter().map(|s| s.norm_sqr()).sum::<f32>() / time.len() as f32;
            assert!((power - 1.0).abs() < 1e-4);
        }
    }
}
