use crate::prelude::{Cf32, DspError, DspResult};

const AMPLITUDE: f32 = std::f32::consts::FRAC_1_SQRT_2;

/// Gray-coded QPSK modem mapping 2-bit symbols onto a unit-energy
/// constellation. Bit 0 selects the in-phase sign, bit 1 the quadrature
/// sign, so adjacent constellation points differ in exactly one bit.
#[derive(Debug, Clone, Copy, Default)]
pub struct QpskModem;

impl QpskModem {
    pub const BITS_PER_SYMBOL: usize = 2;
    pub const CONSTELLATION_SIZE: usize = 4;

    pub fn new() -> Self {
        Self
    }

    /// Maps a 2-bit symbol index onto a constellation point.
    pub fn modulate(&self, symbol: u8) -> DspResult<Cf32> {
        if symbol as usize >= Self::CONSTELLATION_SIZE {
            return Err(DspError::InvalidInput(format!(
                "qpsk: symbol {symbol} exceeds constellation"
            )));
        }
        let i = if symbol & 0b01 == 0 {
            AMPLITUDE
        } else {
            -AMPLITUDE
        };
        let q = if symbol & 0b10 == 0 {
            AMPLITUDE
        } else {
            -AMPLITUDE
        };
        Ok(Cf32::new(i, q))
    }

    /// Hard-decision demapping by quadrant.
    pub fn demodulate(&self, sample: Cf32) -> u8 {
        let mut symbol = 0u8;
        if sample.re < 0.0 {
            symbol |= 0b01;
        }
        if sample.im < 0.0 {
            symbol |= 0b10;
        }
        symbol
    }
}
