use crate::math::fft::FftHelper;
use crate::ofdm::plcp::{self, PnSequence};
use crate::ofdm::subcarriers::{count_types, validate_allocation, SubcarrierType};
use crate::prelude::{Cf32, DspError, DspResult};

const PILOT_SEED: u8 = 0b0111_0100;

/// OFDM frame generator: PLCP preamble (S0, S0, S1) followed by
/// cyclic-prefixed data symbols.
///
/// Frequency-domain symbols are scaled so every emitted time-domain symbol
/// has unit RMS; the synchronizer relies on the preamble and the data
/// symbols sharing that gain when it equalizes against the S1 estimate.
pub struct OfdmFrameGen {
    m: usize,
    cp_len: usize,
    allocation: Vec<SubcarrierType>,
    fft: FftHelper,
    s0_time: Vec<Cf32>,
    s1_time: Vec<Cf32>,
    gain: f32,
    pilot_polarity: PnSequence,
    scratch: Vec<Cf32>,
}

impl OfdmFrameGen {
    pub fn new(m: usize, cp_len: usize, allocation: &[SubcarrierType]) -> DspResult<Self> {
        validate_allocation(allocation)?;
        if allocation.len() != m {
            return Err(DspError::InvalidParameter(format!(
                "allocation length {} does not match subcarrier count {m}",
                allocation.len()
            )));
        }
        if cp_len >= m {
            return Err(DspError::InvalidParameter(format!(
                "cyclic prefix {cp_len} must be shorter than the symbol {m}"
            )));
        }
        let fft = FftHelper::new(m);
        let s0_time = plcp::to_time_domain(&fft, &plcp::s0_freq(allocation));
        let s1_time = plcp::to_time_domain(&fft, &plcp::s1_freq(allocation));
        let (_, pilots, data) = count_types(allocation);
        let gain = m as f32 / ((pilots + data) as f32).sqrt();
        Ok(Self {
            m,
            cp_len,
            allocation: allocation.to_vec(),
            fft,
            s0_time,
            s1_time,
            gain,
            pilot_polarity: PnSequence::new(PILOT_SEED),
            scratch: vec![Cf32::new(0.0, 0.0); m],
        })
    }

    pub fn data_subcarriers(&self) -> usize {
        count_types(&self.allocation).2
    }

    /// Length of the PLCP preamble in samples.
    pub fn preamble_len(&self) -> usize {
        3 * self.m
    }

    /// Length of one cyclic-prefixed data symbol in samples.
    pub fn symbol_len(&self) -> usize {
        self.m + self.cp_len
    }

    /// Writes the preamble (two S0 symbols, one S1 symbol) into `out`.
    pub fn write_preamble(&self, out: &mut [Cf32]) -> DspResult<()> {
        if out.len() < self.preamble_len() {
            return Err(DspError::InvalidInput(format!(
                "preamble needs {} samples, output holds {}",
                self.preamble_len(),
                out.len()
            )));
        }
        out[..self.m].copy_from_slice(&self.s0_time);
        out[self.m..2 * self.m].copy_from_slice(&self.s0_time);
        out[2 * self.m..3 * self.m].copy_from_slice(&self.s1_time);
        Ok(())
    }

    /// Writes one cyclic-prefixed OFDM symbol carrying `data` on the data
    /// subcarriers. `data` must hold exactly `data_subcarriers()` points.
    pub fn write_symbol(&mut self, data: &[Cf32], out: &mut [Cf32]) -> DspResult<()> {
        if data.len() != self.data_subcarriers() {
            return Err(DspError::InvalidInput(format!(
                "expected {} data points, got {}",
                self.data_subcarriers(),
                data.len()
            )));
        }
        if out.len() < self.symbol_len() {
            return Err(DspError::InvalidInput(format!(
                "symbol needs {} samples, output holds {}",
                self.symbol_len(),
                out.len()
            )));
        }

        let polarity = self.pilot_polarity.next_chip();
        let mut pilot_pn = PnSequence::new(PILOT_SEED);
        let mut data_iter = data.iter();
        for (i, &sc) in self.allocation.iter().enumerate() {
            self.scratch[i] = match sc {
                SubcarrierType::Null => Cf32::new(0.0, 0.0),
                SubcarrierType::Pilot => Cf32::new(pilot_pn.next_chip() * polarity, 0.0),
                SubcarrierType::Data => *data_iter.next().unwrap_or(&Cf32::new(0.0, 0.0)),
            } * self.gain;
        }
        self.fft.inverse(&mut self.scratch);

        let (cp, body) = out[..self.symbol_len()].split_at_mut(self.cp_len);
        body.copy_from_slice(&self.scratch);
        cp.copy_from_slice(&self.scratch[self.m - self.cp_len..]);
        Ok(())
    }

    /// Rearms the per-symbol pilot polarity sequence for a new frame.
    pub fn reset(&mut self) {
        self.pilot_polarity = PnSequence::new(PILOT_SEED);
    }
}
