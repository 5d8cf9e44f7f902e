use anyhow::Context;
use radiocore::modem::QpskModem;
use radiocore::prelude::Cf32;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Seeded random QPSK symbol source feeding the transmit pipeline.
pub struct SymbolSource {
    rng: StdRng,
    modem: QpskModem,
}

impl SymbolSource {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            modem: QpskModem::new(),
        }
    }

    pub fn next_index(&mut self) -> u8 {
        self.rng.gen_range(0..QpskModem::CONSTELLATION_SIZE as u8)
    }

    /// Fills `out` with random constellation points.
    pub fn fill(&mut self, out: &mut [Cf32]) -> anyhow::Result<()> {
        for slot in out.iter_mut() {
            let index = self.next_index();
            *slot = self
                .modem
                .modulate(index)
                .context("modulating generated symbol")?;
        }
        Ok(())
    }
}
