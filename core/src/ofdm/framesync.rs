use crate::math::fft::FftHelper;
use crate::ofdm::plcp;
use crate::ofdm::subcarriers::{count_types, validate_allocation, SubcarrierType};
use crate::prelude::{Cf32, DspError, DspResult};
use log::{debug, info};
use serde::Serialize;
use std::collections::VecDeque;

/// Decision returned by the frame callback after each demodulated symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameAction {
    /// Keep demodulating symbols of the current frame.
    Continue,
    /// Frame is finished; rearm the preamble detector.
    Reset,
}

/// Counters and signal-quality figures exposed by the synchronizer.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SyncStats {
    pub frames_detected: u64,
    pub symbols_delivered: u64,
    /// Last estimated carrier frequency offset, radians per sample.
    pub cfo: f32,
    /// Last preamble correlation metric, 0..1.
    pub peak: f32,
}

enum State {
    /// Sliding-window autocorrelation hunting for the S0 half-period
    /// repetition.
    Seek,
    /// Preamble found; matched-filtering for the S1 symbol boundary.
    Align,
    /// Channel estimated; demodulating cyclic-prefixed symbols.
    Demod,
}

/// Streaming OFDM frame synchronizer.
///
/// Samples pushed through [`execute`](Self::execute) are scanned for the
/// PLCP preamble; once the S1 boundary is located the per-subcarrier
/// channel is estimated and every following symbol is CP-stripped,
/// transformed, equalized and handed to the callback as a slice of
/// data-subcarrier points. The callback ends the frame by returning
/// [`FrameAction::Reset`].
pub struct OfdmFrameSync<F>
where
    F: FnMut(&[Cf32]) -> FrameAction,
{
    m: usize,
    cp_len: usize,
    allocation: Vec<SubcarrierType>,
    fft: FftHelper,
    s1_unit: Vec<Cf32>,
    s1_time: Vec<Cf32>,
    callback: F,
    state: State,
    window: VecDeque<Cf32>,
    symbol_buf: Vec<Cf32>,
    scratch: Vec<Cf32>,
    eq: Vec<Cf32>,
    data_buf: Vec<Cf32>,
    nco_phase: f32,
    nco_freq: f32,
    align_elapsed: usize,
    detect_threshold: f32,
    stats: SyncStats,
}

impl<F> OfdmFrameSync<F>
where
    F: FnMut(&[Cf32]) -> FrameAction,
{
    pub fn new(
        m: usize,
        cp_len: usize,
        allocation: &[SubcarrierType],
        callback: F,
    ) -> DspResult<Self> {
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
        let s1_unit = plcp::s1_freq(allocation);
        let s1_time = plcp::to_time_domain(&fft, &s1_unit);
        let (_, pilots, data) = count_types(allocation);
        Ok(Self {
            m,
            cp_len,
            allocation: allocation.to_vec(),
            fft,
            s1_unit,
            s1_time,
            callback,
            state: State::Seek,
            window: VecDeque::with_capacity(m),
            symbol_buf: Vec::with_capacity(m + cp_len),
            scratch: vec![Cf32::new(0.0, 0.0); m],
            eq: vec![Cf32::new(0.0, 0.0); m],
            data_buf: Vec::with_capacity(data.max(pilots)),
            nco_phase: 0.0,
            nco_freq: 0.0,
            align_elapsed: 0,
            detect_threshold: 0.6,
            stats: SyncStats::default(),
        })
    }

    pub fn stats(&self) -> SyncStats {
        self.stats
    }

    /// Rearms the preamble detector and drops all per-frame state.
    pub fn reset(&mut self) {
        self.state = State::Seek;
        self.window.clear();
        self.symbol_buf.clear();
        self.nco_phase = 0.0;
        self.nco_freq = 0.0;
        self.align_elapsed = 0;
    }

    /// Feeds a block of received samples through the state machine.
    pub fn execute(&mut self, samples: &[Cf32]) {
        for &raw in samples {
            // CFO derotation; the oscillator is idle until a preamble
            // has been detected
            let sample = raw * Cf32::from_polar(1.0, -self.nco_phase);
            self.nco_phase += self.nco_freq;

            match self.state {
                State::Seek => self.seek(sample),
                State::Align => self.align(sample),
                State::Demod => self.demod(sample),
            }
        }
    }

    fn push_window(&mut self, sample: Cf32) {
        if self.window.len() == self.m {
            self.window.pop_front();
        }
        self.window.push_back(sample);
    }

    fn seek(&mut self, sample: Cf32) {
        self.push_window(sample);
        if self.window.len() < self.m {
            return;
        }
        let half = self.m / 2;
        let mut corr = Cf32::new(0.0, 0.0);
        let mut energy = 0.0f32;
        for (i, &x) in self.window.iter().enumerate() {
            energy += x.norm_sqr();
            if i < half {
                corr += x * self.window[i + half].conj();
            }
        }
        if energy < 1e-9 * self.m as f32 {
            return;
        }
        let metric = corr.norm() / (0.5 * energy);
        if metric > self.detect_threshold {
            // phase slope over the half-symbol lag gives the coarse CFO
            self.nco_freq = -corr.arg() / half as f32;
            self.nco_phase = 0.0;
            self.stats.cfo = self.nco_freq;
            self.stats.peak = metric;
            self.align_elapsed = 0;
            debug!(
                "preamble detected: metric {:.3}, cfo {:+.5} rad/sample",
                metric, self.nco_freq
            );
            self.state = State::Align;
        }
    }

    fn align(&mut self, sample: Cf32) {
        self.push_window(sample);
        self.align_elapsed += 1;
        // give up if S1 never shows; the detection was spurious
        if self.align_elapsed > 8 * self.m {
            debug!("S1 alignment timed out, rearming detector");
            self.reset();
            return;
        }
        if self.window.len() < self.m {
            return;
        }
        let mut xcorr = Cf32::new(0.0, 0.0);
        let mut energy = 0.0f32;
        for (&x, &r) in self.window.iter().zip(self.s1_time.iter()) {
            xcorr += x * r.conj();
            energy += x.norm_sqr();
        }
        if energy <= 0.0 {
            return;
        }
        // s1_time has unit RMS, so its total energy is m
        let metric = xcorr.norm_sqr() / (energy * self.m as f32);
        if metric > 0.5 {
            self.estimate_channel();
            self.stats.frames_detected += 1;
            self.symbol_buf.clear();
            info!(
                "frame {}: S1 aligned, metric {:.3}",
                self.stats.frames_detected, metric
            );
            self.state = State::Demod;
        }
    }

    /// One-shot channel estimate from the aligned S1 window. The inverted
    /// gains fold the transmit scaling back out, so equalized data points
    /// land on the unit constellation.
    fn estimate_channel(&mut self) {
        for (dst, &src) in self.scratch.iter_mut().zip(self.window.iter()) {
            *dst = src;
        }
        self.fft.forward(&mut self.scratch);
        for i in 0..self.m {
            self.eq[i] = if self.allocation[i] == SubcarrierType::Null {
                Cf32::new(0.0, 0.0)
            } else {
                let y = self.scratch[i];
                if y.norm_sqr() < 1e-12 {
                    Cf32::new(0.0, 0.0)
                } else {
                    self.s1_unit[i] / y
                }
            };
        }
    }

    fn demod(&mut self, sample: Cf32) {
        self.symbol_buf.push(sample);
        if self.symbol_buf.len() < self.m + self.cp_len {
            return;
        }
        self.scratch
            .copy_from_slice(&self.symbol_buf[self.cp_len..]);
        self.fft.forward(&mut self.scratch);

        self.data_buf.clear();
        for i in 0..self.m {
            if self.allocation[i] == SubcarrierType::Data {
                self.data_buf.push(self.scratch[i] * self.eq[i]);
            }
        }
        self.symbol_buf.clear();
        self.stats.symbols_delivered += 1;
        if (self.callback)(&self.data_buf) == FrameAction::Reset {
            self.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modem::QpskModem;
    use crate::ofdm::framegen::OfdmFrameGen;
    use crate::ofdm::subcarriers::default_allocation;
    use std::cell::RefCell;
    use std::rc::Rc;

    const M: usize = 64;
    const CP: usize = 16;

    fn data_count() -> usize {
        let allocation = default_allocation(M).unwrap();
        let (_, _, data) = count_types(&allocation);
        data
    }

    fn build_frame(symbols: &[Vec<u8>]) -> (Vec<Cf32>, usize) {
        let allocation = default_allocation(M).unwrap();
        let mut gen = OfdmFrameGen::new(M, CP, &allocation).unwrap();
        let modem = QpskModem::new();
        let mut stream = vec![Cf32::new(0.0, 0.0); gen.preamble_len()];
        gen.write_preamble(&mut stream).unwrap();
        for symbol in symbols {
            let data: Vec<Cf32> = symbol.iter().map(|&s| modem.modulate(s).unwrap()).collect();
            let mut out = vec![Cf32::new(0.0, 0.0); gen.symbol_len()];
            gen.write_symbol(&data, &mut out).unwrap();
            stream.extend_from_slice(&out);
        }
        (stream, gen.data_subcarriers())
    }

    fn run_sync(stream: &[Cf32], frame_symbols: usize) -> Vec<Vec<Cf32>> {
        let allocation = default_allocation(M).unwrap();
        let received: Rc<RefCell<Vec<Vec<Cf32>>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = received.clone();
        let mut sync = OfdmFrameSync::new(M, CP, &allocation, move |data: &[Cf32]| {
            sink.borrow_mut().push(data.to_vec());
            if sink.borrow().len() % frame_symbols == 0 {
                FrameAction::Reset
            } else {
                FrameAction::Continue
            }
        })
        .unwrap();
        sync.execute(stream);
        let out = received.borrow().clone();
        out
    }

    #[test]
    fn clean_frame_is_detected_and_demodulated() {
        let modem = QpskModem::new();
        let n = data_count();
        let symbols: Vec<Vec<u8>> = (0..3)
            .map(|s| (0..n).map(|i| ((i + s) % 4) as u8).collect())
            .collect();
        let (stream, n_data) = build_frame(&symbols);
        assert_eq!(n_data, n);

        // lead the frame with silence; the detector must wait it out
        let mut padded = vec![Cf32::new(0.0, 0.0); 256];
        padded.extend_from_slice(&stream);

        let received = run_sync(&padded, symbols.len());
        assert_eq!(received.len(), 3, "all three symbols should come back");
        for (rx, tx) in received.iter().zip(symbols.iter()) {
            for (point, &symbol) in rx.iter().zip(tx.iter()) {
                assert_eq!(modem.demodulate(*point), symbol);
                assert!((point.norm() - 1.0).abs() < 0.1, "gain error {}", point.norm());
            }
        }
    }

    #[test]
    fn frame_with_carrier_offset_is_corrected() {
        let modem = QpskModem::new();
        let n = data_count();
        let symbols = vec![vec![1u8; n], vec![3u8; n]];
        let (stream, _) = build_frame(&symbols);

        let cfo = 0.01f32; // radians per sample
        let rotated: Vec<Cf32> = stream
            .iter()
            .enumerate()
            .map(|(n, &x)| x * Cf32::from_polar(1.0, cfo * n as f32))
            .collect();

        let received = run_sync(&rotated, symbols.len());
        assert_eq!(received.len(), 2);
        for (rx, tx) in received.iter().zip(symbols.iter()) {
            for (point, &symbol) in rx.iter().zip(tx.iter()) {
                assert_eq!(modem.demodulate(*point), symbol);
            }
        }
    }

    #[test]
    fn detector_rearms_after_reset() {
        let symbols = vec![vec![0u8; data_count()]];
        let (frame, _) = build_frame(&symbols);
        let mut stream = frame.clone();
        stream.extend(vec![Cf32::new(0.0, 0.0); 128]);
        stream.extend_from_slice(&frame);

        let received = run_sync(&stream, symbols.len());
        assert_eq!(received.len(), 2, "second frame should be caught too");
    }

    #[test]
    fn noise_alone_does_not_trigger_a_frame() {
        // deterministic pseudo-noise, no dependency on rand in this crate
        let mut state = 0x1234_5678u32;
        let mut next = move || {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state as f32 / u32::MAX as f32 - 0.5) * 0.2
        };
        let noise: Vec<Cf32> = (0..4096).map(|_| Cf32::new(next(), next())).collect();

        let allocation = default_allocation(M).unwrap();
        let fired = std::cell::Cell::new(false);
        let mut sync = OfdmFrameSync::new(M, CP, &allocation, |_: &[Cf32]| {
            fired.set(true);
            FrameAction::Reset
        })
        .unwrap();
        sync.execute(&noise);
        assert!(!fired.get());
        assert_eq!(sync.stats().frames_detected, 0);
    }

    #[test]
    fn rejects_mismatched_allocation_length() {
        let allocation = default_allocation(32).unwrap();
        let result = OfdmFrameSync::new(64, 16, &allocation, |_: &[Cf32]| FrameAction::Continue);
        assert!(result.is_err());
    }
}
