//! DSP primitives and sample transport for the SDR demo transceiver.
//!
//! The modules cover the pieces the command-line demos drive: pulse-shaping
//! and resampling filters, a QPSK modem, an OFDM frame generator and
//! synchronizer, and a UDP-framed sample link standing in for the radio
//! front end.

pub mod dsp;
pub mod math;
pub mod modem;
pub mod ofdm;
pub mod prelude;
pub mod radio;
pub mod telemetry;

pub use prelude::{Cf32, DspError, DspResult};

/// Converter DAC clock of the emulated front end.
pub const DAC_RATE: f64 = 32e6;

/// Samples carried by one transport frame (4 bytes per I/Q pair on the
/// wire, so one frame is a 2 KiB datagram payload plus header).
pub const FRAME_SAMPLES: usize = 512;
