//! Wire format for sample datagrams.
//!
//! One frame is a fixed little-endian header followed by interleaved
//! 16-bit I/Q pairs, 4 bytes per complex sample, which matches the front
//! end's native sample width.

use crate::prelude::Cf32;
use crate::radio::{RadioError, RadioResult};
use crate::FRAME_SAMPLES;

const MAGIC: u32 = 0x5344_5246; // "SDRF"
const HEADER_LEN: usize = 4 + 8 + 2;

/// Full-scale value used when quantizing f32 samples to i16.
const I16_SCALE: f32 = 32_000.0;

/// A sequenced block of complex samples as carried on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleFrame {
    pub seq: u64,
    pub samples: Vec<Cf32>,
}

impl SampleFrame {
    pub fn new(seq: u64, samples: Vec<Cf32>) -> Self {
        Self { seq, samples }
    }

    /// Size in bytes of an encoded frame holding `n` samples.
    pub const fn encoded_len(n: usize) -> usize {
        HEADER_LEN + 4 * n
    }

    /// Largest datagram the receive path must accept.
    pub const MAX_ENCODED_LEN: usize = Self::encoded_len(FRAME_SAMPLES);

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(Self::encoded_len(self.samples.len()));
        buf.extend_from_slice(&MAGIC.to_le_bytes());
        buf.extend_from_slice(&self.seq.to_le_bytes());
        buf.extend_from_slice(&(self.samples.len() as u16).to_le_bytes());
        for sample in &self.samples {
            buf.extend_from_slice(&quantize(sample.re).to_le_bytes());
            buf.extend_from_slice(&quantize(sample.im).to_le_bytes());
        }
        buf
    }

    pub fn decode(bytes: &[u8]) -> RadioResult<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(RadioError::Frame(format!(
                "datagram of {} bytes is shorter than the header",
                bytes.len()
            )));
        }
        let magic = u32::from_le_bytes(bytes[0..4].try_into().unwrap());
        if magic != MAGIC {
            return Err(RadioError::Frame(format!("bad magic {magic:#010x}")));
        }
        let seq = u64::from_le_bytes(bytes[4..12].try_into().unwrap());
        let count = u16::from_le_bytes(bytes[12..14].try_into().unwrap()) as usize;
        let body = &bytes[HEADER_LEN..];
        if body.len() != 4 * count {
            return Err(RadioError::Frame(format!(
                "header announces {count} samples, body holds {} bytes",
                body.len()
            )));
        }
        let samples = body
            .chunks_exact(4)
            .map(|chunk| {
                let re = i16::from_le_bytes([chunk[0], chunk[1]]);
                let im = i16::from_le_bytes([chunk[2], chunk[3]]);
                Cf32::new(re as f32 / I16_SCALE, im as f32 / I16_SCALE)
            })
            .collect();
        Ok(Self { seq, samples })
    }
}

fn quantize(value: f32) -> i16 {
    (value * I16_SCALE).clamp(i16::MIN as f32, i16::MAX as f32) as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_round_trip() {
        let samples: Vec<Cf32> = (0..FRAME_SAMPLES)
            .map(|i| Cf32::new((i as f32 / 1024.0) - 0.25, 0.5 - i as f32 / 2048.0))
            .collect();
        let frame = SampleFrame::new(42, samples.clone());
        let decoded = SampleFrame::decode(&frame.encode()).unwrap();
        assert_eq!(decoded.seq, 42);
        assert_eq!(decoded.samples.len(), samples.len());
        for (a, b) in decoded.samples.iter().zip(samples.iter()) {
            assert!((a - b).norm() < 2.0 / I16_SCALE);
        }
    }

    #[test]
    fn quantizer_clamps_overdriven_samples() {
        let frame = SampleFrame::new(0, vec![Cf32::new(4.0, -4.0)]);
        let decoded = SampleFrame::decode(&frame.encode()).unwrap();
        assert!(decoded.samples[0].re > 1.0);
        assert!(decoded.samples[0].im < -1.0);
    }

    #[test]
    fn short_datagram_is_rejected() {
        assert!(SampleFrame::decode(&[0u8; 5]).is_err());
    }

    #[test]
    fn bad_magic_is_rejected() {
        let mut bytes = SampleFrame::new(0, vec![]).encode();
        bytes[0] ^= 0xff;
        assert!(SampleFrame::decode(&bytes).is_err());
    }

    #[test]
    fn truncated_body_is_rejected() {
        let mut bytes = SampleFrame::new(7, vec![Cf32::new(0.1, 0.2); 8]).encode();
        bytes.truncate(bytes.len() - 3);
        assert!(SampleFrame::decode(&bytes).is_err());
    }
}
