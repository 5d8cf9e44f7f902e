//! Front-end facade and sample ports.
//!
//! The demos talk to the radio through [`TxPort`]/[`RxPort`] handles. The
//! UDP implementation streams [`SampleFrame`] datagrams to or from the
//! process driving the actual hardware; the loopback implementation wires
//! a transmitter directly to a receiver in memory for tests and offline
//! runs.

use crate::prelude::Cf32;
use crate::radio::frame::SampleFrame;
use crate::radio::{RadioError, RadioResult};
use crate::telemetry::{MetricsSnapshot, StreamMetrics};
use crate::FRAME_SAMPLES;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::io::ErrorKind;
use std::net::UdpSocket;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const RECV_TIMEOUT: Duration = Duration::from_secs(1);

/// Front-end settings. The endpoint addresses name the UDP link to the
/// process owning the hardware; tuning parameters are forwarded verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UsrpConfig {
    /// Center frequency in Hz.
    pub center_freq: f64,
    /// Hardware-side sample rate in Hz.
    pub sample_rate: f64,
    /// Local bind address.
    pub bind_addr: String,
    /// Remote front-end address.
    pub remote_addr: String,
}

impl Default for UsrpConfig {
    fn default() -> Self {
        Self {
            center_freq: 462e6,
            sample_rate: 62_500.0,
            bind_addr: "0.0.0.0:0".into(),
            remote_addr: "127.0.0.1:9940".into(),
        }
    }
}

impl UsrpConfig {
    pub fn validate(&self) -> RadioResult<()> {
        if self.center_freq <= 0.0 {
            return Err(RadioError::Config(format!(
                "center frequency {} must be positive",
                self.center_freq
            )));
        }
        if self.sample_rate <= 0.0 {
            return Err(RadioError::Config(format!(
                "sample rate {} must be positive",
                self.sample_rate
            )));
        }
        Ok(())
    }
}

/// Sink half of a sample stream.
pub trait TxPort {
    /// Queues samples for transmission; full frames are sent as they fill.
    fn produce(&mut self, samples: &[Cf32]) -> RadioResult<()>;
    /// Sends any partially filled frame.
    fn flush(&mut self) -> RadioResult<()>;
    fn metrics(&self) -> MetricsSnapshot;
}

/// Source half of a sample stream.
pub trait RxPort {
    /// Blocks until `out` has been completely filled.
    fn consume(&mut self, out: &mut [Cf32]) -> RadioResult<()>;
    fn metrics(&self) -> MetricsSnapshot;
}

/// Facade over the radio front end: validates the configuration, announces
/// the tuning parameters, and opens stream ports.
pub struct UsrpIo {
    config: UsrpConfig,
}

impl UsrpIo {
    pub fn new(config: UsrpConfig) -> RadioResult<Self> {
        config.validate()?;
        info!(
            "front end: {:.6} MHz, {:.3} kHz sample rate, link {} -> {}",
            config.center_freq * 1e-6,
            config.sample_rate * 1e-3,
            config.bind_addr,
            config.remote_addr
        );
        Ok(Self { config })
    }

    pub fn config(&self) -> &UsrpConfig {
        &self.config
    }

    /// Opens the transmit stream over UDP.
    pub fn start_tx(&self) -> RadioResult<UdpTxPort> {
        let socket = UdpSocket::bind(&self.config.bind_addr)?;
        socket.connect(&self.config.remote_addr)?;
        info!("tx stream started towards {}", self.config.remote_addr);
        Ok(UdpTxPort {
            socket,
            pending: Vec::with_capacity(FRAME_SAMPLES),
            seq: 0,
            metrics: StreamMetrics::new(),
        })
    }

    /// Opens the receive stream over UDP.
    pub fn start_rx(&self) -> RadioResult<UdpRxPort> {
        let socket = UdpSocket::bind(&self.config.bind_addr)?;
        socket.set_read_timeout(Some(RECV_TIMEOUT))?;
        info!("rx stream listening on {}", self.config.bind_addr);
        Ok(UdpRxPort {
            socket,
            pending: VecDeque::new(),
            next_seq: None,
            timeouts: 0,
            metrics: StreamMetrics::new(),
        })
    }

    /// In-memory transmitter/receiver pair sharing one sample queue.
    pub fn loopback() -> (LoopbackTxPort, LoopbackRxPort) {
        let queue = Arc::new(Mutex::new(VecDeque::new()));
        (
            LoopbackTxPort {
                queue: queue.clone(),
                metrics: StreamMetrics::new(),
            },
            LoopbackRxPort {
                queue,
                metrics: StreamMetrics::new(),
            },
        )
    }
}

pub struct UdpTxPort {
    socket: UdpSocket,
    pending: Vec<Cf32>,
    seq: u64,
    metrics: StreamMetrics,
}

impl UdpTxPort {
    fn send_frame(&mut self, samples: Vec<Cf32>) -> RadioResult<()> {
        let count = samples.len();
        let frame = SampleFrame::new(self.seq, samples);
        self.socket.send(&frame.encode())?;
        self.seq += 1;
        self.metrics.record_frame(count);
        Ok(())
    }
}

impl TxPort for UdpTxPort {
    fn produce(&mut self, samples: &[Cf32]) -> RadioResult<()> {
        self.pending.extend_from_slice(samples);
        while self.pending.len() >= FRAME_SAMPLES {
            let frame: Vec<Cf32> = self.pending.drain(..FRAME_SAMPLES).collect();
            self.send_frame(frame)?;
        }
        Ok(())
    }

    fn flush(&mut self) -> RadioResult<()> {
        if !self.pending.is_empty() {
            let frame: Vec<Cf32> = self.pending.drain(..).collect();
            self.send_frame(frame)?;
        }
        Ok(())
    }

    fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

impl Drop for UdpTxPort {
    fn drop(&mut self) {
        if let Err(err) = self.flush() {
            warn!("tx flush on close failed: {err}");
        }
        let snapshot = self.metrics.snapshot();
        debug!(
            "tx stream closed: {} frames, {} samples",
            snapshot.frames, snapshot.samples
        );
    }
}

/// Consecutive receive timeouts tolerated before the stream is declared
/// dead (one second each).
const MAX_TIMEOUTS: u32 = 30;

pub struct UdpRxPort {
    socket: UdpSocket,
    pending: VecDeque<Cf32>,
    next_seq: Option<u64>,
    timeouts: u32,
    metrics: StreamMetrics,
}

impl UdpRxPort {
    fn fill(&mut self) -> RadioResult<()> {
        let mut buf = [0u8; SampleFrame::MAX_ENCODED_LEN];
        let len = match self.socket.recv(&mut buf) {
            Ok(len) => {
                self.timeouts = 0;
                len
            }
            Err(err) if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                self.timeouts += 1;
                if self.timeouts >= MAX_TIMEOUTS {
                    return Err(RadioError::Closed(format!(
                        "no samples received for {MAX_TIMEOUTS} seconds"
                    )));
                }
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };
        let frame = match SampleFrame::decode(&buf[..len]) {
            Ok(frame) => frame,
            Err(err) => {
                // tolerate stray datagrams on the port
                warn!("discarding datagram: {err}");
                return Ok(());
            }
        };
        if let Some(expected) = self.next_seq {
            if frame.seq > expected {
                self.metrics.record_dropped(frame.seq - expected);
            }
        }
        self.next_seq = Some(frame.seq + 1);
        self.metrics.record_frame(frame.samples.len());
        self.pending.extend(frame.samples);
        Ok(())
    }
}

impl RxPort for UdpRxPort {
    fn consume(&mut self, out: &mut [Cf32]) -> RadioResult<()> {
        for slot in out.iter_mut() {
            while self.pending.is_empty() {
                self.fill()?;
            }
            *slot = self.pending.pop_front().unwrap_or_default();
        }
        Ok(())
    }

    fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

pub struct LoopbackTxPort {
    queue: Arc<Mutex<VecDeque<Cf32>>>,
    metrics: StreamMetrics,
}

impl TxPort for LoopbackTxPort {
    fn produce(&mut self, samples: &[Cf32]) -> RadioResult<()> {
        let mut queue = self
            .queue
            .lock()
            .map_err(|_| RadioError::Closed("loopback queue poisoned".into()))?;
        queue.extend(samples.iter().copied());
        self.metrics.record_frame(samples.len());
        Ok(())
    }

    fn flush(&mut self) -> RadioResult<()> {
        Ok(())
    }

    fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

pub struct LoopbackRxPort {
    queue: Arc<Mutex<VecDeque<Cf32>>>,
    metrics: StreamMetrics,
}

impl RxPort for LoopbackRxPort {
    /// Drains queued samples and pads with silence once the queue runs
    /// dry, mimicking a receiver that always delivers samples.
    fn consume(&mut self, out: &mut [Cf32]) -> RadioResult<()> {
        let mut queue = self
            .queue
            .lock()
            .map_err(|_| RadioError::Closed("loopback queue poisoned".into()))?;
        for slot in out.iter_mut() {
            *slot = queue.pop_front().unwrap_or(Cf32::new(0.0, 0.0));
        }
        self.metrics.record_frame(out.len());
        Ok(())
    }

    fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loopback_carries_samples_in_order() {
        let (mut tx, mut rx) = UsrpIo::loopback();
        let sent: Vec<Cf32> = (0..100).map(|i| Cf32::new(i as f32, -(i as f32))).collect();
        tx.produce(&sent).unwrap();

        let mut out = vec![Cf32::new(0.0, 0.0); 100];
        rx.consume(&mut out).unwrap();
        assert_eq!(out, sent);
    }

    #[test]
    fn loopback_pads_with_silence_when_drained() {
        let (mut tx, mut rx) = UsrpIo::loopback();
        tx.produce(&[Cf32::new(1.0, 1.0)]).unwrap();
        let mut out = vec![Cf32::new(9.0, 9.0); 4];
        rx.consume(&mut out).unwrap();
        assert_eq!(out[0], Cf32::new(1.0, 1.0));
        assert_eq!(out[1], Cf32::new(0.0, 0.0));
    }

    #[test]
    fn udp_ports_transfer_a_block() {
        let rx_config = UsrpConfig {
            bind_addr: "127.0.0.1:0".into(),
            ..Default::default()
        };
        let radio_rx = UsrpIo::new(rx_config).unwrap();
        let mut rx = radio_rx.start_rx().unwrap();
        let local = rx.socket.local_addr().unwrap();

        let tx_config = UsrpConfig {
            bind_addr: "127.0.0.1:0".into(),
            remote_addr: local.to_string(),
            ..Default::default()
        };
        let radio_tx = UsrpIo::new(tx_config).unwrap();
        let mut tx = radio_tx.start_tx().unwrap();

        let block: Vec<Cf32> = (0..crate::FRAME_SAMPLES)
            .map(|i| Cf32::new((i % 7) as f32 / 8.0, 0.25))
            .collect();
        tx.produce(&block).unwrap();

        let mut out = vec![Cf32::new(0.0, 0.0); crate::FRAME_SAMPLES];
        rx.consume(&mut out).unwrap();
        for (a, b) in out.iter().zip(block.iter()) {
            assert!((a - b).norm() < 1e-3);
        }
        assert_eq!(rx.metrics().frames, 1);
    }

    #[test]
    fn config_validation_rejects_bad_rates() {
        let config = UsrpConfig {
            sample_rate: 0.0,
            ..Default::default()
        };
        assert!(UsrpIo::new(config).is_err());
    }
}
