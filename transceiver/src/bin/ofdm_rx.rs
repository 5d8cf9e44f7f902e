//! Receive demo: pulls sample blocks from the radio link, halves the rate
//! through a half-band decimator and runs the OFDM frame synchronizer over
//! the result.

use anyhow::{bail, Context};
use clap::Parser;
use log::{debug, info, warn};
use radiocore::dsp::Halfband;
use radiocore::math::StatsHelper;
use radiocore::ofdm::{default_allocation, FrameAction, OfdmFrameSync, SyncStats};
use radiocore::prelude::Cf32;
use radiocore::radio::{RxPort, UsrpIo};
use radiocore::{DAC_RATE, FRAME_SAMPLES};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use transceiver::config::LinkConfig;
use transceiver::logging;

#[derive(Parser)]
#[command(author, version, about = "OFDM receive demo over the radio link")]
struct Args {
    /// Center frequency [Hz]
    #[arg(short = 'f', long, default_value_t = 462e6)]
    frequency: f64,
    /// Signal bandwidth [Hz]
    #[arg(short = 'b', long, default_value_t = DAC_RATE / 512.0)]
    bandwidth: f64,
    /// Number of subcarriers
    #[arg(short = 'M', long = "subcarriers", default_value_t = 64)]
    subcarriers: usize,
    /// Cyclic prefix length [samples]
    #[arg(long = "cp-len", default_value_t = 16)]
    cp_len: usize,
    /// Run time [seconds]; 0 runs until Ctrl+C
    #[arg(short = 't', long = "time", default_value_t = 5.0)]
    seconds: f64,
    /// Radio link config [YAML]
    #[arg(long)]
    link: Option<PathBuf>,
    /// Append frame-detection events to this file as JSON lines
    #[arg(long)]
    events: Option<PathBuf>,
    /// Only report errors
    #[arg(short = 'q', long)]
    quiet: bool,
    /// Chatty progress output
    #[arg(short = 'v', long)]
    verbose: bool,
}

/// One JSON line per detected frame.
#[derive(Debug, Serialize)]
struct FrameEvent {
    frame: u64,
    block: u64,
    cfo: f32,
    peak: f32,
}

fn spawn_ctrl_c_watcher() -> Arc<AtomicBool> {
    let stop = Arc::new(AtomicBool::new(false));
    let flag = stop.clone();
    std::thread::spawn(move || {
        let runtime = match TokioBuilder::new_current_thread().enable_all().build() {
            Ok(runtime) => runtime,
            Err(err) => {
                warn!("signal watcher unavailable: {err}");
                return;
            }
        };
        runtime.block_on(async {
            if signal::ctrl_c().await.is_ok() {
                flag.store(true, Ordering::SeqCst);
            }
        });
    });
    stop
}

/// Argument validation; runs before any radio or DSP object exists.
fn validate(args: &Args) -> anyhow::Result<()> {
    let min_bandwidth = DAC_RATE / 512.0;
    let max_bandwidth = DAC_RATE / 4.0;
    if args.bandwidth > max_bandwidth {
        bail!("maximum bandwidth exceeded ({:.4} MHz)", max_bandwidth * 1e-6);
    }
    if args.bandwidth < min_bandwidth {
        bail!("minimum bandwidth exceeded ({:.4} kHz)", min_bandwidth * 1e-3);
    }
    if args.seconds < 0.0 {
        bail!("run time {} must not be negative", args.seconds);
    }
    if args.subcarriers < 8 || !args.subcarriers.is_power_of_two() {
        bail!(
            "subcarrier count {} must be a power of two of at least 8",
            args.subcarriers
        );
    }
    if args.cp_len >= args.subcarriers {
        bail!(
            "cyclic prefix {} must be shorter than the symbol ({})",
            args.cp_len,
            args.subcarriers
        );
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init(args.verbose, args.quiet);
    validate(&args)?;

    // hardware delivers 4x bandwidth; software halves it again
    let rx_rate = 4.0 * args.bandwidth;
    let num_blocks = (2.0 * args.bandwidth * args.seconds / FRAME_SAMPLES as f64) as u64;

    println!("frequency   : {:12.8} [MHz]", args.frequency * 1e-6);
    println!("bandwidth   : {:12.8} [kHz]", args.bandwidth * 1e-3);
    println!(
        "subcarriers : {} (cyclic prefix {})",
        args.subcarriers, args.cp_len
    );

    let link = LinkConfig::load_or_default(args.link.as_deref())?;
    let radio = UsrpIo::new(link.into_usrp(args.frequency, rx_rate))
        .context("configuring the radio front end")?;
    let mut rx = radio.start_rx().context("opening the receive stream")?;

    let mut decimator = Halfband::new(12, 60.0).context("building the half-band decimator")?;
    let allocation =
        default_allocation(args.subcarriers).context("building the subcarrier allocation")?;
    let mut sync = OfdmFrameSync::new(args.subcarriers, args.cp_len, &allocation, |data: &[Cf32]| {
        debug!("frame symbol: {} data points", data.len());
        // one symbol per frame is enough for the demo; rearm immediately
        FrameAction::Reset
    })
    .context("building the frame synchronizer")?;

    let mut events = match &args.events {
        Some(path) => Some(BufWriter::new(
            File::create(path)
                .with_context(|| format!("creating event log {}", path.display()))?,
        )),
        None => None,
    };

    let stop = spawn_ctrl_c_watcher();

    let mut block_in = vec![Cf32::new(0.0, 0.0); FRAME_SAMPLES];
    let mut decimated = vec![Cf32::new(0.0, 0.0); FRAME_SAMPLES / 2];

    // one warm-up block lets the hardware settle before we trust the data
    rx.consume(&mut block_in).context("reading warm-up block")?;
    info!(
        "transfer started: {} blocks",
        if num_blocks == 0 {
            "unbounded".to_string()
        } else {
            num_blocks.to_string()
        }
    );

    let mut last_stats = SyncStats::default();
    let mut input_rms = 0.0f32;
    let mut block: u64 = 0;
    while !stop.load(Ordering::SeqCst) && (num_blocks == 0 || block < num_blocks) {
        rx.consume(&mut block_in).context("reading samples")?;
        input_rms = StatsHelper::rms(&block_in);

        for (pair, out) in block_in.chunks_exact(2).zip(decimated.iter_mut()) {
            *out = decimator.decim(&[pair[0], pair[1]]);
        }
        sync.execute(&decimated);

        let stats = sync.stats();
        if stats.frames_detected > last_stats.frames_detected {
            info!(
                "frame {} detected (cfo {:+.5} rad/sample, peak {:.3})",
                stats.frames_detected, stats.cfo, stats.peak
            );
            if let Some(writer) = events.as_mut() {
                let event = FrameEvent {
                    frame: stats.frames_detected,
                    block,
                    cfo: stats.cfo,
                    peak: stats.peak,
                };
                let line = serde_json::to_string(&event).context("encoding frame event")?;
                writeln!(writer, "{line}").context("writing frame event")?;
            }
        }
        last_stats = stats;
        block += 1;
    }

    if let Some(mut writer) = events.take() {
        writer.flush().context("flushing event log")?;
    }

    let totals = rx.metrics();
    let stats = sync.stats();
    println!(
        "transfer complete: {} blocks, {} frames detected, {} symbols, {} frames dropped on the link",
        block, stats.frames_detected, stats.symbols_delivered, totals.dropped_frames
    );
    println!("input level : {input_rms:12.8} rms (last block)");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn default_arguments_validate() {
        assert!(validate(&parse(&["ofdm_rx"])).is_ok());
    }

    #[test]
    fn negative_run_time_is_rejected() {
        let args = parse(&["ofdm_rx", "--time=-0.5"]);
        assert!(validate(&args).is_err());
    }

    #[test]
    fn unbounded_run_time_still_validates() {
        let args = parse(&["ofdm_rx", "--time", "0"]);
        assert!(validate(&args).is_ok());
    }

    #[test]
    fn non_power_of_two_subcarriers_are_rejected() {
        let args = parse(&["ofdm_rx", "--subcarriers", "48"]);
        assert!(validate(&args).is_err());
    }
}
