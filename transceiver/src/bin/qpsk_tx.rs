//! Transmit demo: random QPSK symbols, root-raised-cosine pulse shaping,
//! half-band interpolation and arbitrary-rate resampling onto the radio
//! link.

use anyhow::{bail, Context};
use clap::Parser;
use log::{debug, info};
use radiocore::dsp::{ArbResampler, FirInterpolator, Halfband};
use radiocore::prelude::Cf32;
use radiocore::radio::{TxPort, UsrpIo};
use radiocore::{DAC_RATE, FRAME_SAMPLES};
use std::path::PathBuf;
use transceiver::config::LinkConfig;
use transceiver::generator::SymbolSource;
use transceiver::logging;

/// Symbols shaped per loop iteration; with 2 samples/symbol RRC and the
/// half-band doubler this yields one 512-sample frame per block.
const SYMBOLS_PER_BLOCK: usize = 128;

#[derive(Parser)]
#[command(author, version, about = "QPSK transmit demo over the radio link")]
struct Args {
    /// Center frequency [Hz]
    #[arg(short = 'f', long, default_value_t = 462e6)]
    frequency: f64,
    /// Symbol rate [Hz]
    #[arg(short = 's', long = "symbol-rate", default_value_t = DAC_RATE / 512.0)]
    symbol_rate: f64,
    /// Run time [seconds]
    #[arg(short = 't', long = "time", default_value_t = 5.0)]
    seconds: f64,
    /// Pulse-shaping filter delay [symbols]
    #[arg(short = 'm', long = "delay", default_value_t = 3)]
    delay: usize,
    /// Filter excess-bandwidth factor
    #[arg(short = 'b', long, default_value_t = 0.3)]
    beta: f32,
    /// Seed for the random symbol stream
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Radio link config [YAML]
    #[arg(long)]
    link: Option<PathBuf>,
    /// Only report errors
    #[arg(short = 'q', long)]
    quiet: bool,
    /// Chatty progress output
    #[arg(short = 'v', long)]
    verbose: bool,
}

/// Argument validation; runs before any radio or filter object exists.
fn validate(args: &Args) -> anyhow::Result<()> {
    let min_symbol_rate = DAC_RATE / 512.0;
    let max_symbol_rate = DAC_RATE / 4.0;
    if args.symbol_rate > max_symbol_rate {
        bail!(
            "maximum symbol rate exceeded ({:.4} MHz)",
            max_symbol_rate * 1e-6
        );
    }
    if args.symbol_rate < min_symbol_rate {
        bail!(
            "minimum symbol rate exceeded ({:.4} kHz)",
            min_symbol_rate * 1e-3
        );
    }
    if args.seconds < 0.0 {
        bail!("run time {} must not be negative", args.seconds);
    }
    if args.delay < 1 || args.delay > 20 {
        bail!("filter delay {} must be in [1, 20] symbols", args.delay);
    }
    if !(0.0..=1.0).contains(&args.beta) {
        bail!("excess bandwidth {} must be in [0.0, 1.0]", args.beta);
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init(args.verbose, args.quiet);
    validate(&args)?;

    // hardware interpolation runs in multiples of 4
    let interp_rate = ((DAC_RATE / args.symbol_rate) as u64 >> 2 << 2).max(4);
    let usrp_rate = DAC_RATE / interp_rate as f64;
    let resamp_rate = usrp_rate / args.symbol_rate;
    let num_blocks = (4.0 * args.symbol_rate * args.seconds / FRAME_SAMPLES as f64) as u64;

    println!("frequency      : {:12.8} [MHz]", args.frequency * 1e-6);
    println!(
        "symbol rate    : {:12.8} [kHz] (hardware {:12.8} [kHz])",
        args.symbol_rate * 1e-3,
        usrp_rate * 1e-3
    );
    println!("resampling rate: {resamp_rate:12.8}");

    let link = LinkConfig::load_or_default(args.link.as_deref())?;
    let radio = UsrpIo::new(link.into_usrp(args.frequency, usrp_rate))
        .context("configuring the radio front end")?;
    let mut tx = radio.start_tx().context("opening the transmit stream")?;

    let mut source = SymbolSource::new(args.seed);
    let mut shaper =
        FirInterpolator::rrc(2, args.delay, args.beta, 0.0).context("building the RRC shaper")?;
    let mut doubler = Halfband::new(12, 60.0).context("building the half-band interpolator")?;
    let mut resampler =
        ArbResampler::new(resamp_rate, 13, 0.45, 60.0, 32).context("building the resampler")?;

    let mut symbols = vec![Cf32::new(0.0, 0.0); SYMBOLS_PER_BLOCK];
    let mut shaped = vec![Cf32::new(0.0, 0.0); 2 * SYMBOLS_PER_BLOCK];
    let mut upsampled = vec![Cf32::new(0.0, 0.0); 4 * SYMBOLS_PER_BLOCK];
    let mut resamp_out = vec![Cf32::new(0.0, 0.0); resampler.max_output_len()];
    let mut block_out = Vec::with_capacity(4 * SYMBOLS_PER_BLOCK + 8);

    info!("starting transfer: {num_blocks} blocks");
    for block in 0..num_blocks {
        source.fill(&mut symbols)?;

        for (symbol, pair) in symbols.iter().zip(shaped.chunks_mut(2)) {
            shaper.execute(*symbol, pair)?;
        }
        for (sample, pair) in shaped.iter().zip(upsampled.chunks_mut(2)) {
            let interpolated = doubler.interp(*sample);
            pair.copy_from_slice(&interpolated);
        }

        block_out.clear();
        for &sample in upsampled.iter() {
            let written = resampler.execute(sample, &mut resamp_out)?;
            block_out.extend_from_slice(&resamp_out[..written]);
        }
        tx.produce(&block_out).context("writing samples")?;

        if block % 64 == 0 {
            debug!("block {block}/{num_blocks}: {} samples", block_out.len());
        }
    }
    tx.flush().context("flushing the transmit stream")?;

    let totals = tx.metrics();
    println!(
        "transfer complete: {} frames, {} samples",
        totals.frames, totals.samples
    );
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
        assert!(validate(&parse(&["qpsk_tx"])).is_ok());
    }

    #[test]
    fn negative_run_time_is_rejected() {
        let args = parse(&["qpsk_tx", "--time=-1"]);
        assert!(validate(&args).is_err());
    }

    #[test]
    fn out_of_range_symbol_rate_is_rejected() {
        let args = parse(&["qpsk_tx", "--symbol-rate", "1e9"]);
        assert!(validate(&args).is_err());
    }
}
