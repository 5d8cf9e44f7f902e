//! Filter tap design: root-raised-cosine pulse shaping and Kaiser-windowed
//! sinc lowpass prototypes.

use crate::math::window::{kaiser_beta, kaiser_window, sinc};
use crate::prelude::{DspError, DspResult};

/// Designs a root-raised-cosine filter with `k` samples per symbol, a delay
/// of `m` symbols, excess-bandwidth factor `beta` and fractional sample
/// delay `dt`. The returned response has `2*k*m + 1` taps.
pub fn rrc_taps(k: usize, m: usize, beta: f32, dt: f32) -> DspResult<Vec<f32>> {
    if k < 2 {
        return Err(DspError::InvalidParameter(
            "rrc: samples/symbol must be at least 2".into(),
        ));
    }
    if m == 0 {
        return Err(DspError::InvalidParameter(
            "rrc: filter delay must be at least 1 symbol".into(),
        ));
    }
    if !(0.0..=1.0).contains(&beta) {
        return Err(DspError::InvalidParameter(format!(
            "rrc: excess bandwidth {beta} out of range [0,1]"
        )));
    }

    let h_len = 2 * k * m + 1;
    let mut taps = Vec::with_capacity(h_len);
    for i in 0..h_len {
        // time in symbol intervals, centered on the filter delay
        let t = i as f32 / k as f32 - m as f32 + dt;
        taps.push(rrc_response(t, beta));
    }
    Ok(taps)
}

fn rrc_response(t: f32, beta: f32) -> f32 {
    let pi = std::f32::consts::PI;
    if t.abs() < 1e-6 {
        return 1.0 - beta + 4.0 * beta / pi;
    }
    // removable singularity at |t| = 1/(4 beta)
    if beta > 0.0 && (t.abs() - 1.0 / (4.0 * beta)).abs() < 1e-5 {
        let arg = pi / (4.0 * beta);
        return beta / std::f32::consts::SQRT_2
            * ((1.0 + 2.0 / pi) * arg.sin() + (1.0 - 2.0 / pi) * arg.cos());
    }
    let num = (pi * t * (1.0 - beta)).sin() + 4.0 * beta * t * (pi * t * (1.0 + beta)).cos();
    let den = pi * t * (1.0 - (4.0 * beta * t).powi(2));
    num / den
}

/// Designs an `n`-tap lowpass filter with normalized cutoff `fc` (cycles per
/// sample, 0 < fc <= 0.5) and the given stopband attenuation, using a
/// Kaiser-windowed sinc. Passband gain is unity.
pub fn lowpass_taps(n: usize, fc: f32, atten_db: f32) -> DspResult<Vec<f32>> {
    if n == 0 {
        return Err(DspError::InvalidParameter(
            "lowpass: filter length must be positive".into(),
        ));
    }
    if !(0.0..=0.5).contains(&fc) || fc == 0.0 {
        return Err(DspError::InvalidParameter(format!(
            "lowpass: cutoff {fc} out of range (0, 0.5]"
        )));
    }
    let mid = (n - 1) as f32 / 2.0;
    let window = kaiser_window(n, kaiser_beta(atten_db));
    Ok(window
        .iter()
        .enumerate()
        .map(|(i, &w)| 2.0 * fc * sinc(2.0 * fc * (i as f32 - mid)) * w)
        .collect())
}
