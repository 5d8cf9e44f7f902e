/// Normalized sinc, sinc(x) = sin(pi x)/(pi x).
pub fn sinc(x: f32) -> f32 {
    if x == 0.0 {
        1.0
    } else {
        let px = std::f32::consts::PI * x;
        px.sin() / px
    }
}

/// Zeroth-order modified Bessel function of the first kind, by series
/// expansion until the sum stops changing.
pub fn bessel_i0(x: f32) -> f32 {
    let base = x * x / 4.0;
    let mut addend = 1.0f32;
    let mut sum = 1.0f32;
    for j in 1u32.. {
        addend = addend * base / (j * j) as f32;
        let old = sum;
        sum += addend;
        if sum == old || !sum.is_finite() {
            break;
        }
    }
    sum
}

/// Kaiser window of length `n` with shape parameter `beta`.
pub fn kaiser_window(n: usize, beta: f32) -> Vec<f32> {
    let mid = (n - 1) as f32 / 2.0;
    let denom = bessel_i0(beta);
    (0..n)
        .map(|i| {
            let t = i as f32;
            let arg = 1.0 - (4.0 * (t - mid).powi(2) / ((n - 1) as f32).powi(2));
            bessel_i0(beta * arg.max(0.0).sqrt()) / denom
        })
        .collect()
}

/// Kaiser shape parameter for a target stopband attenuation in dB.
pub fn kaiser_beta(atten_db: f32) -> f32 {
    if atten_db > 50.0 {
        0.1102 * (atten_db - 8.7)
    } else if atten_db > 21.0 {
        0.5842 * (atten_db - 21.0).powf(0.4) + 0.07886 * (atten_db - 21.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sinc_at_zero_is_one() {
        assert_eq!(sinc(0.0), 1.0);
        assert!(sinc(1.0).abs() < 1e-6);
        assert!(sinc(2.0).abs() < 1e-6);
    }

    #[test]
    fn bessel_i0_matches_known_values() {
        assert!((bessel_i0(0.0) - 1.0).abs() < 1e-6);
        // I0(1) = 1.26606588...
        assert!((bessel_i0(1.0) - 1.266_065_9).abs() < 1e-4);
    }

    #[test]
    fn kaiser_window_is_symmetric_and_peaks_in_middle() {
        let w = kaiser_window(9, 6.0);
        for i in 0..w.len() {
            assert!((w[i] - w[w.len() - 1 - i]).abs() < 1e-6);
        }
        let peak = w[4];
        assert!(w.iter().all(|&v| v <= peak + 1e-6));
    }

    #[test]
    fn kaiser_beta_increases_with_attenuation() {
        assert!(kaiser_beta(60.0) > kaiser_beta(40.0));
        assert_eq!(kaiser_beta(10.0), 0.0);
    }
}
