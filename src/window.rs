//! Shared numeric utilities: the analysis window, pre-emphasis and sinc.

use std::f64::consts::PI;

/// Generate a symmetric Hamming window of length `n`.
///
/// w[i] = 0.54 - 0.46 × cos(2πi / (n - 1))
pub fn hamming_window(n: usize) -> Vec<f64> {
    if n <= 1 {
        return vec![1.0; n];
    }

    let denom = (n - 1) as f64;
    (0..n)
        .map(|i| 0.54 - 0.46 * (2.0 * PI * i as f64 / denom).cos())
        .collect()
}

/// Multiply `samples` by `window` element-wise into a new buffer.
///
/// The shorter of the two lengths wins.
pub fn apply_window(samples: &[f64], window: &[f64]) -> Vec<f64> {
    samples
        .iter()
        .zip(window.iter())
        .map(|(&s, &w)| s * w)
        .collect()
}

/// First-order pre-emphasis: y[0] = x[0], y[i] = x[i] - α × x[i-1].
pub fn pre_emphasize(samples: &[f64], alpha: f64) -> Vec<f64> {
    let mut out = Vec::with_capacity(samples.len());
    let mut prev = 0.0;
    for (i, &x) in samples.iter().enumerate() {
        if i == 0 {
            out.push(x);
        } else {
            out.push(x - alpha * prev);
        }
        prev = x;
    }
    out
}

/// Pre-emphasis coefficient for a given corner frequency.
///
/// α = exp(-2π × F × Δt)
pub fn pre_emphasis_alpha(from_hz: f64, sample_rate: f64) -> f64 {
    (-2.0 * PI * from_hz / sample_rate).exp()
}

/// Normalized sinc: sin(πx) / (πx), with sinc(0) = 1.
#[inline]
pub(crate) fn sinc(x: f64) -> f64 {
    if x.abs() < 1e-12 {
        1.0
    } else {
        let px = PI * x;
        px.sin() / px
    }
}
