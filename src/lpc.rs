//! LPC - Linear predictive coding by the autocorrelation method.
//!
//! Models a buffer as the output of an all-pole filter
//!
//! ```text
//! H(z) = 1 / (1 + a[1] z^-1 + a[2] z^-2 + ... + a[p] z^-p)
//! ```
//!
//! driven by a flat-spectrum excitation. The poles of H approximate the
//! vocal-tract resonances.
//!
//! # Algorithm
//!
//! 1. Hamming window (fixed; reduces spectral leakage)
//! 2. Biased autocorrelation r[0..=p], O(n × p)
//! 3. White-noise correction: r[0] × (1 + 1e-9)
//! 4. Levinson-Durbin recursion, O(p²)
//!
//! The biased estimate makes the Toeplitz matrix positive semi-definite, and
//! the white-noise correction makes it definite, so the recursion is stable
//! in exact arithmetic. A reflection coefficient with |k| >= 1 can still come
//! from rounding, and is reported as `Error::UnstableFilter` (never clamped).

use crate::error::{Error, Result};
use crate::window::{apply_window, hamming_window};

/// Lag-0 autocorrelation at or below this is treated as silence.
pub const SILENCE_ENERGY: f64 = 1e-12;

/// Relative white-noise correction added to r[0].
pub const WHITE_NOISE_CORRECTION: f64 = 1e-9;

/// LPC analysis result for one buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct LpcCoefficients {
    /// a[1..=p] (no leading 1.0).
    coefficients: Vec<f64>,
    /// Reflection (PARCOR) coefficients k[1..=p].
    reflection: Vec<f64>,
    /// Residual prediction error energy.
    error_energy: f64,
    /// Input had no energy; coefficients are all zero.
    degenerate: bool,
}

impl LpcCoefficients {
    /// Create a new LpcCoefficients value.
    pub fn new(coefficients: Vec<f64>, reflection: Vec<f64>, error_energy: f64) -> Self {
        Self {
            coefficients,
            reflection,
            error_energy,
            degenerate: false,
        }
    }

    /// Zeroed result for a silent buffer.
    pub fn degenerate(order: usize) -> Self {
        Self {
            coefficients: vec![0.0; order],
            reflection: vec![0.0; order],
            error_energy: 0.0,
            degenerate: true,
        }
    }

    /// Predictor coefficients a[1..=p].
    #[inline]
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Reflection coefficients k[1..=p].
    #[inline]
    pub fn reflection(&self) -> &[f64] {
        &self.reflection
    }

    /// Residual prediction error energy.
    #[inline]
    pub fn error_energy(&self) -> f64 {
        self.error_energy
    }

    /// LPC order p.
    #[inline]
    pub fn order(&self) -> usize {
        self.coefficients.len()
    }

    /// True when the input was silent, or every coefficient is zero.
    pub fn is_degenerate(&self) -> bool {
        self.degenerate || self.coefficients.iter().all(|&a| a == 0.0)
    }

    /// Denominator polynomial [1, a[1], ..., a[p]].
    pub fn polynomial(&self) -> Vec<f64> {
        let mut poly = Vec::with_capacity(self.coefficients.len() + 1);
        poly.push(1.0);
        poly.extend_from_slice(&self.coefficients);
        poly
    }

    /// `Err(DegenerateInput)` when there is no usable filter.
    pub fn check_voiced(&self) -> Result<&Self> {
        if self.is_degenerate() {
            Err(Error::DegenerateInput(
                "LPC coefficients are all zero (silent buffer)".to_string(),
            ))
        } else {
            Ok(self)
        }
    }
}

/// Biased autocorrelation r[k] = Σ x[i] × x[i + k] for k = 0..=max_lag.
///
/// Lags beyond the signal length are zero.
pub fn autocorrelation(samples: &[f64], max_lag: usize) -> Vec<f64> {
    let n = samples.len();
    (0..=max_lag)
        .map(|lag| {
            if lag >= n {
                return 0.0;
            }
            samples[..n - lag]
                .iter()
                .zip(&samples[lag..])
                .map(|(a, b)| a * b)
                .sum()
        })
        .collect()
}

/// Solve the Toeplitz normal equations with the Levinson-Durbin recursion.
///
/// # Arguments
///
/// * `r` - Autocorrelation r[0..=order]
/// * `order` - Number of predictor coefficients
///
/// # Returns
///
/// Coefficients with the sign convention A(z) = 1 + Σ a[k] z^-k. If r[0] is
/// at or below `SILENCE_ENERGY`, a degenerate (all-zero) result.
///
/// # Errors
///
/// - `Error::InvalidParameter` if `order == 0` or `r.len() < order + 1`
/// - `Error::UnstableFilter` if a reflection coefficient reaches |k| >= 1
pub fn levinson_durbin(r: &[f64], order: usize) -> Result<LpcCoefficients> {
    if order == 0 {
        return Err(Error::InvalidParameter("LPC order must be at least 1".to_string()));
    }
    if r.len() < order + 1 {
        return Err(Error::InvalidParameter(format!(
            "need {} autocorrelation lags for order {}, got {}",
            order + 1,
            order,
            r.len()
        )));
    }
    if !(r[0] > SILENCE_ENERGY) {
        return Ok(LpcCoefficients::degenerate(order));
    }

    // a[0] is the implicit leading 1.0
    let mut a = vec![0.0; order + 1];
    a[0] = 1.0;
    let mut prev = vec![0.0; order + 1];
    let mut reflection = Vec::with_capacity(order);
    let mut energy = r[0];

    for i in 1..=order {
        let mut acc = r[i];
        for j in 1..i {
            acc += a[j] * r[i - j];
        }
        let k = -acc / energy;

        if !k.is_finite() || k.abs() >= 1.0 {
            log::warn!("Levinson-Durbin unstable at step {}: k = {}", i, k);
            return Err(Error::UnstableFilter { step: i, reflection: k });
        }

        prev[..i].copy_from_slice(&a[..i]);
        for j in 1..i {
            a[j] = prev[j] + k * prev[i - j];
        }
        a[i] = k;

        energy *= 1.0 - k * k;
        reflection.push(k);
    }

    Ok(LpcCoefficients::new(a[1..].to_vec(), reflection, energy))
}

/// Estimate LPC coefficients of a buffer.
///
/// Applies a Hamming window, computes the biased autocorrelation and runs
/// Levinson-Durbin. The buffer itself is never modified.
///
/// # Arguments
///
/// * `buffer` - Audio samples, nominally in [-1, 1]
/// * `order` - LPC order (typically 8-20), must be < buffer length
///
/// # Errors
///
/// - `Error::InvalidParameter` for order 0, order >= length, or non-finite samples
/// - `Error::UnstableFilter` if the recursion becomes unstable
///
/// A silent buffer is not an error: it yields `LpcCoefficients::is_degenerate()`.
///
/// # Example
///
/// ```
/// use ezformant::estimate_lpc;
///
/// let silence = vec![0.0; 512];
/// let lpc = estimate_lpc(&silence, 14).unwrap();
/// assert!(lpc.is_degenerate());
/// assert_eq!(lpc.error_energy(), 0.0);
/// ```
pub fn estimate_lpc(buffer: &[f64], order: usize) -> Result<LpcCoefficients> {
    validate_order(order, buffer.len())?;
    if buffer.iter().any(|v| !v.is_finite()) {
        return Err(Error::InvalidParameter(
            "buffer contains non-finite samples".to_string(),
        ));
    }

    let windowed = apply_window(buffer, &hamming_window(buffer.len()));
    let mut r = autocorrelation(&windowed, order);
    r[0] *= 1.0 + WHITE_NOISE_CORRECTION;

    let lpc = levinson_durbin(&r, order)?;
    log::trace!(
        "LPC order {} over {} samples: r0 = {:.3e}, error = {:.3e}, degenerate = {}",
        order,
        buffer.len(),
        r[0],
        lpc.error_energy(),
        lpc.is_degenerate()
    );
    Ok(lpc)
}

/// Check 1 <= order < buffer_len.
pub(crate) fn validate_order(order: usize, buffer_len: usize) -> Result<()> {
    if order == 0 {
        return Err(Error::InvalidParameter("LPC order must be at least 1".to_string()));
    }
    if order >= buffer_len {
        return Err(Error::InvalidParameter(format!(
            "LPC order {} must be smaller than buffer length {}",
            order, buffer_len
        )));
    }
    Ok(())
}
