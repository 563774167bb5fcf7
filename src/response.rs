//! Frequency response of the LPC all-pole filter.
//!
//! For `num_points` equally spaced indices i, the evaluator reports the
//! response at
//!
//! ```text
//! f_i = i × (sample_rate / 2) / num_points / downsample_factor
//! ```
//!
//! where `sample_rate` is the capture rate and the coefficients were estimated
//! at `sample_rate / downsample_factor`. In the decimated domain this is
//! ω_i = π i / num_points, so the response always spans DC up to (but not
//! including) the effective Nyquist frequency.
//!
//! Each point is a direct evaluation of the denominator on the unit circle:
//!
//! ```text
//! A(e^{jω}) = 1 + Σ a[k] (cos(kω) - j sin(kω))
//! |H| = 1 / |A|
//! ```
//!
//! # Sentinels
//!
//! - Degenerate (all-zero) coefficients produce an all-zero response, which
//!   callers read as "no data yet".
//! - |A| is floored at `MIN_DENOMINATOR` so no value is ever Inf or NaN.
//! - `log_values()` uses log10(v + 1) so exact zeros stay finite.

use std::f64::consts::PI;

use ndarray::Array1;

use crate::error::{Error, Result};
use crate::lpc::LpcCoefficients;

/// Floor applied to |A(e^{jω})| before inversion.
pub const MIN_DENOMINATOR: f64 = 1e-12;

/// Whether the response holds |H| or |H|².
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ResponseScale {
    /// |H(e^{jω})|
    #[default]
    Magnitude,
    /// |H(e^{jω})|²
    Power,
}

/// LPC filter response sampled on a linear frequency grid.
#[derive(Debug, Clone)]
pub struct FrequencyResponse {
    /// Response values, one per frequency point.
    values: Array1<f64>,
    /// Capture sample rate in Hz (before downsampling).
    sample_rate: f64,
    /// Factor the coefficients were estimated at (1 = none).
    downsample_factor: usize,
    /// Magnitude or power.
    scale: ResponseScale,
}

impl FrequencyResponse {
    /// Create a new FrequencyResponse.
    pub fn new(
        values: Array1<f64>,
        sample_rate: f64,
        downsample_factor: usize,
        scale: ResponseScale,
    ) -> Self {
        Self {
            values,
            sample_rate,
            downsample_factor,
            scale,
        }
    }

    /// All-zero "no data yet" response.
    pub fn silent(
        num_points: usize,
        sample_rate: f64,
        downsample_factor: usize,
        scale: ResponseScale,
    ) -> Self {
        Self::new(Array1::zeros(num_points), sample_rate, downsample_factor, scale)
    }

    /// Response values.
    #[inline]
    pub fn values(&self) -> &Array1<f64> {
        &self.values
    }

    /// Consume into a plain vector.
    pub fn into_vec(self) -> Vec<f64> {
        self.values.to_vec()
    }

    /// Number of frequency points.
    #[inline]
    pub fn num_points(&self) -> usize {
        self.values.len()
    }

    /// Capture sample rate in Hz.
    #[inline]
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Downsample factor (1 = none).
    #[inline]
    pub fn downsample_factor(&self) -> usize {
        self.downsample_factor
    }

    /// Magnitude or power.
    #[inline]
    pub fn scale(&self) -> ResponseScale {
        self.scale
    }

    /// Spacing between points in Hz.
    #[inline]
    pub fn bin_width(&self) -> f64 {
        self.sample_rate / 2.0 / self.num_points() as f64 / self.downsample_factor as f64
    }

    /// Frequency in Hz of point `index`.
    ///
    /// Fractional indices (from peak interpolation) go through
    /// `frequency_at`.
    #[inline]
    pub fn frequency(&self, index: usize) -> f64 {
        self.frequency_at(index as f64)
    }

    /// Frequency in Hz of a fractional point position.
    #[inline]
    pub fn frequency_at(&self, position: f64) -> f64 {
        position * self.bin_width()
    }

    /// Frequencies of all points.
    pub fn frequencies(&self) -> Array1<f64> {
        Array1::from_iter((0..self.num_points()).map(|i| self.frequency(i)))
    }

    /// True for the all-zero sentinel.
    pub fn is_silent(&self) -> bool {
        self.values.iter().all(|&v| v == 0.0)
    }

    /// log10(v + 1) of each value, for log-scaled display.
    pub fn log_values(&self) -> Array1<f64> {
        self.values.mapv(|v| (v + 1.0).log10())
    }

    /// Index and value of the largest point, None when silent.
    pub fn max_point(&self) -> Option<(usize, f64)> {
        if self.is_silent() {
            return None;
        }
        self.values
            .iter()
            .copied()
            .enumerate()
            .fold(None, |best: Option<(usize, f64)>, (i, v)| match best {
                Some((_, bv)) if bv >= v => best,
                _ => Some((i, v)),
            })
    }
}

/// Evaluate |A(e^{jω})| for a polynomial [1, a[1], ..., a[p]].
#[inline]
fn denominator_magnitude(coefficients: &[f64], omega: f64) -> f64 {
    let mut re = 1.0;
    let mut im = 0.0;
    for (k, &a) in coefficients.iter().enumerate() {
        let phase = (k + 1) as f64 * omega;
        re += a * phase.cos();
        im -= a * phase.sin();
    }
    (re * re + im * im).sqrt()
}

/// Compute the magnitude response of the LPC filter.
///
/// # Arguments
///
/// * `lpc` - Coefficients estimated at `sample_rate / factor`
/// * `sample_rate` - Capture sample rate in Hz
/// * `num_points` - Number of frequency points
/// * `downsample_factor` - Decimation applied before estimation (None = 1)
///
/// # Errors
///
/// `Error::InvalidParameter` for zero points, zero factor or a bad sample rate.
pub fn frequency_response(
    lpc: &LpcCoefficients,
    sample_rate: f64,
    num_points: usize,
    downsample_factor: Option<usize>,
) -> Result<FrequencyResponse> {
    frequency_response_with_scale(
        lpc,
        sample_rate,
        num_points,
        downsample_factor,
        ResponseScale::Magnitude,
    )
}

/// Compute the LPC filter response with an explicit scale.
///
/// See [`frequency_response`].
pub fn frequency_response_with_scale(
    lpc: &LpcCoefficients,
    sample_rate: f64,
    num_points: usize,
    downsample_factor: Option<usize>,
    scale: ResponseScale,
) -> Result<FrequencyResponse> {
    let factor = downsample_factor.unwrap_or(1);
    validate_sample_rate(sample_rate)?;
    if num_points == 0 {
        return Err(Error::InvalidParameter(
            "number of response points must be at least 1".to_string(),
        ));
    }
    if factor == 0 {
        return Err(Error::InvalidParameter(
            "downsample factor must be at least 1".to_string(),
        ));
    }

    if lpc.is_degenerate() {
        log::trace!("Degenerate LPC coefficients, returning silent response");
        return Ok(FrequencyResponse::silent(num_points, sample_rate, factor, scale));
    }

    let coefficients = lpc.coefficients();
    let values = Array1::from_iter((0..num_points).map(|i| {
        let omega = PI * i as f64 / num_points as f64;
        let magnitude = 1.0 / denominator_magnitude(coefficients, omega).max(MIN_DENOMINATOR);
        match scale {
            ResponseScale::Magnitude => magnitude,
            ResponseScale::Power => magnitude * magnitude,
        }
    }));

    Ok(FrequencyResponse::new(values, sample_rate, factor, scale))
}

/// Check that a sample rate is positive and finite.
pub(crate) fn validate_sample_rate(sample_rate: f64) -> Result<()> {
    if !(sample_rate.is_finite() && sample_rate > 0.0) {
        return Err(Error::InvalidParameter(format!(
            "sample rate must be positive and finite, got {}",
            sample_rate
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn resonator(r: f64, theta: f64) -> LpcCoefficients {
        LpcCoefficients::new(vec![-2.0 * r * theta.cos(), r * r], vec![0.0, 0.0], 1.0)
    }

    #[test]
    fn test_length_and_frequency_axis() {
        let lpc = resonator(0.9, 0.5);
        let resp = frequency_response(&lpc, 48_000.0, 1024, Some(4)).unwrap();
        assert_eq!(resp.num_points(), 1024);
        assert_relative_eq!(resp.frequency(0), 0.0);
        assert_relative_eq!(resp.frequency(512), 512.0 * 24_000.0 / 1024.0 / 4.0);
        assert_relative_eq!(resp.bin_width(), 24_000.0 / 1024.0 / 4.0);
        assert!(resp.values().iter().all(|v| v.is_finite() && *v >= 0.0));
    }

    #[test]
    fn test_peak_at_resonator_angle() {
        // θ = 2π × 1000 / 8000
        let theta = 2.0 * PI * 1000.0 / 8000.0;
        let lpc = resonator(0.98, theta);
        let resp = frequency_response(&lpc, 8000.0, 512, None).unwrap();
        let (idx, _) = resp.max_point().unwrap();
        assert!((resp.frequency(idx) - 1000.0).abs() <= resp.bin_width());
    }

    #[test]
    fn test_power_is_square_of_magnitude() {
        let lpc = resonator(0.9, 1.0);
        let mag = frequency_response(&lpc, 16_000.0, 64, None).unwrap();
        let pow =
            frequency_response_with_scale(&lpc, 16_000.0, 64, None, ResponseScale::Power).unwrap();
        for (m, p) in mag.values().iter().zip(pow.values().iter()) {
            assert_relative_eq!(m * m, *p, max_relative = 1e-12);
        }
        assert_eq!(pow.scale(), ResponseScale::Power);
    }

    #[test]
    fn test_degenerate_gives_zero_response() {
        let lpc = LpcCoefficients::degenerate(14);
        let resp = frequency_response(&lpc, 44_100.0, 256, Some(4)).unwrap();
        assert!(resp.is_silent());
        assert!(resp.max_point().is_none());
        assert!(resp.log_values().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_pole_on_unit_circle_stays_finite() {
        // Pole exactly at DC: A(z) = 1 - z^-1
        let lpc = LpcCoefficients::new(vec![-1.0], vec![-1.0], 0.0);
        let resp = frequency_response(&lpc, 8000.0, 16, None).unwrap();
        assert!(resp.values().iter().all(|v| v.is_finite()));
        assert_relative_eq!(resp.values()[0], 1.0 / MIN_DENOMINATOR);
    }

    #[test]
    fn test_invalid_parameters() {
        let lpc = resonator(0.9, 0.5);
        assert!(matches!(
            frequency_response(&lpc, 8000.0, 0, None),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            frequency_response(&lpc, 8000.0, 16, Some(0)),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            frequency_response(&lpc, 0.0, 16, None),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            frequency_response(&lpc, f64::NAN, 16, None),
            Err(Error::InvalidParameter(_))
        ));
    }
}
