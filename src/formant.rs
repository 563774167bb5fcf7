//! Formant - resonance frequencies from an LPC model.
//!
//! Two extraction strategies are provided:
//!
//! - **Pole angle** ([`extract_formants`]): roots of the LPC denominator,
//!   keeping upper-half-plane poles whose bandwidth is plausible for a vocal
//!   tract resonance.
//! - **Peak picking** ([`extract_formants_from_response`]): local maxima of
//!   an evaluated frequency response above a noise floor.
//!
//! Both report Hz on the capture time axis. For downsampled analysis the
//! pole-angle method must be given the effective rate
//! (`sample_rate / factor`); the response already carries its own frequency
//! axis.
//!
//! Root-to-formant conversion (Markel & Gray 1976), for z = r × exp(iθ):
//! - Frequency = θ × sample_rate / (2π)
//! - Bandwidth = -ln(r) × sample_rate / π

use std::cmp::Ordering;
use std::f64::consts::PI;

use crate::error::{Error, Result};
use crate::lpc::LpcCoefficients;
use crate::response::{validate_sample_rate, FrequencyResponse, ResponseScale};
use crate::roots::{fix_into_unit_circle, polynomial_roots};

/// Largest number of formants ever reported (F1..F4).
pub const MAX_FORMANTS: usize = 4;

/// A single formant candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormantPoint {
    /// Frequency in Hz.
    pub frequency: f64,
    /// Bandwidth in Hz.
    pub bandwidth: f64,
}

impl FormantPoint {
    /// Create a new FormantPoint.
    pub fn new(frequency: f64, bandwidth: f64) -> Self {
        Self {
            frequency,
            bandwidth,
        }
    }
}

/// Ordered formant frequencies for one buffer (F1 < F2 < F3 < F4).
///
/// May hold fewer than four values; never holds made-up ones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormantSet {
    frequencies: Vec<f64>,
}

impl FormantSet {
    /// Build a set from arbitrary frequencies: sorts ascending and keeps at
    /// most `MAX_FORMANTS`.
    pub fn from_frequencies(mut frequencies: Vec<f64>) -> Self {
        frequencies.retain(|f| f.is_finite());
        frequencies.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        frequencies.truncate(MAX_FORMANTS);
        Self { frequencies }
    }

    /// Empty set.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Frequencies in Hz, ascending.
    #[inline]
    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    /// Get formant n (1-based: 1 = F1).
    pub fn get(&self, n: usize) -> Option<f64> {
        if n >= 1 {
            self.frequencies.get(n - 1).copied()
        } else {
            None
        }
    }

    /// Number of formants found.
    #[inline]
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    /// True when nothing was found.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// Four slots F1..F4, zero where no formant was found.
    pub fn to_padded_array(&self) -> [f64; MAX_FORMANTS] {
        let mut out = [0.0; MAX_FORMANTS];
        for (slot, &f) in out.iter_mut().zip(&self.frequencies) {
            *slot = f;
        }
        out
    }

    /// Consume into a plain vector.
    pub fn into_vec(self) -> Vec<f64> {
        self.frequencies
    }
}

/// Which formant extraction strategy to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FormantMethod {
    /// Angles of the LPC filter poles.
    #[default]
    PoleAngle,
    /// Local maxima of the evaluated response.
    PeakPicking,
}

/// Acceptance policy for pole-angle formants.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FormantLimits {
    /// Lowest accepted frequency (default: 50 Hz).
    pub min_frequency_hz: f64,
    /// Distance kept from the Nyquist frequency (default: 50 Hz).
    pub edge_margin_hz: f64,
    /// Widest accepted bandwidth; wider poles model noise or spectral
    /// tilt rather than a resonance (default: 600 Hz).
    pub max_bandwidth_hz: f64,
    /// Candidates closer than this are merged (default: 50 Hz).
    pub min_separation_hz: f64,
    /// Formants reported, at most 4 (default: 4).
    pub max_formants: usize,
}

impl Default for FormantLimits {
    fn default() -> Self {
        Self {
            min_frequency_hz: 50.0,
            edge_margin_hz: 50.0,
            max_bandwidth_hz: 600.0,
            min_separation_hz: 50.0,
            max_formants: MAX_FORMANTS,
        }
    }
}

impl FormantLimits {
    /// Check every field is in range.
    pub fn validate(&self) -> Result<()> {
        validate_non_negative("min_frequency_hz", self.min_frequency_hz)?;
        validate_non_negative("edge_margin_hz", self.edge_margin_hz)?;
        validate_non_negative("min_separation_hz", self.min_separation_hz)?;
        if !(self.max_bandwidth_hz.is_finite() && self.max_bandwidth_hz > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "max_bandwidth_hz must be positive, got {}",
                self.max_bandwidth_hz
            )));
        }
        validate_max_formants(self.max_formants)
    }
}

/// Peak-picking policy for response-based formants.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PeakPicking {
    /// Peaks more than this many dB below the maximum are ignored
    /// (default: 40 dB).
    pub noise_floor_db: f64,
    /// Peaks closer than this keep only the higher one (default: 100 Hz).
    pub min_separation_hz: f64,
    /// Lowest accepted frequency (default: 50 Hz).
    pub min_frequency_hz: f64,
    /// Formants reported, at most 4 (default: 4).
    pub max_formants: usize,
}

impl Default for PeakPicking {
    fn default() -> Self {
        Self {
            noise_floor_db: 40.0,
            min_separation_hz: 100.0,
            min_frequency_hz: 50.0,
            max_formants: MAX_FORMANTS,
        }
    }
}

impl PeakPicking {
    /// Check every field is in range.
    pub fn validate(&self) -> Result<()> {
        validate_non_negative("noise_floor_db", self.noise_floor_db)?;
        validate_non_negative("min_separation_hz", self.min_separation_hz)?;
        validate_non_negative("min_frequency_hz", self.min_frequency_hz)?;
        validate_max_formants(self.max_formants)
    }
}

fn validate_non_negative(name: &str, value: f64) -> Result<()> {
    if !(value.is_finite() && value >= 0.0) {
        return Err(Error::InvalidParameter(format!(
            "{} must be finite and non-negative, got {}",
            name, value
        )));
    }
    Ok(())
}

fn validate_max_formants(max_formants: usize) -> Result<()> {
    if max_formants == 0 || max_formants > MAX_FORMANTS {
        return Err(Error::InvalidParameter(format!(
            "max_formants must be in 1..={}, got {}",
            MAX_FORMANTS, max_formants
        )));
    }
    Ok(())
}

/// Formant candidates (frequency and bandwidth) from the LPC poles.
///
/// # Arguments
///
/// * `lpc` - LPC coefficients
/// * `sample_rate` - Rate the coefficients were estimated at, in Hz
/// * `limits` - Acceptance policy
///
/// # Returns
///
/// Up to `limits.max_formants` points, sorted by frequency.
///
/// # Errors
///
/// - `Error::DegenerateInput` for all-zero coefficients
/// - `Error::ConvergenceFailure` if root finding hits its cap
/// - `Error::InvalidParameter` for a bad sample rate or limits
pub fn extract_formant_points(
    lpc: &LpcCoefficients,
    sample_rate: f64,
    limits: &FormantLimits,
) -> Result<Vec<FormantPoint>> {
    validate_sample_rate(sample_rate)?;
    limits.validate()?;
    lpc.check_voiced()?;

    let mut roots = polynomial_roots(&lpc.polynomial())?;
    fix_into_unit_circle(&mut roots);

    let nyquist = sample_rate / 2.0;
    let max_freq = nyquist - limits.edge_margin_hz;

    let mut candidates: Vec<FormantPoint> = roots
        .iter()
        // Upper half-plane only; the conjugates carry no extra information
        .filter(|root| root.im > 0.0)
        .filter_map(|root| {
            let r = root.norm();
            let frequency = root.arg() * sample_rate / (2.0 * PI);
            let bandwidth = if r > 0.0 {
                -r.ln() * sample_rate / PI
            } else {
                f64::INFINITY
            };

            let in_range = frequency >= limits.min_frequency_hz && frequency <= max_freq;
            if in_range && bandwidth <= limits.max_bandwidth_hz {
                Some(FormantPoint::new(frequency, bandwidth))
            } else {
                None
            }
        })
        .collect();

    candidates.sort_by(|a, b| a.frequency.partial_cmp(&b.frequency).unwrap_or(Ordering::Equal));

    // Merge near-duplicates, keeping the sharper resonance
    let mut formants: Vec<FormantPoint> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        match formants.last_mut() {
            Some(last) if candidate.frequency - last.frequency < limits.min_separation_hz => {
                if candidate.bandwidth < last.bandwidth {
                    *last = candidate;
                }
            }
            _ => formants.push(candidate),
        }
    }

    formants.truncate(limits.max_formants);

    log::trace!(
        "Pole-angle formants at {} Hz: {:?}",
        sample_rate,
        formants.iter().map(|f| f.frequency).collect::<Vec<_>>()
    );

    Ok(formants)
}

/// Formant frequencies from the LPC poles (pole-angle method).
///
/// See [`extract_formant_points`] for arguments and errors.
///
/// # Example
///
/// ```
/// use ezformant::{extract_formants, FormantLimits, LpcCoefficients};
///
/// // One resonance at 1 kHz, 8 kHz sample rate
/// let theta = 2.0 * std::f64::consts::PI * 1000.0 / 8000.0;
/// let r: f64 = 0.97;
/// let lpc = LpcCoefficients::new(vec![-2.0 * r * theta.cos(), r * r], vec![], 1.0);
///
/// let formants = extract_formants(&lpc, 8000.0, &FormantLimits::default()).unwrap();
/// assert_eq!(formants.len(), 1);
/// assert!((formants.frequencies()[0] - 1000.0).abs() < 1e-6);
/// ```
pub fn extract_formants(
    lpc: &LpcCoefficients,
    sample_rate: f64,
    limits: &FormantLimits,
) -> Result<FormantSet> {
    let points = extract_formant_points(lpc, sample_rate, limits)?;
    Ok(FormantSet::from_frequencies(
        points.into_iter().map(|p| p.frequency).collect(),
    ))
}

/// A local maximum of a frequency response.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResponsePeak {
    /// Index of the maximum point.
    pub index: usize,
    /// Interpolated frequency in Hz.
    pub frequency: f64,
    /// Response value at `index`.
    pub value: f64,
}

/// Find local maxima of a response above a noise floor.
///
/// # Algorithm
///
/// 1. Find all interior local maxima (greater than the left neighbor, not
///    smaller than the right one) above the noise floor
/// 2. Refine each peak with parabolic interpolation
/// 3. Drop peaks whose refined frequency is below `min_frequency_hz`
/// 4. Enforce the minimum separation on refined frequencies, keeping the
///    highest peak
///
/// # Returns
///
/// All surviving peaks sorted by frequency (empty for a silent response).
pub fn find_response_peaks(
    response: &FrequencyResponse,
    policy: &PeakPicking,
) -> Result<Vec<ResponsePeak>> {
    policy.validate()?;

    let values = response.values();
    let n = values.len();
    let max_value = values.iter().copied().fold(0.0f64, f64::max);
    if n < 3 || max_value <= 0.0 {
        return Ok(Vec::new());
    }

    let floor_ratio = match response.scale() {
        ResponseScale::Magnitude => 10f64.powf(-policy.noise_floor_db / 20.0),
        ResponseScale::Power => 10f64.powf(-policy.noise_floor_db / 10.0),
    };
    let threshold = max_value * floor_ratio;

    let mut peaks: Vec<ResponsePeak> = (1..n - 1)
        .filter(|&i| values[i] > values[i - 1] && values[i] >= values[i + 1])
        .filter(|&i| values[i] >= threshold)
        .map(|index| {
            let value = values[index];
            let (left, right) = (values[index - 1], values[index + 1]);
            let curvature = left - 2.0 * value + right;
            let offset = if curvature < 0.0 {
                (0.5 * (left - right) / curvature).clamp(-0.5, 0.5)
            } else {
                0.0
            };
            ResponsePeak {
                index,
                frequency: response.frequency_at(index as f64 + offset),
                value,
            }
        })
        .filter(|peak| peak.frequency >= policy.min_frequency_hz)
        .collect();

    // Highest first, so the separation pass keeps the best peaks
    peaks.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(Ordering::Equal));

    let mut kept: Vec<ResponsePeak> = Vec::with_capacity(peaks.len());
    for peak in peaks {
        let too_close = kept
            .iter()
            .any(|existing| (peak.frequency - existing.frequency).abs() < policy.min_separation_hz);
        if !too_close {
            kept.push(peak);
        }
    }
    kept.sort_by(|a, b| a.frequency.partial_cmp(&b.frequency).unwrap_or(Ordering::Equal));

    Ok(kept)
}

/// Formant frequencies from an evaluated response (peak-picking method).
///
/// # Errors
///
/// - `Error::DegenerateInput` for the all-zero response sentinel
/// - `Error::InvalidParameter` for a bad policy
pub fn extract_formants_from_response(
    response: &FrequencyResponse,
    policy: &PeakPicking,
) -> Result<FormantSet> {
    if response.is_silent() {
        return Err(Error::DegenerateInput(
            "frequency response is all zero".to_string(),
        ));
    }

    let peaks = find_response_peaks(response, policy)?;
    let mut frequencies: Vec<f64> = peaks.into_iter().map(|p| p.frequency).collect();
    frequencies.truncate(policy.max_formants);
    Ok(FormantSet::from_frequencies(frequencies))
}
