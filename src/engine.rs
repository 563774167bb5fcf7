//! Engine - the full pipeline from an audio buffer to formants.
//!
//! ```text
//! buffer ─▶ downsample ─▶ (pre-emphasis) ─▶ estimate_lpc ─┬─▶ frequency_response ─▶ peaks
//!                                                          └─▶ pole-angle formants
//! ```
//!
//! [`FormantEngine`] holds a validated [`EngineConfig`] and nothing else; it
//! is `Send + Sync` and every call is independent.
//!
//! The free functions mirror the browser-facing entry points. They take the
//! per-call scalars directly and turn silent input into the display
//! sentinels (an all-zero response, an empty formant list) instead of an
//! error.

use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::formant::{
    extract_formants, extract_formants_from_response, find_response_peaks, FormantLimits,
    FormantMethod, FormantSet, PeakPicking, ResponsePeak,
};
use crate::lpc::{estimate_lpc, LpcCoefficients};
use crate::resample::downsample;
use crate::response::{
    frequency_response, frequency_response_with_scale, validate_sample_rate, FrequencyResponse,
};
use crate::spectrum;
use crate::window::{pre_emphasis_alpha, pre_emphasize};

/// Everything derived from one LPC estimate of a buffer.
#[derive(Debug, Clone)]
pub struct FrameAnalysis {
    /// LPC model (at the effective sample rate).
    pub lpc: LpcCoefficients,
    /// Filter response on the capture frequency axis.
    pub response: FrequencyResponse,
    /// Formants from the configured method; empty for a silent frame.
    pub formants: FormantSet,
    /// Local maxima of `response`.
    pub peaks: Vec<ResponsePeak>,
}

impl FrameAnalysis {
    /// True when the buffer had no energy.
    pub fn is_silent(&self) -> bool {
        self.lpc.is_degenerate()
    }
}

/// A response together with the frequencies of its peaks.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseWithPeaks {
    /// Response values.
    pub values: Vec<f64>,
    /// Peak frequencies in Hz, ascending.
    pub peak_frequencies: Vec<f64>,
}

/// Formant analysis engine with a fixed configuration.
///
/// # Example
///
/// ```
/// use ezformant::{EngineConfig, FormantEngine};
///
/// let engine = FormantEngine::new(EngineConfig::default()).unwrap();
/// let silence = vec![0.0; 2048];
///
/// let response = engine.frequency_response(&silence, 44_100.0).unwrap();
/// assert!(response.is_silent());
/// assert!(engine.formants(&silence, 44_100.0).unwrap_err().is_degenerate());
/// ```
#[derive(Debug, Clone)]
pub struct FormantEngine {
    config: EngineConfig,
}

impl FormantEngine {
    /// Create an engine, validating the configuration once.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        log::debug!(
            "FormantEngine: order {}, factor {}, {} points, {:?}",
            config.lpc_order,
            config.downsample_factor,
            config.num_points,
            config.method
        );
        Ok(Self { config })
    }

    /// The engine's configuration.
    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Rate the LPC model is estimated at.
    #[inline]
    pub fn effective_sample_rate(&self, sample_rate: f64) -> f64 {
        sample_rate / self.config.downsample_factor as f64
    }

    /// Decimate and pre-emphasize a buffer as configured.
    fn prepare(&self, buffer: &[f64], sample_rate: f64) -> Result<Vec<f64>> {
        validate_sample_rate(sample_rate)?;

        let factor = self.config.downsample_factor;
        let mut samples = if factor > 1 {
            downsample(buffer, factor)?
        } else {
            buffer.to_vec()
        };

        if let Some(from_hz) = self.config.pre_emphasis_hz {
            let alpha = pre_emphasis_alpha(from_hz, self.effective_sample_rate(sample_rate));
            samples = pre_emphasize(&samples, alpha);
        }

        Ok(samples)
    }

    /// LPC coefficients of a buffer at the effective sample rate.
    pub fn lpc(&self, buffer: &[f64], sample_rate: f64) -> Result<LpcCoefficients> {
        let samples = self.prepare(buffer, sample_rate)?;
        estimate_lpc(&samples, self.config.lpc_order)
    }

    fn response_of(&self, lpc: &LpcCoefficients, sample_rate: f64) -> Result<FrequencyResponse> {
        frequency_response_with_scale(
            lpc,
            sample_rate,
            self.config.num_points,
            Some(self.config.downsample_factor),
            self.config.scale,
        )
    }

    /// Formants by the configured method; the response is computed here
    /// if the caller has none.
    fn formants_of(
        &self,
        lpc: &LpcCoefficients,
        sample_rate: f64,
        response: Option<&FrequencyResponse>,
    ) -> Result<FormantSet> {
        match (self.config.method, response) {
            (FormantMethod::PoleAngle, _) => extract_formants(
                lpc,
                self.effective_sample_rate(sample_rate),
                &self.config.limits,
            ),
            (FormantMethod::PeakPicking, Some(response)) => {
                extract_formants_from_response(response, &self.config.peak_picking)
            }
            (FormantMethod::PeakPicking, None) => {
                let response = self.response_of(lpc, sample_rate)?;
                extract_formants_from_response(&response, &self.config.peak_picking)
            }
        }
    }

    /// LPC filter response of a buffer on the capture frequency axis.
    ///
    /// A silent buffer gives the all-zero response.
    pub fn frequency_response(&self, buffer: &[f64], sample_rate: f64) -> Result<FrequencyResponse> {
        let lpc = self.lpc(buffer, sample_rate)?;
        self.response_of(&lpc, sample_rate)
    }

    /// Formants of a buffer using the configured method.
    ///
    /// # Errors
    ///
    /// `Error::DegenerateInput` for a silent buffer, plus anything the LPC
    /// or root-finding stages report.
    pub fn formants(&self, buffer: &[f64], sample_rate: f64) -> Result<FormantSet> {
        let lpc = self.lpc(buffer, sample_rate)?;
        self.formants_of(&lpc, sample_rate, None)
    }

    /// Response, peaks and formants from a single LPC estimate.
    ///
    /// A silent buffer is not an error here: the frame comes back with the
    /// zero response and no formants.
    pub fn analyze(&self, buffer: &[f64], sample_rate: f64) -> Result<FrameAnalysis> {
        let lpc = self.lpc(buffer, sample_rate)?;
        let response = self.response_of(&lpc, sample_rate)?;
        let peaks = find_response_peaks(&response, &self.config.peak_picking)?;
        let formants = match self.formants_of(&lpc, sample_rate, Some(&response)) {
            Err(Error::DegenerateInput(_)) => FormantSet::empty(),
            other => other?,
        };

        log::trace!(
            "Frame of {} samples: {} peaks, formants {:?}",
            buffer.len(),
            peaks.len(),
            formants.frequencies()
        );

        Ok(FrameAnalysis {
            lpc,
            response,
            formants,
            peaks,
        })
    }

    /// Raw magnitude spectrum, for drawing under the LPC envelope.
    pub fn spectrum(&self, buffer: &[f32]) -> Vec<f32> {
        spectrum::process_audio(buffer)
    }
}

/// Replace `DegenerateInput` with a display sentinel.
fn or_sentinel<T>(result: Result<T>, sentinel: impl FnOnce() -> T) -> Result<T> {
    match result {
        Err(Error::DegenerateInput(reason)) => {
            log::trace!("Degenerate input ({}), returning sentinel", reason);
            Ok(sentinel())
        }
        other => other,
    }
}

fn decimated_lpc(buffer: &[f64], order: usize, factor: usize) -> Result<LpcCoefficients> {
    if factor == 0 {
        return Err(Error::InvalidParameter(
            "downsample factor must be at least 1".to_string(),
        ));
    }
    if factor == 1 {
        return estimate_lpc(buffer, order);
    }
    estimate_lpc(&downsample(buffer, factor)?, order)
}

/// LPC magnitude response of a buffer.
///
/// # Arguments
///
/// * `buffer` - Audio samples
/// * `order` - LPC order
/// * `sample_rate` - Sample rate in Hz
/// * `num_points` - Number of response points
///
/// # Returns
///
/// `num_points` magnitudes from DC up to Nyquist; all zero for silence.
pub fn lpc_filter_freq_response(
    buffer: &[f64],
    order: usize,
    sample_rate: f64,
    num_points: usize,
) -> Result<Vec<f64>> {
    let result = estimate_lpc(buffer, order)
        .and_then(|lpc| frequency_response(&lpc, sample_rate, num_points, None));
    or_sentinel(result.map(FrequencyResponse::into_vec), || vec![0.0; num_points])
}

/// LPC magnitude response after decimating by `factor`.
///
/// Point i sits at `i × (sample_rate / 2) / num_points / factor` Hz, so the
/// whole response covers DC up to the decimated Nyquist frequency.
pub fn lpc_filter_freq_response_with_downsampling(
    buffer: &[f64],
    order: usize,
    sample_rate: f64,
    factor: usize,
    num_points: usize,
) -> Result<Vec<f64>> {
    let result = decimated_lpc(buffer, order, factor)
        .and_then(|lpc| frequency_response(&lpc, sample_rate, num_points, Some(factor)));
    or_sentinel(result.map(FrequencyResponse::into_vec), || vec![0.0; num_points])
}

/// LPC magnitude response together with the frequencies of its peaks.
pub fn lpc_filter_freq_response_with_peaks(
    buffer: &[f64],
    order: usize,
    sample_rate: f64,
    num_points: usize,
) -> Result<ResponseWithPeaks> {
    let result = estimate_lpc(buffer, order)
        .and_then(|lpc| frequency_response(&lpc, sample_rate, num_points, None))
        .and_then(|response| {
            let peaks = find_response_peaks(&response, &PeakPicking::default())?;
            Ok(ResponseWithPeaks {
                peak_frequencies: peaks.iter().map(|p| p.frequency).collect(),
                values: response.into_vec(),
            })
        });
    or_sentinel(result, || ResponseWithPeaks {
        values: vec![0.0; num_points],
        peak_frequencies: Vec::new(),
    })
}

/// Up to four formant frequencies of a buffer (pole-angle method).
///
/// Empty for silence.
pub fn formant_detection(buffer: &[f64], order: usize, sample_rate: f64) -> Result<Vec<f64>> {
    let result = estimate_lpc(buffer, order)
        .and_then(|lpc| extract_formants(&lpc, sample_rate, &FormantLimits::default()));
    or_sentinel(result.map(FormantSet::into_vec), Vec::new)
}

/// Up to four formant frequencies after decimating by `factor`.
///
/// Frequencies are in Hz of the original signal.
pub fn formant_detection_with_downsampling(
    buffer: &[f64],
    order: usize,
    sample_rate: f64,
    factor: usize,
) -> Result<Vec<f64>> {
    validate_sample_rate(sample_rate)?;
    let result = decimated_lpc(buffer, order, factor).and_then(|lpc| {
        extract_formants(&lpc, sample_rate / factor as f64, &FormantLimits::default())
    });
    or_sentinel(result.map(FormantSet::into_vec), Vec::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::f64::consts::PI;

    fn vowel(sample_rate: f64, n: usize, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|i| {
                let t = i as f64 / sample_rate;
                (2.0 * PI * 700.0 * t).sin()
                    + 0.6 * (2.0 * PI * 1200.0 * t).sin()
                    + 0.05 * rng.gen_range(-1.0..1.0)
            })
            .collect()
    }

    #[test]
    fn test_engine_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FormantEngine>();
    }

    #[test]
    fn test_new_rejects_bad_config() {
        let config = EngineConfig::default().with_num_points(0);
        assert!(matches!(
            FormantEngine::new(config),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_analyze_consistent_with_parts() {
        let engine = FormantEngine::new(EngineConfig::default()).unwrap();
        let buffer = vowel(44_100.0, 2048, 7);

        let frame = engine.analyze(&buffer, 44_100.0).unwrap();
        assert!(!frame.is_silent());
        assert_eq!(frame.response.num_points(), 1024);
        assert_eq!(frame.response.values(), engine.frequency_response(&buffer, 44_100.0).unwrap().values());
        assert_eq!(frame.formants, engine.formants(&buffer, 44_100.0).unwrap());
        assert_eq!(frame.lpc, engine.lpc(&buffer, 44_100.0).unwrap());
    }

    #[test]
    fn test_analyze_silence() {
        let engine = FormantEngine::new(EngineConfig::default()).unwrap();
        let frame = engine.analyze(&[0.0; 2048], 48_000.0).unwrap();
        assert!(frame.is_silent());
        assert!(frame.response.is_silent());
        assert!(frame.formants.is_empty());
        assert!(frame.peaks.is_empty());
    }

    #[test]
    fn test_peak_picking_method() {
        let config = EngineConfig::default().with_method(FormantMethod::PeakPicking);
        let engine = FormantEngine::new(config).unwrap();
        let formants = engine.formants(&vowel(44_100.0, 2048, 3), 44_100.0).unwrap();
        assert!(formants.len() <= 4);
        assert!(formants.frequencies().windows(2).all(|w| w[0] <= w[1]));
        assert!(formants.frequencies().iter().all(|&f| f > 0.0 && f < 44_100.0 / 8.0));
    }

    #[test]
    fn test_pre_emphasis_changes_model() {
        let buffer = vowel(16_000.0, 1024, 11);
        let plain = FormantEngine::new(EngineConfig::default().with_downsample_factor(1)).unwrap();
        let emphasized = FormantEngine::new(
            EngineConfig::default()
                .with_downsample_factor(1)
                .with_pre_emphasis(Some(50.0)),
        )
        .unwrap();
        assert_ne!(
            plain.lpc(&buffer, 16_000.0).unwrap(),
            emphasized.lpc(&buffer, 16_000.0).unwrap()
        );
    }

    #[test]
    fn test_free_functions_silence_sentinels() {
        let silence = vec![0.0; 1024];
        assert_eq!(
            lpc_filter_freq_response(&silence, 14, 44_100.0, 256).unwrap(),
            vec![0.0; 256]
        );
        assert_eq!(
            lpc_filter_freq_response_with_downsampling(&silence, 14, 44_100.0, 4, 256).unwrap(),
            vec![0.0; 256]
        );
        let with_peaks = lpc_filter_freq_response_with_peaks(&silence, 14, 44_100.0, 256).unwrap();
        assert_eq!(with_peaks.values, vec![0.0; 256]);
        assert!(with_peaks.peak_frequencies.is_empty());
        assert!(formant_detection(&silence, 14, 44_100.0).unwrap().is_empty());
        assert!(formant_detection_with_downsampling(&silence, 14, 44_100.0, 4)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_free_functions_propagate_invalid_parameters() {
        let buffer = vowel(8000.0, 256, 1);
        assert!(matches!(
            lpc_filter_freq_response(&buffer, 0, 8000.0, 64),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            lpc_filter_freq_response_with_downsampling(&buffer, 8, 8000.0, 0, 64),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            formant_detection_with_downsampling(&buffer, 8, 8000.0, 0),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            lpc_filter_freq_response_with_peaks(&buffer, 8, 8000.0, 0),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_peaks_match_response() {
        let buffer = vowel(16_000.0, 1024, 5);
        let out = lpc_filter_freq_response_with_peaks(&buffer, 10, 16_000.0, 512).unwrap();
        assert_eq!(out.values.len(), 512);
        assert!(!out.peak_frequencies.is_empty());
        assert!(out.peak_frequencies.windows(2).all(|w| w[0] < w[1]));
        assert!(out.peak_frequencies.iter().all(|&f| f > 0.0 && f < 8000.0));
    }
}
