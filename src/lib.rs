//! # ezformant
//!
//! Real-time formant extraction from short audio buffers with Linear
//! Predictive Coding (LPC), for speech and phonetics visualization.
//!
//! # Pipeline
//!
//! - **Resample**: optional integer decimation with an anti-alias FIR, so the
//!   LPC model spends its poles below ~5 kHz where formants live
//! - **LPC**: Hamming window, autocorrelation, Levinson-Durbin
//! - **Response**: |H(e^{jω})| of the all-pole filter on a linear grid
//! - **Formant**: pole angles of the filter, or peaks of its response
//! - **Spectrum**: raw FFT magnitudes to draw under the LPC envelope
//!
//! Every stage is a pure function of its inputs. [`FormantEngine`] bundles a
//! validated [`EngineConfig`] for callers that analyze many frames with the
//! same settings.
//!
//! # Quick Start
//!
//! ```
//! use ezformant::{EngineConfig, FormantEngine};
//!
//! let sample_rate = 44_100.0;
//! let buffer: Vec<f64> = (0..2048)
//!     .map(|i| {
//!         let t = i as f64 / sample_rate;
//!         (2.0 * std::f64::consts::PI * 700.0 * t).sin()
//!             + 0.5 * (2.0 * std::f64::consts::PI * 1200.0 * t).sin()
//!             + 0.01 * ((i * 7919 % 101) as f64 / 101.0 - 0.5)
//!     })
//!     .collect();
//!
//! // Order 14, decimate by 4, 1024 response points
//! let engine = FormantEngine::new(EngineConfig::default()).unwrap();
//! let frame = engine.analyze(&buffer, sample_rate).unwrap();
//!
//! assert_eq!(frame.response.num_points(), 1024);
//! assert!(frame.formants.len() <= 4);
//! ```
//!
//! # Silence
//!
//! A buffer with no energy is not an error for the LPC and response stages:
//! it yields degenerate coefficients and an all-zero response. Formant
//! extraction reports it as [`Error::DegenerateInput`]. The free functions in
//! [`engine`] turn that into an empty list, which is what a live display
//! wants.
//!
//! # Logging
//!
//! The crate logs through the `log` facade and never installs a logger.

// Module declarations
pub mod config;
pub mod engine;
pub mod error;
pub mod formant;
pub mod lpc;
pub mod resample;
pub mod response;
pub mod roots;
pub mod spectrum;
pub mod window;

// WASM bindings (enabled with "wasm" feature)
#[cfg(feature = "wasm")]
pub mod wasm;

/// Error types for ezformant operations.
pub use error::{Error, Result};

/// Engine configuration.
pub use config::EngineConfig;

/// Full pipeline and browser-facing entry points.
///
/// - `FormantEngine`: configured analysis of many frames
/// - `FrameAnalysis`: response, peaks and formants of one frame
/// - `lpc_filter_freq_response*`, `formant_detection*`: one-shot functions
pub use engine::{
    formant_detection, formant_detection_with_downsampling, lpc_filter_freq_response,
    lpc_filter_freq_response_with_downsampling, lpc_filter_freq_response_with_peaks,
    FormantEngine, FrameAnalysis, ResponseWithPeaks,
};

/// Formant extraction.
pub use formant::{
    extract_formant_points, extract_formants, extract_formants_from_response,
    find_response_peaks, FormantLimits, FormantMethod, FormantPoint, FormantSet, PeakPicking,
    ResponsePeak, MAX_FORMANTS,
};

/// LPC estimation.
pub use lpc::{autocorrelation, estimate_lpc, levinson_durbin, LpcCoefficients};

/// Decimation.
pub use resample::{downsample, lowpass_taps};

/// LPC filter response.
pub use response::{frequency_response, frequency_response_with_scale, FrequencyResponse, ResponseScale};

/// Raw FFT magnitudes.
pub use spectrum::{process_audio, sound_to_spectrum, Spectrum};
