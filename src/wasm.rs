//! WASM bindings for ezformant.
//!
//! Exposes the analysis entry points to JavaScript with wasm-bindgen, under
//! the names the visualization front end imports.
//!
//! # Usage from JavaScript
//!
//! ```javascript
//! import init, {
//!   process_audio,
//!   lpc_filter_freq_response_with_downsampling,
//!   formant_detection_with_downsampling,
//!   FormantEngine,
//! } from './pkg/ezformant.js';
//!
//! await init();
//!
//! analyser.getFloatTimeDomainData(dataArray);
//! const samples = Float64Array.from(dataArray);
//!
//! const spectrum = process_audio(dataArray);                 // Float32Array
//! const envelope = lpc_filter_freq_response_with_downsampling(
//!   samples, 16, sampleRate, 4, 1024);                        // Float64Array
//! const formants = formant_detection_with_downsampling(
//!   samples, 14, sampleRate, 4);                              // Float64Array, up to 4
//!
//! // Or with a fixed configuration
//! const engine = new FormantEngine(14, 4, 1024);
//! const f = engine.formants(samples, sampleRate);
//! ```
//!
//! # Building for WASM
//!
//! ```bash
//! wasm-pack build --target web --features wasm
//! ```

use wasm_bindgen::prelude::*;

use crate::config::EngineConfig;
use crate::engine::{self, FormantEngine as RustFormantEngine};
use crate::error::Error;
use crate::formant::MAX_FORMANTS;
use crate::spectrum;

// ============================================================================
// Initialization
// ============================================================================

/// Initialize the WASM module.
///
/// Installs the panic hook so panics show up in the browser console.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

fn to_js(err: Error) -> JsError {
    JsError::new(&err.to_string())
}

// ============================================================================
// Free functions
// ============================================================================

/// Magnitude spectrum of a raw buffer (bins 0..=n/2).
#[wasm_bindgen]
pub fn process_audio(data: &[f32]) -> Vec<f32> {
    spectrum::process_audio(data)
}

/// LPC response after decimation, on the original frequency axis.
#[wasm_bindgen]
pub fn lpc_filter_freq_response_with_downsampling(
    original_data: &[f64],
    lpc_order: usize,
    original_sample_rate: f64,
    downsample_factor: usize,
    num_points: usize,
) -> Result<Vec<f64>, JsError> {
    engine::lpc_filter_freq_response_with_downsampling(
        original_data,
        lpc_order,
        original_sample_rate,
        downsample_factor,
        num_points,
    )
    .map_err(to_js)
}

/// LPC response without decimation.
#[wasm_bindgen]
pub fn lpc_filter_freq_response(
    data: &[f64],
    lpc_order: usize,
    sample_rate: f64,
    num_points: usize,
) -> Result<Vec<f64>, JsError> {
    engine::lpc_filter_freq_response(data, lpc_order, sample_rate, num_points).map_err(to_js)
}

/// LPC response and its peak frequencies.
#[wasm_bindgen]
pub struct ResponseWithPeaks {
    inner: engine::ResponseWithPeaks,
}

#[wasm_bindgen]
impl ResponseWithPeaks {
    /// Response values as Float64Array.
    pub fn values(&self) -> Vec<f64> {
        self.inner.values.clone()
    }

    /// Peak frequencies in Hz as Float64Array.
    pub fn peak_frequencies(&self) -> Vec<f64> {
        self.inner.peak_frequencies.clone()
    }
}

#[wasm_bindgen]
pub fn lpc_filter_freq_response_with_peaks(
    data: &[f64],
    lpc_order: usize,
    sample_rate: f64,
    num_points: usize,
) -> Result<ResponseWithPeaks, JsError> {
    engine::lpc_filter_freq_response_with_peaks(data, lpc_order, sample_rate, num_points)
        .map(|inner| ResponseWithPeaks { inner })
        .map_err(to_js)
}

/// Up to four formant frequencies (empty for silence).
#[wasm_bindgen]
pub fn formant_detection(
    data: &[f64],
    lpc_order: usize,
    sample_rate: f64,
) -> Result<Vec<f64>, JsError> {
    engine::formant_detection(data, lpc_order, sample_rate).map_err(to_js)
}

/// Up to four formant frequencies after decimation.
#[wasm_bindgen]
pub fn formant_detection_with_downsampling(
    original_data: &[f64],
    lpc_order: usize,
    original_sample_rate: f64,
    downsample_factor: usize,
) -> Result<Vec<f64>, JsError> {
    engine::formant_detection_with_downsampling(
        original_data,
        lpc_order,
        original_sample_rate,
        downsample_factor,
    )
    .map_err(to_js)
}

// ============================================================================
// FormantEngine - configured analysis
// ============================================================================

/// Analysis engine with a fixed order, factor and response size.
#[wasm_bindgen]
pub struct FormantEngine {
    inner: RustFormantEngine,
}

#[wasm_bindgen]
impl FormantEngine {
    /// Create an engine.
    ///
    /// # Errors
    ///
    /// Throws if any parameter is out of range.
    #[wasm_bindgen(constructor)]
    pub fn new(
        lpc_order: usize,
        downsample_factor: usize,
        num_points: usize,
    ) -> Result<FormantEngine, JsError> {
        let config = EngineConfig::default()
            .with_lpc_order(lpc_order)
            .with_downsample_factor(downsample_factor)
            .with_num_points(num_points);
        RustFormantEngine::new(config)
            .map(|inner| FormantEngine { inner })
            .map_err(to_js)
    }

    /// Response values; all zero for silence.
    pub fn frequency_response(&self, data: &[f64], sample_rate: f64) -> Result<Vec<f64>, JsError> {
        self.inner
            .frequency_response(data, sample_rate)
            .map(|r| r.into_vec())
            .map_err(to_js)
    }

    /// Formants as four slots (F1..F4), zero where none was found.
    pub fn formants(&self, data: &[f64], sample_rate: f64) -> Result<Vec<f64>, JsError> {
        match self.inner.formants(data, sample_rate) {
            Ok(set) => Ok(set.to_padded_array().to_vec()),
            Err(Error::DegenerateInput(_)) => Ok(vec![0.0; MAX_FORMANTS]),
            Err(e) => Err(to_js(e)),
        }
    }

    /// Magnitude spectrum of a raw buffer.
    pub fn spectrum(&self, data: &[f32]) -> Vec<f32> {
        self.inner.spectrum(data)
    }
}
