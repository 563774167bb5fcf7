//! Spectrum - Single-frame FFT magnitude spectrum.
//!
//! The visualization sibling of the LPC path: a plain DFT of the raw buffer,
//! drawn under the smooth LPC envelope.
//!
//! # Scaling
//!
//! Magnitudes are the unscaled DFT, |X[k]| with
//!
//! ```text
//! X[k] = Σₙ x[n] × e^(-2πikn/N)
//! ```
//!
//! No window is applied and no 1/N or dt factor is used. Only bins
//! `0..=N/2` are kept; for real input the rest are conjugate mirrors.

use ndarray::Array1;
use rustfft::{num_complex::Complex, FftPlanner};

use crate::error::Result;
use crate::response::validate_sample_rate;

/// Single-frame FFT magnitude spectrum.
///
/// # Frequency Indexing
///
/// - Bin 0: DC component (0 Hz)
/// - Bin k: frequency = k × df Hz
/// - Bin N/2: Nyquist frequency (sample_rate / 2)
///
/// where df = sample_rate / N.
#[derive(Debug, Clone)]
pub struct Spectrum {
    /// |X[k]| for k = 0..=N/2.
    magnitudes: Array1<f64>,
    /// Frequency resolution (bin width) in Hz.
    df: f64,
    /// Maximum frequency (Nyquist) in Hz.
    f_max: f64,
}

impl Spectrum {
    /// Create a new Spectrum.
    ///
    /// # Arguments
    ///
    /// * `magnitudes` - Magnitude of each bin
    /// * `df` - Frequency resolution in Hz
    /// * `f_max` - Maximum frequency in Hz
    pub fn new(magnitudes: Array1<f64>, df: f64, f_max: f64) -> Self {
        Self {
            magnitudes,
            df,
            f_max,
        }
    }

    /// Magnitude of each bin.
    #[inline]
    pub fn magnitudes(&self) -> &Array1<f64> {
        &self.magnitudes
    }

    /// Frequency resolution (bin width) in Hz.
    #[inline]
    pub fn df(&self) -> f64 {
        self.df
    }

    /// Maximum frequency (Nyquist) in Hz.
    #[inline]
    pub fn f_max(&self) -> f64 {
        self.f_max
    }

    /// Number of frequency bins (N/2 + 1).
    #[inline]
    pub fn n_bins(&self) -> usize {
        self.magnitudes.len()
    }

    /// Frequency for a bin index.
    #[inline]
    pub fn get_frequency(&self, bin_index: usize) -> f64 {
        bin_index as f64 * self.df
    }

    /// Frequency of the strongest bin, skipping DC.
    ///
    /// None if there is no non-DC bin or every one is zero.
    pub fn peak_frequency(&self) -> Option<f64> {
        self.magnitudes
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, &m)| m > 0.0)
            .fold(None, |best: Option<(usize, f64)>, (i, &m)| match best {
                Some((_, bm)) if bm >= m => best,
                _ => Some((i, m)),
            })
            .map(|(i, _)| self.get_frequency(i))
    }

    /// log10(m + 1) of each magnitude, for log-scaled display.
    pub fn log_magnitudes(&self) -> Array1<f64> {
        self.magnitudes.mapv(|m| (m + 1.0).log10())
    }
}

/// Unscaled DFT magnitudes of bins 0..=N/2.
fn dft_magnitudes(samples: impl Iterator<Item = f64>, n: usize) -> Vec<f64> {
    let mut buffer: Vec<Complex<f64>> = samples.map(|s| Complex::new(s, 0.0)).collect();

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(n);
    fft.process(&mut buffer);

    buffer[..n / 2 + 1].iter().map(|c| c.norm()).collect()
}

/// Magnitude spectrum of a raw buffer.
///
/// # Arguments
///
/// * `buffer` - Audio samples (not windowed)
///
/// # Returns
///
/// `buffer.len() / 2 + 1` magnitudes; empty for empty input.
///
/// # Example
///
/// ```
/// use ezformant::process_audio;
///
/// let dc = vec![1.0f32; 8];
/// let mags = process_audio(&dc);
/// assert_eq!(mags.len(), 5);
/// assert!((mags[0] - 8.0).abs() < 1e-5);
/// ```
pub fn process_audio(buffer: &[f32]) -> Vec<f32> {
    let n = buffer.len();
    if n == 0 {
        return Vec::new();
    }

    dft_magnitudes(buffer.iter().map(|&s| s as f64), n)
        .into_iter()
        .map(|m| m as f32)
        .collect()
}

/// Compute the magnitude spectrum of a buffer with its frequency axis.
///
/// # Errors
///
/// `Error::InvalidParameter` if the sample rate is not positive and finite.
pub fn sound_to_spectrum(buffer: &[f64], sample_rate: f64) -> Result<Spectrum> {
    validate_sample_rate(sample_rate)?;

    let n = buffer.len();
    let f_max = sample_rate / 2.0;
    if n == 0 {
        return Ok(Spectrum::new(Array1::zeros(0), 0.0, f_max));
    }

    let magnitudes = dft_magnitudes(buffer.iter().copied(), n);
    Ok(Spectrum::new(
        Array1::from_vec(magnitudes),
        sample_rate / n as f64,
        f_max,
    ))
}
