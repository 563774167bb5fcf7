//! Integer-factor decimation with anti-alias filtering.
//!
//! Formants live below ~5 kHz, while capture rates are 44.1 or 48 kHz. An
//! LPC model of a given order spends its poles over the whole band, so
//! decimating first concentrates the model's resolution where formants are.
//!
//! Decimation is a low-pass FIR followed by keeping every `factor`-th
//! sample. Skipping samples without the low-pass would fold energy above
//! the new Nyquist frequency back into the formant range.
//!
//! # Filter
//!
//! - Hamming-windowed sinc, `8 × factor + 1` taps
//! - Cutoff at 0.9 × the new Nyquist (0.45 / factor cycles per sample)
//! - Normalized to unity gain at DC
//! - Applied centered (zero-phase), zero padding at the buffer edges

use crate::error::{Error, Result};
use crate::window::{hamming_window, sinc};

/// Taps per unit of decimation factor (the filter has `TAPS_PER_FACTOR × factor + 1` taps).
const TAPS_PER_FACTOR: usize = 8;

/// Cutoff as a fraction of the decimated Nyquist frequency.
const CUTOFF_RATIO: f64 = 0.9;

/// Anti-alias low-pass taps for decimation by `factor`.
///
/// Returns `[1.0]` for `factor <= 1`.
pub fn lowpass_taps(factor: usize) -> Vec<f64> {
    if factor <= 1 {
        return vec![1.0];
    }

    let n_taps = TAPS_PER_FACTOR * factor + 1;
    let half = (n_taps / 2) as f64;
    // Cutoff in cycles per input sample
    let fc = CUTOFF_RATIO * 0.5 / factor as f64;
    let window = hamming_window(n_taps);

    let mut taps: Vec<f64> = (0..n_taps)
        .map(|i| {
            let t = i as f64 - half;
            2.0 * fc * sinc(2.0 * fc * t) * window[i]
        })
        .collect();

    let sum: f64 = taps.iter().sum();
    if sum.abs() > f64::EPSILON {
        for tap in taps.iter_mut() {
            *tap /= sum;
        }
    }

    taps
}

/// Downsample `buffer` by an integer `factor`.
///
/// # Arguments
///
/// * `buffer` - Input samples (never modified)
/// * `factor` - Decimation factor; 1 returns a copy
///
/// # Returns
///
/// `floor(buffer.len() / factor)` samples at `sample_rate / factor`.
///
/// # Errors
///
/// `Error::InvalidParameter` if `factor == 0` or `factor >= buffer.len()`.
pub fn downsample(buffer: &[f64], factor: usize) -> Result<Vec<f64>> {
    if factor == 0 {
        return Err(Error::InvalidParameter(
            "downsample factor must be at least 1".to_string(),
        ));
    }
    if factor >= buffer.len() {
        return Err(Error::InvalidParameter(format!(
            "downsample factor {} must be smaller than buffer length {}",
            factor,
            buffer.len()
        )));
    }
    if factor == 1 {
        return Ok(buffer.to_vec());
    }

    let taps = lowpass_taps(factor);
    let half = taps.len() / 2;
    let n = buffer.len();
    let out_len = n / factor;

    log::trace!(
        "Downsampling {} samples by {} ({} taps) -> {} samples",
        n,
        factor,
        taps.len(),
        out_len
    );

    let output = (0..out_len)
        .map(|i| {
            let center = i * factor;
            let mut acc = 0.0;
            for (k, &tap) in taps.iter().enumerate() {
                // Input index center + half - k, skipping the zero-padded edges
                let idx = center as isize + half as isize - k as isize;
                if idx >= 0 && (idx as usize) < n {
                    acc += tap * buffer[idx as usize];
                }
            }
            acc
        })
        .collect();

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn tone(freq: f64, sample_rate: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| (2.0 * PI * freq * i as f64 / sample_rate).sin())
            .collect()
    }

    fn rms(x: &[f64]) -> f64 {
        (x.iter().map(|v| v * v).sum::<f64>() / x.len() as f64).sqrt()
    }

    #[test]
    fn test_output_length_is_floor() {
        let buffer = vec![0.5; 2050];
        assert_eq!(downsample(&buffer, 4).unwrap().len(), 512);
        assert_eq!(downsample(&buffer, 3).unwrap().len(), 683);
        assert_eq!(downsample(&buffer, 1).unwrap().len(), 2050);
    }

    #[test]
    fn test_invalid_factor() {
        let buffer = vec![0.0; 16];
        assert!(matches!(downsample(&buffer, 0), Err(Error::InvalidParameter(_))));
        assert!(matches!(downsample(&buffer, 16), Err(Error::InvalidParameter(_))));
        assert!(matches!(downsample(&buffer, 40), Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn test_taps_unity_dc_gain() {
        for factor in 2..8 {
            let taps = lowpass_taps(factor);
            assert_eq!(taps.len(), 8 * factor + 1);
            assert_relative_eq!(taps.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        }
        assert_eq!(lowpass_taps(1), vec![1.0]);
    }

    #[test]
    fn test_dc_preserved_away_from_edges() {
        let buffer = vec![0.25; 1024];
        let out = downsample(&buffer, 4).unwrap();
        for &v in &out[10..out.len() - 10] {
            assert_relative_eq!(v, 0.25, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_passband_tone_kept() {
        // 500 Hz at 44.1 kHz, new Nyquist 5512 Hz
        let x = tone(500.0, 44_100.0, 4096);
        let y = downsample(&x, 4).unwrap();
        let inner = &y[20..y.len() - 20];
        assert_relative_eq!(rms(inner), 1.0 / 2f64.sqrt(), epsilon = 0.02);
    }

    #[test]
    fn test_alias_tone_attenuated() {
        // 9 kHz would fold to 2025 Hz after naive 4× decimation
        let x = tone(9_000.0, 44_100.0, 4096);
        let y = downsample(&x, 4).unwrap();
        let inner = &y[20..y.len() - 20];
        assert!(rms(inner) < 0.05, "alias rms = {}", rms(inner));

        let naive: Vec<f64> = x.iter().step_by(4).copied().collect();
        assert!(rms(&naive) > 0.5);
    }

    #[test]
    fn test_input_untouched() {
        let x = tone(300.0, 8000.0, 256);
        let copy = x.clone();
        let _ = downsample(&x, 2).unwrap();
        assert_eq!(x, copy);
    }
}
