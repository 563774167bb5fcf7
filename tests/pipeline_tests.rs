//! Integration tests for the formant pipeline

use std::f64::consts::PI;

use approx::assert_abs_diff_eq;
use ezformant::{
    estimate_lpc, extract_formants, formant_detection, formant_detection_with_downsampling,
    frequency_response, lpc_filter_freq_response, lpc_filter_freq_response_with_downsampling,
    lpc_filter_freq_response_with_peaks, process_audio, EngineConfig, Error, FormantEngine,
    FormantLimits, FormantMethod,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn tones(sample_rate: f64, n: usize, parts: &[(f64, f64)]) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let t = i as f64 / sample_rate;
            parts
                .iter()
                .map(|&(freq, amp)| amp * (2.0 * PI * freq * t).sin())
                .sum()
        })
        .collect()
}

fn add_noise(buffer: &mut [f64], amplitude: f64, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    for x in buffer.iter_mut() {
        *x += amplitude * rng.gen_range(-1.0..1.0);
    }
}

fn argmax(values: &[f64]) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f64::MIN), |best, (i, &v)| if v > best.1 { (i, v) } else { best })
        .0
}

#[test]
fn test_sine_gives_single_peak_at_f0() {
    let sr = 8000.0;
    let num_points = 512;
    let buffer = tones(sr, 1024, &[(1000.0, 1.0)]);

    for order in [4, 8, 12] {
        let values = lpc_filter_freq_response(&buffer, order, sr, num_points).unwrap();
        assert_eq!(values.len(), num_points);
        assert!(values.iter().all(|v| v.is_finite() && *v >= 0.0));

        let bin_width = sr / 2.0 / num_points as f64;
        let peak_hz = argmax(&values) as f64 * bin_width;
        assert!(
            (peak_hz - 1000.0).abs() <= bin_width,
            "order {order}: peak at {peak_hz} Hz"
        );
    }
}

#[test]
fn test_downsampled_response_axis() {
    let sr = 44_100.0;
    let factor = 4;
    let num_points = 1024;
    let mut buffer = tones(sr, 2048, &[(1000.0, 1.0)]);
    add_noise(&mut buffer, 1e-3, 2);

    let values =
        lpc_filter_freq_response_with_downsampling(&buffer, 16, sr, factor, num_points).unwrap();
    let bin_width = sr / 2.0 / num_points as f64 / factor as f64;
    let peak_hz = argmax(&values) as f64 * bin_width;
    assert!((peak_hz - 1000.0).abs() <= 2.0 * bin_width, "peak at {peak_hz} Hz");
}

#[test]
fn test_silence_everywhere() {
    let silence = vec![0.0; 2048];

    let lpc = estimate_lpc(&silence, 14).unwrap();
    assert!(lpc.is_degenerate());
    assert!(lpc.coefficients().iter().all(|&a| a == 0.0));
    assert_eq!(lpc.error_energy(), 0.0);

    let response = frequency_response(&lpc, 44_100.0, 256, Some(4)).unwrap();
    assert!(response.is_silent());

    assert!(matches!(
        extract_formants(&lpc, 11_025.0, &FormantLimits::default()),
        Err(Error::DegenerateInput(_))
    ));

    let values = lpc_filter_freq_response_with_downsampling(&silence, 16, 44_100.0, 4, 1024).unwrap();
    assert!(values.iter().all(|&v| v == 0.0));
    assert!(lpc_filter_freq_response(&silence, 16, 44_100.0, 1024)
        .unwrap()
        .iter()
        .all(|&v| v == 0.0));
    assert!(formant_detection(&silence, 14, 44_100.0).unwrap().is_empty());
    assert!(formant_detection_with_downsampling(&silence, 14, 44_100.0, 4)
        .unwrap()
        .is_empty());
    assert!(process_audio(&[0.0f32; 2048]).iter().all(|&m| m == 0.0));
}

#[test]
fn test_formants_sorted_and_at_most_four() {
    for seed in 0..8u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let buffer: Vec<f64> = (0..2048).map(|_| rng.gen_range(-1.0..1.0)).collect();

        for order in [8, 14, 20] {
            let formants = formant_detection_with_downsampling(&buffer, order, 48_000.0, 4).unwrap();
            assert!(formants.len() <= 4);
            assert!(formants.windows(2).all(|w| w[0] <= w[1]), "{formants:?}");
            assert!(formants.iter().all(|&f| f > 0.0 && f < 6000.0));

            let formants = formant_detection(&buffer, order, 16_000.0).unwrap();
            assert!(formants.len() <= 4);
            assert!(formants.windows(2).all(|w| w[0] <= w[1]), "{formants:?}");
        }
    }
}

#[test]
fn test_two_tones_found_after_downsampling() {
    let sr = 44_100.0;
    let mut buffer = tones(sr, 2048, &[(500.0, 1.0), (1500.0, 0.8)]);
    add_noise(&mut buffer, 0.05, 42);

    let formants = formant_detection_with_downsampling(&buffer, 10, sr, 4).unwrap();
    for tone in [500.0, 1500.0] {
        assert!(
            formants.iter().any(|f| (f - tone).abs() < 50.0),
            "{tone} Hz not in {formants:?}"
        );
    }
}

#[test]
fn test_downsampling_resolves_tones_a_low_order_misses() {
    let sr = 44_100.0;
    let buffer = tones(sr, 2048, &[(500.0, 1.0), (1500.0, 0.8)]);
    let finds_both = |formants: &[f64]| {
        [500.0, 1500.0]
            .iter()
            .all(|tone| formants.iter().any(|f| (f - tone).abs() < 50.0))
    };

    // Order 6 spread over 22 kHz cannot place poles on both tones
    let full_band = formant_detection(&buffer, 6, sr).unwrap();
    assert!(!finds_both(&full_band), "full band found {full_band:?}");

    let decimated = formant_detection_with_downsampling(&buffer, 6, sr, 4).unwrap();
    assert!(finds_both(&decimated), "decimated found {decimated:?}");
}

#[test]
fn test_known_all_pole_filter_round_trip() {
    // Poles at r = 0.9, θ = 0.2π and 0.5π
    let r: f64 = 0.9;
    let section = |theta: f64| [1.0, -2.0 * r * theta.cos(), r * r];
    let (s1, s2) = (section(0.2 * PI), section(0.5 * PI));
    let mut a = [0.0; 5];
    for i in 0..3 {
        for j in 0..3 {
            a[i + j] += s1[i] * s2[j];
        }
    }

    let mut rng = StdRng::seed_from_u64(1234);
    let burn_in = 1000;
    let n = 32_768;
    let mut x = vec![0.0; burn_in + n];
    for i in 0..x.len() {
        let mut v: f64 = rng.gen_range(-1.0..1.0);
        for k in 1..=4 {
            if i >= k {
                v -= a[k] * x[i - k];
            }
        }
        x[i] = v;
    }
    let signal = &x[burn_in..];

    let lpc = estimate_lpc(signal, 4).unwrap();
    for (estimated, expected) in lpc.coefficients().iter().zip(&a[1..]) {
        assert_abs_diff_eq!(*estimated, *expected, epsilon = 0.05);
    }

    // θ = 0.2π and 0.5π are 1000 Hz and 2500 Hz at 10 kHz
    let formants = extract_formants(&lpc, 10_000.0, &FormantLimits::default()).unwrap();
    assert_eq!(formants.len(), 2);
    assert_abs_diff_eq!(formants.get(1).unwrap(), 1000.0, epsilon = 50.0);
    assert_abs_diff_eq!(formants.get(2).unwrap(), 2500.0, epsilon = 50.0);
}

#[test]
fn test_boundary_parameters() {
    let mut buffer = tones(16_000.0, 64, &[(440.0, 1.0), (1800.0, 0.3)]);
    add_noise(&mut buffer, 0.01, 9);

    // order == len - 1 must not panic; any error must be a recoverable one
    for result in [
        lpc_filter_freq_response(&buffer, 63, 16_000.0, 128).map(|_| ()),
        formant_detection(&buffer, 63, 16_000.0).map(|_| ()),
        lpc_filter_freq_response_with_downsampling(&buffer, 15, 16_000.0, 4, 128).map(|_| ()),
    ] {
        if let Err(e) = result {
            assert!(e.is_recoverable(), "{e}");
        }
    }

    assert!(matches!(
        lpc_filter_freq_response(&buffer, 0, 16_000.0, 128),
        Err(Error::InvalidParameter(_))
    ));
    assert!(matches!(
        formant_detection(&buffer, 0, 16_000.0),
        Err(Error::InvalidParameter(_))
    ));
    assert!(matches!(
        lpc_filter_freq_response_with_downsampling(&buffer, 8, 16_000.0, 0, 128),
        Err(Error::InvalidParameter(_))
    ));
    assert!(matches!(
        formant_detection_with_downsampling(&buffer, 8, 16_000.0, 0),
        Err(Error::InvalidParameter(_))
    ));
    assert!(matches!(
        lpc_filter_freq_response(&buffer, 8, 16_000.0, 0),
        Err(Error::InvalidParameter(_))
    ));
    // order must fit the decimated buffer: 64 / 4 = 16 samples
    assert!(matches!(
        lpc_filter_freq_response_with_downsampling(&buffer, 16, 16_000.0, 4, 128),
        Err(Error::InvalidParameter(_))
    ));
}

#[test]
fn test_repeatable_and_input_untouched() {
    let mut buffer = tones(48_000.0, 2048, &[(650.0, 1.0), (1100.0, 0.7), (2500.0, 0.2)]);
    add_noise(&mut buffer, 0.02, 77);
    let copy = buffer.clone();

    let a = lpc_filter_freq_response_with_downsampling(&buffer, 16, 48_000.0, 4, 1024).unwrap();
    let b = lpc_filter_freq_response_with_downsampling(&buffer, 16, 48_000.0, 4, 1024).unwrap();
    assert_eq!(a, b);

    let f1 = formant_detection_with_downsampling(&buffer, 14, 48_000.0, 4).unwrap();
    let f2 = formant_detection_with_downsampling(&buffer, 14, 48_000.0, 4).unwrap();
    assert_eq!(f1, f2);

    let p1 = lpc_filter_freq_response_with_peaks(&buffer, 14, 48_000.0, 512).unwrap();
    let p2 = lpc_filter_freq_response_with_peaks(&buffer, 14, 48_000.0, 512).unwrap();
    assert_eq!(p1, p2);

    assert_eq!(buffer, copy);
}

#[test]
fn test_engine_matches_free_functions() {
    let mut buffer = tones(44_100.0, 2048, &[(700.0, 1.0), (1200.0, 0.6)]);
    add_noise(&mut buffer, 0.05, 3);

    let engine = FormantEngine::new(EngineConfig::default()).unwrap();
    let frame = engine.analyze(&buffer, 44_100.0).unwrap();

    let values = lpc_filter_freq_response_with_downsampling(&buffer, 14, 44_100.0, 4, 1024).unwrap();
    assert_eq!(frame.response.values().to_vec(), values);

    let formants = formant_detection_with_downsampling(&buffer, 14, 44_100.0, 4).unwrap();
    assert_eq!(frame.formants.frequencies(), formants.as_slice());

    let peak_engine =
        FormantEngine::new(EngineConfig::default().with_method(FormantMethod::PeakPicking))
            .unwrap();
    let by_peaks = peak_engine.formants(&buffer, 44_100.0).unwrap();
    assert!(!by_peaks.is_empty());
    assert!(by_peaks.len() <= 4);
}
