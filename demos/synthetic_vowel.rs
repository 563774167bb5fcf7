//! Run the engine on synthesized vowels with known formants
//!
//! A 120 Hz impulse train is passed through a cascade of second-order
//! resonators, then analyzed exactly like a live analyser frame.

use std::f64::consts::PI;

use ezformant::{
    formant_detection_with_downsampling, lpc_filter_freq_response_with_downsampling,
    EngineConfig, FormantEngine, FormantMethod,
};

const SAMPLE_RATE: f64 = 44_100.0;
const FRAME_SIZE: usize = 2048;
const F0: f64 = 120.0;

/// (name, [(frequency, bandwidth); 3])
const VOWELS: [(&str, [(f64, f64); 3]); 3] = [
    ("/a/", [(730.0, 90.0), (1090.0, 110.0), (2440.0, 170.0)]),
    ("/i/", [(270.0, 60.0), (2290.0, 100.0), (3010.0, 120.0)]),
    ("/u/", [(300.0, 60.0), (870.0, 90.0), (2240.0, 120.0)]),
];

/// Impulse train through a cascade of two-pole resonators.
fn synthesize(formants: &[(f64, f64)]) -> Vec<f64> {
    let period = (SAMPLE_RATE / F0).round() as usize;
    let mut signal: Vec<f64> = (0..FRAME_SIZE * 2)
        .map(|i| if i % period == 0 { 1.0 } else { 0.0 })
        .collect();

    for &(freq, bandwidth) in formants {
        let r = (-PI * bandwidth / SAMPLE_RATE).exp();
        let c1 = 2.0 * r * (2.0 * PI * freq / SAMPLE_RATE).cos();
        let c2 = -r * r;
        let (mut y1, mut y2) = (0.0, 0.0);
        for x in signal.iter_mut() {
            let y = *x + c1 * y1 + c2 * y2;
            y2 = y1;
            y1 = y;
            *x = y;
        }
    }

    // Keep the settled second half, normalized to a unit peak
    let tail = signal.split_off(FRAME_SIZE);
    let peak = tail.iter().fold(0.0f64, |m, v| m.max(v.abs()));
    tail.into_iter().map(|v| v / peak).collect()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let pole_engine = FormantEngine::new(EngineConfig::default())?;
    let peak_engine =
        FormantEngine::new(EngineConfig::default().with_method(FormantMethod::PeakPicking))?;

    for (name, targets) in VOWELS {
        let frame = synthesize(&targets);
        let expected: Vec<f64> = targets.iter().map(|&(f, _)| f).collect();

        let poles = pole_engine.formants(&frame, SAMPLE_RATE)?;
        let peaks = peak_engine.formants(&frame, SAMPLE_RATE)?;
        let one_shot = formant_detection_with_downsampling(&frame, 14, SAMPLE_RATE, 4)?;
        let envelope = lpc_filter_freq_response_with_downsampling(&frame, 16, SAMPLE_RATE, 4, 1024)?;
        let envelope_max = envelope.iter().fold(0.0f64, |m, &v| m.max(v));

        println!("{}", name);
        println!("  target      {:?}", expected);
        println!("  pole angle  {:.0?}", poles.frequencies());
        println!("  peaks       {:.0?}", peaks.frequencies());
        println!("  one-shot    {:.0?}", one_shot);
        println!("  envelope    max {:.2} (log10 {:.3})", envelope_max, (envelope_max + 1.0).log10());
    }

    Ok(())
}
