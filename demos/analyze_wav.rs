//! Formant track of a WAV file, one line per analysis frame
//!
//! Usage: cargo run --example analyze_wav -- <file.wav> [order] [factor]

use std::time::Instant;

use ezformant::{EngineConfig, FormantEngine, MAX_FORMANTS};

const FRAME_SIZE: usize = 2048;
const HOP_SIZE: usize = 512;

/// Load channel 0 of a WAV file as f64 samples in [-1, 1].
fn load_wav(path: &str) -> Result<(Vec<f64>, f64), Box<dyn std::error::Error>> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    let channels = spec.channels as usize;

    let interleaved: Vec<f64> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .map(|s| s.map(|v| v as f64))
            .collect::<Result<Vec<_>, _>>()?,
        hound::SampleFormat::Int => {
            let max_value = (1i64 << (spec.bits_per_sample - 1)) as f64;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f64 / max_value))
                .collect::<Result<Vec<_>, _>>()?
        }
    };

    if channels > 1 {
        log::info!("{} channels, analyzing channel 0", channels);
    }
    let samples = interleaved.into_iter().step_by(channels.max(1)).collect();
    Ok((samples, spec.sample_rate as f64))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let path = args
        .get(1)
        .ok_or("usage: analyze_wav <file.wav> [order] [factor]")?;
    let order: usize = args.get(2).map(|s| s.parse()).transpose()?.unwrap_or(14);
    let factor: usize = args.get(3).map(|s| s.parse()).transpose()?.unwrap_or(4);

    let (samples, sample_rate) = load_wav(path)?;
    println!(
        "{}: {} samples, {} Hz, {:.3}s",
        path,
        samples.len(),
        sample_rate,
        samples.len() as f64 / sample_rate
    );

    let engine = FormantEngine::new(
        EngineConfig::default()
            .with_lpc_order(order)
            .with_downsample_factor(factor),
    )?;

    println!("{:>8} {:>8} {:>8} {:>8} {:>8}", "time", "F1", "F2", "F3", "F4");
    let start = Instant::now();
    let mut frames = 0;
    let mut voiced = 0;

    for offset in (0..samples.len().saturating_sub(FRAME_SIZE)).step_by(HOP_SIZE) {
        let frame = &samples[offset..offset + FRAME_SIZE];
        let time = (offset + FRAME_SIZE / 2) as f64 / sample_rate;
        frames += 1;

        match engine.analyze(frame, sample_rate) {
            Ok(analysis) if !analysis.formants.is_empty() => {
                voiced += 1;
                let padded = analysis.formants.to_padded_array();
                let cells: Vec<String> = (0..MAX_FORMANTS)
                    .map(|i| {
                        if padded[i] > 0.0 {
                            format!("{:8.1}", padded[i])
                        } else {
                            format!("{:>8}", "-")
                        }
                    })
                    .collect();
                println!("{:8.3} {}", time, cells.join(" "));
            }
            Ok(_) => println!("{:8.3} {:>8}", time, "(silent)"),
            Err(e) if e.is_recoverable() => log::warn!("frame at {:.3}s skipped: {}", time, e),
            Err(e) => return Err(e.into()),
        }
    }

    println!(
        "\n{} frames ({} with formants) in {:.2?}",
        frames,
        voiced,
        start.elapsed()
    );
    Ok(())
}
