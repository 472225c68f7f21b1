//! Synthetic signals and spectral checks shared by the DSP unit tests.

use realfft::RealFftPlanner;
use std::f64::consts::PI;

pub fn sine(freq: f64, sample_rate: u32, num_samples: usize, amplitude: f32) -> Vec<f32> {
    (0..num_samples)
        .map(|i| {
            let t = i as f64 / sample_rate as f64;
            (2.0 * PI * freq * t).sin() as f32 * amplitude
        })
        .collect()
}

/// Linear chirp from `f0` to `f1` Hz over `num_samples`.
pub fn chirp(f0: f64, f1: f64, sample_rate: u32, num_samples: usize) -> Vec<f32> {
    let duration = num_samples as f64 / sample_rate as f64;
    (0..num_samples)
        .map(|i| {
            let t = i as f64 / sample_rate as f64;
            (2.0 * PI * (f0 * t + (f1 - f0) * t * t / (2.0 * duration))).sin() as f32
        })
        .collect()
}

/// Frequency of the strongest non-DC bin of a Hann-windowed FFT over the whole signal.
pub fn dominant_frequency(samples: &[f32], sample_rate: u32) -> f64 {
    let n = samples.len();
    let mut planner = RealFftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(n);
    let mut input: Vec<f32> = samples
        .iter()
        .enumerate()
        .map(|(i, &s)| {
            let w = 0.5 * (1.0 - (2.0 * PI * i as f64 / n as f64).cos());
            s * w as f32
        })
        .collect();
    let mut spectrum = fft.make_output_vec();
    fft.process(&mut input, &mut spectrum).unwrap();
    let peak = spectrum
        .iter()
        .enumerate()
        .skip(1)
        .max_by(|a, b| a.1.norm().partial_cmp(&b.1.norm()).unwrap())
        .unwrap()
        .0;
    peak as f64 * sample_rate as f64 / n as f64
}
