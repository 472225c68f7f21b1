//! Griffin-Lim waveform reconstruction from magnitude-only spectrograms.

use crate::dsp::fft::{check_shape, istft, stft};
use crate::error::Result;
use crate::types::{Spectrogram, StftParams};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use realfft::num_complex::Complex;

/// Iteration count used when none is given.
pub const DEFAULT_ITERATIONS: usize = 50;

/// Seed of the default random initial phase.
pub const DEFAULT_PHASE_SEED: u64 = 1;

/// Starting phase estimate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhaseInit {
    /// All phases zero, i.e. the first candidate is the inverse of the bare
    /// magnitude. Tends to lock onto a buzz at the frame rate.
    Zero,
    /// Uniform random phases in `[0, 2π)` drawn from a seeded generator.
    Random { seed: u64 },
}

impl Default for PhaseInit {
    fn default() -> Self {
        PhaseInit::Random {
            seed: DEFAULT_PHASE_SEED,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GriffinLimOptions {
    pub iterations: usize,
    pub phase_init: PhaseInit,
}

impl Default for GriffinLimOptions {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            phase_init: PhaseInit::default(),
        }
    }
}

/// Reconstruct a waveform from a `(1 + n_fft / 2, n_frames)` magnitude spectrogram.
///
/// Starts from the default seeded random phase, so repeated calls agree.
pub fn spectrogram_to_wav(
    magnitude: &Spectrogram<f32>,
    win_len: usize,
    hop_len: usize,
    n_fft: usize,
    iterations: usize,
) -> Result<Vec<f32>> {
    let params = StftParams::new(n_fft, win_len, hop_len)?;
    griffin_lim(
        magnitude,
        &params,
        &GriffinLimOptions {
            iterations,
            ..Default::default()
        },
    )
}

/// Griffin-Lim phase estimation.
///
/// Each iteration combines the fixed magnitude with the current phase,
/// inverts it by overlap-add, re-analyses the candidate waveform and keeps
/// only the new phase. The magnitude is never altered. The loop runs exactly
/// `options.iterations` times.
///
/// The output has `(n_frames - 1) * hop_len + win_len` samples.
pub fn griffin_lim(
    magnitude: &Spectrogram<f32>,
    params: &StftParams,
    options: &GriffinLimOptions,
) -> Result<Vec<f32>> {
    check_shape(magnitude.n_bins(), magnitude.n_frames(), params)?;
    log::debug!(
        "griffin-lim: {:?} spectrogram, {} iterations, {:?}",
        magnitude.shape(),
        options.iterations,
        options.phase_init
    );

    let mut phase = initial_phase(magnitude, options.phase_init);

    for iteration in 0..options.iterations {
        let candidate = istft(&combine(magnitude, &phase)?, params)?;
        let analysis = stft(&candidate, params)?;
        for (phase_col, analysis_col) in phase.iter_mut().zip(analysis.columns()) {
            for (p, c) in phase_col.iter_mut().zip(analysis_col) {
                *p = unit_phasor(*c);
            }
        }
        log::trace!("griffin-lim iteration {}/{}", iteration + 1, options.iterations);
    }

    istft(&combine(magnitude, &phase)?, params)
}

fn initial_phase(magnitude: &Spectrogram<f32>, init: PhaseInit) -> Vec<Vec<Complex<f32>>> {
    let (n_bins, n_frames) = magnitude.shape();
    match init {
        PhaseInit::Zero => vec![vec![Complex::new(1.0, 0.0); n_bins]; n_frames],
        PhaseInit::Random { seed } => {
            let mut rng = StdRng::seed_from_u64(seed);
            (0..n_frames)
                .map(|_| {
                    (0..n_bins)
                        .map(|_| Complex::from_polar(1.0, rng.gen_range(0.0..std::f32::consts::TAU)))
                        .collect()
                })
                .collect()
        }
    }
}

/// `c / |c|`, or 1 when `c` is zero.
fn unit_phasor(c: Complex<f32>) -> Complex<f32> {
    let norm = c.norm();
    if norm > f32::MIN_POSITIVE {
        c / norm
    } else {
        Complex::new(1.0, 0.0)
    }
}

fn combine(
    magnitude: &Spectrogram<f32>,
    phase: &[Vec<Complex<f32>>],
) -> Result<Spectrogram<Complex<f32>>> {
    let columns = magnitude
        .columns()
        .iter()
        .zip(phase)
        .map(|(mag_col, phase_col)| {
            mag_col
                .iter()
                .zip(phase_col)
                .map(|(&m, &p)| p * m)
                .collect()
        })
        .collect();
    Spectrogram::from_columns(columns, magnitude.n_bins())
}
