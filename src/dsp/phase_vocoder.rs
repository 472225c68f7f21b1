use crate::error::{AudioError, Result};
use crate::types::Spectrogram;
use realfft::num_complex::Complex;
use std::f32::consts::PI;

/// Resample STFT frames by `rate` while keeping phase continuous.
///
/// Output frame `t` reads the fractional input position `t * rate`:
/// magnitudes are interpolated linearly between the two neighbouring frames,
/// and the phase is accumulated from the expected per-bin advance
/// `2π k hop / n_fft` plus the measured, wrapped deviation between them.
/// Frames past the end of the input are treated as silent.
///
/// `rate > 1` shortens the sequence, `rate < 1` lengthens it. The output has
/// `ceil(n_frames / rate)` frames.
pub fn phase_vocoder(
    stft: &Spectrogram<Complex<f32>>,
    rate: f32,
    hop_len: usize,
    n_fft: usize,
) -> Result<Spectrogram<Complex<f32>>> {
    check_rate(rate)?;
    if n_fft == 0 {
        return Err(AudioError::invalid("n_fft must be > 0"));
    }
    let (n_bins, n_frames) = stft.shape();
    if n_frames == 0 {
        return Spectrogram::from_columns(Vec::new(), n_bins);
    }

    let phi_advance: Vec<f32> = (0..n_bins)
        .map(|k| 2.0 * PI * hop_len as f32 * k as f32 / n_fft as f32)
        .collect();
    let silent = vec![Complex::new(0.0f32, 0.0); n_bins];

    let n_out = (n_frames as f64 / rate as f64).ceil() as usize;
    let mut phase_acc: Vec<f32> = stft.column(0).iter().map(|c| c.arg()).collect();
    let mut columns = Vec::with_capacity(n_out);

    for t in 0..n_out {
        let step = t as f64 * rate as f64;
        let idx = step.floor() as usize;
        let alpha = (step - idx as f64) as f32;
        let (left, right) = (
            frame_or_silence(stft, &silent, idx),
            frame_or_silence(stft, &silent, idx + 1),
        );

        let mut column = Vec::with_capacity(n_bins);
        for k in 0..n_bins {
            let mag = (1.0 - alpha) * left[k].norm() + alpha * right[k].norm();
            column.push(Complex::from_polar(mag, phase_acc[k]));

            let dphase = right[k].arg() - left[k].arg() - phi_advance[k];
            phase_acc[k] += phi_advance[k] + wrap_phase(dphase);
        }
        columns.push(column);
    }

    log::debug!("phase vocoder: {n_frames} -> {n_out} frames at rate {rate}");
    Spectrogram::from_columns(columns, n_bins)
}

fn frame_or_silence<'a>(
    stft: &'a Spectrogram<Complex<f32>>,
    silent: &'a [Complex<f32>],
    index: usize,
) -> &'a [Complex<f32>] {
    if index < stft.n_frames() {
        stft.column(index)
    } else {
        silent
    }
}

/// Wrap to `[-π, π]`.
fn wrap_phase(phase: f32) -> f32 {
    phase - 2.0 * PI * (phase / (2.0 * PI)).round()
}

pub(crate) fn check_rate(rate: f32) -> Result<()> {
    if rate > 0.0 && rate.is_finite() {
        Ok(())
    } else {
        Err(AudioError::invalid(format!("rate must be > 0, got {rate}")))
    }
}
