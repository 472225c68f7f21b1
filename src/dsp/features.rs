//! Linear and mel scale spectrogram features.

use crate::dsp::fft::stft;
use crate::error::{AudioError, Result};
use crate::types::{Spectrogram, StftParams};
use realfft::num_complex::Complex;

/// Complex STFT of `wav` with shape `(1 + n_fft / 2, n_frames)`.
///
/// See [`stft`] for the framing and padding convention.
pub fn linear_scale_spectrogram(
    wav: &[f32],
    n_fft: usize,
    hop_len: usize,
    win_len: usize,
) -> Result<Spectrogram<Complex<f32>>> {
    let params = StftParams::new(n_fft, win_len, hop_len)?;
    let spec = stft(wav, &params)?;
    log::debug!(
        "linear spectrogram: {} samples -> {:?} (n_fft={n_fft}, win={win_len}, hop={hop_len})",
        wav.len(),
        spec.shape()
    );
    Ok(spec)
}

/// Magnitude of a complex spectrogram.
pub fn magnitude(spec: &Spectrogram<Complex<f32>>) -> Spectrogram<f32> {
    spec.map(|c| c.norm())
}

/// Mel spectrogram of `wav` with shape `(n_mels, n_frames)`.
///
/// `|STFT|^power` is projected through the filterbank from [`mel_filterbank`].
#[allow(clippy::too_many_arguments)]
pub fn mel_scale_spectrogram(
    wav: &[f32],
    n_fft: usize,
    sampling_rate: u32,
    n_mels: usize,
    fmin: f32,
    fmax: f32,
    hop_len: usize,
    win_len: usize,
    power: f32,
) -> Result<Spectrogram<f32>> {
    if !(power > 0.0 && power.is_finite()) {
        return Err(AudioError::invalid(format!("power must be > 0, got {power}")));
    }
    let filterbank = mel_filterbank(sampling_rate, n_fft, n_mels, fmin, fmax)?;
    let linear = linear_scale_spectrogram(wav, n_fft, hop_len, win_len)?;

    let columns: Vec<Vec<f32>> = linear
        .columns()
        .iter()
        .map(|column| {
            let spectrum: Vec<f32> = if power == 1.0 {
                column.iter().map(|c| c.norm()).collect()
            } else if power == 2.0 {
                column.iter().map(|c| c.norm_sqr()).collect()
            } else {
                column.iter().map(|c| c.norm().powf(power)).collect()
            };
            filterbank
                .iter()
                .map(|filter| filter.iter().zip(&spectrum).map(|(w, s)| w * s).sum::<f32>())
                .collect()
        })
        .collect();

    Spectrogram::from_columns(columns, n_mels)
}

/// HTK mel warp: `2595 * log10(1 + f / 700)`.
pub fn hz_to_mel(hz: f32) -> f32 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

pub fn mel_to_hz(mel: f32) -> f32 {
    700.0 * (10.0f32.powf(mel / 2595.0) - 1.0)
}

/// Triangular mel filterbank, `n_mels` rows of `1 + n_fft / 2` weights.
///
/// Band edges are spaced uniformly in mel between `fmin` and `fmax`. Each
/// triangle is scaled by `2 / (f_hi - f_lo)` so all filters have equal area.
pub fn mel_filterbank(
    sampling_rate: u32,
    n_fft: usize,
    n_mels: usize,
    fmin: f32,
    fmax: f32,
) -> Result<Vec<Vec<f32>>> {
    let nyquist = sampling_rate as f32 / 2.0;
    if sampling_rate == 0 || n_fft == 0 {
        return Err(AudioError::invalid("sampling_rate and n_fft must be > 0"));
    }
    if n_mels == 0 {
        return Err(AudioError::invalid("n_mels must be > 0"));
    }
    if !(fmin >= 0.0 && fmin < fmax && fmax <= nyquist) {
        return Err(AudioError::invalid(format!(
            "mel band must satisfy 0 <= fmin < fmax <= {nyquist}, got [{fmin}, {fmax}]"
        )));
    }

    let n_bins = n_fft / 2 + 1;
    let fft_freqs: Vec<f32> = (0..n_bins)
        .map(|k| k as f32 * sampling_rate as f32 / n_fft as f32)
        .collect();

    let mel_min = hz_to_mel(fmin);
    let mel_max = hz_to_mel(fmax);
    let edges: Vec<f32> = (0..n_mels + 2)
        .map(|i| mel_to_hz(mel_min + (mel_max - mel_min) * i as f32 / (n_mels + 1) as f32))
        .collect();

    let filters = (0..n_mels)
        .map(|m| {
            let (lo, center, hi) = (edges[m], edges[m + 1], edges[m + 2]);
            let norm = 2.0 / (hi - lo);
            fft_freqs
                .iter()
                .map(|&f| {
                    let rising = (f - lo) / (center - lo);
                    let falling = (hi - f) / (hi - center);
                    rising.min(falling).max(0.0) * norm
                })
                .collect()
        })
        .collect();

    Ok(filters)
}
