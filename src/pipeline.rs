//! Model-boundary feature extraction and inference-time reconstruction.
//!
//! The sequence model consumes time-major (`T x bins`) normalized decibel
//! features and emits linear features in the same domain; these helpers
//! convert between that layout and waveforms.

use crate::config::AudioConfig;
use crate::dsp::conversion::{
    inv_normalize_spectrogram, magnitude_to_decibel, normalize_spectrogram,
    spectrogram_to_decibel, spectrogram_to_magnitude, MAGNITUDE_FLOOR,
};
use crate::dsp::features::{linear_scale_spectrogram, magnitude, mel_scale_spectrogram};
use crate::dsp::griffin_lim::spectrogram_to_wav;
use crate::dsp::trim::{trim_silence, DEFAULT_FRAME_LEN, DEFAULT_HOP_LEN};
use crate::error::{AudioError, Result};
use crate::types::{DecibelReference, Spectrogram};
use serde::{Deserialize, Serialize};

/// Normalized decibel features of one utterance, time-major.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Features {
    /// `T x n_mels`
    pub mel: Vec<Vec<f32>>,
    /// `T x (1 + n_fft / 2)`
    pub linear: Vec<Vec<f32>>,
}

impl Features {
    pub fn n_frames(&self) -> usize {
        self.mel.len()
    }
}

/// Compute mel and linear features for a waveform recorded at `config.sampling_rate`.
pub fn extract_features(wav: &[f32], config: &AudioConfig) -> Result<Features> {
    let params = config.stft_params()?;

    let trimmed;
    let wav = if config.trim_silence {
        let (kept, range) =
            trim_silence(wav, config.trim_top_db, DEFAULT_FRAME_LEN, DEFAULT_HOP_LEN)?;
        log::debug!("trimmed to {range:?}");
        trimmed = kept;
        &trimmed[..]
    } else {
        wav
    };

    let linear = linear_scale_spectrogram(wav, params.n_fft(), params.hop_len(), params.win_len())?;
    let mel = mel_scale_spectrogram(
        wav,
        params.n_fft(),
        config.sampling_rate,
        config.n_mels,
        config.mel_fmin,
        config.mel_fmax,
        params.hop_len(),
        params.win_len(),
        1.0,
    )?;

    let mut linear = to_normalized_db(&magnitude(&linear), &config.linear_reference);
    let mut mel = to_normalized_db(&mel, &config.mel_reference);

    if config.reduction > 1 {
        apply_reduction_padding(&mut mel, config.reduction, silence_value(&config.mel_reference));
        apply_reduction_padding(
            &mut linear,
            config.reduction,
            silence_value(&config.linear_reference),
        );
    }

    Ok(Features { mel, linear })
}

/// Pad time-major frames at the end to a multiple of `reduction` with `fill`.
pub fn apply_reduction_padding(frames: &mut Vec<Vec<f32>>, reduction: usize, fill: f32) {
    if reduction <= 1 || frames.is_empty() {
        return;
    }
    let width = frames[0].len();
    let remainder = frames.len() % reduction;
    if remainder != 0 {
        let missing = reduction - remainder;
        frames.extend(std::iter::repeat(vec![fill; width]).take(missing));
    }
}

/// Normalized value of the magnitude floor, i.e. digital silence.
pub fn silence_value(reference: &DecibelReference) -> f32 {
    reference.normalize(magnitude_to_decibel(MAGNITUDE_FLOOR))
}

fn to_normalized_db(spec: &Spectrogram<f32>, reference: &DecibelReference) -> Vec<Vec<f32>> {
    normalize_spectrogram(&spectrogram_to_decibel(spec), reference).into_columns()
}

/// Reconstruct a waveform from time-major normalized linear features.
pub fn reconstruct_from_linear(linear: &[Vec<f32>], config: &AudioConfig) -> Result<Vec<f32>> {
    let params = config.stft_params()?;
    let normalized = Spectrogram::from_columns(linear.to_vec(), params.n_bins())?;
    let magnitude =
        spectrogram_to_magnitude(&inv_normalize_spectrogram(&normalized, &config.linear_reference));
    spectrogram_to_wav(
        &magnitude,
        params.win_len(),
        params.hop_len(),
        params.n_fft(),
        config.reconstruction_iterations,
    )
}

/// Smallest and largest decibel value of one spectrogram.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecibelStats {
    pub min_db: f32,
    pub max_db: f32,
}

pub fn decibel_statistics(db: &Spectrogram<f32>) -> Option<DecibelStats> {
    let mut values = db.columns().iter().flatten().copied().filter(|v| v.is_finite());
    let first = values.next()?;
    let (min_db, max_db) = values.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
    Some(DecibelStats { min_db, max_db })
}

/// Per-file decibel extremes averaged over a dataset.
///
/// The averaged maxima are the usual choice for [`DecibelReference::ref_db`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DatasetDecibelStats {
    pub files: usize,
    pub linear: DecibelStats,
    pub mel: DecibelStats,
}

pub fn collect_decibel_statistics<'a, I>(waves: I, config: &AudioConfig) -> Result<DatasetDecibelStats>
where
    I: IntoIterator<Item = &'a [f32]>,
{
    let params = config.stft_params()?;
    let mut sums = [0.0f64; 4];
    let mut files = 0usize;

    for wav in waves {
        let linear = magnitude(&linear_scale_spectrogram(
            wav,
            params.n_fft(),
            params.hop_len(),
            params.win_len(),
        )?);
        let mel = mel_scale_spectrogram(
            wav,
            params.n_fft(),
            config.sampling_rate,
            config.n_mels,
            config.mel_fmin,
            config.mel_fmax,
            params.hop_len(),
            params.win_len(),
            1.0,
        )?;
        let (Some(lin), Some(mel)) = (
            decibel_statistics(&spectrogram_to_decibel(&linear)),
            decibel_statistics(&spectrogram_to_decibel(&mel)),
        ) else {
            continue;
        };
        sums[0] += lin.min_db as f64;
        sums[1] += lin.max_db as f64;
        sums[2] += mel.min_db as f64;
        sums[3] += mel.max_db as f64;
        files += 1;
    }

    if files == 0 {
        return Err(AudioError::config("no input produced decibel statistics"));
    }
    let avg = |i: usize| (sums[i] / files as f64) as f32;
    Ok(DatasetDecibelStats {
        files,
        linear: DecibelStats {
            min_db: avg(0),
            max_db: avg(1),
        },
        mel: DecibelStats {
            min_db: avg(2),
            max_db: avg(3),
        },
    })
}
