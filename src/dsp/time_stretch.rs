//! Duration changes without pitch change, by phase vocoding in the STFT domain.

use crate::dsp::features::{linear_scale_spectrogram, magnitude};
use crate::dsp::fft::{istft, stft};
use crate::dsp::griffin_lim::spectrogram_to_wav;
use crate::dsp::phase_vocoder::{check_rate, phase_vocoder};
use crate::error::Result;
use crate::types::StftParams;

const STRETCH_N_FFT: usize = 2048;
const STRETCH_HOP: usize = STRETCH_N_FFT / 4;

const ADV_N_FFT: usize = 1024;
const ADV_HOP: usize = ADV_N_FFT / 4;
const ADV_ITERATIONS: usize = 25;

/// Stretch `wav` in time by `1 / rate` without altering pitch.
///
/// `rate > 1` speeds up, `0 < rate < 1` slows down. The waveform is padded
/// with one window of silence on each side, phase vocoded and inverted
/// directly with the vocoder's phase. The output has exactly
/// `round(len / rate)` samples. Rate 1 returns a copy of the input.
pub fn time_stretch(wav: &[f32], rate: f32) -> Result<Vec<f32>> {
    check_rate(rate)?;
    if wav.is_empty() {
        return Ok(Vec::new());
    }
    if rate == 1.0 {
        return Ok(wav.to_vec());
    }

    let params = StftParams::new(STRETCH_N_FFT, STRETCH_N_FFT, STRETCH_HOP)?;
    let pad = params.win_len();
    let mut padded = Vec::with_capacity(wav.len() + 2 * pad);
    padded.resize(pad, 0.0);
    padded.extend_from_slice(wav);
    padded.resize(wav.len() + 2 * pad, 0.0);

    let spec = stft(&padded, &params)?;
    let stretched = phase_vocoder(&spec, rate, params.hop_len(), params.n_fft())?;
    let output = istft(&stretched, &params)?;

    let target_len = (wav.len() as f64 / rate as f64).round() as usize;
    let offset = ((pad as f64 / rate as f64).round() as usize).min(output.len());
    log::debug!(
        "time stretch: {} -> {target_len} samples at rate {rate}",
        wav.len()
    );
    Ok(fix_length(&output[offset..], target_len))
}

/// Time stretch through magnitude-only reconstruction.
///
/// Linear STFT (n_fft = win = 1024, hop = 256), phase vocoder, then 25
/// Griffin-Lim iterations on the stretched magnitude. The output length is
/// the Griffin-Lim length `(n_frames - 1) * 256 + 1024` of the stretched
/// frame sequence. Empty input gives empty output.
pub fn time_stretch_adv(wav: &[f32], rate: f32) -> Result<Vec<f32>> {
    check_rate(rate)?;
    if wav.is_empty() {
        return Ok(Vec::new());
    }

    let spec = linear_scale_spectrogram(wav, ADV_N_FFT, ADV_HOP, ADV_N_FFT)?;
    let stretched = phase_vocoder(&spec, rate, ADV_HOP, ADV_N_FFT)?;
    spectrogram_to_wav(
        &magnitude(&stretched),
        ADV_N_FFT,
        ADV_HOP,
        ADV_N_FFT,
        ADV_ITERATIONS,
    )
}

/// Truncate or zero-pad to exactly `len` samples.
pub fn fix_length(samples: &[f32], len: usize) -> Vec<f32> {
    let mut out = samples[..samples.len().min(len)].to_vec();
    out.resize(len, 0.0);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::test_signals::{dominant_frequency, sine};
    use crate::error::AudioError;

    #[test]
    fn test_rate_one_is_identity() {
        let wav = sine(440.0, 22050, 5000, 0.8);
        let out = time_stretch(&wav, 1.0).unwrap();
        assert_eq!(out.len(), wav.len());
        assert!(out.iter().zip(&wav).all(|(a, b)| (a - b).abs() < 1e-6));
    }

    #[test]
    fn test_non_positive_rate_rejected() {
        let wav = sine(440.0, 22050, 5000, 0.8);
        for rate in [0.0, -1.0] {
            assert!(matches!(
                time_stretch(&wav, rate),
                Err(AudioError::InvalidArgument(_))
            ));
            assert!(matches!(
                time_stretch_adv(&wav, rate),
                Err(AudioError::InvalidArgument(_))
            ));
        }
    }

    #[test]
    fn test_output_length() {
        let wav = sine(440.0, 22050, 22050, 0.5);
        assert_eq!(time_stretch(&wav, 2.0).unwrap().len(), 11025);
        assert_eq!(time_stretch(&wav, 0.5).unwrap().len(), 44100);
        // round(22050 / 1.5) = 14700
        assert_eq!(time_stretch(&wav, 1.5).unwrap().len(), 14700);
        assert!(time_stretch(&[], 2.0).unwrap().is_empty());
    }

    #[test]
    fn test_stretch_keeps_pitch() {
        let sample_rate = 22050;
        let wav = sine(440.0, sample_rate, sample_rate as usize, 0.5);
        let slow = time_stretch(&wav, 0.5).unwrap();
        let f = dominant_frequency(&slow, sample_rate);
        assert!((f - 440.0).abs() / 440.0 < 0.02, "slowed tone at {f} Hz");
    }

    #[test]
    fn test_adv_length_and_pitch() {
        let sample_rate = 22050;
        let wav = sine(440.0, sample_rate, sample_rate as usize, 0.5);
        let out = time_stretch_adv(&wav, 2.0).unwrap();

        let in_frames = (wav.len() - ADV_N_FFT) / ADV_HOP + 1;
        let out_frames = (in_frames as f64 / 2.0).ceil() as usize;
        assert_eq!(out.len(), (out_frames - 1) * ADV_HOP + ADV_N_FFT);

        let f = dominant_frequency(&out, sample_rate);
        assert!((f - 440.0).abs() / 440.0 < 0.03, "stretched tone at {f} Hz");
    }

    #[test]
    fn test_empty_input_is_empty_for_both() {
        assert!(time_stretch(&[], 0.5).unwrap().is_empty());
        assert!(time_stretch_adv(&[], 0.5).unwrap().is_empty());
        assert!(time_stretch_adv(&[], 2.0).unwrap().is_empty());
        assert!(matches!(
            time_stretch_adv(&[], 0.0),
            Err(AudioError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_fix_length() {
        assert_eq!(fix_length(&[1.0, 2.0, 3.0], 2), vec![1.0, 2.0]);
        assert_eq!(fix_length(&[1.0], 3), vec![1.0, 0.0, 0.0]);
    }
}
