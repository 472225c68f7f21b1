use crate::dsp::time_stretch::{fix_length, time_stretch};
use crate::error::{AudioError, Result};

/// Pitch-shift audio by `octaves` while preserving the original duration.
///
/// Two-step process:
/// 1. Time-stretch by `2^octaves` with the phase vocoder (pitch unchanged)
/// 2. Resample back to the original length, which scales all frequencies by `2^octaves`
///
/// Result: output length equals input length. `octaves = 1/12` is one half-step.
pub fn pitch_shift(wav: &[f32], sampling_rate: u32, octaves: f32) -> Result<Vec<f32>> {
    if sampling_rate == 0 {
        return Err(AudioError::invalid("sampling_rate must be > 0"));
    }
    if !octaves.is_finite() {
        return Err(AudioError::invalid(format!("octaves must be finite, got {octaves}")));
    }
    if wav.is_empty() || octaves == 0.0 {
        return Ok(wav.to_vec());
    }

    // Step 1: stretch duration by 2^octaves
    let rate = 2f32.powf(-octaves);
    let stretched = time_stretch(wav, rate)?;

    // Step 2: resample back to the input length
    log::debug!(
        "pitch shift: {octaves} octaves at {sampling_rate} Hz, {} -> {} -> {} samples",
        wav.len(),
        stretched.len(),
        wav.len()
    );
    Ok(fix_length(&resample_linear(&stretched, wav.len()), wav.len()))
}

/// Resample audio to `out_len` samples by linear interpolation.
///
/// Making the signal longer divides its frequencies by `out_len / len`,
/// making it shorter multiplies them.
pub fn resample_linear(samples: &[f32], out_len: usize) -> Vec<f32> {
    if samples.is_empty() {
        return vec![0.0; out_len];
    }
    if out_len == samples.len() {
        return samples.to_vec();
    }

    let step = samples.len() as f64 / out_len as f64;
    let mut output = Vec::with_capacity(out_len);

    for i in 0..out_len {
        let src_pos = i as f64 * step;
        let idx = src_pos as usize;
        let frac = (src_pos - idx as f64) as f32;

        let s0 = samples[idx.min(samples.len() - 1)];
        let s1 = samples[(idx + 1).min(samples.len() - 1)];
        output.push(s0 + frac * (s1 - s0));
    }

    output
}
