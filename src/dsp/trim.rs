use crate::error::{AudioError, Result};
use std::ops::Range;

pub const DEFAULT_TOP_DB: f32 = 60.0;
pub const DEFAULT_FRAME_LEN: usize = 2048;
pub const DEFAULT_HOP_LEN: usize = 512;

/// Strip leading and trailing silence.
///
/// Frames of `frame_len` are centered on multiples of `hop_len` (the signal is
/// zero-padded by `frame_len / 2` on both sides). A frame is non-silent when its
/// RMS power is within `top_db` of the loudest frame. Returns the trimmed
/// samples and the kept range `[first * hop, min(len, (last + 1) * hop))`.
/// With every frame at zero power no frame is quieter than the loudest, so
/// all-silent input is kept whole.
pub fn trim_silence(
    wav: &[f32],
    top_db: f32,
    frame_len: usize,
    hop_len: usize,
) -> Result<(Vec<f32>, Range<usize>)> {
    if frame_len == 0 || hop_len == 0 {
        return Err(AudioError::invalid("frame_len and hop_len must be > 0"));
    }
    if !(top_db > 0.0) {
        return Err(AudioError::invalid(format!("top_db must be > 0, got {top_db}")));
    }
    if wav.is_empty() {
        return Ok((Vec::new(), 0..0));
    }

    let power = frame_power(wav, frame_len, hop_len);
    let max_power = power.iter().copied().fold(0.0f32, f32::max);
    if max_power <= 0.0 {
        log::warn!("trim_silence: signal of {} samples is all silence", wav.len());
        return Ok((wav.to_vec(), 0..wav.len()));
    }

    // power ratio threshold for `top_db` below the loudest frame
    let threshold = max_power * 10f32.powf(-top_db / 10.0);
    let loud = |p: &f32| *p > threshold;
    let first = power.iter().position(loud).unwrap_or(0);
    let last = power.iter().rposition(loud).unwrap_or(first);

    let start = (first * hop_len).min(wav.len());
    let end = ((last + 1) * hop_len).min(wav.len()).max(start);
    log::debug!("trim_silence: kept {start}..{end} of {} samples", wav.len());
    Ok((wav[start..end].to_vec(), start..end))
}

/// Mean squared amplitude of each centered frame.
fn frame_power(wav: &[f32], frame_len: usize, hop_len: usize) -> Vec<f32> {
    let half = frame_len / 2;
    let n_frames = wav.len() / hop_len + 1;
    (0..n_frames)
        .map(|t| {
            let center = t * hop_len;
            let lo = center.saturating_sub(half);
            let hi = (center + frame_len - half).min(wav.len());
            let sum: f32 = wav[lo.min(hi)..hi].iter().map(|s| s * s).sum();
            sum / frame_len as f32
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trims_leading_and_trailing_silence() {
        let mut wav = vec![0.0f32; 8000];
        wav.extend((0..8000).map(|i| (i as f32 * 0.05).sin() * 0.5));
        wav.extend(vec![0.0f32; 8000]);

        let (trimmed, range) =
            trim_silence(&wav, DEFAULT_TOP_DB, DEFAULT_FRAME_LEN, DEFAULT_HOP_LEN).unwrap();
        assert_eq!(trimmed.len(), range.len());
        // Frame granularity: boundaries are within one frame of the tone
        assert!(range.start <= 8000 && range.start + 2048 >= 8000, "start {}", range.start);
        assert!(range.end >= 16000 && range.end <= 16000 + 2048, "end {}", range.end);
    }

    #[test]
    fn test_all_silent_is_kept_whole() {
        let (trimmed, range) = trim_silence(&[0.0; 4000], DEFAULT_TOP_DB, 2048, 512).unwrap();
        assert_eq!(trimmed.len(), 4000);
        assert_eq!(range, 0..4000);
    }

    #[test]
    fn test_loud_signal_is_untouched() {
        let wav: Vec<f32> = (0..4096).map(|i| (i as f32 * 0.1).sin()).collect();
        let (trimmed, range) = trim_silence(&wav, 60.0, 1024, 256).unwrap();
        assert_eq!(range, 0..4096);
        assert_eq!(trimmed, wav);
    }

    #[test]
    fn test_invalid_arguments() {
        assert!(trim_silence(&[0.1; 10], 60.0, 0, 512).is_err());
        assert!(trim_silence(&[0.1; 10], -1.0, 2048, 512).is_err());
    }
}
