//! Pure transforms between magnitude, decibel, and normalized decibel domains.

use crate::types::{DecibelReference, Spectrogram};

/// Magnitude floor applied before taking the logarithm (-100 dB).
pub const MAGNITUDE_FLOOR: f32 = 1e-5;

/// Convert a duration in milliseconds to a sample count.
///
/// Rounds to the nearest integer, halves away from zero (`f64::round`).
/// Negative or non-finite durations give 0.
pub fn ms_to_samples(duration_ms: f64, sampling_rate: u32) -> usize {
    let samples = (duration_ms * sampling_rate as f64 / 1000.0).round();
    if samples.is_finite() && samples > 0.0 {
        samples as usize
    } else {
        0
    }
}

/// `20 * log10(max(magnitude, 1e-5))`. NaN and negative input floor too.
pub fn magnitude_to_decibel(magnitude: f32) -> f32 {
    // f32::max returns the non-NaN operand
    20.0 * magnitude.max(MAGNITUDE_FLOOR).log10()
}

/// `10 ^ (db / 20)`
pub fn decibel_to_magnitude(db: f32) -> f32 {
    10.0f32.powf(db / 20.0)
}

/// Affine map `(db - ref_db) / max_db`. Not clipped.
pub fn normalize_decibel(db: f32, ref_db: f32, max_db: f32) -> f32 {
    (db - ref_db) / max_db
}

/// Inverse of [`normalize_decibel`]: `norm * max_db + ref_db`.
pub fn inv_normalize_decibel(norm: f32, ref_db: f32, max_db: f32) -> f32 {
    norm * max_db + ref_db
}

impl DecibelReference {
    pub fn normalize(&self, db: f32) -> f32 {
        normalize_decibel(db, self.ref_db, self.max_db)
    }

    pub fn denormalize(&self, norm: f32) -> f32 {
        inv_normalize_decibel(norm, self.ref_db, self.max_db)
    }
}

pub fn spectrogram_to_decibel(magnitude: &Spectrogram<f32>) -> Spectrogram<f32> {
    magnitude.map(|&m| magnitude_to_decibel(m))
}

pub fn spectrogram_to_magnitude(db: &Spectrogram<f32>) -> Spectrogram<f32> {
    db.map(|&d| decibel_to_magnitude(d))
}

pub fn normalize_spectrogram(db: &Spectrogram<f32>, reference: &DecibelReference) -> Spectrogram<f32> {
    db.map(|&d| reference.normalize(d))
}

pub fn inv_normalize_spectrogram(
    norm: &Spectrogram<f32>,
    reference: &DecibelReference,
) -> Spectrogram<f32> {
    norm.map(|&n| reference.denormalize(n))
}
