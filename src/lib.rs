//! Audio analysis and synthesis for Tacotron-style text-to-speech.
//!
//! Waveforms go in as `&[f32]`, spectrograms come out as [`Spectrogram`]
//! values indexed by (frequency bin, time frame). Magnitude spectrograms
//! predicted by a sequence model are turned back into audio with
//! Griffin-Lim phase reconstruction.

pub mod audio;
pub mod config;
pub mod dsp;
pub mod error;
pub mod pipeline;
pub mod types;

pub use config::AudioConfig;
pub use dsp::conversion::{
    decibel_to_magnitude, inv_normalize_decibel, magnitude_to_decibel, ms_to_samples,
    normalize_decibel,
};
pub use dsp::features::{linear_scale_spectrogram, mel_scale_spectrogram};
pub use dsp::griffin_lim::{griffin_lim, spectrogram_to_wav, GriffinLimOptions, PhaseInit};
pub use dsp::phase_vocoder::phase_vocoder;
pub use dsp::pitch_shift::pitch_shift;
pub use dsp::time_stretch::{time_stretch, time_stretch_adv};
pub use error::{AudioError, Result};
pub use realfft::num_complex::Complex;
pub use types::{AudioData, DecibelReference, Spectrogram, StftParams};
