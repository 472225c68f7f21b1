use crate::dsp::conversion::ms_to_samples;
use crate::dsp::trim::DEFAULT_TOP_DB;
use crate::error::{AudioError, Result};
use crate::types::{DecibelReference, StftParams};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Feature extraction and reconstruction settings shared by the pipeline and the CLI.
///
/// Missing fields in a config file take the defaults below.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Target sampling rate in Hz.
    pub sampling_rate: u32,
    pub n_fft: usize,
    /// Analysis window length in milliseconds.
    pub win_len_ms: f64,
    /// Hop between windows in milliseconds.
    pub win_hop_ms: f64,
    pub n_mels: usize,
    pub mel_fmin: f32,
    pub mel_fmax: f32,
    /// Griffin-Lim iterations for inference reconstruction.
    pub reconstruction_iterations: usize,
    /// Frames emitted per decoder step by the sequence model; features are
    /// padded to a multiple of this.
    pub reduction: usize,
    pub trim_silence: bool,
    pub trim_top_db: f32,
    pub mel_reference: DecibelReference,
    pub linear_reference: DecibelReference,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sampling_rate: 16000,
            n_fft: 1024,
            win_len_ms: 50.0,
            win_hop_ms: 12.5,
            n_mels: 80,
            mel_fmin: 0.0,
            mel_fmax: 8000.0,
            reconstruction_iterations: 50,
            reduction: 1,
            trim_silence: true,
            trim_top_db: DEFAULT_TOP_DB,
            mel_reference: DecibelReference::cmu_slt_mel(),
            linear_reference: DecibelReference::cmu_slt_linear(),
        }
    }
}

impl AudioConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn win_len(&self) -> usize {
        ms_to_samples(self.win_len_ms, self.sampling_rate)
    }

    pub fn hop_len(&self) -> usize {
        ms_to_samples(self.win_hop_ms, self.sampling_rate)
    }

    /// Same settings at another sampling rate.
    ///
    /// The millisecond window settings are kept, so `n_fft` grows to the next
    /// power of two when the window no longer fits. `mel_fmax` is capped at
    /// the new Nyquist frequency.
    pub fn with_sampling_rate(&self, sampling_rate: u32) -> Result<Self> {
        let mut config = Self {
            sampling_rate,
            mel_fmax: self.mel_fmax.min(sampling_rate as f32 / 2.0),
            ..self.clone()
        };
        let win_len = config.win_len();
        if win_len > config.n_fft {
            let n_fft = win_len.next_power_of_two();
            log::debug!(
                "n_fft {} too small for {win_len}-sample window at {sampling_rate} Hz, using {n_fft}",
                config.n_fft
            );
            config.n_fft = n_fft;
        }
        config.validate()?;
        Ok(config)
    }

    /// STFT parameters derived from the millisecond window settings.
    pub fn stft_params(&self) -> Result<StftParams> {
        StftParams::new(self.n_fft, self.win_len(), self.hop_len())
    }

    pub fn validate(&self) -> Result<()> {
        if self.sampling_rate == 0 {
            return Err(AudioError::config("sampling_rate must be > 0"));
        }
        if self.reduction == 0 {
            return Err(AudioError::config("reduction must be >= 1"));
        }
        self.stft_params()?;
        DecibelReference::new(self.mel_reference.ref_db, self.mel_reference.max_db)?;
        DecibelReference::new(self.linear_reference.ref_db, self.linear_reference.max_db)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = AudioConfig::default();
        config.validate().unwrap();
        let params = config.stft_params().unwrap();
        assert_eq!(params.win_len(), 800);
        assert_eq!(params.hop_len(), 200);
        assert_eq!(params.n_bins(), 513);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = AudioConfig::from_json_str(
            r#"{ "sampling_rate": 22050, "n_fft": 2048, "n_mels": 40, "linear_reference": { "ref_db": 35.7, "max_db": 100.0 } }"#,
        )
        .unwrap();
        assert_eq!(config.sampling_rate, 22050);
        assert_eq!(config.n_mels, 40);
        assert_eq!(config.n_fft, 2048);
        assert_eq!(config.win_len_ms, 50.0);
        assert_eq!(config.linear_reference.ref_db, 35.7);
        assert_eq!(config.mel_reference, DecibelReference::cmu_slt_mel());
    }

    #[test]
    fn test_window_too_long_for_n_fft_rejected() {
        // 50 ms at 22050 Hz is 1103 samples, more than the default n_fft
        assert!(matches!(
            AudioConfig::from_json_str(r#"{ "sampling_rate": 22050 }"#),
            Err(AudioError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_with_sampling_rate_grows_n_fft() {
        let config = AudioConfig::default().with_sampling_rate(22050).unwrap();
        assert_eq!(config.win_len(), 1103);
        assert_eq!(config.hop_len(), 276);
        assert_eq!(config.n_fft, 2048);
        assert_eq!(config.mel_fmax, 8000.0);

        let config = AudioConfig::default().with_sampling_rate(44100).unwrap();
        assert_eq!(config.win_len(), 2205);
        assert_eq!(config.n_fft, 4096);
        assert_eq!(config.stft_params().unwrap().n_bins(), 2049);
    }

    #[test]
    fn test_with_sampling_rate_caps_fmax() {
        let config = AudioConfig::default().with_sampling_rate(8000).unwrap();
        assert_eq!(config.n_fft, 1024);
        assert_eq!(config.win_len(), 400);
        assert_eq!(config.mel_fmax, 4000.0);
    }

    #[test]
    fn test_json_round_trip() {
        let config = AudioConfig {
            reduction: 5,
            ..Default::default()
        };
        let json = config.to_json_pretty().unwrap();
        assert_eq!(AudioConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(matches!(
            AudioConfig::from_json_str(r#"{ "win_hop_ms": 60.0 }"#),
            Err(AudioError::InvalidArgument(_))
        ));
        assert!(matches!(
            AudioConfig::from_json_str(r#"{ "reduction": 0 }"#),
            Err(AudioError::Configuration(_))
        ));
        assert!(matches!(
            AudioConfig::from_json_str("{ not json"),
            Err(AudioError::Config(_))
        ));
    }
}
