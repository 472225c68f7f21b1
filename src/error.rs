use std::fmt;

#[derive(Debug)]
pub enum AudioError {
    /// Out-of-domain scalar parameter (rate <= 0, hop >= window, ...).
    InvalidArgument(String),
    /// Spectrogram shape does not match the STFT parameters used with it.
    Shape {
        expected: String,
        found: String,
    },
    /// Derived configuration that cannot produce a meaningful result.
    Configuration(String),
    Fft(String),
    Wav(hound::Error),
    Config(serde_json::Error),
    Io(std::io::Error),
}

pub type Result<T> = std::result::Result<T, AudioError>;

impl AudioError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        AudioError::InvalidArgument(msg.into())
    }

    pub(crate) fn shape(expected: impl Into<String>, found: impl Into<String>) -> Self {
        AudioError::Shape {
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub(crate) fn config(msg: impl Into<String>) -> Self {
        AudioError::Configuration(msg.into())
    }
}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioError::InvalidArgument(msg) => write!(f, "Invalid argument: {msg}"),
            AudioError::Shape { expected, found } => {
                write!(f, "Shape mismatch: expected {expected}, found {found}")
            }
            AudioError::Configuration(msg) => write!(f, "Configuration error: {msg}"),
            AudioError::Fft(msg) => write!(f, "FFT error: {msg}"),
            AudioError::Wav(e) => write!(f, "WAV error: {e}"),
            AudioError::Config(e) => write!(f, "Config parse error: {e}"),
            AudioError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for AudioError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AudioError::Wav(e) => Some(e),
            AudioError::Config(e) => Some(e),
            AudioError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<hound::Error> for AudioError {
    fn from(e: hound::Error) -> Self {
        AudioError::Wav(e)
    }
}

impl From<serde_json::Error> for AudioError {
    fn from(e: serde_json::Error) -> Self {
        AudioError::Config(e)
    }
}

impl From<std::io::Error> for AudioError {
    fn from(e: std::io::Error) -> Self {
        AudioError::Io(e)
    }
}

impl From<realfft::FftError> for AudioError {
    fn from(e: realfft::FftError) -> Self {
        AudioError::Fft(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let e = AudioError::invalid("rate must be > 0");
        assert_eq!(e.to_string(), "Invalid argument: rate must be > 0");

        let e = AudioError::shape("513 bins", "512 bins");
        assert_eq!(e.to_string(), "Shape mismatch: expected 513 bins, found 512 bins");

        let e = AudioError::config("zero frames");
        assert_eq!(e.to_string(), "Configuration error: zero frames");
    }
}
