use crate::error::{AudioError, Result};
use serde::{Deserialize, Serialize};

/// Mono waveform tagged with its sampling rate.
#[derive(Clone, Debug)]
pub struct AudioData {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioData {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Time-frequency array indexed by (frequency bin, time frame).
///
/// Stored frame-major: `columns[t][k]` is bin `k` of frame `t`. The bin count
/// is kept separately so a spectrogram with zero frames still knows its height.
#[derive(Clone, Debug, PartialEq)]
pub struct Spectrogram<T> {
    columns: Vec<Vec<T>>,
    n_bins: usize,
}

impl<T: Clone> Spectrogram<T> {
    /// Build from frame columns. All columns must have `n_bins` entries.
    pub fn from_columns(columns: Vec<Vec<T>>, n_bins: usize) -> Result<Self> {
        if let Some((t, col)) = columns.iter().enumerate().find(|(_, c)| c.len() != n_bins) {
            return Err(AudioError::shape(
                format!("{n_bins} bins in every frame"),
                format!("{} bins in frame {t}", col.len()),
            ));
        }
        Ok(Self { columns, n_bins })
    }

    /// Build from bin rows (`rows[k][t]`), the layout most array libraries use.
    pub fn from_rows(rows: &[Vec<T>]) -> Result<Self> {
        let n_bins = rows.len();
        let n_frames = rows.first().map_or(0, Vec::len);
        if let Some((k, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != n_frames) {
            return Err(AudioError::shape(
                format!("{n_frames} frames in every bin"),
                format!("{} frames in bin {k}", row.len()),
            ));
        }
        let columns = (0..n_frames)
            .map(|t| rows.iter().map(|row| row[t].clone()).collect())
            .collect();
        Ok(Self { columns, n_bins })
    }

    pub fn n_bins(&self) -> usize {
        self.n_bins
    }

    pub fn n_frames(&self) -> usize {
        self.columns.len()
    }

    /// `(n_bins, n_frames)`
    pub fn shape(&self) -> (usize, usize) {
        (self.n_bins, self.columns.len())
    }

    pub fn get(&self, bin: usize, frame: usize) -> Option<&T> {
        self.columns.get(frame).and_then(|c| c.get(bin))
    }

    pub fn column(&self, frame: usize) -> &[T] {
        &self.columns[frame]
    }

    pub fn columns(&self) -> &[Vec<T>] {
        &self.columns
    }

    /// Time-major frames (`T x bins`), the layout a sequence model consumes.
    pub fn into_columns(self) -> Vec<Vec<T>> {
        self.columns
    }

    /// Frequency-major copy (`bins x T`).
    pub fn to_rows(&self) -> Vec<Vec<T>> {
        (0..self.n_bins)
            .map(|k| self.columns.iter().map(|c| c[k].clone()).collect())
            .collect()
    }

    /// Apply `f` elementwise, returning a new spectrogram of the same shape.
    pub fn map<U, F: Fn(&T) -> U>(&self, f: F) -> Spectrogram<U> {
        Spectrogram {
            columns: self
                .columns
                .iter()
                .map(|c| c.iter().map(&f).collect())
                .collect(),
            n_bins: self.n_bins,
        }
    }
}

/// Immutable STFT framing parameters.
///
/// Invariant: `0 < hop_len < win_len <= n_fft`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StftParams {
    n_fft: usize,
    win_len: usize,
    hop_len: usize,
}

impl StftParams {
    pub fn new(n_fft: usize, win_len: usize, hop_len: usize) -> Result<Self> {
        if hop_len == 0 {
            return Err(AudioError::invalid("hop_len must be > 0"));
        }
        if win_len == 0 {
            return Err(AudioError::invalid("win_len must be > 0"));
        }
        if hop_len >= win_len {
            return Err(AudioError::invalid(format!(
                "hop_len ({hop_len}) must be smaller than win_len ({win_len})"
            )));
        }
        if win_len > n_fft {
            return Err(AudioError::invalid(format!(
                "win_len ({win_len}) must not exceed n_fft ({n_fft})"
            )));
        }
        Ok(Self {
            n_fft,
            win_len,
            hop_len,
        })
    }

    pub fn n_fft(&self) -> usize {
        self.n_fft
    }

    pub fn win_len(&self) -> usize {
        self.win_len
    }

    pub fn hop_len(&self) -> usize {
        self.hop_len
    }

    /// Number of frequency bins of a linear spectrogram: `1 + n_fft / 2`.
    pub fn n_bins(&self) -> usize {
        self.n_fft / 2 + 1
    }

    /// Frame count for a waveform of `len` samples.
    ///
    /// Waveforms shorter than the window are zero-padded to one full window,
    /// so any non-empty input yields at least one frame.
    pub fn n_frames(&self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        let len = len.max(self.win_len);
        (len - self.win_len) / self.hop_len + 1
    }

    /// Overlap-add output length for `n_frames` frames.
    pub fn output_len(&self, n_frames: usize) -> usize {
        if n_frames == 0 {
            return 0;
        }
        (n_frames - 1) * self.hop_len + self.win_len
    }
}

/// Affine decibel normalization reference for one dataset and feature type.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecibelReference {
    pub ref_db: f32,
    pub max_db: f32,
}

impl DecibelReference {
    pub fn new(ref_db: f32, max_db: f32) -> Result<Self> {
        if !ref_db.is_finite() || !max_db.is_finite() || max_db == 0.0 {
            return Err(AudioError::invalid(format!(
                "decibel reference needs finite values and max_db != 0 (got {ref_db}, {max_db})"
            )));
        }
        Ok(Self { ref_db, max_db })
    }

    /// Mel statistics measured over the CMU US SLT Arctic corpus.
    pub fn cmu_slt_mel() -> Self {
        Self {
            ref_db: 9.33,
            max_db: 100.0,
        }
    }

    /// Linear statistics measured over the CMU US SLT Arctic corpus.
    pub fn cmu_slt_linear() -> Self {
        Self {
            ref_db: 36.50,
            max_db: 100.0,
        }
    }
}
