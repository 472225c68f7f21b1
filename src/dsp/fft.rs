use crate::error::{AudioError, Result};
use crate::types::{Spectrogram, StftParams};
use realfft::num_complex::Complex;
use realfft::RealFftPlanner;
use std::cell::RefCell;
use std::collections::HashMap;

thread_local! {
    static FFT_PLANNER: RefCell<RealFftPlanner<f32>> = RefCell::new(RealFftPlanner::new());
    static HANN_CACHE: RefCell<HashMap<usize, Vec<f32>>> = RefCell::new(HashMap::new());
}

/// Overlap-add samples whose squared-window sum is below this are left
/// unnormalized instead of being divided by a near-zero weight.
const WINDOW_SUM_FLOOR: f32 = 1e-3;

/// Periodic Hann window: `0.5 * (1 - cos(2πi / N))`.
///
/// The periodic form makes hops of `N/4` sum to a constant, which keeps the
/// overlap-add inverse well conditioned.
pub fn hann_window(size: usize) -> Vec<f32> {
    HANN_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .entry(size)
            .or_insert_with(|| {
                (0..size)
                    .map(|i| {
                        0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / size as f32).cos())
                    })
                    .collect()
            })
            .clone()
    })
}

/// Short-time Fourier transform.
///
/// Frame `t` covers samples `[t * hop, t * hop + win_len)`; there is no
/// centering. Input shorter than one window is zero-padded on the right.
/// Each frame is Hann-windowed, placed at the start of an `n_fft` buffer
/// (remaining entries zero) and transformed with a real FFT.
///
/// Output shape is `(1 + n_fft / 2, n_frames)`. An empty waveform has no
/// frames and is rejected.
pub fn stft(samples: &[f32], params: &StftParams) -> Result<Spectrogram<Complex<f32>>> {
    let n_fft = params.n_fft();
    let win_len = params.win_len();
    let hop = params.hop_len();
    let n_frames = params.n_frames(samples.len());
    if n_frames == 0 {
        return Err(AudioError::config(format!(
            "waveform of {} samples yields zero STFT frames",
            samples.len()
        )));
    }

    let padded;
    let samples = if samples.len() < win_len {
        log::debug!("zero-padding {} samples to one window of {win_len}", samples.len());
        let mut buf = samples.to_vec();
        buf.resize(win_len, 0.0);
        padded = buf;
        &padded[..]
    } else {
        samples
    };

    let fft = FFT_PLANNER.with(|p| p.borrow_mut().plan_fft_forward(n_fft));
    let window = hann_window(win_len);

    // Reusable FFT buffers; the tail past win_len stays zero
    let mut input = fft.make_input_vec();
    let mut spectrum = fft.make_output_vec();

    let mut columns = Vec::with_capacity(n_frames);
    for col_i in 0..n_frames {
        let pos = col_i * hop;
        for (inp, (&s, &w)) in input
            .iter_mut()
            .zip(samples[pos..pos + win_len].iter().zip(window.iter()))
        {
            *inp = s * w;
        }
        for inp in input[win_len..].iter_mut() {
            *inp = 0.0;
        }
        fft.process(&mut input, &mut spectrum)?;
        columns.push(spectrum.clone());
    }

    Spectrogram::from_columns(columns, params.n_bins())
}

/// Inverse STFT by windowed overlap-add.
///
/// Each frame is inverse transformed, its first `win_len` samples are
/// windowed again and summed at `t * hop`. The sum is divided by the
/// squared-window envelope where that envelope is above a small floor.
/// Output length is `(n_frames - 1) * hop + win_len`.
pub fn istft(spec: &Spectrogram<Complex<f32>>, params: &StftParams) -> Result<Vec<f32>> {
    check_shape(spec.n_bins(), spec.n_frames(), params)?;

    let n_fft = params.n_fft();
    let win_len = params.win_len();
    let hop = params.hop_len();
    let out_len = params.output_len(spec.n_frames());

    let ifft = FFT_PLANNER.with(|p| p.borrow_mut().plan_fft_inverse(n_fft));
    let window = hann_window(win_len);

    let mut spectrum = ifft.make_input_vec();
    let mut frame = ifft.make_output_vec();
    let mut output = vec![0.0f32; out_len];
    let mut window_sum = vec![0.0f32; out_len];
    let scale = 1.0 / n_fft as f32;
    let last = spectrum.len() - 1;

    for (col_i, column) in spec.columns().iter().enumerate() {
        spectrum.copy_from_slice(column);
        // A real signal has purely real DC and Nyquist bins
        spectrum[0].im = 0.0;
        if n_fft % 2 == 0 {
            spectrum[last].im = 0.0;
        }
        ifft.process(&mut spectrum, &mut frame)?;

        let pos = col_i * hop;
        for i in 0..win_len {
            output[pos + i] += frame[i] * scale * window[i];
            window_sum[pos + i] += window[i] * window[i];
        }
    }

    for (s, &ws) in output.iter_mut().zip(window_sum.iter()) {
        if ws > WINDOW_SUM_FLOOR {
            *s /= ws;
        }
    }

    Ok(output)
}

/// Check a spectrogram's bin and frame counts against STFT parameters.
pub(crate) fn check_shape(n_bins: usize, n_frames: usize, params: &StftParams) -> Result<()> {
    if n_bins != params.n_bins() {
        return Err(AudioError::shape(
            format!("{} frequency bins for n_fft = {}", params.n_bins(), params.n_fft()),
            format!("{n_bins} bins"),
        ));
    }
    if n_frames == 0 {
        return Err(AudioError::shape("at least one frame", "0 frames"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::test_signals::sine;

    #[test]
    fn test_spectrogram_basic() {
        let sample_rate = 44100u32;
        let freq = 1000.0f64;
        let samples = sine(freq, sample_rate, 4096, 1.0);

        let params = StftParams::new(1024, 1024, 512).unwrap();
        let result = stft(&samples, &params).unwrap();
        assert_eq!(result.shape(), (513, 7));

        // The peak bin should be near 1000 Hz
        let col = result.column(1);
        let peak_bin = col
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.norm().partial_cmp(&b.1.norm()).unwrap())
            .unwrap()
            .0;
        let freq_resolution = sample_rate as f64 / 1024.0;
        let peak_freq = peak_bin as f64 * freq_resolution;
        let error = (peak_freq - freq).abs();
        assert!(
            error < freq_resolution * 2.0,
            "Peak at {peak_freq} Hz, expected ~{freq} Hz"
        );
    }

    #[test]
    fn test_hann_window_periodic() {
        let w = hann_window(8);
        assert_eq!(w.len(), 8);
        assert!(w[0].abs() < 1e-7);
        assert!((w[4] - 1.0).abs() < 1e-6);
        // periodic: w[i] == w[N - i]
        assert!((w[1] - w[7]).abs() < 1e-6);
    }

    #[test]
    fn test_istft_inverts_stft_in_interior() {
        let params = StftParams::new(512, 400, 100).unwrap();
        let samples = sine(330.0, 16000, 4000, 1.0);
        let spec = stft(&samples, &params).unwrap();
        let recon = istft(&spec, &params).unwrap();
        assert_eq!(recon.len(), params.output_len(spec.n_frames()));

        for i in 400..recon.len() - 400 {
            assert!(
                (recon[i] - samples[i]).abs() < 1e-3,
                "sample {i}: {} vs {}",
                recon[i],
                samples[i]
            );
        }
    }

    #[test]
    fn test_short_input_is_padded_to_one_frame() {
        let params = StftParams::new(256, 256, 64).unwrap();
        let spec = stft(&[0.5; 10], &params).unwrap();
        assert_eq!(spec.shape(), (129, 1));
    }

    #[test]
    fn test_empty_input_rejected() {
        let params = StftParams::new(256, 256, 64).unwrap();
        assert!(matches!(
            stft(&[], &params),
            Err(AudioError::Configuration(_))
        ));
    }

    #[test]
    fn test_istft_rejects_wrong_bin_count() {
        let params = StftParams::new(256, 256, 64).unwrap();
        let spec = Spectrogram::from_columns(vec![vec![Complex::new(0.0f32, 0.0); 100]], 100).unwrap();
        assert!(matches!(istft(&spec, &params), Err(AudioError::Shape { .. })));
    }
}
