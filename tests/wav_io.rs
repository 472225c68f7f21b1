use hound::{SampleFormat, WavSpec, WavWriter};
use tacotron_audio::audio::{load_wav, save_wav, save_wav_pcm16};
use tacotron_audio::AudioError;
use tempfile::tempdir;

fn ramp(n: usize) -> Vec<f32> {
    (0..n).map(|i| (i as f32 / n as f32) * 1.8 - 0.9).collect()
}

#[test]
fn float_wav_round_trip_is_exact() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("float.wav");
    let samples = ramp(1000);

    save_wav(&path, &samples, 22050).unwrap();
    let audio = load_wav(&path).unwrap();

    assert_eq!(audio.sample_rate, 22050);
    assert_eq!(audio.samples, samples);
}

#[test]
fn pcm16_wav_round_trip_within_quantization() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("pcm16.wav");
    let mut samples = ramp(1000);
    samples.push(1.7); // clamped on write

    save_wav_pcm16(&path, &samples, 16000).unwrap();
    let audio = load_wav(&path).unwrap();

    assert_eq!(audio.sample_rate, 16000);
    assert_eq!(audio.len(), samples.len());
    for (a, b) in audio.samples.iter().zip(&samples[..1000]) {
        assert!((a - b).abs() < 1e-4, "{a} vs {b}");
    }
    assert!((audio.samples[1000] - 1.0).abs() < 1e-4);
}

#[test]
fn stereo_is_mixed_down_to_mono() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("stereo.wav");
    let spec = WavSpec {
        channels: 2,
        sample_rate: 8000,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(&path, spec).unwrap();
    for _ in 0..100 {
        writer.write_sample(16384i16).unwrap();
        writer.write_sample(0i16).unwrap();
    }
    writer.finalize().unwrap();

    let audio = load_wav(&path).unwrap();
    assert_eq!(audio.len(), 100);
    assert!(audio.samples.iter().all(|s| (s - 0.25).abs() < 1e-4));
    assert!((audio.duration_secs() - 100.0 / 8000.0).abs() < 1e-9);
}

#[test]
fn missing_file_is_wav_error() {
    let dir = tempdir().unwrap();
    let err = load_wav(dir.path().join("nope.wav")).unwrap_err();
    assert!(matches!(err, AudioError::Wav(_)));
}
