//! tts-audio - feature extraction and resynthesis for Tacotron training data

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn, Level};

use tacotron_audio::audio::{load_wav, save_wav, save_wav_pcm16};
use tacotron_audio::dsp::features::magnitude;
use tacotron_audio::pipeline::{collect_decibel_statistics, extract_features};
use tacotron_audio::{
    griffin_lim, linear_scale_spectrogram, pitch_shift, time_stretch, time_stretch_adv,
    AudioConfig, AudioData, GriffinLimOptions, PhaseInit,
};

#[derive(Parser, Debug)]
#[command(name = "tts-audio")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// JSON feature config; defaults are used for missing fields
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Write 16-bit PCM instead of 32-bit float WAV
    #[arg(long, global = true)]
    pcm16: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract normalized mel and linear features
    Features {
        input: PathBuf,

        /// Write features as JSON instead of printing a summary
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Resynthesize a file from its magnitude spectrogram with Griffin-Lim
    Reconstruct {
        input: PathBuf,
        output: PathBuf,

        #[arg(short = 'n', long)]
        iterations: Option<usize>,

        /// Seed for the random initial phase
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Change duration without changing pitch
    Stretch {
        input: PathBuf,
        output: PathBuf,

        /// Speed factor: > 1 is faster, < 1 is slower
        #[arg(short, long)]
        rate: f32,

        /// Reconstruct with Griffin-Lim instead of the vocoder phase
        #[arg(long = "griffin-lim")]
        use_griffin_lim: bool,
    },

    /// Shift pitch without changing duration
    Pitch {
        input: PathBuf,
        output: PathBuf,

        /// Octaves to shift; 1/12 is one half-step
        #[arg(short, long, allow_hyphen_values = true)]
        octaves: f32,
    },

    /// Print averaged decibel extremes over a set of files
    Stats {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },

    /// Print the effective config as JSON
    ShowConfig,
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .compact()
        .init();
}

fn load_config(path: Option<&Path>) -> Result<AudioConfig> {
    match path {
        Some(path) => AudioConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(AudioConfig::default()),
    }
}

fn load_input(path: &Path) -> Result<AudioData> {
    let audio =
        load_wav(path).with_context(|| format!("Failed to read WAV file {}", path.display()))?;
    if audio.is_empty() {
        bail!("{} contains no samples", path.display());
    }
    info!(
        "Loaded {} ({:.2}s at {} Hz)",
        path.display(),
        audio.duration_secs(),
        audio.sample_rate
    );
    Ok(audio)
}

fn write_output(path: &Path, samples: &[f32], sample_rate: u32, pcm16: bool) -> Result<()> {
    let result = if pcm16 {
        save_wav_pcm16(path, samples, sample_rate)
    } else {
        save_wav(path, samples, sample_rate)
    };
    result.with_context(|| format!("Failed to write {}", path.display()))?;
    info!(
        "Wrote {} ({} samples, {:.2}s)",
        path.display(),
        samples.len(),
        samples.len() as f64 / sample_rate as f64
    );
    Ok(())
}

/// Use the file's sampling rate when it differs from the configured one.
fn config_for(audio: &AudioData, config: &AudioConfig) -> Result<AudioConfig> {
    if audio.sample_rate == config.sampling_rate {
        return Ok(config.clone());
    }
    warn!(
        "Input is {} Hz but config expects {} Hz; using the input rate",
        audio.sample_rate, config.sampling_rate
    );
    let adjusted = config.with_sampling_rate(audio.sample_rate)?;
    if adjusted.n_fft != config.n_fft {
        info!("Using n_fft {} for the {} Hz window", adjusted.n_fft, audio.sample_rate);
    }
    Ok(adjusted)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Features { input, output } => {
            let audio = load_input(&input)?;
            let config = config_for(&audio, &config)?;
            let features = extract_features(&audio.samples, &config)?;
            info!(
                "{} frames: mel {}x{}, linear {}x{}",
                features.n_frames(),
                features.mel.len(),
                config.n_mels,
                features.linear.len(),
                config.n_fft / 2 + 1
            );
            if let Some(output) = output {
                let json = serde_json::to_string(&features)?;
                std::fs::write(&output, json)
                    .with_context(|| format!("Failed to write {}", output.display()))?;
                info!("Wrote features to {}", output.display());
            }
        }

        Commands::Reconstruct {
            input,
            output,
            iterations,
            seed,
        } => {
            let audio = load_input(&input)?;
            let config = config_for(&audio, &config)?;
            let params = config.stft_params()?;
            let spec = linear_scale_spectrogram(
                &audio.samples,
                params.n_fft(),
                params.hop_len(),
                params.win_len(),
            )?;
            let options = GriffinLimOptions {
                iterations: iterations.unwrap_or(config.reconstruction_iterations),
                phase_init: seed.map_or_else(PhaseInit::default, |seed| PhaseInit::Random { seed }),
            };
            info!(
                "Griffin-Lim: {} frames, {} iterations",
                spec.n_frames(),
                options.iterations
            );
            let wav = griffin_lim(&magnitude(&spec), &params, &options)?;
            write_output(&output, &wav, audio.sample_rate, cli.pcm16)?;
        }

        Commands::Stretch {
            input,
            output,
            rate,
            use_griffin_lim,
        } => {
            let audio = load_input(&input)?;
            let wav = if use_griffin_lim {
                time_stretch_adv(&audio.samples, rate)?
            } else {
                time_stretch(&audio.samples, rate)?
            };
            write_output(&output, &wav, audio.sample_rate, cli.pcm16)?;
        }

        Commands::Pitch {
            input,
            output,
            octaves,
        } => {
            let audio = load_input(&input)?;
            let wav = pitch_shift(&audio.samples, audio.sample_rate, octaves)?;
            write_output(&output, &wav, audio.sample_rate, cli.pcm16)?;
        }

        Commands::Stats { inputs } => {
            let mut waves = Vec::with_capacity(inputs.len());
            for path in &inputs {
                let audio = load_input(path)?;
                if audio.sample_rate != config.sampling_rate {
                    warn!(
                        "{} is {} Hz, config expects {} Hz",
                        path.display(),
                        audio.sample_rate,
                        config.sampling_rate
                    );
                }
                waves.push(audio.samples);
            }
            let stats = collect_decibel_statistics(waves.iter().map(Vec::as_slice), &config)?;
            println!("files:                  {}", stats.files);
            println!("avg. min. linear (dB):  {:.2}", stats.linear.min_db);
            println!("avg. max. linear (dB):  {:.2}", stats.linear.max_db);
            println!("avg. min. mel (dB):     {:.2}", stats.mel.min_db);
            println!("avg. max. mel (dB):     {:.2}", stats.mel.max_db);
        }

        Commands::ShowConfig => {
            println!("{}", config.to_json_pretty()?);
        }
    }

    Ok(())
}
