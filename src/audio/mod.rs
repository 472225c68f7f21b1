pub mod wav;

pub use wav::{load_wav, save_wav, save_wav_pcm16};
