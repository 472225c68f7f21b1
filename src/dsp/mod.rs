pub mod conversion;
pub mod features;
pub mod fft;
pub mod griffin_lim;
pub mod phase_vocoder;
pub mod pitch_shift;
pub mod time_stretch;
pub mod trim;

#[cfg(test)]
pub(crate) mod test_signals;
