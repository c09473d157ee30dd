mod load_options;
mod loader;
mod symphonia_loader;

pub use load_options::{ConvertToMono, LoadOptions};
pub use loader::{SilenceLoader, SoundLoader};
pub use symphonia_loader::SymphoniaLoader;

use std::sync::Arc;
use std::time::Duration;

/// Decoded audio with reference-counted sharing.
///
/// Samples are stored **interleaved** (`[L0, R0, L1, R1, ...]`); mono data is
/// simply `[M0, M1, ...]`. Cloning is cheap and shares the sample storage.
#[derive(Debug, Clone)]
pub struct SoundData {
    inner: Arc<SoundDataInner>,
}

#[derive(Debug)]
struct SoundDataInner {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
    duration: Duration,
    /// `samples.len() / channels`
    total_frames: usize,
}

impl SoundData {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16, duration: Duration) -> Self {
        let total_frames = samples.len() / channels.max(1) as usize;
        Self {
            inner: Arc::new(SoundDataInner {
                samples,
                sample_rate,
                channels,
                duration,
                total_frames,
            }),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.inner.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.inner.channels
    }

    pub fn duration(&self) -> Duration {
        self.inner.duration
    }

    pub fn samples(&self) -> &[f32] {
        &self.inner.samples
    }

    pub fn total_frames(&self) -> usize {
        self.inner.total_frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_account_for_channels() {
        let data = SoundData::new(vec![0.0; 8], 48000, 2, Duration::ZERO);
        assert_eq!(data.total_frames(), 4);
        assert_eq!(data.samples().len(), 8);
    }

    #[test]
    fn test_silence_loader_produces_requested_length() {
        let data = SilenceLoader::new(8000, 400)
            .load("engine.wav", &LoadOptions::default())
            .unwrap();
        assert_eq!(data.total_frames(), 400);
        assert_eq!(data.channels(), 1);
        assert_eq!(data.duration().as_millis(), 50);
        assert!(data.samples().iter().all(|&s| s == 0.0));
    }
}
