use crate::audio_data::{LoadOptions, SoundData};
use crate::error::Result;
use std::time::Duration;

/// Trait for turning a file identifier into decoded audio.
///
/// The headless backend calls this once per distinct file; the buffer cache
/// makes sure the same file is never decoded twice in a session.
pub trait SoundLoader {
    fn load(&self, file: &str, options: &LoadOptions) -> Result<SoundData>;
}

/// Loader that ignores the file contents and produces silent mono buffers.
///
/// Useful when a scenario should run without any sound assets on disk, and
/// in tests where only the lifecycle of sources matters.
#[derive(Debug, Clone, Copy)]
pub struct SilenceLoader {
    pub sample_rate: u32,
    pub frames: usize,
}

impl SilenceLoader {
    pub fn new(sample_rate: u32, frames: usize) -> Self {
        Self {
            sample_rate,
            frames,
        }
    }
}

impl Default for SilenceLoader {
    fn default() -> Self {
        Self::new(44100, 44100)
    }
}

impl SoundLoader for SilenceLoader {
    fn load(&self, _file: &str, _options: &LoadOptions) -> Result<SoundData> {
        let duration = Duration::from_secs_f64(self.frames as f64 / self.sample_rate as f64);
        Ok(SoundData::new(
            vec![0.0; self.frames],
            self.sample_rate,
            1,
            duration,
        ))
    }
}
