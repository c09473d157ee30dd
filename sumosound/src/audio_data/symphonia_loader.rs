use crate::{
    audio_data::{ConvertToMono, LoadOptions, SoundData, SoundLoader},
    error::{Result, SumoSoundError},
};
use std::fs::File;
use std::path::Path;
use std::time::Duration;
use symphonia::{
    core::{
        audio::SampleBuffer, codecs::DecoderOptions, errors::Error, formats::FormatOptions,
        io::MediaSourceStream, meta::MetadataOptions, probe::Hint,
    },
    default::{get_codecs, get_probe},
};

/// Loader that decodes sound files with Symphonia.
///
/// Supports whatever formats the default Symphonia registry handles (WAV,
/// FLAC, OGG, MP3, ...). Samples are decoded to interleaved `f32`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SymphoniaLoader;

impl SoundLoader for SymphoniaLoader {
    fn load(&self, file: &str, options: &LoadOptions) -> Result<SoundData> {
        let handle = File::open(file)?;
        let mss = MediaSourceStream::new(Box::new(handle), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = Path::new(file).extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| {
                SumoSoundError::AudioLoading(format!("Unrecognized audio format in {}: {:?}", file, e))
            })?;

        let mut format = probed.format;

        let track = format.default_track().ok_or_else(|| {
            SumoSoundError::AudioLoading(format!("No default audio track in {}", file))
        })?;
        let track_id = track.id;

        let sample_rate = track
            .codec_params
            .sample_rate
            .ok_or_else(|| SumoSoundError::AudioLoading("Sample rate not found".to_string()))?;

        let channels = track
            .codec_params
            .channels
            .ok_or_else(|| SumoSoundError::AudioLoading("Channel count not found".to_string()))?
            .count() as u16;

        let mut decoder = get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| {
                SumoSoundError::AudioLoading(format!("Failed to create decoder: {:?}", e))
            })?;

        let mut samples: Vec<f32> = Vec::new();

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(Error::IoError(_)) => break, // end-of-file
                Err(e) => {
                    return Err(SumoSoundError::AudioLoading(format!(
                        "Error reading packet: {:?}",
                        e
                    )));
                }
            };
            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(Error::IoError(_)) => break,
                Err(Error::DecodeError(_)) => continue, // recoverable corruption
                Err(e) => {
                    return Err(SumoSoundError::AudioLoading(format!(
                        "Error decoding packet: {:?}",
                        e
                    )));
                }
            };

            let spec = *decoded.spec();
            let mut tmp = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
            tmp.copy_interleaved_ref(decoded);
            samples.extend_from_slice(tmp.samples());
        }

        let (final_samples, final_channels) = match options.convert_to_mono {
            ConvertToMono::Original => (samples, channels),
            ConvertToMono::ForceMono if channels == 1 => (samples, 1),
            ConvertToMono::ForceMono => (downmix(&samples, channels), 1),
        };

        let duration = Duration::from_secs_f64(
            final_samples.len() as f64 / (sample_rate * final_channels as u32) as f64,
        );

        log::debug!(
            "Decoded {} ({} Hz, {} ch, {:?})",
            file,
            sample_rate,
            final_channels,
            duration
        );

        Ok(SoundData::new(
            final_samples,
            sample_rate,
            final_channels,
            duration,
        ))
    }
}

/// Averages interleaved frames down to a single channel.
fn downmix(samples: &[f32], channels: u16) -> Vec<f32> {
    samples
        .chunks(channels as usize)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downmix_averages_frames() {
        let stereo = [1.0, 0.0, 0.5, 0.5, -1.0, 1.0];
        assert_eq!(downmix(&stereo, 2), vec![0.5, 0.5, 0.0]);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = SymphoniaLoader
            .load("does/not/exist.wav", &LoadOptions::default())
            .unwrap_err();
        assert!(matches!(err, SumoSoundError::Io(_)));
    }
}
