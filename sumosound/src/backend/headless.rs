use super::{AudioBackend, BackendError, BackendResult, BufferId, BufferInfo, SourceHandle};
use crate::audio_data::{LoadOptions, SoundData, SoundLoader, SymphoniaLoader};
use crate::math::{Orientation, Vec3};
use std::collections::HashMap;

/// Configuration for a [`HeadlessBackend`].
#[derive(Debug, Clone)]
pub struct HeadlessBackendDesc {
    /// Maximum number of concurrently allocated sources (`None` = unlimited)
    pub max_sources: Option<usize>,
    /// Options handed to the loader for every buffer
    pub load_options: LoadOptions,
}

impl Default for HeadlessBackendDesc {
    fn default() -> Self {
        Self {
            max_sources: Some(256),
            load_options: LoadOptions::default(),
        }
    }
}

/// State of one allocated source, as last set by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessSource {
    pub buffer: BufferId,
    pub gain: f32,
    pub position: Vec3,
    pub velocity: Vec3,
    pub looping: bool,
    pub sample_offset: usize,
    pub playing: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessListener {
    pub position: Vec3,
    pub velocity: Vec3,
    pub orientation: Orientation,
    pub gain: f32,
}

impl Default for HeadlessListener {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            orientation: Orientation::default(),
            gain: 1.0,
        }
    }
}

struct HeadlessBuffer {
    file: String,
    data: SoundData,
}

/// Device-less backend that keeps the full source/listener state in memory.
///
/// Buffers are really decoded through a [`SoundLoader`], and the source
/// budget is really enforced, but nothing is ever rendered. This is what the
/// demo driver and the test-suite run against, and it is a faithful stand-in
/// for the capacity behaviour of a hardware-limited OpenAL device.
pub struct HeadlessBackend {
    desc: HeadlessBackendDesc,
    loader: Box<dyn SoundLoader>,
    buffers: HashMap<BufferId, HeadlessBuffer>,
    sources: HashMap<SourceHandle, HeadlessSource>,
    listener: HeadlessListener,
    next_id: u64,
    buffers_loaded: usize,
}

impl HeadlessBackend {
    /// Creates a backend that decodes files with Symphonia.
    pub fn new(desc: HeadlessBackendDesc) -> Self {
        Self::with_loader(desc, SymphoniaLoader)
    }

    pub fn with_loader(desc: HeadlessBackendDesc, loader: impl SoundLoader + 'static) -> Self {
        log::info!(
            "Headless audio backend ready (max sources: {:?})",
            desc.max_sources
        );
        Self {
            desc,
            loader: Box::new(loader),
            buffers: HashMap::new(),
            sources: HashMap::new(),
            listener: HeadlessListener::default(),
            next_id: 1,
            buffers_loaded: 0,
        }
    }

    pub fn max_sources(&self) -> Option<usize> {
        self.desc.max_sources
    }

    /// Number of currently allocated sources.
    pub fn active_sources(&self) -> usize {
        self.sources.len()
    }

    pub fn source(&self, handle: SourceHandle) -> Option<&HeadlessSource> {
        self.sources.get(&handle)
    }

    pub fn sources(&self) -> impl Iterator<Item = (SourceHandle, &HeadlessSource)> {
        self.sources.iter().map(|(handle, source)| (*handle, source))
    }

    /// Number of sources currently flagged as playing.
    pub fn playing_sources(&self) -> usize {
        self.sources.values().filter(|s| s.playing).count()
    }

    /// Number of buffers currently resident.
    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    /// Total number of decode calls over the lifetime of the backend.
    pub fn buffers_loaded(&self) -> usize {
        self.buffers_loaded
    }

    pub fn buffer_file(&self, buffer: BufferId) -> Option<&str> {
        self.buffers.get(&buffer).map(|b| b.file.as_str())
    }

    /// Decoded audio behind a resident buffer.
    pub fn buffer_data(&self, buffer: BufferId) -> Option<&SoundData> {
        self.buffers.get(&buffer).map(|b| &b.data)
    }

    pub fn listener(&self) -> &HeadlessListener {
        &self.listener
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn source_mut(&mut self, handle: SourceHandle) -> BackendResult<&mut HeadlessSource> {
        self.sources
            .get_mut(&handle)
            .ok_or(BackendError::UnknownSource(handle))
    }
}

impl AudioBackend for HeadlessBackend {
    fn create_buffer(&mut self, file: &str) -> BackendResult<BufferInfo> {
        let data = self
            .loader
            .load(file, &self.desc.load_options)
            .map_err(|e| BackendError::BufferLoad {
                file: file.to_string(),
                reason: e.to_string(),
            })?;
        if data.channels() != 1 {
            log::warn!(
                "{} has {} channels; only mono buffers are spatialized",
                file,
                data.channels()
            );
        }
        let id = BufferId(self.next_id());
        let frames = data.total_frames();
        log::debug!(
            "Loaded buffer {:?} from {} ({} frames, {} Hz, {:.2}s)",
            id,
            file,
            frames,
            data.sample_rate(),
            data.duration().as_secs_f32()
        );
        self.buffers.insert(
            id,
            HeadlessBuffer {
                file: file.to_string(),
                data,
            },
        );
        self.buffers_loaded += 1;
        Ok(BufferInfo { id, frames })
    }

    fn destroy_buffer(&mut self, buffer: BufferId) -> BackendResult<()> {
        if self.sources.values().any(|s| s.buffer == buffer) {
            return Err(BackendError::Device(format!(
                "buffer {:?} is still bound to a source",
                buffer
            )));
        }
        self.buffers
            .remove(&buffer)
            .map(|_| ())
            .ok_or(BackendError::UnknownBuffer(buffer))
    }

    fn create_source(&mut self, buffer: BufferId) -> BackendResult<SourceHandle> {
        if !self.buffers.contains_key(&buffer) {
            return Err(BackendError::UnknownBuffer(buffer));
        }
        if let Some(limit) = self.desc.max_sources {
            if self.sources.len() >= limit {
                return Err(BackendError::CapacityExhausted { limit: Some(limit) });
            }
        }
        let handle = SourceHandle(self.next_id());
        self.sources.insert(
            handle,
            HeadlessSource {
                buffer,
                gain: 1.0,
                position: Vec3::ZERO,
                velocity: Vec3::ZERO,
                looping: false,
                sample_offset: 0,
                playing: false,
            },
        );
        Ok(handle)
    }

    fn destroy_source(&mut self, source: SourceHandle) -> BackendResult<()> {
        self.sources
            .remove(&source)
            .map(|_| ())
            .ok_or(BackendError::UnknownSource(source))
    }

    fn set_source_gain(&mut self, source: SourceHandle, gain: f32) -> BackendResult<()> {
        self.source_mut(source)?.gain = gain;
        Ok(())
    }

    fn set_source_position(&mut self, source: SourceHandle, position: Vec3) -> BackendResult<()> {
        self.source_mut(source)?.position = position;
        Ok(())
    }

    fn set_source_velocity(&mut self, source: SourceHandle, velocity: Vec3) -> BackendResult<()> {
        self.source_mut(source)?.velocity = velocity;
        Ok(())
    }

    fn set_source_looping(&mut self, source: SourceHandle, looping: bool) -> BackendResult<()> {
        self.source_mut(source)?.looping = looping;
        Ok(())
    }

    fn set_source_sample_offset(
        &mut self,
        source: SourceHandle,
        offset: usize,
    ) -> BackendResult<()> {
        let buffer = self.source_mut(source)?.buffer;
        let frames = self
            .buffers
            .get(&buffer)
            .map(|b| b.data.total_frames())
            .ok_or(BackendError::UnknownBuffer(buffer))?;
        if offset >= frames.max(1) {
            return Err(BackendError::Device(format!(
                "sample offset {} out of range for {} frames",
                offset, frames
            )));
        }
        self.source_mut(source)?.sample_offset = offset;
        Ok(())
    }

    fn play_source(&mut self, source: SourceHandle) -> BackendResult<()> {
        self.source_mut(source)?.playing = true;
        Ok(())
    }

    fn pause_source(&mut self, source: SourceHandle) -> BackendResult<()> {
        self.source_mut(source)?.playing = false;
        Ok(())
    }

    fn set_listener_position(&mut self, position: Vec3) -> BackendResult<()> {
        self.listener.position = position;
        Ok(())
    }

    fn set_listener_velocity(&mut self, velocity: Vec3) -> BackendResult<()> {
        self.listener.velocity = velocity;
        Ok(())
    }

    fn set_listener_orientation(&mut self, orientation: Orientation) -> BackendResult<()> {
        self.listener.orientation = orientation;
        Ok(())
    }

    fn set_listener_gain(&mut self, gain: f32) -> BackendResult<()> {
        self.listener.gain = gain;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_data::SilenceLoader;

    fn backend(max_sources: Option<usize>) -> HeadlessBackend {
        HeadlessBackend::with_loader(
            HeadlessBackendDesc {
                max_sources,
                ..Default::default()
            },
            SilenceLoader::new(1000, 100),
        )
    }

    #[test]
    fn test_enforces_source_limit() {
        let mut backend = backend(Some(2));
        let buffer = backend.create_buffer("engine.wav").unwrap();
        let a = backend.create_source(buffer.id).unwrap();
        backend.create_source(buffer.id).unwrap();
        assert!(matches!(
            backend.create_source(buffer.id),
            Err(BackendError::CapacityExhausted { limit: Some(2) })
        ));

        backend.destroy_source(a).unwrap();
        assert!(backend.create_source(buffer.id).is_ok());
        assert_eq!(backend.active_sources(), 2);
    }

    #[test]
    fn test_buffer_keeps_decoded_audio() {
        let mut backend = backend(None);
        let buffer = backend.create_buffer("idle.wav").unwrap();
        let data = backend.buffer_data(buffer.id).unwrap();
        assert_eq!(data.sample_rate(), 1000);
        assert_eq!(data.channels(), 1);
        assert_eq!(data.samples().len(), 100);
        assert_eq!(buffer.frames, data.total_frames());

        backend.destroy_buffer(buffer.id).unwrap();
        assert!(backend.buffer_data(buffer.id).is_none());
    }

    #[test]
    fn test_sample_offset_bounded_by_buffer() {
        let mut backend = backend(None);
        let buffer = backend.create_buffer("tires.wav").unwrap();
        assert_eq!(buffer.frames, 100);
        let source = backend.create_source(buffer.id).unwrap();
        assert!(backend.set_source_sample_offset(source, 99).is_ok());
        assert!(backend.set_source_sample_offset(source, 100).is_err());
        assert_eq!(backend.source(source).unwrap().sample_offset, 99);
    }

    #[test]
    fn test_buffer_cannot_be_destroyed_while_bound() {
        let mut backend = backend(None);
        let buffer = backend.create_buffer("siren.wav").unwrap();
        let source = backend.create_source(buffer.id).unwrap();
        assert!(backend.destroy_buffer(buffer.id).is_err());
        backend.destroy_source(source).unwrap();
        assert!(backend.destroy_buffer(buffer.id).is_ok());
        assert_eq!(backend.buffer_count(), 0);
    }

    #[test]
    fn test_unknown_source_is_reported() {
        let mut backend = backend(None);
        assert!(matches!(
            backend.play_source(SourceHandle(42)),
            Err(BackendError::UnknownSource(SourceHandle(42)))
        ));
    }
}
