//! A single positional sound belonging to an emitter.

use crate::backend::{BufferInfo, SharedBackend, SourceHandle};
use crate::context::AudioContext;
use crate::error::Result;
use crate::math::Vec3;
use rand::Rng;

/// One looping (or one-shot) sound attached to an emitter.
///
/// A `SoundSource` is created *disabled*: it references a shared buffer but
/// holds no backend source. [`enable`](Self::enable) allocates a backend
/// source and replays the cached state onto it; [`disable`](Self::disable)
/// gives the backend source back while keeping that state, so a
/// disable/enable cycle is invisible apart from the new start offset.
///
/// Setters work in every state. They always update the cached value and only
/// reach the backend while enabled.
pub struct SoundSource {
    backend: SharedBackend,
    file: String,
    buffer: BufferInfo,
    base_gain: f32,
    relative_offset: Vec3,
    looping: bool,
    randomize_offset: bool,
    handle: Option<SourceHandle>,
    gain: f32,
    position: Vec3,
    velocity: Vec3,
    playing: bool,
}

impl SoundSource {
    /// Creates a looping source for `file`, loading the buffer through the
    /// context's cache if this is the first use of the file.
    pub fn new(context: &AudioContext, file: &str, base_gain: f32) -> Result<Self> {
        let buffer = context.buffer(file)?;
        Ok(Self {
            backend: context.backend().clone(),
            file: file.to_string(),
            buffer,
            base_gain,
            relative_offset: Vec3::ZERO,
            looping: true,
            randomize_offset: true,
            handle: None,
            gain: 1.0,
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            playing: false,
        })
    }

    /// Position of the sound relative to its emitter's origin.
    pub fn with_relative_offset(mut self, offset: Vec3) -> Self {
        self.relative_offset = offset;
        self
    }

    /// Sets the loop flag. The randomized start offset follows the loop flag
    /// unless overridden afterwards with [`with_randomized_offset`](Self::with_randomized_offset).
    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self.randomize_offset = looping;
        self
    }

    /// Starts playback at a random frame on every enable, so identical
    /// looping sounds on neighbouring emitters do not phase-lock.
    pub fn with_randomized_offset(mut self, randomize: bool) -> Self {
        self.randomize_offset = randomize;
        self
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn base_gain(&self) -> f32 {
        self.base_gain
    }

    pub fn relative_offset(&self) -> Vec3 {
        self.relative_offset
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn randomizes_offset(&self) -> bool {
        self.randomize_offset
    }

    pub fn is_enabled(&self) -> bool {
        self.handle.is_some()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Backend handle while enabled.
    pub fn handle(&self) -> Option<SourceHandle> {
        self.handle
    }

    /// Gain actually sent to the backend (`base_gain * gain`).
    pub fn effective_gain(&self) -> f32 {
        self.base_gain * self.gain
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// Acquires a backend source and replays the cached state onto it.
    ///
    /// Fails with [`SumoSoundError::BackendCapacity`](crate::SumoSoundError::BackendCapacity)
    /// when the backend has no free source. On any failure the source is left
    /// disabled and no backend source is leaked.
    pub fn enable(&mut self) -> Result<()> {
        if self.handle.is_some() {
            return Ok(());
        }
        let handle = self.backend.borrow_mut().create_source(self.buffer.id)?;
        if let Err(e) = self.configure(handle) {
            if let Err(release) = self.backend.borrow_mut().destroy_source(handle) {
                log::warn!("Failed to release {} after setup error: {}", handle, release);
            }
            return Err(e);
        }
        self.handle = Some(handle);
        log::debug!("Enabled {} for {}", handle, self.file);
        Ok(())
    }

    fn configure(&self, handle: SourceHandle) -> Result<()> {
        let mut backend = self.backend.borrow_mut();
        backend.set_source_looping(handle, self.looping)?;
        if self.randomize_offset && self.buffer.frames > 0 {
            let offset = rand::thread_rng().gen_range(0..self.buffer.frames);
            backend.set_source_sample_offset(handle, offset)?;
        }
        backend.set_source_gain(handle, self.effective_gain())?;
        backend.set_source_position(handle, self.position)?;
        backend.set_source_velocity(handle, self.velocity)?;
        if self.playing {
            backend.play_source(handle)?;
        }
        Ok(())
    }

    /// Releases the backend source, keeping all cached state.
    pub fn disable(&mut self) -> Result<()> {
        if let Some(handle) = self.handle.take() {
            self.backend.borrow_mut().destroy_source(handle)?;
            log::debug!("Disabled {} for {}", handle, self.file);
        }
        Ok(())
    }

    pub fn play(&mut self) -> Result<()> {
        self.playing = true;
        if let Some(handle) = self.handle {
            self.backend.borrow_mut().play_source(handle)?;
        }
        Ok(())
    }

    pub fn pause(&mut self) -> Result<()> {
        self.playing = false;
        if let Some(handle) = self.handle {
            self.backend.borrow_mut().pause_source(handle)?;
        }
        Ok(())
    }

    /// Sets the modulation gain, applied on top of the base gain.
    pub fn set_gain(&mut self, gain: f32) -> Result<()> {
        self.gain = gain;
        if let Some(handle) = self.handle {
            self.backend
                .borrow_mut()
                .set_source_gain(handle, self.base_gain * gain)?;
        }
        Ok(())
    }

    /// Sets the absolute position of the sound.
    pub fn set_position(&mut self, position: Vec3) -> Result<()> {
        self.position = position;
        if let Some(handle) = self.handle {
            self.backend
                .borrow_mut()
                .set_source_position(handle, position)?;
        }
        Ok(())
    }

    /// Sets the absolute velocity of the sound.
    pub fn set_velocity(&mut self, velocity: Vec3) -> Result<()> {
        self.velocity = velocity;
        if let Some(handle) = self.handle {
            self.backend
                .borrow_mut()
                .set_source_velocity(handle, velocity)?;
        }
        Ok(())
    }
}

impl Drop for SoundSource {
    fn drop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        match self.backend.try_borrow_mut() {
            Ok(mut backend) => {
                if let Err(e) = backend.destroy_source(handle) {
                    log::warn!("Failed to release {} for {}: {}", handle, self.file, e);
                }
            }
            Err(_) => log::warn!("Backend busy; leaked {} for {}", handle, self.file),
        }
    }
}

impl std::fmt::Debug for SoundSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoundSource")
            .field("file", &self.file)
            .field("base_gain", &self.base_gain)
            .field("relative_offset", &self.relative_offset)
            .field("looping", &self.looping)
            .field("handle", &self.handle)
            .field("gain", &self.gain)
            .field("position", &self.position)
            .field("velocity", &self.velocity)
            .field("playing", &self.playing)
            .finish()
    }
}
