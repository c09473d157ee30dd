//! The audio-engine seam.
//!
//! SumoSound never mixes or spatializes audio itself. Everything that touches
//! the audio device goes through [`AudioBackend`], whose surface mirrors an
//! OpenAL-style engine: shared buffers, sources bound to buffers, and a single
//! listener.

mod headless;

pub use headless::{HeadlessBackend, HeadlessBackendDesc, HeadlessListener, HeadlessSource};

use crate::math::{Orientation, Vec3};
use std::cell::RefCell;
use std::rc::Rc;
use thiserror::Error;

/// Backend handle for a decoded buffer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BufferId(pub u64);

/// Backend handle for a playing voice bound to a buffer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SourceHandle(pub u64);

impl std::fmt::Display for SourceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SourceHandle({})", self.0)
    }
}

/// What the backend reports about a freshly created buffer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BufferInfo {
    pub id: BufferId,
    /// Length of the buffer in sample frames; bounds random start offsets.
    pub frames: usize,
}

#[derive(Error, Debug)]
pub enum BackendError {
    /// No more concurrent sources can be allocated.
    #[error("source capacity exhausted (limit: {limit:?})")]
    CapacityExhausted { limit: Option<usize> },

    #[error("unknown buffer {0:?}")]
    UnknownBuffer(BufferId),

    #[error("unknown source {0}")]
    UnknownSource(SourceHandle),

    #[error("failed to load '{file}': {reason}")]
    BufferLoad { file: String, reason: String },

    #[error("device error: {0}")]
    Device(String),
}

pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Operations SumoSound needs from an audio engine.
pub trait AudioBackend {
    fn create_buffer(&mut self, file: &str) -> BackendResult<BufferInfo>;
    fn destroy_buffer(&mut self, buffer: BufferId) -> BackendResult<()>;

    /// Allocates a source bound to `buffer`.
    ///
    /// Must fail with [`BackendError::CapacityExhausted`] when the engine's
    /// concurrent-source budget is used up.
    fn create_source(&mut self, buffer: BufferId) -> BackendResult<SourceHandle>;
    fn destroy_source(&mut self, source: SourceHandle) -> BackendResult<()>;

    fn set_source_gain(&mut self, source: SourceHandle, gain: f32) -> BackendResult<()>;
    fn set_source_position(&mut self, source: SourceHandle, position: Vec3) -> BackendResult<()>;
    fn set_source_velocity(&mut self, source: SourceHandle, velocity: Vec3) -> BackendResult<()>;
    fn set_source_looping(&mut self, source: SourceHandle, looping: bool) -> BackendResult<()>;
    fn set_source_sample_offset(&mut self, source: SourceHandle, offset: usize)
    -> BackendResult<()>;
    fn play_source(&mut self, source: SourceHandle) -> BackendResult<()>;
    fn pause_source(&mut self, source: SourceHandle) -> BackendResult<()>;

    fn set_listener_position(&mut self, position: Vec3) -> BackendResult<()>;
    fn set_listener_velocity(&mut self, velocity: Vec3) -> BackendResult<()>;
    fn set_listener_orientation(&mut self, orientation: Orientation) -> BackendResult<()>;
    fn set_listener_gain(&mut self, gain: f32) -> BackendResult<()>;
}

/// Single-threaded shared handle to the session's backend.
pub type SharedBackend = Rc<RefCell<dyn AudioBackend>>;
