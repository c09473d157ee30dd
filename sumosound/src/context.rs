use crate::backend::{BufferInfo, SharedBackend};
use crate::buffer_cache::BufferCache;
use crate::error::Result;
use std::cell::RefCell;
use std::rc::Rc;

/// Cheaply cloneable handle to the session's backend and buffer cache.
///
/// Everything that allocates audio resources (sound sources, emitters, the
/// listener) holds one of these. All clones share the same cache, so a file is
/// decoded once no matter which emitter asks for it first.
#[derive(Clone)]
pub struct AudioContext {
    backend: SharedBackend,
    buffers: Rc<RefCell<BufferCache>>,
}

impl AudioContext {
    pub fn new(backend: SharedBackend) -> Self {
        let buffers = Rc::new(RefCell::new(BufferCache::new(backend.clone())));
        Self { backend, buffers }
    }

    pub fn backend(&self) -> &SharedBackend {
        &self.backend
    }

    pub fn buffer(&self, file: &str) -> Result<BufferInfo> {
        self.buffers.borrow_mut().get_or_load(file)
    }

    /// Number of distinct files loaded so far.
    pub fn cached_buffers(&self) -> usize {
        self.buffers.borrow().len()
    }
}
