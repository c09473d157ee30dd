//! Session-wide cache of decoded buffers, keyed by file identifier.

use crate::backend::{BufferInfo, SharedBackend};
use crate::error::Result;
use std::collections::HashMap;

/// Get-or-insert cache that makes every distinct sound file load exactly once.
///
/// Entries are never replaced once inserted, so a [`BufferInfo`] handed out
/// stays valid for as long as the cache lives. Dropping the cache destroys
/// every buffer it created in the backend.
pub struct BufferCache {
    backend: SharedBackend,
    entries: HashMap<String, BufferInfo>,
}

impl BufferCache {
    pub fn new(backend: SharedBackend) -> Self {
        Self {
            backend,
            entries: HashMap::new(),
        }
    }

    /// Returns the buffer for `file`, loading it through the backend on first use.
    pub fn get_or_load(&mut self, file: &str) -> Result<BufferInfo> {
        if let Some(info) = self.entries.get(file) {
            return Ok(*info);
        }
        let info = self.backend.borrow_mut().create_buffer(file)?;
        log::debug!("Cached buffer {:?} for {}", info.id, file);
        self.entries.insert(file.to_string(), info);
        Ok(info)
    }

    pub fn get(&self, file: &str) -> Option<BufferInfo> {
        self.entries.get(file).copied()
    }

    pub fn contains(&self, file: &str) -> bool {
        self.entries.contains_key(file)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Drop for BufferCache {
    fn drop(&mut self) {
        let Ok(mut backend) = self.backend.try_borrow_mut() else {
            log::warn!("Backend busy while releasing buffer cache; buffers leaked");
            return;
        };
        for (file, info) in self.entries.drain() {
            if let Err(e) = backend.destroy_buffer(info.id) {
                log::warn!("Failed to release buffer for {}: {}", file, e);
            }
        }
    }
}
