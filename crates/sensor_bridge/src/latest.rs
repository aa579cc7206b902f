//! Name → latest decoded frame, overwritten rather than queued.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use contracts::Frame;

/// Shared store of the most recent frame per sensor name.
///
/// Writers are sensor delivery threads; readers take a snapshot and never
/// observe later updates through it.
#[derive(Debug, Clone, Default)]
pub struct LatestFrames {
    inner: Arc<RwLock<HashMap<String, Frame>>>,
}

impl LatestFrames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self, name: &str, frame: Frame) {
        let mut frames = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        frames.insert(name.to_string(), frame);
    }

    /// Copy of every latest frame
    pub fn snapshot(&self) -> HashMap<String, Frame> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn get(&self, name: &str) -> Option<Frame> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    pub fn remove(&self, name: &str) -> Option<Frame> {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
    }

    pub fn clear(&self) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
