//! Integer handles for values owned on this side of the plugin boundary.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{Result, WcxError};

/// Opaque value handed to the host. Never zero.
pub type Handle = usize;

/// Maps handles to owned values.
///
/// The map lock is held only while inserting, looking up or removing; each
/// value sits behind its own mutex so independent handles never contend.
pub struct HandleRegistry<T> {
    next_id: AtomicUsize,
    entries: Mutex<HashMap<Handle, Arc<Mutex<T>>>>,
}

impl<T> HandleRegistry<T> {
    pub fn new() -> Self {
        HandleRegistry {
            next_id: AtomicUsize::new(1),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Take ownership of `value` and return a fresh handle. Handles are not reused.
    pub fn allocate(&self, value: T) -> Handle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.entries.lock().insert(id, Arc::new(Mutex::new(value)));
        id
    }

    pub fn resolve(&self, handle: Handle) -> Result<Arc<Mutex<T>>> {
        self.entries
            .lock()
            .get(&handle)
            .cloned()
            .ok_or(WcxError::InvalidHandle(handle))
    }

    /// Remove the handle. Calls already holding the value keep it alive until they return.
    pub fn release(&self, handle: Handle) -> Result<Arc<Mutex<T>>> {
        self.entries
            .lock()
            .remove(&handle)
            .ok_or(WcxError::InvalidHandle(handle))
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for HandleRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}
