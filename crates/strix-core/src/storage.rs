use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Shared, reference-counted tensor storage.
///
/// Views produced by slice/transpose/broadcast hold clones of the same
/// handle, so a write through one view is visible through every other view of
/// the buffer. The buffer lives as long as the longest-living view.
#[derive(Debug, Clone)]
pub struct Storage {
    data: Arc<RwLock<Vec<f64>>>,
}

impl Storage {
    /// Wrap an existing buffer.
    pub fn new(data: Vec<f64>) -> Self {
        Self {
            data: Arc::new(RwLock::new(data)),
        }
    }

    /// Allocate `len` zeros.
    pub fn zeros(len: usize) -> Self {
        Self::new(vec![0.0; len])
    }

    /// Number of physical elements in the buffer.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Vec<f64>> {
        self.data.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Vec<f64>> {
        self.data.write()
    }

    /// Whether two handles refer to the same buffer.
    pub fn same_buffer(&self, other: &Storage) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    /// Number of live handles to this buffer.
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.data)
    }

    /// Read two buffers at once, taking a single guard when they alias.
    pub fn read_pair<R>(a: &Storage, b: &Storage, f: impl FnOnce(&[f64], &[f64]) -> R) -> R {
        if a.same_buffer(b) {
            let guard = a.read();
            f(&guard, &guard)
        } else {
            let ga = a.read();
            let gb = b.read();
            f(&ga, &gb)
        }
    }
}
