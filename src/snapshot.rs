//! Atomic snapshot replacement.
//!
//! Graphs are rebuilt from scratch on every batch. Readers hold an
//! `Arc` to whichever complete snapshot was current when they loaded it;
//! a rebuild swaps the pointer once it is finished.

use std::sync::Arc;

use parking_lot::RwLock;

#[derive(Debug)]
pub struct SnapshotCell<T> {
    current: RwLock<Arc<T>>,
}

impl<T> SnapshotCell<T> {
    pub fn new(initial: T) -> Self {
        Self { current: RwLock::new(Arc::new(initial)) }
    }

    /// The snapshot current right now.
    pub fn load(&self) -> Arc<T> {
        Arc::clone(&*self.current.read())
    }

    /// Install a new snapshot, returning the one it replaced.
    pub fn replace(&self, next: T) -> Arc<T> {
        let next = Arc::new(next);
        std::mem::replace(&mut *self.current.write(), next)
    }
}

impl<T: Default> Default for SnapshotCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
