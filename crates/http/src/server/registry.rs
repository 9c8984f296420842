use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::connection::HandlerHandle;

/// The live request handlers of a server, keyed by connection id.
#[derive(Debug, Default)]
pub(crate) struct HandlerRegistry {
    handlers: Mutex<HashMap<u64, HandlerHandle>>,
    accepted: AtomicU64,
}

impl HandlerRegistry {
    pub(crate) fn register(&self, handle: HandlerHandle) {
        self.accepted.fetch_add(1, Ordering::Relaxed);
        self.lock().insert(handle.id(), handle);
    }

    /// Removes a handler whose loop has ended.
    pub(crate) fn done(&self, id: u64) {
        self.lock().remove(&id);
    }

    /// Cancels every registered handler, returning how many were cancelled by this call.
    pub(crate) fn cancel_all(&self) -> usize {
        self.lock().values().filter(|handle| handle.cancel()).count()
    }

    /// Total number of handlers ever registered.
    pub(crate) fn accepted(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<u64, HandlerHandle>> {
        self.handlers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
