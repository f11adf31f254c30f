use crate::Id;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic generator for student and activity ids.
///
/// The allocator is owned by the collection the ids belong to (see [`State`](crate::state::State))
/// and is reset to `max(existing) + 1` whenever that collection changes wholesale. It may be
/// shared between threads; every call of `next_id()` yields a distinct id.
#[derive(Debug)]
pub struct IdAllocator {
    next: AtomicU64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(start: Id) -> Self {
        Self {
            next: AtomicU64::new(start),
        }
    }

    /// Return the id the next call of `next_id()` will hand out, without consuming it
    pub fn current_id(&self) -> Id {
        self.next.load(Ordering::SeqCst)
    }

    pub fn next_id(&self) -> Id {
        self.next.fetch_add(1, Ordering::SeqCst)
    }

    pub fn reset(&self, start: Id) {
        self.next.store(start, Ordering::SeqCst);
    }

    /// Reset the allocator to continue after the largest of the given ids (or at 1, if there are
    /// none)
    pub fn reset_after<I: IntoIterator<Item = Id>>(&self, existing: I) {
        self.reset(existing.into_iter().max().unwrap_or(0) + 1);
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
