use std::collections::HashMap;
use std::sync::{Mutex, OnceLock, PoisonError};
use std::thread::ThreadId;

use super::SurfaceId;

/// Table of the canvas currently active on each thread.
///
/// At most one canvas is active per thread. Mismatched set/clear calls are
/// protocol violations: they are logged and execution continues with the most
/// recent acquire treated as authoritative.
#[derive(Debug, Default)]
pub struct ContextTracker {
    active: Mutex<HashMap<ThreadId, SurfaceId>>,
}

impl ContextTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide tracker used by [`ContextToken`](super::ContextToken).
    pub fn global() -> &'static ContextTracker {
        static GLOBAL: OnceLock<ContextTracker> = OnceLock::new();
        GLOBAL.get_or_init(ContextTracker::new)
    }

    /// Marks `surface` active on `thread`.
    ///
    /// Returns the stale identity that was overwritten, if a different canvas
    /// never released the thread.
    pub fn set_active(&self, thread: ThreadId, surface: SurfaceId) -> Option<SurfaceId> {
        let previous = self.table().insert(thread, surface);
        match previous {
            Some(prev) if prev != surface => {
                log::error!(
                    "context protocol violation on {thread:?}: {surface} acquired while {prev} \
                     was still active (missing release)"
                );
                Some(prev)
            }
            _ => None,
        }
    }

    /// Clears `surface` from `thread`.
    ///
    /// Returns `false` (after logging) when `surface` was not the active one;
    /// the entry is removed either way.
    pub fn clear_active(&self, thread: ThreadId, surface: SurfaceId) -> bool {
        let previous = self.table().remove(&thread);
        match previous {
            Some(prev) if prev == surface => true,
            Some(prev) => {
                log::error!(
                    "context protocol violation on {thread:?}: {surface} released while {prev} \
                     was active"
                );
                false
            }
            None => {
                log::error!(
                    "context protocol violation on {thread:?}: {surface} released without a \
                     matching acquire"
                );
                false
            }
        }
    }

    /// Canvas currently active on `thread`.
    pub fn active(&self, thread: ThreadId) -> Option<SurfaceId> {
        self.table().get(&thread).copied()
    }

    fn table(&self) -> std::sync::MutexGuard<'_, HashMap<ThreadId, SurfaceId>> {
        // Entries are plain ids; a poisoned table is still consistent.
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn set_then_clear_is_clean() {
        let tracker = ContextTracker::new();
        let me = thread::current().id();
        let id = SurfaceId::next();

        assert_eq!(tracker.set_active(me, id), None);
        assert_eq!(tracker.active(me), Some(id));
        assert!(tracker.clear_active(me, id));
        assert_eq!(tracker.active(me), None);
    }

    #[test]
    fn reacquiring_the_same_surface_is_not_a_violation() {
        let tracker = ContextTracker::new();
        let me = thread::current().id();
        let id = SurfaceId::next();

        tracker.set_active(me, id);
        assert_eq!(tracker.set_active(me, id), None);
    }

    #[test]
    fn missing_release_is_reported_and_overwritten() {
        let tracker = ContextTracker::new();
        let me = thread::current().id();
        let a = SurfaceId::next();
        let b = SurfaceId::next();

        tracker.set_active(me, a);
        assert_eq!(tracker.set_active(me, b), Some(a));
        assert_eq!(tracker.active(me), Some(b));
    }

    #[test]
    fn mismatched_or_unpaired_release_is_reported() {
        let tracker = ContextTracker::new();
        let me = thread::current().id();
        let a = SurfaceId::next();
        let b = SurfaceId::next();

        assert!(!tracker.clear_active(me, a));

        tracker.set_active(me, a);
        assert!(!tracker.clear_active(me, b));
        assert_eq!(tracker.active(me), None);
    }

    #[test]
    fn threads_are_tracked_independently() {
        let tracker = ContextTracker::new();
        let a = SurfaceId::next();
        let b = SurfaceId::next();
        let me = thread::current().id();

        tracker.set_active(me, a);
        thread::scope(|s| {
            s.spawn(|| {
                let other = thread::current().id();
                assert_eq!(tracker.active(other), None);
                assert_eq!(tracker.set_active(other, b), None);
                assert!(tracker.clear_active(other, b));
            });
        });
        assert_eq!(tracker.active(me), Some(a));
    }
}
