use std::fmt;
use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique, nonzero identity of a canvas.
///
/// Issued from a monotonic counter; an id is never handed out twice.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(NonZeroU64);

impl SurfaceId {
    /// Issues a fresh identity.
    pub fn next() -> Self {
        let raw = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        // The counter starts at 1 and 2^64 increments are out of reach.
        Self(NonZeroU64::new(raw).unwrap_or(NonZeroU64::MAX))
    }

    #[inline]
    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "surface#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_increasing() {
        let a = SurfaceId::next();
        let b = SurfaceId::next();
        assert_ne!(a, b);
        assert!(b > a);
        assert!(a.get() > 0);
    }
}
