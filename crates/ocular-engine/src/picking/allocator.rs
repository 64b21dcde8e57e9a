use super::{PickError, PickRegistry};

/// Pick id allocation with reuse.
///
/// Layers a free list of reclaimed ids over a [`PickRegistry`], which on its
/// own only ever issues fresh ids. Reclaimed ids are handed out again LIFO.
#[derive(Debug)]
pub struct PickIdAllocator<T> {
    registry: PickRegistry<T>,
    free: Vec<u32>,
}

impl<T> Default for PickIdAllocator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PickIdAllocator<T> {
    pub fn new() -> Self {
        Self { registry: PickRegistry::new(), free: Vec::new() }
    }

    /// Registers `value` under a reclaimed id, or a fresh one.
    pub fn allocate(&mut self, value: T) -> Result<u32, PickError> {
        let id = match self.free.pop() {
            Some(id) => id,
            None => self.registry.issue_id()?,
        };
        self.registry.register(id, value)?;
        Ok(id)
    }

    /// Releases `id` for reuse and returns its value.
    ///
    /// Unknown ids are ignored so a double reclaim cannot put an id on the
    /// free list twice.
    pub fn reclaim(&mut self, id: u32) -> Option<T> {
        let value = self.registry.remove(id)?;
        self.free.push(id);
        Some(value)
    }

    pub fn lookup(&self, id: u32) -> Option<&T> {
        self.registry.lookup(id)
    }

    pub fn registry(&self) -> &PickRegistry<T> {
        &self.registry
    }

    /// Number of ids waiting for reuse.
    pub fn free_len(&self) -> usize {
        self.free.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reclaimed_ids_are_reused_last_in_first_out() {
        let mut ids = PickIdAllocator::new();
        let a = ids.allocate("a").unwrap();
        let b = ids.allocate("b").unwrap();

        assert_eq!(ids.reclaim(a), Some("a"));
        assert_eq!(ids.reclaim(b), Some("b"));

        assert_eq!(ids.allocate("c").unwrap(), b);
        assert_eq!(ids.allocate("d").unwrap(), a);
        assert_eq!(ids.free_len(), 0);
    }

    #[test]
    fn reclaimed_id_is_not_resolvable() {
        let mut ids = PickIdAllocator::new();
        let a = ids.allocate(7).unwrap();
        ids.reclaim(a);
        assert_eq!(ids.lookup(a), None);
    }

    #[test]
    fn double_reclaim_does_not_duplicate_free_entries() {
        let mut ids = PickIdAllocator::new();
        let a = ids.allocate(()).unwrap();
        assert!(ids.reclaim(a).is_some());
        assert!(ids.reclaim(a).is_none());
        assert_eq!(ids.free_len(), 1);
    }

    #[test]
    fn fresh_ids_continue_after_reuse() {
        let mut ids = PickIdAllocator::new();
        let a = ids.allocate(1).unwrap();
        ids.reclaim(a);
        let reused = ids.allocate(2).unwrap();
        let fresh = ids.allocate(3).unwrap();
        assert_eq!(reused, a);
        assert_eq!(fresh, a + 1);
        assert_eq!(ids.registry().len(), 2);
    }
}
