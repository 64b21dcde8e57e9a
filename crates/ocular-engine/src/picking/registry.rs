use std::collections::HashMap;

use thiserror::Error;

use super::encoding::{ALPHA_MASK, KEY_MASK, NOTHING};

/// First id issued by a fresh registry.
pub const FIRST_ID: u32 = ALPHA_MASK | 0x0000_0001;

/// Picking registry misuse. The registry is left unchanged.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PickError {
    #[error("pick id {0:#010x} is not opaque (top byte must be 0xFF)")]
    NotOpaque(u32),

    #[error("pick id {0:#010x} is reserved for \"nothing\"")]
    Reserved(u32),

    #[error("pick id space exhausted")]
    Exhausted,
}

/// Maps opaque pick ids to application objects for one canvas.
///
/// Ids are issued from a monotonically increasing counter; the registry itself
/// never reuses them (see [`PickIdAllocator`](super::PickIdAllocator)).
#[derive(Debug)]
pub struct PickRegistry<T> {
    next: Option<u32>,
    entries: HashMap<u32, T>,
}

impl<T> Default for PickRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PickRegistry<T> {
    pub fn new() -> Self {
        Self { next: Some(FIRST_ID), entries: HashMap::new() }
    }

    /// Returns the next unused id.
    pub fn issue_id(&mut self) -> Result<u32, PickError> {
        let id = self.next.ok_or(PickError::Exhausted)?;
        self.next = id.checked_add(1);
        Ok(id)
    }

    /// Associates `value` with `id`, replacing any previous value.
    pub fn register(&mut self, id: u32, value: T) -> Result<Option<T>, PickError> {
        let key = validate(id)?;
        Ok(self.entries.insert(key, value))
    }

    /// Issues a fresh id and registers `value` under it.
    pub fn insert(&mut self, value: T) -> Result<u32, PickError> {
        let id = self.issue_id()?;
        self.entries.insert(id & KEY_MASK, value);
        Ok(id)
    }

    /// Object registered under `id`.
    ///
    /// Accepts the full opaque id as read from the pick attachment or its
    /// 24-bit key. Transparent values resolve to `None`.
    pub fn lookup(&self, id: u32) -> Option<&T> {
        if id == NOTHING || (id & ALPHA_MASK != 0 && id & ALPHA_MASK != ALPHA_MASK) {
            return None;
        }
        self.entries.get(&(id & KEY_MASK))
    }

    /// Forgets `id`; subsequent lookups return `None`.
    pub fn remove(&mut self, id: u32) -> Option<T> {
        self.entries.remove(&(id & KEY_MASK))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn validate(id: u32) -> Result<u32, PickError> {
    if id & ALPHA_MASK != ALPHA_MASK {
        return Err(PickError::NotOpaque(id));
    }
    let key = id & KEY_MASK;
    if key == 0 {
        return Err(PickError::Reserved(id));
    }
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_start_above_the_transparent_range_and_increase() {
        let mut reg = PickRegistry::<()>::new();
        let a = reg.issue_id().unwrap();
        let b = reg.issue_id().unwrap();
        assert_eq!(a, 0xFF00_0001);
        assert_eq!(b, a + 1);
    }

    #[test]
    fn register_rejects_non_opaque_ids() {
        let mut reg = PickRegistry::new();
        assert_eq!(reg.register(0x0000_1234, "x"), Err(PickError::NotOpaque(0x0000_1234)));
        assert_eq!(reg.register(0x7F00_1234, "x"), Err(PickError::NotOpaque(0x7F00_1234)));
        assert!(reg.is_empty());
    }

    #[test]
    fn register_rejects_zero_key() {
        let mut reg = PickRegistry::new();
        assert_eq!(reg.register(0, "x"), Err(PickError::NotOpaque(0)));
        assert_eq!(reg.register(0xFF00_0000, "x"), Err(PickError::Reserved(0xFF00_0000)));
    }

    #[test]
    fn lookup_resolves_full_and_masked_ids() {
        let mut reg = PickRegistry::new();
        reg.register(0xFF00_1234, "quad").unwrap();
        assert_eq!(reg.lookup(0xFF00_1234), Some(&"quad"));
        assert_eq!(reg.lookup(0x0000_1234), Some(&"quad"));
        assert_eq!(reg.lookup(0x8000_1234), None);
        assert_eq!(reg.lookup(0), None);
    }

    #[test]
    fn lookup_of_unknown_or_removed_id_is_absent() {
        let mut reg = PickRegistry::new();
        let id = reg.insert("a").unwrap();
        assert_eq!(reg.lookup(id + 1), None);
        assert_eq!(reg.remove(id), Some("a"));
        assert_eq!(reg.lookup(id), None);
    }

    #[test]
    fn failed_register_keeps_existing_entries() {
        let mut reg = PickRegistry::new();
        let id = reg.insert(1).unwrap();
        assert!(reg.register(0x0100_0000 | (id & KEY_MASK), 2).is_err());
        assert_eq!(reg.lookup(id), Some(&1));
    }

    #[test]
    fn exhausting_the_id_space_is_an_error() {
        let mut reg = PickRegistry::<()>::new();
        reg.next = Some(u32::MAX);
        assert_eq!(reg.issue_id(), Ok(u32::MAX));
        assert_eq!(reg.issue_id(), Err(PickError::Exhausted));
        assert_eq!(reg.issue_id(), Err(PickError::Exhausted));
    }
}
