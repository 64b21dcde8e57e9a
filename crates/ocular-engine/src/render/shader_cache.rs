use std::collections::HashMap;
use std::ops::Deref;
use std::sync::Arc;

use super::ShaderProgram;

struct Entry<P> {
    program: Arc<P>,
    refs: usize,
}

/// Reference-counted programs shared by label within one GPU context.
///
/// `acquire` builds a program on first use and hands out further handles to
/// the same program afterwards; `release` drops the program once the last
/// handle is returned. Counts live in a side table, so reclamation never
/// depends on when handles happen to be dropped.
pub struct ShaderCache<P = ShaderProgram> {
    entries: HashMap<String, Entry<P>>,
}

/// Handle to a cached program. Return it with [`ShaderCache::release`].
pub struct Shared<P = ShaderProgram> {
    label: String,
    program: Arc<P>,
}

impl<P> Shared<P> {
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl<P> Deref for Shared<P> {
    type Target = P;

    fn deref(&self) -> &P {
        &self.program
    }
}

impl<P> Default for ShaderCache<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> ShaderCache<P> {
    pub fn new() -> Self {
        Self { entries: HashMap::new() }
    }

    /// Returns a handle to the program stored under `label`, building it with
    /// `factory` when absent. A failing factory leaves the cache unchanged.
    pub fn acquire<E>(
        &mut self,
        label: &str,
        factory: impl FnOnce() -> Result<P, E>,
    ) -> Result<Shared<P>, E> {
        if let Some(entry) = self.entries.get_mut(label) {
            entry.refs += 1;
            return Ok(Shared { label: label.to_string(), program: Arc::clone(&entry.program) });
        }

        let program = Arc::new(factory()?);
        self.entries.insert(
            label.to_string(),
            Entry { program: Arc::clone(&program), refs: 1 },
        );
        log::debug!("shader cache: built {label}");
        Ok(Shared { label: label.to_string(), program })
    }

    /// Returns a handle; destroys the program when it was the last one.
    ///
    /// Returns `true` when the program was destroyed.
    pub fn release(&mut self, handle: Shared<P>) -> bool {
        let Shared { label, program } = handle;
        drop(program);

        let Some(entry) = self.entries.get_mut(&label) else {
            log::warn!("shader cache: release of unknown program {label}");
            return false;
        };

        entry.refs -= 1;
        if entry.refs > 0 {
            return false;
        }

        self.entries.remove(&label);
        log::debug!("shader cache: destroyed {label}");
        true
    }

    /// Outstanding handles for `label` (0 when not cached).
    pub fn ref_count(&self, label: &str) -> usize {
        self.entries.get(label).map_or(0, |e| e.refs)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
