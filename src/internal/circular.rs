//! Circular dependency and depth checks for nested construction.

use std::cell::RefCell;

use crate::error::{RegistryError, RegistryResult};
use crate::key::Key;

/// Keys currently under construction, outermost first.
///
/// Owned by a single registry. Only consulted when cycle detection or a
/// depth limit is configured.
#[derive(Default)]
pub(crate) struct ResolutionStack {
    frames: RefCell<Vec<Key>>,
}

impl ResolutionStack {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Pushes `key`, failing if it is already being built (when
    /// `detect_cycles`) or if the stack is `max_depth` deep.
    pub(crate) fn enter(
        &self,
        key: Key,
        detect_cycles: bool,
        max_depth: Option<usize>,
    ) -> RegistryResult<StackGuard<'_>> {
        let mut frames = self.frames.borrow_mut();

        // Circular detection BEFORE pushing the new key
        if detect_cycles && frames.contains(&key) {
            let mut path: Vec<&'static str> = frames.iter().map(|k| k.display_name()).collect();
            path.push(key.display_name());
            return Err(RegistryError::Circular(path));
        }

        if let Some(limit) = max_depth {
            if frames.len() >= limit {
                return Err(RegistryError::DepthExceeded(limit));
            }
        }

        frames.push(key);
        Ok(StackGuard { stack: self, key })
    }

    pub(crate) fn depth(&self) -> usize {
        self.frames.borrow().len()
    }
}

/// Pops its frame on drop, including during unwinding out of a constructor.
pub(crate) struct StackGuard<'a> {
    stack: &'a ResolutionStack,
    key: Key,
}

impl Drop for StackGuard<'_> {
    fn drop(&mut self) {
        let popped = self.stack.frames.borrow_mut().pop();
        debug_assert_eq!(popped, Some(self.key));
    }
}
