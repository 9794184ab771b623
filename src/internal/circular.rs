//! Circular dependency detection infrastructure.

use std::cell::RefCell;

use tracing::debug;

use super::FastSet;
use crate::error::{DiError, DiResult};
use crate::key::ServiceId;

/// Default bound on nested resolutions.
///
/// Every level costs several frames (resolve, binding or constructor, user
/// closure), so the bound stays well below what a 2 MiB thread stack can
/// hold in a debug build. Deeper graphs need both a larger stack and
/// [`ContainerConfig::with_max_depth`](crate::ContainerConfig::with_max_depth).
pub(crate) const MAX_DEPTH: usize = 64;

/// In-flight resolution state shared by one logical resolution call tree.
///
/// The set answers "is this id mid-resolution" in O(1); the chain keeps the
/// order for diagnostics. Both always hold the same ids.
#[derive(Default)]
pub(crate) struct ResolutionStack {
    state: RefCell<StackState>,
}

#[derive(Default)]
struct StackState {
    set: FastSet<ServiceId>,
    chain: Vec<ServiceId>,
}

impl ResolutionStack {
    /// Pushes `id`, failing on re-entry or when `max_depth` is reached.
    ///
    /// The returned guard pops `id` when dropped, so every exit path of the
    /// caller (success, error or unwind) leaves the stack clean.
    pub(crate) fn enter(&self, id: &ServiceId, max_depth: usize) -> DiResult<StackGuard<'_>> {
        let mut state = self.state.borrow_mut();

        // Circular detection BEFORE pushing the new id
        if state.set.contains(id) {
            let mut path = state.chain.clone();
            path.push(id.clone());
            debug!(service = %id, depth = state.chain.len(), "circular dependency detected");
            return Err(DiError::circular(path));
        }

        // Depth guard
        if state.chain.len() >= max_depth {
            return Err(DiError::resolution(id, "maximum resolution depth exceeded")
                .with_context("depth", state.chain.len().to_string())
                .in_chain(state.chain.clone()));
        }

        state.set.insert(id.clone());
        state.chain.push(id.clone());

        Ok(StackGuard { stack: self, id: id.clone() })
    }

    pub(crate) fn chain(&self) -> Vec<ServiceId> {
        self.state.borrow().chain.clone()
    }

    pub(crate) fn depth(&self) -> usize {
        self.state.borrow().chain.len()
    }

    #[cfg(test)]
    fn is_idle(&self) -> bool {
        self.state.borrow().chain.is_empty()
    }
}

/// Guard for one entry of the resolution stack
pub(crate) struct StackGuard<'a> {
    stack: &'a ResolutionStack,
    id: ServiceId,
}

impl Drop for StackGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.stack.state.borrow_mut();
        if let Some(last) = state.chain.pop() {
            debug_assert_eq!(last, self.id);
        }
        state.set.remove(&self.id);
    }
}
