//! Navigators owned by a node: an ordered stack of screens or a fixed set
//! with one current entry.

mod changes;
mod set;
mod stack;

pub use changes::{NavigationChanges, StackChange};
pub use set::SetNavigator;
pub use stack::StackNavigator;

use std::fmt;
use std::rc::Rc;

use crate::error::PmError;
use crate::lifecycle::LifecycleState;
use crate::node::{Description, Pm, PmNode, WeakPmNode};
use crate::snapshot::PmState;

/// One screen held by a navigator.
pub struct BackStackEntry<D: Description> {
    pub description: D,
    pub pm: Pm<D>,
}

impl<D: Description> Clone for BackStackEntry<D> {
    fn clone(&self) -> Self {
        Self {
            description: self.description.clone(),
            pm: Rc::clone(&self.pm),
        }
    }
}

impl<D: Description> fmt::Debug for BackStackEntry<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackStackEntry")
            .field("description", &self.description)
            .field("tag", &self.pm.tag())
            .finish()
    }
}

/// How to build one navigator entry.
pub(crate) struct EntrySpec<D: Description> {
    pub(crate) description: D,
    pub(crate) tag: Option<String>,
    pub(crate) state: Option<PmState<D>>,
}

impl<D: Description> EntrySpec<D> {
    pub(crate) fn fresh(description: D) -> Self {
        Self {
            description,
            tag: None,
            state: None,
        }
    }
}

/// Weak link from a navigator back to the node hosting it.
pub(crate) struct HostLink<D: Description> {
    node: WeakPmNode<D>,
}

impl<D: Description> HostLink<D> {
    pub(crate) fn new(node: WeakPmNode<D>) -> Self {
        Self { node }
    }

    /// The host, provided it still accepts navigation.
    pub(crate) fn live(&self) -> Result<PmNode<D>, PmError> {
        match self.node.upgrade() {
            Some(node) if !node.is_destroyed() => Ok(node),
            Some(node) => Err(PmError::Destroyed { tag: node.tag() }),
            None => Err(PmError::Destroyed {
                tag: String::from("<dropped>"),
            }),
        }
    }

    pub(crate) fn build(
        &self,
        host: &PmNode<D>,
        spec: EntrySpec<D>,
    ) -> Result<BackStackEntry<D>, PmError> {
        let pm = host.create_child(spec.description.clone(), spec.tag, spec.state)?;
        Ok(BackStackEntry {
            description: spec.description,
            pm,
        })
    }
}

/// Moves hidden entries to at most `Created` and the visible one to the
/// host's state.
pub(crate) fn settle<D: Description>(
    entries: &[BackStackEntry<D>],
    visible: usize,
    host_state: LifecycleState,
) {
    for (index, entry) in entries.iter().enumerate() {
        if index != visible {
            entry.pm.node().move_lifecycle_to(host_state.capped_at_created());
        }
    }
    if let Some(entry) = entries.get(visible) {
        entry.pm.node().move_lifecycle_to(host_state);
    }
}

/// The navigator installed on a node.
pub enum Navigator<D: Description> {
    Stack(StackNavigator<D>),
    Set(SetNavigator<D>),
}

impl<D: Description> Clone for Navigator<D> {
    fn clone(&self) -> Self {
        match self {
            Navigator::Stack(stack) => Navigator::Stack(stack.clone()),
            Navigator::Set(set) => Navigator::Set(set.clone()),
        }
    }
}

impl<D: Description> Navigator<D> {
    /// The entry allowed to be in foreground.
    pub fn current(&self) -> Option<Pm<D>> {
        match self {
            Navigator::Stack(stack) => stack.current(),
            Navigator::Set(set) => set.current(),
        }
    }

    pub fn entries(&self) -> Vec<BackStackEntry<D>> {
        match self {
            Navigator::Stack(stack) => stack.entries(),
            Navigator::Set(set) => set.entries(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Navigator::Stack(stack) => stack.len(),
            Navigator::Set(set) => set.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn changes(&self) -> NavigationChanges<D> {
        match self {
            Navigator::Stack(stack) => stack.changes(),
            Navigator::Set(set) => set.changes(),
        }
    }

    pub(crate) fn pop_for_back(&self) -> bool {
        match self {
            Navigator::Stack(stack) => stack.pop(),
            Navigator::Set(_) => false,
        }
    }

    /// Destroys every entry except the current one, which follows the host
    /// through normal propagation.
    pub(crate) fn destroy_hidden(&self) {
        match self {
            Navigator::Stack(stack) => stack.destroy_hidden(),
            Navigator::Set(set) => set.destroy_hidden(),
        }
    }
}

impl<D: Description> fmt::Debug for Navigator<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Navigator::Stack(stack) => fmt::Debug::fmt(stack, f),
            Navigator::Set(set) => fmt::Debug::fmt(set, f),
        }
    }
}

#[cfg(test)]
#[path = "../tests/navigation_tests.rs"]
mod tests;
