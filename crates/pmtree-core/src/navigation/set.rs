use std::fmt;
use std::rc::Rc;

use super::{settle, BackStackEntry, EntrySpec, HostLink, NavigationChanges};
use crate::error::PmError;
use crate::lifecycle::LifecycleState;
use crate::node::{Description, Pm};
use crate::state::State;

struct SetInner<D: Description> {
    host: HostLink<D>,
    entries: Vec<BackStackEntry<D>>,
    current: State<usize>,
}

/// Fixed entries with a movable current one, as used for tabs. Entries live
/// as long as the host.
pub struct SetNavigator<D: Description> {
    inner: Rc<SetInner<D>>,
}

impl<D: Description> Clone for SetNavigator<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<D: Description> SetNavigator<D> {
    pub(crate) fn new(
        host: HostLink<D>,
        specs: Vec<EntrySpec<D>>,
        current: usize,
    ) -> Result<Self, PmError> {
        if specs.is_empty() {
            return Err(PmError::EmptySet);
        }
        if current >= specs.len() {
            return Err(PmError::IndexOutOfRange {
                index: current,
                len: specs.len(),
            });
        }
        let node = host.live()?;
        let entries = specs
            .into_iter()
            .map(|spec| host.build(&node, spec))
            .collect::<Result<Vec<_>, _>>()?;
        settle(&entries, current, node.lifecycle_state());
        Ok(Self {
            inner: Rc::new(SetInner {
                host,
                entries,
                current: State::new(current),
            }),
        })
    }

    /// Makes entry `index` current. The previous current entry drops to
    /// `Created`.
    pub fn set_current(&self, index: usize) -> Result<(), PmError> {
        let host = self.inner.host.live()?;
        let Some(next) = self.inner.entries.get(index) else {
            return Err(PmError::IndexOutOfRange {
                index,
                len: self.len(),
            });
        };
        let previous = self.current_index();
        let host_state = host.lifecycle_state();
        if previous != index {
            if let Some(entry) = self.inner.entries.get(previous) {
                entry.pm.node().move_lifecycle_to(host_state.capped_at_created());
            }
            log::debug!("{}: switch {previous} -> {index}", host.tag());
            self.inner.current.set(index);
        }
        next.pm.node().move_lifecycle_to(host_state);
        Ok(())
    }

    pub fn current_index(&self) -> usize {
        self.inner.current.value()
    }

    /// Observable index of the current entry.
    pub fn current_state(&self) -> State<usize> {
        self.inner.current.clone()
    }

    pub fn current(&self) -> Option<Pm<D>> {
        self.inner
            .entries
            .get(self.current_index())
            .map(|entry| Rc::clone(&entry.pm))
    }

    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    pub fn entries(&self) -> Vec<BackStackEntry<D>> {
        self.inner.entries.clone()
    }

    pub fn changes(&self) -> NavigationChanges<D> {
        NavigationChanges::for_set(self.inner.current.subscribe(), self.entries())
    }

    pub(crate) fn destroy_hidden(&self) {
        let current = self.current_index();
        for (index, entry) in self.inner.entries.iter().enumerate() {
            if index != current {
                entry.pm.node().move_lifecycle_to(LifecycleState::Destroyed);
            }
        }
    }
}

impl<D: Description> fmt::Debug for SetNavigator<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetNavigator")
            .field("entries", &self.inner.entries)
            .field("current", &self.current_index())
            .finish()
    }
}
