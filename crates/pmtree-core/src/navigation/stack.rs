use std::fmt;
use std::rc::Rc;

use super::{settle, BackStackEntry, EntrySpec, HostLink, NavigationChanges};
use crate::error::PmError;
use crate::lifecycle::LifecycleState;
use crate::node::{Description, Pm};
use crate::state::State;

struct StackInner<D: Description> {
    host: HostLink<D>,
    backstack: State<Vec<BackStackEntry<D>>>,
}

/// Backstack of screens. Only the top entry follows the host into
/// foreground; the rest wait in `Created`.
pub struct StackNavigator<D: Description> {
    inner: Rc<StackInner<D>>,
}

impl<D: Description> Clone for StackNavigator<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<D: Description> StackNavigator<D> {
    pub(crate) fn new(host: HostLink<D>) -> Self {
        Self {
            inner: Rc::new(StackInner {
                host,
                backstack: State::new(Vec::new()),
            }),
        }
    }

    pub fn push(&self, description: D) -> Result<Pm<D>, PmError> {
        self.push_spec(EntrySpec::fresh(description))
    }

    pub fn push_with_tag(&self, description: D, tag: impl Into<String>) -> Result<Pm<D>, PmError> {
        self.push_spec(EntrySpec {
            description,
            tag: Some(tag.into()),
            state: None,
        })
    }

    fn push_spec(&self, spec: EntrySpec<D>) -> Result<Pm<D>, PmError> {
        let host = self.inner.host.live()?;
        let entry = self.inner.host.build(&host, spec)?;
        if let Some(top) = self.current() {
            if top.lifecycle_state() == LifecycleState::InForeground {
                top.node().move_lifecycle_to(LifecycleState::Created);
            }
        }
        let pm = Rc::clone(&entry.pm);
        pm.node().move_lifecycle_to(host.lifecycle_state());
        log::debug!("{}: push {}", host.tag(), pm.tag());
        self.inner.backstack.update(|entries| entries.push(entry));
        Ok(pm)
    }

    /// Destroys the top entry and resumes the one below. Returns `false`
    /// without touching anything when the stack holds a single entry or the
    /// host is gone.
    pub fn pop(&self) -> bool {
        let Ok(host) = self.inner.host.live() else {
            return false;
        };
        if self.len() <= 1 {
            return false;
        }
        if let Some(top) = self.current() {
            log::debug!("{}: pop {}", host.tag(), top.tag());
            top.node().move_lifecycle_to(LifecycleState::Destroyed);
        }
        self.inner.backstack.update(|entries| {
            entries.pop();
        });
        if let Some(top) = self.current() {
            top.node().move_lifecycle_to(host.lifecycle_state());
        }
        true
    }

    /// Swaps the top entry for a new one built from `description`.
    pub fn replace_top(&self, description: D) -> Result<Pm<D>, PmError> {
        let host = self.inner.host.live()?;
        if self.is_empty() {
            return self.push(description);
        }
        let entry = self.inner.host.build(&host, EntrySpec::fresh(description))?;
        let pm = Rc::clone(&entry.pm);
        let mut replaced = None;
        self.inner.backstack.update(|entries| {
            replaced = entries.pop();
            entries.push(entry);
        });
        if let Some(replaced) = replaced {
            log::debug!("{}: replace {} with {}", host.tag(), replaced.pm.tag(), pm.tag());
            replaced.pm.node().move_lifecycle_to(LifecycleState::Destroyed);
        }
        pm.node().move_lifecycle_to(host.lifecycle_state());
        Ok(pm)
    }

    /// Destroys everything above the root entry. Returns whether anything was
    /// removed.
    pub fn pop_to_root(&self) -> bool {
        let Ok(host) = self.inner.host.live() else {
            return false;
        };
        if self.len() <= 1 {
            return false;
        }
        let mut removed = Vec::new();
        self.inner
            .backstack
            .update(|entries| removed = entries.split_off(1));
        log::debug!("{}: pop {} entries to root", host.tag(), removed.len());
        for entry in removed.iter().rev() {
            entry.pm.node().move_lifecycle_to(LifecycleState::Destroyed);
        }
        if let Some(root) = self.current() {
            root.node().move_lifecycle_to(host.lifecycle_state());
        }
        true
    }

    /// Replaces the whole backstack with fresh entries, last one on top.
    pub fn replace_all(&self, descriptions: impl IntoIterator<Item = D>) -> Result<(), PmError> {
        let specs = descriptions.into_iter().map(EntrySpec::fresh).collect();
        self.replace_with(specs)
    }

    pub(crate) fn replace_with(&self, specs: Vec<EntrySpec<D>>) -> Result<(), PmError> {
        if specs.is_empty() {
            return Err(PmError::EmptyBackstack);
        }
        let host = self.inner.host.live()?;

        let mut built = Vec::with_capacity(specs.len());
        for spec in specs {
            match self.inner.host.build(&host, spec) {
                Ok(entry) => built.push(entry),
                Err(err) => {
                    for entry in &built {
                        entry.pm.node().move_lifecycle_to(LifecycleState::Destroyed);
                    }
                    return Err(err);
                }
            }
        }

        let old = self.entries();
        for entry in old.iter().rev() {
            entry.pm.node().move_lifecycle_to(LifecycleState::Destroyed);
        }
        log::debug!("{}: backstack replaced ({} entries)", host.tag(), built.len());
        settle(&built, built.len() - 1, host.lifecycle_state());
        self.inner.backstack.set(built);
        Ok(())
    }

    pub fn current(&self) -> Option<Pm<D>> {
        self.inner
            .backstack
            .with(|entries| entries.last().map(|entry| Rc::clone(&entry.pm)))
    }

    pub fn len(&self) -> usize {
        self.inner.backstack.with(Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn entries(&self) -> Vec<BackStackEntry<D>> {
        self.inner.backstack.value()
    }

    /// Structural changes of the backstack, starting with the current top.
    pub fn changes(&self) -> NavigationChanges<D> {
        NavigationChanges::for_stack(self.inner.backstack.subscribe())
    }

    pub(crate) fn destroy_hidden(&self) {
        let entries = self.entries();
        let hidden = entries.len().saturating_sub(1);
        for entry in entries[..hidden].iter().rev() {
            entry.pm.node().move_lifecycle_to(LifecycleState::Destroyed);
        }
    }
}

impl<D: Description> fmt::Debug for StackNavigator<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StackNavigator")
            .field("entries", &self.entries())
            .finish()
    }
}
