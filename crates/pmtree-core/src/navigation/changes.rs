use std::fmt;
use std::rc::Rc;

use super::BackStackEntry;
use crate::node::{Description, Pm};
use crate::state::StateStream;

/// Structural difference between two consecutive navigator states.
pub enum StackChange<D: Description> {
    Push { new_top: Pm<D>, old_top: Pm<D> },
    Pop { new_top: Pm<D>, old_top: Pm<D> },
    Set { new_top: Pm<D> },
}

impl<D: Description> StackChange<D> {
    pub fn new_top(&self) -> &Pm<D> {
        match self {
            StackChange::Push { new_top, .. }
            | StackChange::Pop { new_top, .. }
            | StackChange::Set { new_top } => new_top,
        }
    }

    pub fn old_top(&self) -> Option<&Pm<D>> {
        match self {
            StackChange::Push { old_top, .. } | StackChange::Pop { old_top, .. } => Some(old_top),
            StackChange::Set { .. } => None,
        }
    }
}

impl<D: Description> fmt::Debug for StackChange<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StackChange::Push { new_top, old_top } => f
                .debug_struct("Push")
                .field("new_top", &new_top.tag())
                .field("old_top", &old_top.tag())
                .finish(),
            StackChange::Pop { new_top, old_top } => f
                .debug_struct("Pop")
                .field("new_top", &new_top.tag())
                .field("old_top", &old_top.tag())
                .finish(),
            StackChange::Set { new_top } => {
                f.debug_struct("Set").field("new_top", &new_top.tag()).finish()
            }
        }
    }
}

/// Classifies the move from `old` to `new`. `None` when `new` is empty.
pub(crate) fn classify<D: Description>(
    old: Option<&[BackStackEntry<D>]>,
    new: &[BackStackEntry<D>],
) -> Option<StackChange<D>> {
    let new_top = Rc::clone(&new.last()?.pm);
    let Some((old, old_top)) = old.and_then(|old| old.last().map(|top| (old, &top.pm))) else {
        return Some(StackChange::Set { new_top });
    };
    if Rc::ptr_eq(old_top, &new_top) {
        return Some(StackChange::Set { new_top });
    }
    let old_top = Rc::clone(old_top);
    if old.iter().any(|entry| Rc::ptr_eq(&entry.pm, &new_top)) {
        Some(StackChange::Pop { new_top, old_top })
    } else {
        Some(StackChange::Push { new_top, old_top })
    }
}

enum Source<D: Description> {
    Stack {
        stream: StateStream<Vec<BackStackEntry<D>>>,
        previous: Option<Vec<BackStackEntry<D>>>,
    },
    Set {
        stream: StateStream<usize>,
        entries: Vec<BackStackEntry<D>>,
    },
}

/// Stream of [`StackChange`]s for one navigator. The first item describes
/// the state at subscription time as a `Set`.
pub struct NavigationChanges<D: Description> {
    source: Source<D>,
}

impl<D: Description> NavigationChanges<D> {
    pub(crate) fn for_stack(stream: StateStream<Vec<BackStackEntry<D>>>) -> Self {
        Self {
            source: Source::Stack {
                stream,
                previous: None,
            },
        }
    }

    pub(crate) fn for_set(stream: StateStream<usize>, entries: Vec<BackStackEntry<D>>) -> Self {
        Self {
            source: Source::Set { stream, entries },
        }
    }

    /// Waits for the next change. `None` once the navigator is dropped.
    pub async fn next(&mut self) -> Option<StackChange<D>> {
        loop {
            let change = match &mut self.source {
                Source::Stack { stream, previous } => {
                    let entries = stream.next().await?;
                    Self::advance(previous, entries)
                }
                Source::Set { stream, entries } => {
                    let index = stream.next().await?;
                    Self::select(entries, index)
                }
            };
            if change.is_some() {
                return change;
            }
        }
    }

    /// The change since the last read, if any, without waiting.
    pub fn try_next(&mut self) -> Option<StackChange<D>> {
        match &mut self.source {
            Source::Stack { stream, previous } => {
                let entries = stream.try_next()?;
                Self::advance(previous, entries)
            }
            Source::Set { stream, entries } => {
                let index = stream.try_next()?;
                Self::select(entries, index)
            }
        }
    }

    fn advance(
        previous: &mut Option<Vec<BackStackEntry<D>>>,
        entries: Vec<BackStackEntry<D>>,
    ) -> Option<StackChange<D>> {
        let change = classify(previous.as_deref(), &entries);
        *previous = Some(entries);
        change
    }

    fn select(entries: &[BackStackEntry<D>], index: usize) -> Option<StackChange<D>> {
        entries.get(index).map(|entry| StackChange::Set {
            new_top: Rc::clone(&entry.pm),
        })
    }
}
