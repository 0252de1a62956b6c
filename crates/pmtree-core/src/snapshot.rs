//! Saving a presentation-model tree to a plain value and bringing a live
//! tree back to it.

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::codec::SerializedValue;
use crate::error::{CodecError, PmError};
use crate::navigation::{EntrySpec, Navigator};
use crate::node::{Description, PmNode};

/// Saved form of one node and everything below it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "D: DeserializeOwned"))]
pub struct PmState<D> {
    pub tag: String,
    pub description: D,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub states: IndexMap<String, SerializedValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<PmState<D>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backstack: Option<Vec<BackStackEntryState<D>>>,
    /// Current entry of a set navigator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<usize>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "D: DeserializeOwned"))]
pub struct BackStackEntryState<D> {
    pub description: D,
    pub state: PmState<D>,
}

impl<D> PmState<D> {
    /// Depth-first search for the snapshot of the node tagged `tag`.
    pub fn find(&self, tag: &str) -> Option<&PmState<D>> {
        if self.tag == tag {
            return Some(self);
        }
        self.children
            .iter()
            .chain(self.backstack.iter().flatten().map(|entry| &entry.state))
            .find_map(|state| state.find(tag))
    }
}

impl<D: Description> PmNode<D> {
    pub fn save_state(&self) -> Result<PmState<D>, CodecError> {
        let states = self.saveable().encode_all(self.codec())?;
        let children = self
            .children()
            .iter()
            .map(|child| child.node().save_state())
            .collect::<Result<Vec<_>, _>>()?;

        let navigator = self.navigator();
        let backstack = navigator
            .as_ref()
            .map(|navigator| {
                navigator
                    .entries()
                    .into_iter()
                    .map(|entry| {
                        Ok(BackStackEntryState {
                            state: entry.pm.node().save_state()?,
                            description: entry.description,
                        })
                    })
                    .collect::<Result<Vec<_>, CodecError>>()
            })
            .transpose()?;
        let current = match &navigator {
            Some(Navigator::Set(set)) => Some(set.current_index()),
            _ => None,
        };

        Ok(PmState {
            tag: self.tag(),
            description: self.description().clone(),
            states,
            children,
            backstack,
            current,
        })
    }

    /// Brings this already built subtree back to `state`. Data without a live
    /// counterpart is skipped with a warning.
    pub fn restore_state(&self, state: &PmState<D>) -> Result<(), PmError> {
        self.set_tag(state.tag.clone());
        let tag = self.tag();
        self.saveable()
            .restore_all(self.codec(), &state.states, &tag);

        let children = self.children();
        if children.len() != state.children.len() {
            log::warn!(
                "{tag}: snapshot has {} children, node has {}; restoring the common prefix",
                state.children.len(),
                children.len()
            );
        }
        for (child, saved) in children.iter().zip(&state.children) {
            child.node().restore_state(saved)?;
        }

        let saved = state.backstack.as_deref().unwrap_or_default();
        match self.navigator() {
            Some(Navigator::Stack(stack)) if !saved.is_empty() => {
                let specs = saved
                    .iter()
                    .map(|entry| EntrySpec {
                        description: entry.description.clone(),
                        tag: Some(entry.state.tag.clone()),
                        state: None,
                    })
                    .collect();
                stack.replace_with(specs)?;
                for (entry, saved) in stack.entries().iter().zip(saved) {
                    entry.pm.node().restore_state(&saved.state)?;
                }
            }
            Some(Navigator::Set(set)) => {
                let entries = set.entries();
                if entries.len() != saved.len() {
                    log::warn!(
                        "{tag}: snapshot has {} set entries, navigator has {}",
                        saved.len(),
                        entries.len()
                    );
                }
                for (entry, saved) in entries.iter().zip(saved) {
                    entry.pm.node().restore_state(&saved.state)?;
                }
                if let Some(current) = state.current {
                    if let Err(err) = set.set_current(current) {
                        log::warn!("{tag}: saved current entry not restored: {err}");
                    }
                }
            }
            Some(Navigator::Stack(_)) => {}
            None if !saved.is_empty() => {
                log::warn!("{tag}: snapshot has a backstack but the node has no navigator");
            }
            None => {}
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/snapshot_tests.rs"]
mod tests;
