use std::cell::RefCell;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec::{SerializedValue, StateCodec, TypeDescriptor};
use crate::error::CodecError;
use crate::state::State;

trait SaveableEntry {
    fn descriptor(&self) -> &TypeDescriptor;
    fn encode(&self, codec: &dyn StateCodec) -> Result<SerializedValue, CodecError>;
    fn restore(&self, codec: &dyn StateCodec, data: &SerializedValue) -> Result<(), CodecError>;
}

struct TypedEntry<T> {
    state: State<T>,
    descriptor: TypeDescriptor,
}

impl<T> SaveableEntry for TypedEntry<T>
where
    T: Clone + Serialize + DeserializeOwned + 'static,
{
    fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    fn encode(&self, codec: &dyn StateCodec) -> Result<SerializedValue, CodecError> {
        self.state
            .with(|value| codec.encode(&self.descriptor, value as &dyn std::any::Any))
    }

    fn restore(&self, codec: &dyn StateCodec, data: &SerializedValue) -> Result<(), CodecError> {
        let decoded = codec.decode(&self.descriptor, data)?;
        let value = decoded
            .downcast::<T>()
            .map_err(|_| CodecError::TypeMismatch {
                expected: self.descriptor.type_name(),
            })?;
        self.state.set(*value);
        Ok(())
    }
}

/// Named, typed cells of one node that take part in snapshots.
///
/// Keys keep registration order so snapshots list values the way the node
/// declared them.
#[derive(Default)]
pub(crate) struct SaveableRegistry {
    entries: RefCell<IndexMap<String, Box<dyn SaveableEntry>>>,
}

impl SaveableRegistry {
    /// Registers `state` under `key`. A second registration for the same key
    /// replaces the first.
    pub(crate) fn register<T>(&self, key: &str, state: State<T>)
    where
        T: Clone + Serialize + DeserializeOwned + 'static,
    {
        let entry = TypedEntry {
            state,
            descriptor: TypeDescriptor::of::<T>(),
        };
        if self
            .entries
            .borrow_mut()
            .insert(key.to_owned(), Box::new(entry))
            .is_some()
        {
            log::warn!("saveable state {key:?} registered twice; keeping the latest cell");
        }
    }

    pub(crate) fn encode_all(
        &self,
        codec: &dyn StateCodec,
    ) -> Result<IndexMap<String, SerializedValue>, CodecError> {
        self.entries
            .borrow()
            .iter()
            .map(|(key, entry)| Ok((key.clone(), entry.encode(codec)?)))
            .collect()
    }

    /// Overwrites live cells from `saved`. Keys without a live cell and values
    /// that fail to decode are skipped.
    pub(crate) fn restore_all(
        &self,
        codec: &dyn StateCodec,
        saved: &IndexMap<String, SerializedValue>,
        owner: &str,
    ) {
        let entries = self.entries.borrow();
        for (key, data) in saved {
            let Some(entry) = entries.get(key) else {
                log::warn!("{owner}: saved state {key:?} has no live counterpart; skipped");
                continue;
            };
            if let Err(err) = entry.restore(codec, data) {
                log::warn!(
                    "{owner}: failed to restore {key:?} as {}: {err}",
                    entry.descriptor().type_name()
                );
            }
        }
    }

    pub(crate) fn restore_key(
        &self,
        codec: &dyn StateCodec,
        key: &str,
        data: &SerializedValue,
        owner: &str,
    ) {
        if let Some(entry) = self.entries.borrow().get(key) {
            if let Err(err) = entry.restore(codec, data) {
                log::warn!(
                    "{owner}: failed to restore {key:?} as {}: {err}",
                    entry.descriptor().type_name()
                );
            }
        }
    }

    pub(crate) fn keys(&self) -> Vec<String> {
        self.entries.borrow().keys().cloned().collect()
    }
}

#[cfg(test)]
#[path = "tests/saveable_tests.rs"]
mod tests;
