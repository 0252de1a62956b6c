//! Encoding of saveable values.
//!
//! Restoration has no static type to decode into, so every saveable cell is
//! registered with a [`TypeDescriptor`] that carries the conversion functions
//! for its value type. A [`StateCodec`] decides the textual form.

use std::any::{type_name, Any, TypeId};
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CodecError;

#[derive(Clone, Copy)]
pub struct TypeDescriptor {
    type_id: TypeId,
    type_name: &'static str,
    to_value: fn(&dyn Any) -> Result<Value, CodecError>,
    from_value: fn(Value) -> Result<Box<dyn Any>, CodecError>,
}

impl TypeDescriptor {
    pub fn of<T>() -> Self
    where
        T: Serialize + DeserializeOwned + 'static,
    {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            to_value: to_value::<T>,
            from_value: from_value::<T>,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn to_value(&self, value: &dyn Any) -> Result<Value, CodecError> {
        (self.to_value)(value)
    }

    pub fn from_value(&self, value: Value) -> Result<Box<dyn Any>, CodecError> {
        (self.from_value)(value)
    }
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for TypeDescriptor {}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeDescriptor").field(&self.type_name).finish()
    }
}

fn to_value<T: Serialize + 'static>(value: &dyn Any) -> Result<Value, CodecError> {
    let value = value
        .downcast_ref::<T>()
        .ok_or(CodecError::TypeMismatch {
            expected: type_name::<T>(),
        })?;
    Ok(serde_json::to_value(value)?)
}

fn from_value<T: DeserializeOwned + 'static>(value: Value) -> Result<Box<dyn Any>, CodecError> {
    let value: T = serde_json::from_value(value)?;
    Ok(Box::new(value))
}

/// Encoded form of one saveable value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SerializedValue(String);

impl SerializedValue {
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Turns saveable values into [`SerializedValue`]s and back.
///
/// Implementations must round-trip: decoding the result of `encode` yields a
/// value equal to the original.
pub trait StateCodec {
    fn encode(&self, ty: &TypeDescriptor, value: &dyn Any) -> Result<SerializedValue, CodecError>;

    fn decode(&self, ty: &TypeDescriptor, data: &SerializedValue)
        -> Result<Box<dyn Any>, CodecError>;
}

/// Stores values as compact JSON text.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonStateCodec;

impl StateCodec for JsonStateCodec {
    fn encode(&self, ty: &TypeDescriptor, value: &dyn Any) -> Result<SerializedValue, CodecError> {
        let value = ty.to_value(value)?;
        Ok(SerializedValue(serde_json::to_string(&value)?))
    }

    fn decode(
        &self,
        ty: &TypeDescriptor,
        data: &SerializedValue,
    ) -> Result<Box<dyn Any>, CodecError> {
        let value: Value = serde_json::from_str(data.as_str())?;
        ty.from_value(value)
    }
}

#[cfg(test)]
#[path = "tests/codec_tests.rs"]
mod tests;
