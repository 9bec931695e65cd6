use std::collections::BTreeMap;

use crate::{EntityId, SlotIndex};

/// Pointer to another entity, as written in an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityRef {
    /// Absolute id of an entity created in an earlier transaction.
    Existing(EntityId),
    /// Zero-based index into the current batch's creations.
    Local(u32),
}

/// A decoded property value.
///
/// Integer widths from the wire collapse into [`Value::Uint`] and
/// [`Value::Int`]; the typed property structs narrow them again per field.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Uint(u64),
    Int(i64),
    Text(String),
    Reference(EntityRef),
    List(Vec<Value>),
}

impl Value {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Uint(_) => "unsigned integer",
            Self::Int(_) => "signed integer",
            Self::Text(_) => "text",
            Self::Reference(_) => "reference",
            Self::List(_) => "list",
        }
    }
}

/// Decoded properties of one operation, keyed by slot.
pub type PropertyMap = BTreeMap<SlotIndex, Value>;
