//! Operation records as emitted by the upstream chain module.
//!
//! These shapes are fixed upstream: field names and nesting follow the chain's
//! own types, serialized with serde's externally tagged enum representation.

use serde::{Deserialize, Serialize};

use crate::{ClassId, EntityId, SchemaId, SlotIndex};

/// Target entity of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterizedEntity {
    /// Zero-based index into the transaction's `create_entity` operations.
    InternalEntityJustAdded(u32),
    ExistingEntity(EntityId),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputValue {
    Bool(bool),
    Uint16(u16),
    Uint32(u32),
    Uint64(u64),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Text(String),
    TextToHash(String),
    Reference(EntityId),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VecInputValue {
    Bool(Vec<bool>),
    Uint16(Vec<u16>),
    Uint32(Vec<u32>),
    Uint64(Vec<u64>),
    Int16(Vec<i16>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    Text(Vec<String>),
    TextToHash(Vec<String>),
    Reference(Vec<EntityId>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputPropertyValue {
    Single(InputValue),
    Vector(VecInputValue),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParametrizedPropertyValue {
    InputPropertyValue(InputPropertyValue),
    /// Reference to an entity created earlier in the same transaction.
    InternalEntityJustAdded(u32),
    /// Vector mixing existing and batch-local references; not supported.
    InternalEntityVec(Vec<ParameterizedEntity>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParametrizedClassPropertyValue {
    pub in_class_index: SlotIndex,
    pub value: ParametrizedPropertyValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationRecord {
    CreateEntity {
        class_id: ClassId,
    },
    AddSchemaSupportToEntity {
        entity: ParameterizedEntity,
        schema_id: SchemaId,
        parametrized_property_values: Vec<ParametrizedClassPropertyValue>,
    },
    UpdatePropertyValues {
        entity: ParameterizedEntity,
        new_parametrized_property_values: Vec<ParametrizedClassPropertyValue>,
    },
}
