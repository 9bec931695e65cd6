use tracing::instrument;

use crate::error::{ErrorKind, Result};
use crate::wire::{
    InputPropertyValue, InputValue, OperationRecord, ParameterizedEntity, ParametrizedClassPropertyValue,
    ParametrizedPropertyValue, VecInputValue,
};
use crate::{ClassId, EntityRef, PropertyMap, Value};

/// Properties destined for one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityIntent {
    pub target: EntityRef,
    pub properties: PropertyMap,
}

/// A transaction split into its three operation kinds, each list keeping the
/// relative order the operations had in the transaction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedBatch {
    pub creates: Vec<ClassId>,
    pub schema_support: Vec<EntityIntent>,
    pub updates: Vec<EntityIntent>,
}

impl From<ParameterizedEntity> for EntityRef {
    fn from(entity: ParameterizedEntity) -> Self {
        match entity {
            ParameterizedEntity::InternalEntityJustAdded(index) => Self::Local(index),
            ParameterizedEntity::ExistingEntity(id) => Self::Existing(id),
        }
    }
}

#[instrument(level = "debug", skip(operations), fields(operations = operations.len()))]
pub fn decode_operations(operations: &[OperationRecord]) -> Result<DecodedBatch> {
    let mut batch = DecodedBatch::default();
    for operation in operations {
        match operation {
            OperationRecord::CreateEntity { class_id } => batch.creates.push(*class_id),
            OperationRecord::AddSchemaSupportToEntity { entity, parametrized_property_values, .. } => {
                batch.schema_support.push(EntityIntent {
                    target: EntityRef::from(*entity),
                    properties: decode_properties(parametrized_property_values)?,
                });
            },
            OperationRecord::UpdatePropertyValues { entity, new_parametrized_property_values } => {
                batch.updates.push(EntityIntent {
                    target: EntityRef::from(*entity),
                    properties: decode_properties(new_parametrized_property_values)?,
                });
            },
        }
    }
    Ok(batch)
}

/// Decode a property list into a slot map. A slot given twice keeps its last
/// value.
pub fn decode_properties(values: &[ParametrizedClassPropertyValue]) -> Result<PropertyMap> {
    let mut properties = PropertyMap::new();
    for property in values {
        properties.insert(property.in_class_index, decode_value(&property.value)?);
    }
    Ok(properties)
}

fn decode_value(value: &ParametrizedPropertyValue) -> Result<Value> {
    match value {
        ParametrizedPropertyValue::InputPropertyValue(InputPropertyValue::Single(single)) => decode_single(single),
        ParametrizedPropertyValue::InputPropertyValue(InputPropertyValue::Vector(vector)) => decode_vector(vector),
        ParametrizedPropertyValue::InternalEntityJustAdded(index) => Ok(Value::Reference(EntityRef::Local(*index))),
        ParametrizedPropertyValue::InternalEntityVec(_) => {
            exn::bail!(ErrorKind::UnsupportedValue("vector of batch-local references"))
        },
    }
}

fn decode_single(value: &InputValue) -> Result<Value> {
    Ok(match value {
        InputValue::Bool(b) => Value::Bool(*b),
        InputValue::Uint16(n) => Value::Uint(u64::from(*n)),
        InputValue::Uint32(n) => Value::Uint(u64::from(*n)),
        InputValue::Uint64(n) => Value::Uint(*n),
        InputValue::Int16(n) => Value::Int(i64::from(*n)),
        InputValue::Int32(n) => Value::Int(i64::from(*n)),
        InputValue::Int64(n) => Value::Int(*n),
        InputValue::Text(text) => Value::Text(text.clone()),
        InputValue::TextToHash(_) => exn::bail!(ErrorKind::UnsupportedValue("text to hash")),
        InputValue::Reference(id) => Value::Reference(EntityRef::Existing(*id)),
    })
}

fn decode_vector(value: &VecInputValue) -> Result<Value> {
    fn list<T: Copy>(items: &[T], f: impl Fn(T) -> Value) -> Value {
        Value::List(items.iter().copied().map(f).collect())
    }
    Ok(match value {
        VecInputValue::Bool(items) => list(items, Value::Bool),
        VecInputValue::Uint16(items) => list(items, |n| Value::Uint(u64::from(n))),
        VecInputValue::Uint32(items) => list(items, |n| Value::Uint(u64::from(n))),
        VecInputValue::Uint64(items) => list(items, Value::Uint),
        VecInputValue::Int16(items) => list(items, |n| Value::Int(i64::from(n))),
        VecInputValue::Int32(items) => list(items, |n| Value::Int(i64::from(n))),
        VecInputValue::Int64(items) => list(items, Value::Int),
        VecInputValue::Text(items) => Value::List(items.iter().cloned().map(Value::Text).collect()),
        VecInputValue::TextToHash(_) => exn::bail!(ErrorKind::UnsupportedValue("vector of text to hash")),
        VecInputValue::Reference(_) => exn::bail!(ErrorKind::UnsupportedValue("vector of references")),
    })
}
