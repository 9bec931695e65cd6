//! Inputs as handed over by the chain subscription, one per line of an
//! ingest stream.

use cdmirror_schema::wire::{OperationRecord, ParametrizedClassPropertyValue};
use cdmirror_schema::{BlockNumber, ClassId, EntityId, SchemaId};
use cdmirror_store::models::Cursor;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainInput {
    pub block: BlockNumber,
    /// Position of the input within its block.
    #[serde(default)]
    pub index: u32,
    /// Block timestamp in unix milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    pub event: ChainEvent,
}

impl ChainInput {
    pub fn new(block: BlockNumber, index: u32, event: ChainEvent) -> Self {
        Self { block, index, timestamp: None, event }
    }

    pub fn cursor(&self) -> Cursor {
        Cursor { block: self.block, position: self.index }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChainEvent {
    /// Seed the id-0 template of every class.
    Bootstrap,
    /// One multi-operation transaction.
    Transaction {
        operations: Vec<OperationRecord>,
        /// Index of the operation the chain rejected, if the transaction
        /// failed part way through.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        failed_at: Option<usize>,
    },
    EntityCreated {
        class_id: ClassId,
        entity_id: EntityId,
    },
    EntityRemoved {
        entity_id: EntityId,
    },
    EntitySchemaSupportAdded {
        entity_id: EntityId,
        #[serde(default)]
        schema_id: SchemaId,
        properties: Vec<ParametrizedClassPropertyValue>,
    },
    EntityPropertyValuesUpdated {
        entity_id: EntityId,
        properties: Vec<ParametrizedClassPropertyValue>,
    },
}

impl ChainEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bootstrap => "bootstrap",
            Self::Transaction { .. } => "transaction",
            Self::EntityCreated { .. } => "entity_created",
            Self::EntityRemoved { .. } => "entity_removed",
            Self::EntitySchemaSupportAdded { .. } => "entity_schema_support_added",
            Self::EntityPropertyValuesUpdated { .. } => "entity_property_values_updated",
        }
    }
}
