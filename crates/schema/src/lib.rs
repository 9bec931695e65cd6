//! Everything needed to turn the upstream chain module's operation records
//! into typed, per-class property intents.
//!
//! The [`registry`](DomainClass) knows which numeric class ids this indexer
//! models and the order of each class' property slots; the [`wire`] module
//! mirrors the records exactly as the chain emits them; [`decode_operations`]
//! splits a transaction into its three ordered intent lists, and [`props`]
//! narrows a slot map into one closed struct per class.

mod decode;
pub mod error;
pub mod props;
mod registry;
mod value;
pub mod wire;

pub use crate::decode::{DecodedBatch, EntityIntent, decode_operations, decode_properties};
pub use crate::registry::{DomainClass, class_name_for, property_slot_table};
pub use crate::value::{EntityRef, PropertyMap, Value};

/// Ledger-side entity identifier.
pub type EntityId = u64;
/// Ledger-side class identifier.
pub type ClassId = u64;
/// Block height.
pub type BlockNumber = u32;
/// Schema identifier within a class.
pub type SchemaId = u16;
/// Position of a property within its class.
pub type SlotIndex = u16;
