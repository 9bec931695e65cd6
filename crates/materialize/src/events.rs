//! Single-entity events emitted outside multi-operation transactions.

use cdmirror_schema::wire::ParametrizedClassPropertyValue;
use cdmirror_schema::{ClassId, EntityId, EntityRef, decode_properties};
use cdmirror_store::models::{ClassEntity, NextEntityId};
use exn::ResultExt;
use tracing::instrument;

use crate::context::Batch;
use crate::error::{ErrorKind, Result};
use crate::repo;

/// Record the entity's class and make sure later transactions number their
/// creations after it.
#[instrument(level = "debug", skip(batch, first_entity_id))]
pub(crate) async fn entity_created(
    batch: &mut Batch,
    first_entity_id: EntityId,
    class_id: ClassId,
    entity_id: EntityId,
) -> Result<()> {
    let version = batch.block();
    ClassEntity { id: entity_id, class_id, version }.insert(batch.conn()).await.or_raise(|| ErrorKind::Store)?;
    let current = NextEntityId::get(batch.conn()).await.or_raise(|| ErrorKind::Store)?.unwrap_or(first_entity_id);
    let next = current.max(entity_id.saturating_add(1));
    if next != current {
        NextEntityId::set(batch.conn(), next).await.or_raise(|| ErrorKind::Store)?;
    }
    Ok(())
}

#[instrument(level = "debug", skip(batch))]
pub(crate) async fn entity_removed(batch: &mut Batch, entity_id: EntityId) -> Result<()> {
    match batch.domain_class_of(EntityRef::Existing(entity_id)).await? {
        Some(class) => repo::remove(batch, class, entity_id).await,
        None => Ok(()),
    }
}

#[instrument(level = "debug", skip(batch, properties))]
pub(crate) async fn schema_support_added(
    batch: &mut Batch,
    entity_id: EntityId,
    properties: &[ParametrizedClassPropertyValue],
) -> Result<()> {
    let Some(class) = batch.domain_class_of(EntityRef::Existing(entity_id)).await? else {
        return Ok(());
    };
    let properties = decode_properties(properties).or_raise(|| ErrorKind::Decode)?;
    repo::create(batch, class, entity_id, &properties).await
}

#[instrument(level = "debug", skip(batch, properties))]
pub(crate) async fn property_values_updated(
    batch: &mut Batch,
    entity_id: EntityId,
    properties: &[ParametrizedClassPropertyValue],
) -> Result<()> {
    let Some(class) = batch.domain_class_of(EntityRef::Existing(entity_id)).await? else {
        return Ok(());
    };
    let properties = decode_properties(properties).or_raise(|| ErrorKind::Decode)?;
    repo::update(batch, class, entity_id, &properties).await
}
