//! Applying one multi-operation transaction.

use cdmirror_schema::wire::OperationRecord;
use cdmirror_schema::{DecodedBatch, EntityId, decode_operations};
use cdmirror_store::models::{ClassEntity, NextEntityId};
use derive_more::Display;
use exn::ResultExt;
use tracing::instrument;

use crate::context::Batch;
use crate::error::{ErrorKind, Result};
use crate::repo;

/// Progress through a transaction, in order.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
enum Phase {
    #[display("decoded")]
    Decoded,
    #[display("slots reserved")]
    SlotsReserved,
    #[display("properties updated")]
    PropertiesUpdated,
    #[display("schema applied")]
    SchemaApplied,
}

/// Operations the chain actually executed: everything before the rejected
/// one when the transaction failed.
fn executed(operations: &[OperationRecord], failed_at: Option<usize>) -> Result<&[OperationRecord]> {
    match failed_at {
        None => Ok(operations),
        Some(failed_at) => match operations.get(..failed_at) {
            Some(executed) => Ok(executed),
            None => exn::bail!(ErrorKind::InvalidFailedIndex { failed_at, operations: operations.len() }),
        },
    }
}

#[instrument(level = "debug", skip_all, fields(block = batch.block(), operations = operations.len()))]
pub(crate) async fn apply_transaction(
    batch: &mut Batch,
    first_entity_id: EntityId,
    operations: &[OperationRecord],
    failed_at: Option<usize>,
) -> Result<()> {
    let operations = executed(operations, failed_at)?;
    let DecodedBatch { creates, schema_support, updates } =
        decode_operations(operations).or_raise(|| ErrorKind::Decode)?;
    tracing::debug!(
        phase = %Phase::Decoded,
        creates = creates.len(),
        schema_support = schema_support.len(),
        updates = updates.len()
    );

    // Every creation gets its class entity up front, so forward references
    // within the transaction can be classified before any typed row exists.
    let watermark = NextEntityId::get(batch.conn()).await.or_raise(|| ErrorKind::Store)?.unwrap_or(first_entity_id);
    let version = batch.block();
    for (id, class_id) in (watermark..).zip(creates.iter().copied()) {
        ClassEntity { id, class_id, version }.insert(batch.conn()).await.or_raise(|| ErrorKind::Store)?;
    }
    let next = watermark + creates.len() as EntityId;
    NextEntityId::set(batch.conn(), next).await.or_raise(|| ErrorKind::Store)?;
    batch.reserve(watermark, creates);
    tracing::debug!(phase = %Phase::SlotsReserved, watermark, next);

    for intent in schema_support {
        if let Some(class) = batch.domain_class_of(intent.target).await? {
            batch.pending.push(class, intent);
        }
    }

    for intent in updates {
        let Some(class) = batch.domain_class_of(intent.target).await? else {
            continue;
        };
        // A row whose schema arrives in this same transaction is built first.
        let id = batch.resolve(intent.target, class).await?;
        repo::update(batch, class, id, &intent.properties).await?;
    }
    tracing::debug!(phase = %Phase::PropertiesUpdated, pending = batch.pending.len());

    while let Some((class, intent)) = batch.pending.pop_next() {
        let id = batch.target_id(intent.target);
        repo::create(batch, class, id, &intent.properties).await?;
    }
    tracing::debug!(phase = %Phase::SchemaApplied);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn creates(n: u64) -> Vec<OperationRecord> {
        (0..n).map(|class_id| OperationRecord::CreateEntity { class_id }).collect()
    }

    #[rstest]
    #[case::all(None, 3)]
    #[case::none_executed(Some(0), 0)]
    #[case::prefix(Some(2), 2)]
    #[case::everything_before_end(Some(3), 3)]
    fn test_executed_prefix(#[case] failed_at: Option<usize>, #[case] expected: usize) {
        let operations = creates(3);
        assert_eq!(executed(&operations, failed_at).unwrap().len(), expected);
    }

    #[test]
    fn test_failed_index_past_end() {
        let err = executed(&creates(3), Some(4)).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidFailedIndex { failed_at: 4, operations: 3 }));
    }
}
