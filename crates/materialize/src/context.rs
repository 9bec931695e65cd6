//! Batch-scoped resolution state and the entity reference resolver.
//!
//! A batch may reference entities it creates itself, in any order. Instead of
//! sorting the operations, references are resolved on demand: the first time
//! something needs a batch-local entity, its pending schema intent is pulled
//! out of the [`PendingPool`] and materialized, recursively resolving its own
//! references. The store doubles as the memo: an id that already has a row is
//! never built twice.

use cdmirror_schema::{BlockNumber, ClassId, DomainClass, EntityId, EntityIntent, EntityRef};
use cdmirror_store::Record;
use cdmirror_store::models::ClassEntity;
use exn::{OptionExt, ResultExt};
use futures::FutureExt;
use futures::future::BoxFuture;
use sqlx::{Sqlite, SqliteConnection, Transaction};
use std::collections::VecDeque;

use crate::error::{ErrorKind, Result};
use crate::repo;

/// Schema intents waiting to be materialized, grouped by class in the order
/// each class was first seen.
#[derive(Debug, Default)]
pub(crate) struct PendingPool {
    groups: Vec<(DomainClass, VecDeque<EntityIntent>)>,
}

impl PendingPool {
    pub(crate) fn push(&mut self, class: DomainClass, intent: EntityIntent) {
        match self.groups.iter_mut().find(|(c, _)| *c == class) {
            Some((_, intents)) => intents.push_back(intent),
            None => self.groups.push((class, VecDeque::from([intent]))),
        }
    }

    /// Remove the first intent of `class` aimed at `target`.
    pub(crate) fn take(&mut self, class: DomainClass, target: EntityRef) -> Option<EntityIntent> {
        let (_, intents) = self.groups.iter_mut().find(|(c, _)| *c == class)?;
        let position = intents.iter().position(|intent| intent.target == target)?;
        intents.remove(position)
    }

    /// Remove the next intent in class-then-arrival order.
    pub(crate) fn pop_next(&mut self) -> Option<(DomainClass, EntityIntent)> {
        self.groups.iter_mut().find_map(|(class, intents)| intents.pop_front().map(|intent| (*class, intent)))
    }

    pub(crate) fn len(&self) -> usize {
        self.groups.iter().map(|(_, intents)| intents.len()).sum()
    }
}

/// Everything one batch (or standalone event) needs while it is applied. Owns
/// the store transaction: dropping the context without [`Batch::commit`]
/// discards every write.
pub(crate) struct Batch {
    tx: Transaction<'static, Sqlite>,
    block: BlockNumber,
    next_id_before: EntityId,
    creates: Vec<ClassId>,
    pub(crate) pending: PendingPool,
}

impl Batch {
    pub(crate) fn new(tx: Transaction<'static, Sqlite>, block: BlockNumber) -> Self {
        Self { tx, block, next_id_before: 0, creates: Vec::new(), pending: PendingPool::default() }
    }

    pub(crate) fn conn(&mut self) -> &mut SqliteConnection {
        &mut self.tx
    }

    pub(crate) fn block(&self) -> BlockNumber {
        self.block
    }

    /// Declare the batch's creations, the first of which takes id `next_id_before`.
    pub(crate) fn reserve(&mut self, next_id_before: EntityId, creates: Vec<ClassId>) {
        self.next_id_before = next_id_before;
        self.creates = creates;
    }

    pub(crate) fn local_id(&self, index: u32) -> EntityId {
        self.next_id_before + u64::from(index)
    }

    /// Absolute id of a reference, without checking that anything exists.
    pub(crate) fn target_id(&self, target: EntityRef) -> EntityId {
        match target {
            EntityRef::Existing(id) => id,
            EntityRef::Local(index) => self.local_id(index),
        }
    }

    /// Class id of the entity a reference points at: the batch's own
    /// declaration for local references, the recorded [`ClassEntity`]
    /// otherwise.
    pub(crate) async fn class_id_of(&mut self, target: EntityRef) -> Result<Option<ClassId>> {
        match target {
            EntityRef::Local(index) => {
                let class_id = usize::try_from(index).ok().and_then(|i| self.creates.get(i).copied());
                Ok(Some(class_id.ok_or_raise(|| ErrorKind::UnknownLocalEntity(index))?))
            },
            EntityRef::Existing(id) => {
                let entity = ClassEntity::find(self.conn(), id).await.or_raise(|| ErrorKind::Store)?;
                Ok(entity.map(|e| e.class_id))
            },
        }
    }

    /// Domain class of the entity a reference points at, or `None` (logged)
    /// when the entity has no recorded class or one this indexer doesn't model.
    pub(crate) async fn domain_class_of(&mut self, target: EntityRef) -> Result<Option<DomainClass>> {
        let id = self.target_id(target);
        let Some(class_id) = self.class_id_of(target).await? else {
            tracing::warn!(id, "entity has no recorded class, skipping");
            return Ok(None);
        };
        let class = DomainClass::from_class_id(class_id);
        if class.is_none() {
            tracing::warn!(id, class_id, "unknown class, skipping");
        }
        Ok(class)
    }

    pub(crate) async fn find<R: Record>(&mut self, id: EntityId) -> Result<Option<R>> {
        R::find(self.conn(), id).await.or_raise(|| ErrorKind::Store)
    }

    pub(crate) async fn require<R: Record>(&mut self, id: EntityId) -> Result<R> {
        self.find(id).await?.ok_or_raise(|| ErrorKind::EntityNotFound { class: R::CLASS.name(), id })
    }

    /// The id-0 default row of a class.
    pub(crate) async fn template<R: Record>(&mut self) -> Result<R> {
        self.find(0).await?.ok_or_raise(|| ErrorKind::TemplateMissing(R::CLASS.name()))
    }

    pub(crate) async fn save<R: Record>(&mut self, record: &R) -> Result<()> {
        record.save(self.conn()).await.or_raise(|| ErrorKind::Store)
    }

    pub(crate) async fn exists(&mut self, class: DomainClass, id: EntityId) -> Result<bool> {
        cdmirror_store::exists(self.conn(), class, id).await.or_raise(|| ErrorKind::Store)
    }

    /// Resolve a reference to the id of a persisted row of `class`,
    /// materializing it from the pending pool when it hasn't been built yet.
    pub(crate) fn resolve(&mut self, target: EntityRef, class: DomainClass) -> BoxFuture<'_, Result<EntityId>> {
        async move {
            if let EntityRef::Local(index) = target {
                let declared = self.class_id_of(target).await?.unwrap_or_default();
                if declared != class.class_id() {
                    exn::bail!(ErrorKind::ClassMismatch {
                        id: self.local_id(index),
                        expected: class.name(),
                        found: declared,
                    });
                }
            }
            let id = self.target_id(target);
            if self.exists(class, id).await? {
                return Ok(id);
            }
            // Schema support for the entity may still be waiting in this
            // batch; anything else is a reference to a row that never existed.
            let intent =
                self.pending.take(class, target).ok_or_raise(|| ErrorKind::EntityNotFound { class: class.name(), id })?;
            tracing::trace!(class = class.name(), id, "materializing on demand");
            repo::create(self, class, id, &intent.properties).await?;
            Ok(id)
        }
        .boxed()
    }

    pub(crate) async fn resolve_opt(
        &mut self,
        target: Option<EntityRef>,
        class: DomainClass,
    ) -> Result<Option<EntityId>> {
        match target {
            Some(target) => Ok(Some(self.resolve(target, class).await?)),
            None => Ok(None),
        }
    }

    /// Resolve a reference and load the row it points at.
    pub(crate) async fn resolve_row<R: Record>(&mut self, target: EntityRef) -> Result<R> {
        let id = self.resolve(target, R::CLASS).await?;
        self.require(id).await
    }

    /// Delete a domain row together with its [`ClassEntity`].
    pub(crate) async fn delete(&mut self, class: DomainClass, id: EntityId) -> Result<()> {
        cdmirror_store::delete(self.conn(), class, id).await.or_raise(|| ErrorKind::Store)?;
        ClassEntity::delete(self.conn(), id).await.or_raise(|| ErrorKind::Store)?;
        tracing::trace!(class = class.name(), id, "removed");
        Ok(())
    }

    pub(crate) async fn commit(self) -> Result<()> {
        self.tx.commit().await.or_raise(|| ErrorKind::Store)
    }
}
