//! Applies content directory inputs to the relational mirror.
//!
//! # Architecture
//! Every input is applied inside its own store transaction:
//! - **Transactions** reserve a [`ClassEntity`](cdmirror_store::models::ClassEntity)
//!   for each creation, apply property updates, then materialize every pending
//!   schema intent through the resolver, which builds batch-local references
//!   on demand in whatever order they are needed.
//! - **Standalone events** create, update or remove a single entity.
//! - **Bootstrap** seeds the id-0 template rows later creations inherit from.
//!
//! Any error rolls the whole input back. The ingest cursor is advanced in the
//! same store transaction, so replaying an input stream after a crash skips
//! whatever already made it in.

mod bootstrap;
mod context;
pub mod error;
mod events;
mod input;
mod repo;
mod transaction;

pub use crate::input::{ChainEvent, ChainInput};

use cdmirror_config::{Config, Templates};
use cdmirror_schema::{BlockNumber, EntityId};
use cdmirror_store::Database;
use cdmirror_store::models::{Block, Cursor, NextEntityId};
use exn::ResultExt;
use time::UtcDateTime;
use tracing::instrument;

use crate::context::Batch;
use crate::error::{ErrorKind, Result};

/// What happened to an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    /// At or before the ingest cursor: applied by an earlier run.
    Skipped,
}

/// Mirror bookkeeping, as reported to downstream tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    pub next_entity_id: EntityId,
    pub cursor: Option<Cursor>,
}

#[derive(Debug, Clone)]
pub struct Materializer {
    db: Database,
    network: String,
    first_entity_id: EntityId,
    templates: Templates,
}

impl Materializer {
    pub fn new(db: Database, config: &Config) -> Self {
        Self {
            db,
            network: config.network.clone(),
            first_entity_id: config.first_entity_id,
            templates: config.templates.clone(),
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    async fn begin(&self, block: BlockNumber, timestamp: Option<i64>) -> Result<Batch> {
        let tx = self.db.begin().await.or_raise(|| ErrorKind::Store)?;
        let mut batch = Batch::new(tx, block);
        let timestamp = match timestamp {
            Some(millis) => UtcDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
                .or_raise(|| ErrorKind::InvalidTimestamp(millis))?,
            None => UtcDateTime::now(),
        };
        Block::get_or_create(batch.conn(), block, &self.network, timestamp).await.or_raise(|| ErrorKind::Store)?;
        Ok(batch)
    }

    // =========================================================================
    // Ingest
    // =========================================================================

    /// Apply one input atomically.
    ///
    /// Inputs at or before the stored cursor are skipped. An error leaves the
    /// store exactly as it was before the call; the run should stop there.
    #[instrument(skip_all, fields(block = input.block, index = input.index, event = input.event.name()))]
    pub async fn apply(&self, input: &ChainInput) -> Result<Outcome> {
        let position = input.cursor();
        let mut batch = self.begin(input.block, input.timestamp).await?;
        if let Some(cursor) = Cursor::get(batch.conn()).await.or_raise(|| ErrorKind::Store)?
            && position <= cursor
        {
            tracing::debug!(?cursor, "already applied, skipping");
            return Ok(Outcome::Skipped);
        }
        match &input.event {
            ChainEvent::Bootstrap => {
                bootstrap::seed_templates(&mut batch, &self.templates).await?;
            },
            ChainEvent::Transaction { operations, failed_at } => {
                transaction::apply_transaction(&mut batch, self.first_entity_id, operations, *failed_at).await?;
            },
            ChainEvent::EntityCreated { class_id, entity_id } => {
                events::entity_created(&mut batch, self.first_entity_id, *class_id, *entity_id).await?;
            },
            ChainEvent::EntityRemoved { entity_id } => {
                events::entity_removed(&mut batch, *entity_id).await?;
            },
            ChainEvent::EntitySchemaSupportAdded { entity_id, properties, .. } => {
                events::schema_support_added(&mut batch, *entity_id, properties).await?;
            },
            ChainEvent::EntityPropertyValuesUpdated { entity_id, properties } => {
                events::property_values_updated(&mut batch, *entity_id, properties).await?;
            },
        }
        position.set(batch.conn()).await.or_raise(|| ErrorKind::Store)?;
        batch.commit().await?;
        tracing::debug!("applied");
        Ok(Outcome::Applied)
    }

    /// Seed missing templates outside of an input stream. Returns how many
    /// were created.
    #[instrument(skip(self))]
    pub async fn bootstrap(&self, block: BlockNumber) -> Result<usize> {
        let mut batch = self.begin(block, None).await?;
        let created = bootstrap::seed_templates(&mut batch, &self.templates).await?;
        batch.commit().await?;
        Ok(created)
    }

    // =========================================================================
    // Status
    // =========================================================================

    pub async fn status(&self) -> Result<Status> {
        let mut conn = self.db.pool().acquire().await.or_raise(|| ErrorKind::Store)?;
        let next_entity_id = NextEntityId::get(&mut conn).await.or_raise(|| ErrorKind::Store)?;
        let cursor = Cursor::get(&mut conn).await.or_raise(|| ErrorKind::Store)?;
        Ok(Status { next_entity_id: next_entity_id.unwrap_or(self.first_entity_id), cursor })
    }
}
