//! Bookkeeping rows: blocks, entity classes, the id watermark and the ingest
//! cursor.

use cdmirror_schema::{BlockNumber, ClassId, EntityId};
use exn::ResultExt;
use sqlx::SqliteConnection;
use time::UtcDateTime;
use tracing::instrument;

use crate::error::{Error, ErrorKind, Result};
use crate::record::{from_sql, to_sql};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub number: BlockNumber,
    pub network: String,
    pub timestamp: UtcDateTime,
}

#[derive(sqlx::FromRow)]
struct BlockRow {
    number: i64,
    network: String,
    timestamp: i64,
}

impl TryFrom<BlockRow> for Block {
    type Error = Error;
    fn try_from(row: BlockRow) -> Result<Self> {
        let nanos = i128::from(row.timestamp) * 1_000_000;
        Ok(Self {
            number: from_sql(row.number, "block number")?,
            network: row.network,
            timestamp: UtcDateTime::from_unix_timestamp_nanos(nanos)
                .or_raise(|| ErrorKind::InvalidData("block timestamp"))?,
        })
    }
}

fn unix_millis(timestamp: UtcDateTime) -> Result<i64> {
    i64::try_from(timestamp.unix_timestamp_nanos() / 1_000_000).or_raise(|| ErrorKind::InvalidData("block timestamp"))
}

impl Block {
    pub async fn find(conn: &mut SqliteConnection, number: BlockNumber) -> Result<Option<Self>> {
        let row = sqlx::query_as::<_, BlockRow>("SELECT number, network, timestamp FROM blocks WHERE number = ?")
            .bind(i64::from(number))
            .fetch_optional(&mut *conn)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(Self::try_from).transpose()
    }

    /// Return the stored block, recording it first if this is the first time
    /// it has been seen. Stored blocks are never modified.
    #[instrument(level = "trace", skip(conn))]
    pub async fn get_or_create(
        conn: &mut SqliteConnection,
        number: BlockNumber,
        network: &str,
        timestamp: UtcDateTime,
    ) -> Result<Self> {
        if let Some(block) = Self::find(conn, number).await? {
            return Ok(block);
        }
        sqlx::query("INSERT INTO blocks (number, network, timestamp) VALUES (?, ?, ?)")
            .bind(i64::from(number))
            .bind(network)
            .bind(unix_millis(timestamp)?)
            .execute(&mut *conn)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(Self { number, network: network.to_string(), timestamp })
    }
}

/// Which class an entity id belongs to, recorded as soon as the entity is
/// created and before it has any typed properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassEntity {
    pub id: EntityId,
    pub class_id: ClassId,
    pub version: BlockNumber,
}

#[derive(sqlx::FromRow)]
struct ClassEntityRow {
    id: i64,
    class_id: i64,
    version: i64,
}

impl TryFrom<ClassEntityRow> for ClassEntity {
    type Error = Error;
    fn try_from(row: ClassEntityRow) -> Result<Self> {
        Ok(Self {
            id: from_sql(row.id, "entity id")?,
            class_id: from_sql(row.class_id, "class id")?,
            version: from_sql(row.version, "block number")?,
        })
    }
}

impl ClassEntity {
    pub async fn find(conn: &mut SqliteConnection, id: EntityId) -> Result<Option<Self>> {
        let row = sqlx::query_as::<_, ClassEntityRow>("SELECT id, class_id, version FROM class_entities WHERE id = ?")
            .bind(to_sql(id, "entity id")?)
            .fetch_optional(&mut *conn)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(Self::try_from).transpose()
    }

    /// Record the entity; an already recorded id is left untouched.
    pub async fn insert(&self, conn: &mut SqliteConnection) -> Result<()> {
        sqlx::query("INSERT INTO class_entities (id, class_id, version) VALUES (?, ?, ?) ON CONFLICT (id) DO NOTHING")
            .bind(to_sql(self.id, "entity id")?)
            .bind(to_sql(self.class_id, "class id")?)
            .bind(i64::from(self.version))
            .execute(&mut *conn)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    pub async fn delete(conn: &mut SqliteConnection, id: EntityId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM class_entities WHERE id = ?")
            .bind(to_sql(id, "entity id")?)
            .execute(&mut *conn)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected() > 0)
    }
}

/// The ledger's next-entity-id as of the last applied batch.
pub struct NextEntityId;

impl NextEntityId {
    pub async fn get(conn: &mut SqliteConnection) -> Result<Option<EntityId>> {
        let value = sqlx::query_scalar::<_, i64>("SELECT next_id FROM next_entity_id WHERE id = 1")
            .fetch_optional(&mut *conn)
            .await
            .or_raise(|| ErrorKind::Database)?;
        value.map(|v| from_sql(v, "next entity id")).transpose()
    }

    pub async fn set(conn: &mut SqliteConnection, next_id: EntityId) -> Result<()> {
        sqlx::query("INSERT INTO next_entity_id (id, next_id) VALUES (1, ?) ON CONFLICT (id) DO UPDATE SET next_id = excluded.next_id")
            .bind(to_sql(next_id, "next entity id")?)
            .execute(&mut *conn)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }
}

/// Position of the last applied input: its block and its index within the
/// block. Ordered by block first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Cursor {
    pub block: BlockNumber,
    pub position: u32,
}

impl Cursor {
    pub async fn get(conn: &mut SqliteConnection) -> Result<Option<Self>> {
        let row = sqlx::query_as::<_, (i64, i64)>("SELECT block, position FROM ingest_cursor WHERE id = 1")
            .fetch_optional(&mut *conn)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(|(block, position)| {
            Ok(Self { block: from_sql(block, "block number")?, position: from_sql(position, "cursor position")? })
        })
        .transpose()
    }

    pub async fn set(&self, conn: &mut SqliteConnection) -> Result<()> {
        sqlx::query(
            "INSERT INTO ingest_cursor (id, block, position) VALUES (1, ?, ?)
             ON CONFLICT (id) DO UPDATE SET block = excluded.block, position = excluded.position",
        )
        .bind(i64::from(self.block))
        .bind(i64::from(self.position))
        .execute(&mut *conn)
        .await
        .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    #[tokio::test]
    async fn test_block_is_memoized_by_number() {
        let db = Database::connect_in_memory().await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();
        let first = UtcDateTime::from_unix_timestamp(1_600_000_000).unwrap();
        let created = Block::get_or_create(&mut conn, 7, "olympia", first).await.unwrap();
        let later = UtcDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        let again = Block::get_or_create(&mut conn, 7, "other", later).await.unwrap();
        assert_eq!(created, again);
        assert_eq!(again.network, "olympia");
        assert_eq!(again.timestamp, first);
    }

    #[tokio::test]
    async fn test_class_entity_insert_is_idempotent() {
        let db = Database::connect_in_memory().await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();
        Block::get_or_create(&mut conn, 1, "test", UtcDateTime::UNIX_EPOCH).await.unwrap();
        let entity = ClassEntity { id: 5, class_id: 2, version: 1 };
        entity.insert(&mut conn).await.unwrap();
        ClassEntity { class_id: 9, ..entity }.insert(&mut conn).await.unwrap();
        assert_eq!(ClassEntity::find(&mut conn, 5).await.unwrap(), Some(entity));
        assert!(ClassEntity::delete(&mut conn, 5).await.unwrap());
        assert!(!ClassEntity::delete(&mut conn, 5).await.unwrap());
    }

    #[tokio::test]
    async fn test_watermark_and_cursor_are_singletons() {
        let db = Database::connect_in_memory().await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();
        assert_eq!(NextEntityId::get(&mut conn).await.unwrap(), None);
        NextEntityId::set(&mut conn, 3).await.unwrap();
        NextEntityId::set(&mut conn, 8).await.unwrap();
        assert_eq!(NextEntityId::get(&mut conn).await.unwrap(), Some(8));

        assert_eq!(Cursor::get(&mut conn).await.unwrap(), None);
        Cursor { block: 4, position: 1 }.set(&mut conn).await.unwrap();
        Cursor { block: 5, position: 0 }.set(&mut conn).await.unwrap();
        assert_eq!(Cursor::get(&mut conn).await.unwrap(), Some(Cursor { block: 5, position: 0 }));
    }

    #[test]
    fn test_cursor_orders_by_block_first() {
        assert!(Cursor { block: 4, position: 9 } < Cursor { block: 5, position: 0 });
        assert!(Cursor { block: 5, position: 0 } < Cursor { block: 5, position: 1 });
    }
}
