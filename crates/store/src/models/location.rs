use async_trait::async_trait;
use cdmirror_schema::{BlockNumber, DomainClass, EntityId};
use exn::ResultExt;
use sqlx::SqliteConnection;

use crate::error::{Error, ErrorKind, Result};
use crate::record::{Record, from_sql, ids_where, opt_from_sql, opt_to_sql, to_sql};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpMediaLocation {
    pub id: EntityId,
    pub url: String,
    pub port: Option<u16>,
    pub version: BlockNumber,
}

#[derive(sqlx::FromRow)]
struct HttpMediaLocationRow {
    id: i64,
    url: String,
    port: Option<i64>,
    version: i64,
}

impl TryFrom<HttpMediaLocationRow> for HttpMediaLocation {
    type Error = Error;
    fn try_from(row: HttpMediaLocationRow) -> Result<Self> {
        Ok(Self {
            id: from_sql(row.id, "entity id")?,
            url: row.url,
            port: opt_from_sql(row.port, "port")?,
            version: from_sql(row.version, "block number")?,
        })
    }
}

#[async_trait]
impl Record for HttpMediaLocation {
    const CLASS: DomainClass = DomainClass::HttpMediaLocation;

    async fn find(conn: &mut SqliteConnection, id: EntityId) -> Result<Option<Self>> {
        let row = sqlx::query_as::<_, HttpMediaLocationRow>(
            "SELECT id, url, port, version FROM http_media_locations WHERE id = ?",
        )
        .bind(to_sql(id, "entity id")?)
        .fetch_optional(&mut *conn)
        .await
        .or_raise(|| ErrorKind::Database)?;
        row.map(Self::try_from).transpose()
    }

    async fn save(&self, conn: &mut SqliteConnection) -> Result<()> {
        sqlx::query(
            "INSERT INTO http_media_locations (id, url, port, version) VALUES (?, ?, ?, ?)
             ON CONFLICT (id) DO UPDATE SET url = excluded.url, port = excluded.port",
        )
        .bind(to_sql(self.id, "entity id")?)
        .bind(&self.url)
        .bind(self.port.map(i64::from))
        .bind(i64::from(self.version))
        .execute(&mut *conn)
        .await
        .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoystreamMediaLocation {
    pub id: EntityId,
    pub data_object_id: String,
    pub version: BlockNumber,
}

#[derive(sqlx::FromRow)]
struct JoystreamMediaLocationRow {
    id: i64,
    data_object_id: String,
    version: i64,
}

impl TryFrom<JoystreamMediaLocationRow> for JoystreamMediaLocation {
    type Error = Error;
    fn try_from(row: JoystreamMediaLocationRow) -> Result<Self> {
        Ok(Self {
            id: from_sql(row.id, "entity id")?,
            data_object_id: row.data_object_id,
            version: from_sql(row.version, "block number")?,
        })
    }
}

#[async_trait]
impl Record for JoystreamMediaLocation {
    const CLASS: DomainClass = DomainClass::JoystreamMediaLocation;

    async fn find(conn: &mut SqliteConnection, id: EntityId) -> Result<Option<Self>> {
        let row = sqlx::query_as::<_, JoystreamMediaLocationRow>(
            "SELECT id, data_object_id, version FROM joystream_media_locations WHERE id = ?",
        )
        .bind(to_sql(id, "entity id")?)
        .fetch_optional(&mut *conn)
        .await
        .or_raise(|| ErrorKind::Database)?;
        row.map(Self::try_from).transpose()
    }

    async fn save(&self, conn: &mut SqliteConnection) -> Result<()> {
        sqlx::query(
            "INSERT INTO joystream_media_locations (id, data_object_id, version) VALUES (?, ?, ?)
             ON CONFLICT (id) DO UPDATE SET data_object_id = excluded.data_object_id",
        )
        .bind(to_sql(self.id, "entity id")?)
        .bind(&self.data_object_id)
        .bind(i64::from(self.version))
        .execute(&mut *conn)
        .await
        .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }
}

/// Which location entity a [`MediaLocation`] points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationTarget {
    Http(EntityId),
    Joystream(EntityId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaLocation {
    pub id: EntityId,
    pub target: LocationTarget,
    pub version: BlockNumber,
}

#[derive(sqlx::FromRow)]
struct MediaLocationRow {
    id: i64,
    http_media_location_id: Option<i64>,
    joystream_media_location_id: Option<i64>,
    version: i64,
}

impl TryFrom<MediaLocationRow> for MediaLocation {
    type Error = Error;
    fn try_from(row: MediaLocationRow) -> Result<Self> {
        let id = from_sql(row.id, "entity id")?;
        let target = match (row.http_media_location_id, row.joystream_media_location_id) {
            (Some(http), None) => LocationTarget::Http(from_sql(http, "entity id")?),
            (None, Some(joystream)) => LocationTarget::Joystream(from_sql(joystream, "entity id")?),
            _ => exn::bail!(ErrorKind::InvalidVariant("media location", id)),
        };
        Ok(Self { id, target, version: from_sql(row.version, "block number")? })
    }
}

#[async_trait]
impl Record for MediaLocation {
    const CLASS: DomainClass = DomainClass::MediaLocation;

    async fn find(conn: &mut SqliteConnection, id: EntityId) -> Result<Option<Self>> {
        let row = sqlx::query_as::<_, MediaLocationRow>(
            "SELECT id, http_media_location_id, joystream_media_location_id, version
             FROM media_locations WHERE id = ?",
        )
        .bind(to_sql(id, "entity id")?)
        .fetch_optional(&mut *conn)
        .await
        .or_raise(|| ErrorKind::Database)?;
        row.map(Self::try_from).transpose()
    }

    async fn save(&self, conn: &mut SqliteConnection) -> Result<()> {
        let (http, joystream) = match self.target {
            LocationTarget::Http(id) => (Some(id), None),
            LocationTarget::Joystream(id) => (None, Some(id)),
        };
        sqlx::query(
            "INSERT INTO media_locations (id, http_media_location_id, joystream_media_location_id, version)
             VALUES (?, ?, ?, ?)
             ON CONFLICT (id) DO UPDATE SET
                http_media_location_id = excluded.http_media_location_id,
                joystream_media_location_id = excluded.joystream_media_location_id",
        )
        .bind(to_sql(self.id, "entity id")?)
        .bind(opt_to_sql(http, "entity id")?)
        .bind(opt_to_sql(joystream, "entity id")?)
        .bind(i64::from(self.version))
        .execute(&mut *conn)
        .await
        .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }
}

impl MediaLocation {
    pub async fn ids_by_http(conn: &mut SqliteConnection, id: EntityId) -> Result<Vec<EntityId>> {
        ids_where(conn, "SELECT id FROM media_locations WHERE http_media_location_id = ? ORDER BY id", id).await
    }

    pub async fn ids_by_joystream(conn: &mut SqliteConnection, id: EntityId) -> Result<Vec<EntityId>> {
        ids_where(conn, "SELECT id FROM media_locations WHERE joystream_media_location_id = ? ORDER BY id", id).await
    }
}

/// A media location as embedded by value on video media.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaLocationKind {
    Http { url: String, port: Option<u16> },
    Joystream { data_object_id: String },
}

impl MediaLocationKind {
    pub(crate) fn tag(&self) -> &'static str {
        match self {
            Self::Http { .. } => "http",
            Self::Joystream { .. } => "joystream",
        }
    }
}

impl From<&HttpMediaLocation> for MediaLocationKind {
    fn from(location: &HttpMediaLocation) -> Self {
        Self::Http { url: location.url.clone(), port: location.port }
    }
}

impl From<&JoystreamMediaLocation> for MediaLocationKind {
    fn from(location: &JoystreamMediaLocation) -> Self {
        Self::Joystream { data_object_id: location.data_object_id.clone() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;
    use crate::models::Block;
    use rstest::rstest;
    use time::UtcDateTime;

    #[tokio::test]
    async fn test_media_location_lookup_by_branch() {
        let db = Database::connect_in_memory().await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();
        Block::get_or_create(&mut conn, 1, "test", UtcDateTime::UNIX_EPOCH).await.unwrap();
        JoystreamMediaLocation { id: 10, data_object_id: "obj".into(), version: 1 }.save(&mut conn).await.unwrap();
        for id in [11, 12] {
            MediaLocation { id, target: LocationTarget::Joystream(10), version: 1 }.save(&mut conn).await.unwrap();
        }
        assert_eq!(MediaLocation::ids_by_joystream(&mut conn, 10).await.unwrap(), vec![11, 12]);
        assert!(MediaLocation::ids_by_http(&mut conn, 10).await.unwrap().is_empty());
        let stored = MediaLocation::find(&mut conn, 12).await.unwrap().unwrap();
        assert_eq!(stored.target, LocationTarget::Joystream(10));
    }

    #[rstest]
    #[case(MediaLocationKind::Http { url: "a".into(), port: Some(80) }, MediaLocationKind::Http { url: "a".into(), port: Some(80) }, true)]
    #[case(MediaLocationKind::Http { url: "a".into(), port: Some(80) }, MediaLocationKind::Http { url: "a".into(), port: None }, false)]
    #[case(MediaLocationKind::Joystream { data_object_id: "a".into() }, MediaLocationKind::Http { url: "a".into(), port: None }, false)]
    fn test_location_kind_equality(
        #[case] left: MediaLocationKind,
        #[case] right: MediaLocationKind,
        #[case] equal: bool,
    ) {
        assert_eq!(left == right, equal);
    }
}
