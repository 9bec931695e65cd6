use async_trait::async_trait;
use cdmirror_schema::{DomainClass, EntityId};
use exn::ResultExt;
use sqlx::SqliteConnection;

use crate::error::{ErrorKind, Result};

/// A typed row of one domain class table.
///
/// Rows share the ledger's entity id as their primary key, so the same id
/// never appears in two domain tables (the id-0 templates excepted).
#[async_trait]
pub trait Record: Sized + Send + Sync {
    const CLASS: DomainClass;

    async fn find(conn: &mut SqliteConnection, id: EntityId) -> Result<Option<Self>>;

    /// Insert the row, or overwrite every column except its `version` stamp.
    async fn save(&self, conn: &mut SqliteConnection) -> Result<()>;
}

/// Table backing a domain class.
pub fn table_of(class: DomainClass) -> &'static str {
    match class {
        DomainClass::Channel => "channels",
        DomainClass::ContentCategory => "categories",
        DomainClass::HttpMediaLocation => "http_media_locations",
        DomainClass::JoystreamMediaLocation => "joystream_media_locations",
        DomainClass::KnownLicense => "known_licenses",
        DomainClass::Language => "languages",
        DomainClass::License => "licenses",
        DomainClass::MediaLocation => "media_locations",
        DomainClass::UserDefinedLicense => "user_defined_licenses",
        DomainClass::Video => "videos",
        DomainClass::VideoMedia => "video_media",
        DomainClass::VideoMediaEncoding => "video_media_encodings",
        DomainClass::FeaturedVideo => "featured_videos",
    }
}

pub async fn exists(conn: &mut SqliteConnection, class: DomainClass, id: EntityId) -> Result<bool> {
    let sql = format!("SELECT EXISTS (SELECT 1 FROM {} WHERE id = ?)", table_of(class));
    let found = sqlx::query_scalar::<_, i64>(&sql)
        .bind(to_sql(id, "entity id")?)
        .fetch_one(&mut *conn)
        .await
        .or_raise(|| ErrorKind::Database)?;
    Ok(found != 0)
}

/// Delete a single domain row. Dependents must have been dealt with first.
pub async fn delete(conn: &mut SqliteConnection, class: DomainClass, id: EntityId) -> Result<bool> {
    let sql = format!("DELETE FROM {} WHERE id = ?", table_of(class));
    let result = sqlx::query(&sql)
        .bind(to_sql(id, "entity id")?)
        .execute(&mut *conn)
        .await
        .or_raise(|| ErrorKind::Database)?;
    Ok(result.rows_affected() > 0)
}

pub(crate) fn to_sql(value: u64, what: &'static str) -> Result<i64> {
    i64::try_from(value).or_raise(|| ErrorKind::InvalidData(what))
}

pub(crate) fn opt_to_sql(value: Option<u64>, what: &'static str) -> Result<Option<i64>> {
    value.map(|v| to_sql(v, what)).transpose()
}

pub(crate) fn from_sql<T: TryFrom<i64>>(value: i64, what: &'static str) -> Result<T>
where
    T::Error: std::error::Error + Send + Sync + 'static,
{
    T::try_from(value).or_raise(|| ErrorKind::InvalidData(what))
}

pub(crate) fn opt_from_sql<T: TryFrom<i64>>(value: Option<i64>, what: &'static str) -> Result<Option<T>>
where
    T::Error: std::error::Error + Send + Sync + 'static,
{
    value.map(|v| from_sql(v, what)).transpose()
}

/// Ids returned by a single-column query filtered on one id parameter.
pub(crate) async fn ids_where(conn: &mut SqliteConnection, sql: &str, id: EntityId) -> Result<Vec<EntityId>> {
    let ids = sqlx::query_scalar::<_, i64>(sql)
        .bind(to_sql(id, "entity id")?)
        .fetch_all(&mut *conn)
        .await
        .or_raise(|| ErrorKind::Database)?;
    ids.into_iter().map(|id| from_sql(id, "entity id")).collect()
}
