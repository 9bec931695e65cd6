use async_trait::async_trait;
use cdmirror_schema::{BlockNumber, DomainClass, EntityId};
use exn::ResultExt;
use sqlx::SqliteConnection;

use crate::error::{Error, ErrorKind, Result};
use crate::record::{Record, from_sql, ids_where, opt_from_sql, opt_to_sql, to_sql};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Language {
    pub id: EntityId,
    pub name: String,
    /// ISO 639-1 code.
    pub code: String,
    pub version: BlockNumber,
}

#[derive(sqlx::FromRow)]
struct LanguageRow {
    id: i64,
    name: String,
    code: String,
    version: i64,
}

impl TryFrom<LanguageRow> for Language {
    type Error = Error;
    fn try_from(row: LanguageRow) -> Result<Self> {
        Ok(Self {
            id: from_sql(row.id, "entity id")?,
            name: row.name,
            code: row.code,
            version: from_sql(row.version, "block number")?,
        })
    }
}

#[async_trait]
impl Record for Language {
    const CLASS: DomainClass = DomainClass::Language;

    async fn find(conn: &mut SqliteConnection, id: EntityId) -> Result<Option<Self>> {
        let row = sqlx::query_as::<_, LanguageRow>("SELECT id, name, code, version FROM languages WHERE id = ?")
            .bind(to_sql(id, "entity id")?)
            .fetch_optional(&mut *conn)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(Self::try_from).transpose()
    }

    async fn save(&self, conn: &mut SqliteConnection) -> Result<()> {
        sqlx::query(
            "INSERT INTO languages (id, name, code, version) VALUES (?, ?, ?, ?)
             ON CONFLICT (id) DO UPDATE SET name = excluded.name, code = excluded.code",
        )
        .bind(to_sql(self.id, "entity id")?)
        .bind(&self.name)
        .bind(&self.code)
        .bind(i64::from(self.version))
        .execute(&mut *conn)
        .await
        .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: EntityId,
    pub name: String,
    pub description: String,
    pub version: BlockNumber,
}

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: i64,
    name: String,
    description: String,
    version: i64,
}

impl TryFrom<CategoryRow> for Category {
    type Error = Error;
    fn try_from(row: CategoryRow) -> Result<Self> {
        Ok(Self {
            id: from_sql(row.id, "entity id")?,
            name: row.name,
            description: row.description,
            version: from_sql(row.version, "block number")?,
        })
    }
}

#[async_trait]
impl Record for Category {
    const CLASS: DomainClass = DomainClass::ContentCategory;

    async fn find(conn: &mut SqliteConnection, id: EntityId) -> Result<Option<Self>> {
        let row = sqlx::query_as::<_, CategoryRow>("SELECT id, name, description, version FROM categories WHERE id = ?")
            .bind(to_sql(id, "entity id")?)
            .fetch_optional(&mut *conn)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(Self::try_from).transpose()
    }

    async fn save(&self, conn: &mut SqliteConnection) -> Result<()> {
        sqlx::query(
            "INSERT INTO categories (id, name, description, version) VALUES (?, ?, ?, ?)
             ON CONFLICT (id) DO UPDATE SET name = excluded.name, description = excluded.description",
        )
        .bind(to_sql(self.id, "entity id")?)
        .bind(&self.name)
        .bind(&self.description)
        .bind(i64::from(self.version))
        .execute(&mut *conn)
        .await
        .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub id: EntityId,
    /// Also serves as the channel handle.
    pub title: String,
    pub description: String,
    pub cover_photo_url: String,
    pub avatar_photo_url: String,
    pub is_public: bool,
    pub is_curated: bool,
    pub language: Option<EntityId>,
    pub version: BlockNumber,
}

#[derive(sqlx::FromRow)]
struct ChannelRow {
    id: i64,
    title: String,
    description: String,
    cover_photo_url: String,
    avatar_photo_url: String,
    is_public: bool,
    is_curated: bool,
    language_id: Option<i64>,
    version: i64,
}

impl TryFrom<ChannelRow> for Channel {
    type Error = Error;
    fn try_from(row: ChannelRow) -> Result<Self> {
        Ok(Self {
            id: from_sql(row.id, "entity id")?,
            title: row.title,
            description: row.description,
            cover_photo_url: row.cover_photo_url,
            avatar_photo_url: row.avatar_photo_url,
            is_public: row.is_public,
            is_curated: row.is_curated,
            language: opt_from_sql(row.language_id, "entity id")?,
            version: from_sql(row.version, "block number")?,
        })
    }
}

#[async_trait]
impl Record for Channel {
    const CLASS: DomainClass = DomainClass::Channel;

    async fn find(conn: &mut SqliteConnection, id: EntityId) -> Result<Option<Self>> {
        let row = sqlx::query_as::<_, ChannelRow>(
            "SELECT id, title, description, cover_photo_url, avatar_photo_url, is_public, is_curated, language_id, version
             FROM channels WHERE id = ?",
        )
        .bind(to_sql(id, "entity id")?)
        .fetch_optional(&mut *conn)
        .await
        .or_raise(|| ErrorKind::Database)?;
        row.map(Self::try_from).transpose()
    }

    async fn save(&self, conn: &mut SqliteConnection) -> Result<()> {
        sqlx::query(
            "INSERT INTO channels
                (id, title, description, cover_photo_url, avatar_photo_url, is_public, is_curated, language_id, version)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT (id) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                cover_photo_url = excluded.cover_photo_url,
                avatar_photo_url = excluded.avatar_photo_url,
                is_public = excluded.is_public,
                is_curated = excluded.is_curated,
                language_id = excluded.language_id",
        )
        .bind(to_sql(self.id, "entity id")?)
        .bind(&self.title)
        .bind(&self.description)
        .bind(&self.cover_photo_url)
        .bind(&self.avatar_photo_url)
        .bind(self.is_public)
        .bind(self.is_curated)
        .bind(opt_to_sql(self.language, "entity id")?)
        .bind(i64::from(self.version))
        .execute(&mut *conn)
        .await
        .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }
}

impl Channel {
    /// Detach every channel from a language about to be removed.
    pub async fn clear_language(conn: &mut SqliteConnection, language: EntityId) -> Result<u64> {
        let result = sqlx::query("UPDATE channels SET language_id = NULL WHERE language_id = ?")
            .bind(to_sql(language, "entity id")?)
            .execute(&mut *conn)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeaturedVideo {
    pub id: EntityId,
    pub video: EntityId,
    pub version: BlockNumber,
}

#[derive(sqlx::FromRow)]
struct FeaturedVideoRow {
    id: i64,
    video_id: i64,
    version: i64,
}

impl TryFrom<FeaturedVideoRow> for FeaturedVideo {
    type Error = Error;
    fn try_from(row: FeaturedVideoRow) -> Result<Self> {
        Ok(Self {
            id: from_sql(row.id, "entity id")?,
            video: from_sql(row.video_id, "entity id")?,
            version: from_sql(row.version, "block number")?,
        })
    }
}

#[async_trait]
impl Record for FeaturedVideo {
    const CLASS: DomainClass = DomainClass::FeaturedVideo;

    async fn find(conn: &mut SqliteConnection, id: EntityId) -> Result<Option<Self>> {
        let row = sqlx::query_as::<_, FeaturedVideoRow>("SELECT id, video_id, version FROM featured_videos WHERE id = ?")
            .bind(to_sql(id, "entity id")?)
            .fetch_optional(&mut *conn)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(Self::try_from).transpose()
    }

    async fn save(&self, conn: &mut SqliteConnection) -> Result<()> {
        sqlx::query(
            "INSERT INTO featured_videos (id, video_id, version) VALUES (?, ?, ?)
             ON CONFLICT (id) DO UPDATE SET video_id = excluded.video_id",
        )
        .bind(to_sql(self.id, "entity id")?)
        .bind(to_sql(self.video, "entity id")?)
        .bind(i64::from(self.version))
        .execute(&mut *conn)
        .await
        .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }
}

impl FeaturedVideo {
    pub async fn ids_by_video(conn: &mut SqliteConnection, video: EntityId) -> Result<Vec<EntityId>> {
        ids_where(conn, "SELECT id FROM featured_videos WHERE video_id = ? ORDER BY id", video).await
    }
}
