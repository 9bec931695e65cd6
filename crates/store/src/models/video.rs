use async_trait::async_trait;
use cdmirror_schema::{BlockNumber, DomainClass, EntityId};
use exn::{OptionExt, ResultExt};
use sqlx::SqliteConnection;

use super::{LicenseKind, MediaLocationKind};
use crate::error::{Error, ErrorKind, Result};
use crate::record::{Record, from_sql, ids_where, opt_from_sql, opt_to_sql, to_sql};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoMediaEncoding {
    pub id: EntityId,
    pub name: String,
    pub version: BlockNumber,
}

#[derive(sqlx::FromRow)]
struct VideoMediaEncodingRow {
    id: i64,
    name: String,
    version: i64,
}

impl TryFrom<VideoMediaEncodingRow> for VideoMediaEncoding {
    type Error = Error;
    fn try_from(row: VideoMediaEncodingRow) -> Result<Self> {
        Ok(Self {
            id: from_sql(row.id, "entity id")?,
            name: row.name,
            version: from_sql(row.version, "block number")?,
        })
    }
}

#[async_trait]
impl Record for VideoMediaEncoding {
    const CLASS: DomainClass = DomainClass::VideoMediaEncoding;

    async fn find(conn: &mut SqliteConnection, id: EntityId) -> Result<Option<Self>> {
        let row =
            sqlx::query_as::<_, VideoMediaEncodingRow>("SELECT id, name, version FROM video_media_encodings WHERE id = ?")
                .bind(to_sql(id, "entity id")?)
                .fetch_optional(&mut *conn)
                .await
                .or_raise(|| ErrorKind::Database)?;
        row.map(Self::try_from).transpose()
    }

    async fn save(&self, conn: &mut SqliteConnection) -> Result<()> {
        sqlx::query(
            "INSERT INTO video_media_encodings (id, name, version) VALUES (?, ?, ?)
             ON CONFLICT (id) DO UPDATE SET name = excluded.name",
        )
        .bind(to_sql(self.id, "entity id")?)
        .bind(&self.name)
        .bind(i64::from(self.version))
        .execute(&mut *conn)
        .await
        .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoMedia {
    pub id: EntityId,
    pub encoding: Option<EntityId>,
    pub pixel_width: u16,
    pub pixel_height: u16,
    /// Bytes.
    pub size: Option<u64>,
    pub location: MediaLocationKind,
    pub version: BlockNumber,
}

#[derive(sqlx::FromRow)]
struct VideoMediaRow {
    id: i64,
    encoding_id: Option<i64>,
    pixel_width: i64,
    pixel_height: i64,
    size: Option<i64>,
    location_kind: String,
    location_url: Option<String>,
    location_port: Option<i64>,
    location_data_object_id: Option<String>,
    version: i64,
}

impl TryFrom<VideoMediaRow> for VideoMedia {
    type Error = Error;
    fn try_from(row: VideoMediaRow) -> Result<Self> {
        let id = from_sql(row.id, "entity id")?;
        let invalid = || ErrorKind::InvalidVariant("media location", id);
        let location = match row.location_kind.as_str() {
            "http" => MediaLocationKind::Http {
                url: row.location_url.ok_or_raise(invalid)?,
                port: opt_from_sql(row.location_port, "port")?,
            },
            "joystream" => {
                MediaLocationKind::Joystream { data_object_id: row.location_data_object_id.ok_or_raise(invalid)? }
            },
            _ => exn::bail!(invalid()),
        };
        Ok(Self {
            id,
            encoding: opt_from_sql(row.encoding_id, "entity id")?,
            pixel_width: from_sql(row.pixel_width, "pixel width")?,
            pixel_height: from_sql(row.pixel_height, "pixel height")?,
            size: opt_from_sql(row.size, "media size")?,
            location,
            version: from_sql(row.version, "block number")?,
        })
    }
}

const VIDEO_MEDIA_COLUMNS: &str = "id, encoding_id, pixel_width, pixel_height, size, \
     location_kind, location_url, location_port, location_data_object_id, version";

#[async_trait]
impl Record for VideoMedia {
    const CLASS: DomainClass = DomainClass::VideoMedia;

    async fn find(conn: &mut SqliteConnection, id: EntityId) -> Result<Option<Self>> {
        let sql = format!("SELECT {VIDEO_MEDIA_COLUMNS} FROM video_media WHERE id = ?");
        let row = sqlx::query_as::<_, VideoMediaRow>(&sql)
            .bind(to_sql(id, "entity id")?)
            .fetch_optional(&mut *conn)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(Self::try_from).transpose()
    }

    async fn save(&self, conn: &mut SqliteConnection) -> Result<()> {
        let (url, port, data_object_id) = match &self.location {
            MediaLocationKind::Http { url, port } => (Some(url), port.map(i64::from), None),
            MediaLocationKind::Joystream { data_object_id } => (None, None, Some(data_object_id)),
        };
        sqlx::query(
            "INSERT INTO video_media
                (id, encoding_id, pixel_width, pixel_height, size,
                 location_kind, location_url, location_port, location_data_object_id, version)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT (id) DO UPDATE SET
                encoding_id = excluded.encoding_id,
                pixel_width = excluded.pixel_width,
                pixel_height = excluded.pixel_height,
                size = excluded.size,
                location_kind = excluded.location_kind,
                location_url = excluded.location_url,
                location_port = excluded.location_port,
                location_data_object_id = excluded.location_data_object_id",
        )
        .bind(to_sql(self.id, "entity id")?)
        .bind(opt_to_sql(self.encoding, "entity id")?)
        .bind(i64::from(self.pixel_width))
        .bind(i64::from(self.pixel_height))
        .bind(opt_to_sql(self.size, "media size")?)
        .bind(self.location.tag())
        .bind(url)
        .bind(port)
        .bind(data_object_id)
        .bind(i64::from(self.version))
        .execute(&mut *conn)
        .await
        .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }
}

impl VideoMedia {
    /// Every media row whose embedded location equals `location`.
    pub async fn matching_location(conn: &mut SqliteConnection, location: &MediaLocationKind) -> Result<Vec<Self>> {
        let sql = format!("SELECT {VIDEO_MEDIA_COLUMNS} FROM video_media WHERE location_kind = ? ORDER BY id");
        let rows = sqlx::query_as::<_, VideoMediaRow>(&sql)
            .bind(location.tag())
            .fetch_all(&mut *conn)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let mut matching = Vec::new();
        for row in rows {
            let media = Self::try_from(row)?;
            if media.location == *location {
                matching.push(media);
            }
        }
        Ok(matching)
    }

    /// Detach every media row from an encoding about to be removed.
    pub async fn clear_encoding(conn: &mut SqliteConnection, encoding: EntityId) -> Result<u64> {
        let result = sqlx::query("UPDATE video_media SET encoding_id = NULL WHERE encoding_id = ?")
            .bind(to_sql(encoding, "entity id")?)
            .execute(&mut *conn)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Video {
    pub id: EntityId,
    pub channel: EntityId,
    pub category: EntityId,
    pub title: String,
    pub description: String,
    /// Seconds.
    pub duration: u32,
    pub skippable_intro_duration: Option<u32>,
    pub thumbnail_url: String,
    pub language: Option<EntityId>,
    pub media: EntityId,
    pub has_marketing: Option<bool>,
    /// Unix timestamp.
    pub published_before_joystream: Option<u64>,
    pub is_public: bool,
    pub is_curated: bool,
    pub is_explicit: bool,
    pub is_featured: bool,
    pub license: LicenseKind,
    pub version: BlockNumber,
}

#[derive(sqlx::FromRow)]
struct VideoRow {
    id: i64,
    channel_id: i64,
    category_id: i64,
    title: String,
    description: String,
    duration: i64,
    skippable_intro_duration: Option<i64>,
    thumbnail_url: String,
    language_id: Option<i64>,
    media_id: i64,
    has_marketing: Option<bool>,
    published_before_joystream: Option<i64>,
    is_public: bool,
    is_curated: bool,
    is_explicit: bool,
    is_featured: bool,
    license_kind: String,
    license_code: Option<String>,
    license_name: Option<String>,
    license_description: Option<String>,
    license_url: Option<String>,
    license_content: Option<String>,
    version: i64,
}

impl TryFrom<VideoRow> for Video {
    type Error = Error;
    fn try_from(row: VideoRow) -> Result<Self> {
        let id = from_sql(row.id, "entity id")?;
        let invalid = || ErrorKind::InvalidVariant("license", id);
        let license = match row.license_kind.as_str() {
            "known" => LicenseKind::Known {
                code: row.license_code.ok_or_raise(invalid)?,
                name: row.license_name,
                description: row.license_description,
                url: row.license_url,
            },
            "user_defined" => LicenseKind::UserDefined { content: row.license_content.ok_or_raise(invalid)? },
            _ => exn::bail!(invalid()),
        };
        Ok(Self {
            id,
            channel: from_sql(row.channel_id, "entity id")?,
            category: from_sql(row.category_id, "entity id")?,
            title: row.title,
            description: row.description,
            duration: from_sql(row.duration, "duration")?,
            skippable_intro_duration: opt_from_sql(row.skippable_intro_duration, "duration")?,
            thumbnail_url: row.thumbnail_url,
            language: opt_from_sql(row.language_id, "entity id")?,
            media: from_sql(row.media_id, "entity id")?,
            has_marketing: row.has_marketing,
            published_before_joystream: opt_from_sql(row.published_before_joystream, "timestamp")?,
            is_public: row.is_public,
            is_curated: row.is_curated,
            is_explicit: row.is_explicit,
            is_featured: row.is_featured,
            license,
            version: from_sql(row.version, "block number")?,
        })
    }
}

const VIDEO_COLUMNS: &str = "id, channel_id, category_id, title, description, duration, skippable_intro_duration, \
     thumbnail_url, language_id, media_id, has_marketing, published_before_joystream, is_public, is_curated, \
     is_explicit, is_featured, license_kind, license_code, license_name, license_description, license_url, \
     license_content, version";

#[async_trait]
impl Record for Video {
    const CLASS: DomainClass = DomainClass::Video;

    async fn find(conn: &mut SqliteConnection, id: EntityId) -> Result<Option<Self>> {
        let sql = format!("SELECT {VIDEO_COLUMNS} FROM videos WHERE id = ?");
        let row = sqlx::query_as::<_, VideoRow>(&sql)
            .bind(to_sql(id, "entity id")?)
            .fetch_optional(&mut *conn)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(Self::try_from).transpose()
    }

    async fn save(&self, conn: &mut SqliteConnection) -> Result<()> {
        let (code, name, description, url, content) = match &self.license {
            LicenseKind::Known { code, name, description, url } => {
                (Some(code), name.as_ref(), description.as_ref(), url.as_ref(), None)
            },
            LicenseKind::UserDefined { content } => (None, None, None, None, Some(content)),
        };
        sqlx::query(
            "INSERT INTO videos
                (id, channel_id, category_id, title, description, duration, skippable_intro_duration,
                 thumbnail_url, language_id, media_id, has_marketing, published_before_joystream,
                 is_public, is_curated, is_explicit, is_featured, license_kind, license_code, license_name,
                 license_description, license_url, license_content, version)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT (id) DO UPDATE SET
                channel_id = excluded.channel_id,
                category_id = excluded.category_id,
                title = excluded.title,
                description = excluded.description,
                duration = excluded.duration,
                skippable_intro_duration = excluded.skippable_intro_duration,
                thumbnail_url = excluded.thumbnail_url,
                language_id = excluded.language_id,
                media_id = excluded.media_id,
                has_marketing = excluded.has_marketing,
                published_before_joystream = excluded.published_before_joystream,
                is_public = excluded.is_public,
                is_curated = excluded.is_curated,
                is_explicit = excluded.is_explicit,
                is_featured = excluded.is_featured,
                license_kind = excluded.license_kind,
                license_code = excluded.license_code,
                license_name = excluded.license_name,
                license_description = excluded.license_description,
                license_url = excluded.license_url,
                license_content = excluded.license_content",
        )
        .bind(to_sql(self.id, "entity id")?)
        .bind(to_sql(self.channel, "entity id")?)
        .bind(to_sql(self.category, "entity id")?)
        .bind(&self.title)
        .bind(&self.description)
        .bind(i64::from(self.duration))
        .bind(self.skippable_intro_duration.map(i64::from))
        .bind(&self.thumbnail_url)
        .bind(opt_to_sql(self.language, "entity id")?)
        .bind(to_sql(self.media, "entity id")?)
        .bind(self.has_marketing)
        .bind(opt_to_sql(self.published_before_joystream, "timestamp")?)
        .bind(self.is_public)
        .bind(self.is_curated)
        .bind(self.is_explicit)
        .bind(self.is_featured)
        .bind(self.license.tag())
        .bind(code)
        .bind(name)
        .bind(description)
        .bind(url)
        .bind(content)
        .bind(i64::from(self.version))
        .execute(&mut *conn)
        .await
        .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }
}

impl Video {
    pub async fn ids_by_channel(conn: &mut SqliteConnection, channel: EntityId) -> Result<Vec<EntityId>> {
        ids_where(conn, "SELECT id FROM videos WHERE channel_id = ? ORDER BY id", channel).await
    }

    pub async fn ids_by_category(conn: &mut SqliteConnection, category: EntityId) -> Result<Vec<EntityId>> {
        ids_where(conn, "SELECT id FROM videos WHERE category_id = ? ORDER BY id", category).await
    }

    pub async fn ids_by_media(conn: &mut SqliteConnection, media: EntityId) -> Result<Vec<EntityId>> {
        ids_where(conn, "SELECT id FROM videos WHERE media_id = ? ORDER BY id", media).await
    }

    /// Every video whose embedded license equals `license`.
    pub async fn matching_license(conn: &mut SqliteConnection, license: &LicenseKind) -> Result<Vec<Self>> {
        let sql = format!("SELECT {VIDEO_COLUMNS} FROM videos WHERE license_kind = ? ORDER BY id");
        let rows = sqlx::query_as::<_, VideoRow>(&sql)
            .bind(license.tag())
            .fetch_all(&mut *conn)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let mut matching = Vec::new();
        for row in rows {
            let video = Self::try_from(row)?;
            if video.license == *license {
                matching.push(video);
            }
        }
        Ok(matching)
    }

    /// Detach every video from a language about to be removed.
    pub async fn clear_language(conn: &mut SqliteConnection, language: EntityId) -> Result<u64> {
        let result = sqlx::query("UPDATE videos SET language_id = NULL WHERE language_id = ?")
            .bind(to_sql(language, "entity id")?)
            .execute(&mut *conn)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected())
    }

    pub async fn set_featured(conn: &mut SqliteConnection, id: EntityId, featured: bool) -> Result<()> {
        sqlx::query("UPDATE videos SET is_featured = ? WHERE id = ?")
            .bind(featured)
            .bind(to_sql(id, "entity id")?)
            .execute(&mut *conn)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }
}
