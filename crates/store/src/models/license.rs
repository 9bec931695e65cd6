use async_trait::async_trait;
use cdmirror_schema::{BlockNumber, DomainClass, EntityId};
use exn::ResultExt;
use sqlx::SqliteConnection;

use crate::error::{Error, ErrorKind, Result};
use crate::record::{Record, from_sql, ids_where, opt_to_sql, to_sql};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownLicense {
    pub id: EntityId,
    pub code: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub version: BlockNumber,
}

#[derive(sqlx::FromRow)]
struct KnownLicenseRow {
    id: i64,
    code: String,
    name: Option<String>,
    description: Option<String>,
    url: Option<String>,
    version: i64,
}

impl TryFrom<KnownLicenseRow> for KnownLicense {
    type Error = Error;
    fn try_from(row: KnownLicenseRow) -> Result<Self> {
        Ok(Self {
            id: from_sql(row.id, "entity id")?,
            code: row.code,
            name: row.name,
            description: row.description,
            url: row.url,
            version: from_sql(row.version, "block number")?,
        })
    }
}

#[async_trait]
impl Record for KnownLicense {
    const CLASS: DomainClass = DomainClass::KnownLicense;

    async fn find(conn: &mut SqliteConnection, id: EntityId) -> Result<Option<Self>> {
        let row = sqlx::query_as::<_, KnownLicenseRow>(
            "SELECT id, code, name, description, url, version FROM known_licenses WHERE id = ?",
        )
        .bind(to_sql(id, "entity id")?)
        .fetch_optional(&mut *conn)
        .await
        .or_raise(|| ErrorKind::Database)?;
        row.map(Self::try_from).transpose()
    }

    async fn save(&self, conn: &mut SqliteConnection) -> Result<()> {
        sqlx::query(
            "INSERT INTO known_licenses (id, code, name, description, url, version) VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT (id) DO UPDATE SET
                code = excluded.code, name = excluded.name, description = excluded.description, url = excluded.url",
        )
        .bind(to_sql(self.id, "entity id")?)
        .bind(&self.code)
        .bind(&self.name)
        .bind(&self.description)
        .bind(&self.url)
        .bind(i64::from(self.version))
        .execute(&mut *conn)
        .await
        .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDefinedLicense {
    pub id: EntityId,
    pub content: String,
    pub version: BlockNumber,
}

#[derive(sqlx::FromRow)]
struct UserDefinedLicenseRow {
    id: i64,
    content: String,
    version: i64,
}

impl TryFrom<UserDefinedLicenseRow> for UserDefinedLicense {
    type Error = Error;
    fn try_from(row: UserDefinedLicenseRow) -> Result<Self> {
        Ok(Self {
            id: from_sql(row.id, "entity id")?,
            content: row.content,
            version: from_sql(row.version, "block number")?,
        })
    }
}

#[async_trait]
impl Record for UserDefinedLicense {
    const CLASS: DomainClass = DomainClass::UserDefinedLicense;

    async fn find(conn: &mut SqliteConnection, id: EntityId) -> Result<Option<Self>> {
        let row = sqlx::query_as::<_, UserDefinedLicenseRow>(
            "SELECT id, content, version FROM user_defined_licenses WHERE id = ?",
        )
        .bind(to_sql(id, "entity id")?)
        .fetch_optional(&mut *conn)
        .await
        .or_raise(|| ErrorKind::Database)?;
        row.map(Self::try_from).transpose()
    }

    async fn save(&self, conn: &mut SqliteConnection) -> Result<()> {
        sqlx::query(
            "INSERT INTO user_defined_licenses (id, content, version) VALUES (?, ?, ?)
             ON CONFLICT (id) DO UPDATE SET content = excluded.content",
        )
        .bind(to_sql(self.id, "entity id")?)
        .bind(&self.content)
        .bind(i64::from(self.version))
        .execute(&mut *conn)
        .await
        .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }
}

/// Which license entity a [`License`] points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LicenseTarget {
    Known(EntityId),
    UserDefined(EntityId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct License {
    pub id: EntityId,
    pub target: LicenseTarget,
    pub attribution: Option<String>,
    pub version: BlockNumber,
}

#[derive(sqlx::FromRow)]
struct LicenseRow {
    id: i64,
    known_license_id: Option<i64>,
    user_defined_license_id: Option<i64>,
    attribution: Option<String>,
    version: i64,
}

impl TryFrom<LicenseRow> for License {
    type Error = Error;
    fn try_from(row: LicenseRow) -> Result<Self> {
        let id = from_sql(row.id, "entity id")?;
        let target = match (row.known_license_id, row.user_defined_license_id) {
            (Some(known), None) => LicenseTarget::Known(from_sql(known, "entity id")?),
            (None, Some(user_defined)) => LicenseTarget::UserDefined(from_sql(user_defined, "entity id")?),
            _ => exn::bail!(ErrorKind::InvalidVariant("license", id)),
        };
        Ok(Self { id, target, attribution: row.attribution, version: from_sql(row.version, "block number")? })
    }
}

#[async_trait]
impl Record for License {
    const CLASS: DomainClass = DomainClass::License;

    async fn find(conn: &mut SqliteConnection, id: EntityId) -> Result<Option<Self>> {
        let row = sqlx::query_as::<_, LicenseRow>(
            "SELECT id, known_license_id, user_defined_license_id, attribution, version FROM licenses WHERE id = ?",
        )
        .bind(to_sql(id, "entity id")?)
        .fetch_optional(&mut *conn)
        .await
        .or_raise(|| ErrorKind::Database)?;
        row.map(Self::try_from).transpose()
    }

    async fn save(&self, conn: &mut SqliteConnection) -> Result<()> {
        let (known, user_defined) = match self.target {
            LicenseTarget::Known(id) => (Some(id), None),
            LicenseTarget::UserDefined(id) => (None, Some(id)),
        };
        sqlx::query(
            "INSERT INTO licenses (id, known_license_id, user_defined_license_id, attribution, version)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT (id) DO UPDATE SET
                known_license_id = excluded.known_license_id,
                user_defined_license_id = excluded.user_defined_license_id,
                attribution = excluded.attribution",
        )
        .bind(to_sql(self.id, "entity id")?)
        .bind(opt_to_sql(known, "entity id")?)
        .bind(opt_to_sql(user_defined, "entity id")?)
        .bind(&self.attribution)
        .bind(i64::from(self.version))
        .execute(&mut *conn)
        .await
        .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }
}

impl License {
    pub async fn ids_by_known_license(conn: &mut SqliteConnection, id: EntityId) -> Result<Vec<EntityId>> {
        ids_where(conn, "SELECT id FROM licenses WHERE known_license_id = ? ORDER BY id", id).await
    }

    pub async fn ids_by_user_defined_license(conn: &mut SqliteConnection, id: EntityId) -> Result<Vec<EntityId>> {
        ids_where(conn, "SELECT id FROM licenses WHERE user_defined_license_id = ? ORDER BY id", id).await
    }
}

/// A license as embedded by value on a video.
///
/// Videos don't reference license rows: they carry a copy of the license's
/// fields, so finding the videos affected by a license means comparing these
/// values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LicenseKind {
    Known {
        code: String,
        name: Option<String>,
        description: Option<String>,
        url: Option<String>,
    },
    UserDefined {
        content: String,
    },
}

impl LicenseKind {
    pub(crate) fn tag(&self) -> &'static str {
        match self {
            Self::Known { .. } => "known",
            Self::UserDefined { .. } => "user_defined",
        }
    }
}

impl From<&KnownLicense> for LicenseKind {
    fn from(license: &KnownLicense) -> Self {
        Self::Known {
            code: license.code.clone(),
            name: license.name.clone(),
            description: license.description.clone(),
            url: license.url.clone(),
        }
    }
}

impl From<&UserDefinedLicense> for LicenseKind {
    fn from(license: &UserDefinedLicense) -> Self {
        Self::UserDefined { content: license.content.clone() }
    }
}
