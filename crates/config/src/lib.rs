//! Layered configuration: built-in defaults, then an optional file, then
//! `CDMIRROR_`-prefixed environment variables.

pub mod error;

use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ErrorKind, Result};

const ENV_PREFIX: &str = "CDMIRROR_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite database file.
    pub database: PathBuf,
    /// Network tag recorded on every block.
    pub network: String,
    /// Watermark used before the first batch is applied. Id 0 is reserved
    /// for the class templates.
    pub first_entity_id: u64,
    pub templates: Templates,
}

impl Default for Config {
    fn default() -> Self {
        let database = project_dirs()
            .map(|dirs| dirs.data_dir().join("mirror.sqlite"))
            .unwrap_or_else(|| PathBuf::from("cdmirror.sqlite"));
        Self { database, network: "olympia".to_string(), first_entity_id: 1, templates: Templates::default() }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "cdmirror")
}

impl Config {
    /// Load from `path` if given, otherwise from `config.toml` in the
    /// platform config directory when present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        match path {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading configuration file");
                figment = match path.extension().and_then(|ext| ext.to_str()) {
                    Some("yaml" | "yml") => figment.merge(Yaml::file_exact(path)),
                    Some("json") => figment.merge(Json::file_exact(path)),
                    _ => figment.merge(Toml::file_exact(path)),
                };
            },
            None => {
                if let Some(dirs) = project_dirs() {
                    figment = figment.merge(Toml::file(dirs.config_dir().join("config.toml")));
                }
            },
        }
        Self::from_figment(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    fn from_figment(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.network.trim().is_empty() {
            exn::bail!(ErrorKind::Invalid("network must not be empty"));
        }
        if self.first_entity_id == 0 {
            exn::bail!(ErrorKind::Invalid("first_entity_id 0 is reserved for templates"));
        }
        Ok(())
    }
}

/// Seed values for the id-0 template row of every class.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Templates {
    pub language: LanguageTemplate,
    pub category: CategoryTemplate,
    pub channel: ChannelTemplate,
    pub known_license: KnownLicenseTemplate,
    pub user_defined_license: UserDefinedLicenseTemplate,
    pub license: LicenseTemplate,
    pub http_media_location: HttpMediaLocationTemplate,
    pub joystream_media_location: JoystreamMediaLocationTemplate,
    pub media_location: MediaLocationTemplate,
    pub video_media_encoding: VideoMediaEncodingTemplate,
    pub video_media: VideoMediaTemplate,
    pub video: VideoTemplate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageTemplate {
    pub name: String,
    pub code: String,
}

impl Default for LanguageTemplate {
    fn default() -> Self {
        Self { name: "English".to_string(), code: "en".to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryTemplate {
    pub name: String,
    pub description: String,
}

impl Default for CategoryTemplate {
    fn default() -> Self {
        Self { name: "Uncategorized".to_string(), description: String::new() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelTemplate {
    pub title: String,
    pub description: String,
    pub cover_photo_url: String,
    pub avatar_photo_url: String,
    pub is_public: bool,
    pub is_curated: bool,
}

impl Default for ChannelTemplate {
    fn default() -> Self {
        Self {
            title: "Default channel".to_string(),
            description: String::new(),
            cover_photo_url: String::new(),
            avatar_photo_url: String::new(),
            is_public: true,
            is_curated: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnownLicenseTemplate {
    pub code: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
}

impl Default for KnownLicenseTemplate {
    fn default() -> Self {
        Self {
            code: "CC_BY".to_string(),
            name: Some("Creative Commons Attribution".to_string()),
            description: None,
            url: Some("https://creativecommons.org/licenses/by/4.0".to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserDefinedLicenseTemplate {
    pub content: String,
}

/// The template license always points at the template known license.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LicenseTemplate {
    pub attribution: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpMediaLocationTemplate {
    pub url: String,
    pub port: Option<u16>,
}

impl Default for HttpMediaLocationTemplate {
    fn default() -> Self {
        Self { url: "http://localhost".to_string(), port: None }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JoystreamMediaLocationTemplate {
    pub data_object_id: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationBranch {
    Http,
    #[default]
    Joystream,
}

/// Which template location the template media location points at.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaLocationTemplate {
    pub branch: LocationBranch,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoMediaEncodingTemplate {
    pub name: String,
}

impl Default for VideoMediaEncodingTemplate {
    fn default() -> Self {
        Self { name: "H.264".to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoMediaTemplate {
    pub pixel_width: u16,
    pub pixel_height: u16,
    pub size: Option<u64>,
}

impl Default for VideoMediaTemplate {
    fn default() -> Self {
        Self { pixel_width: 1920, pixel_height: 1080, size: None }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoTemplate {
    pub title: String,
    pub description: String,
    pub duration: u32,
    pub thumbnail_url: String,
    pub is_public: bool,
    pub is_curated: bool,
    pub is_explicit: bool,
}

impl Default for VideoTemplate {
    fn default() -> Self {
        Self {
            title: "Untitled".to_string(),
            description: String::new(),
            duration: 0,
            thumbnail_url: String::new(),
            is_public: true,
            is_curated: false,
            is_explicit: false,
        }
    }
}
