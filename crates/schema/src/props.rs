//! Typed property sets, one closed struct per domain class.
//!
//! Every field is optional: an absent slot means "not supplied by this
//! operation", and it's up to the repository to fall back to the template row
//! (on create) or keep the stored value (on update).

use std::collections::BTreeMap;

use crate::error::{ErrorKind, Result};
use crate::{DomainClass, EntityRef, PropertyMap, Value};

/// Slot map viewed through a class' field names.
struct Fields<'a> {
    class: DomainClass,
    values: BTreeMap<&'static str, &'a Value>,
}

impl<'a> Fields<'a> {
    fn new(class: DomainClass, properties: &'a PropertyMap) -> Self {
        let mut values = BTreeMap::new();
        for (slot, value) in properties {
            match class.field_name(*slot) {
                Some(name) => {
                    values.insert(name, value);
                },
                None => tracing::trace!(class = class.name(), slot, "ignoring unknown property slot"),
            }
        }
        Self { class, values }
    }

    fn mismatch<T>(&self, field: &'static str, expected: &'static str, found: &Value) -> Result<T> {
        exn::bail!(ErrorKind::TypeMismatch { class: self.class.name(), field, expected, found: found.kind() })
    }

    fn text(&self, field: &'static str) -> Result<Option<String>> {
        match self.values.get(field) {
            None => Ok(None),
            Some(Value::Text(text)) => Ok(Some(text.clone())),
            Some(other) => self.mismatch(field, "text", other),
        }
    }

    fn bool(&self, field: &'static str) -> Result<Option<bool>> {
        match self.values.get(field) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(other) => self.mismatch(field, "bool", other),
        }
    }

    fn uint<T: TryFrom<u64>>(&self, field: &'static str) -> Result<Option<T>> {
        let expected = std::any::type_name::<T>();
        let Some(value) = self.values.get(field) else {
            return Ok(None);
        };
        let wide = match value {
            Value::Uint(n) => Some(*n),
            Value::Int(n) => u64::try_from(*n).ok(),
            _ => None,
        };
        match wide.and_then(|n| T::try_from(n).ok()) {
            Some(n) => Ok(Some(n)),
            None => self.mismatch(field, expected, value),
        }
    }

    fn reference(&self, field: &'static str) -> Result<Option<EntityRef>> {
        match self.values.get(field) {
            None => Ok(None),
            Some(Value::Reference(entity)) => Ok(Some(*entity)),
            Some(other) => self.mismatch(field, "reference", other),
        }
    }

    fn exclusive(&self, first: &'static str, second: &'static str) -> Result<()> {
        if self.values.contains_key(first) && self.values.contains_key(second) {
            exn::bail!(ErrorKind::AmbiguousVariant { class: self.class.name(), first, second });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelProps {
    pub title: Option<String>,
    pub description: Option<String>,
    pub cover_photo_url: Option<String>,
    pub avatar_photo_url: Option<String>,
    pub is_public: Option<bool>,
    pub is_curated: Option<bool>,
    pub language: Option<EntityRef>,
}

impl ChannelProps {
    pub fn decode(properties: &PropertyMap) -> Result<Self> {
        let f = Fields::new(DomainClass::Channel, properties);
        Ok(Self {
            title: f.text("title")?,
            description: f.text("description")?,
            cover_photo_url: f.text("coverPhotoUrl")?,
            avatar_photo_url: f.text("avatarPhotoUrl")?,
            is_public: f.bool("isPublic")?,
            is_curated: f.bool("isCurated")?,
            language: f.reference("language")?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryProps {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl CategoryProps {
    pub fn decode(properties: &PropertyMap) -> Result<Self> {
        let f = Fields::new(DomainClass::ContentCategory, properties);
        Ok(Self { name: f.text("name")?, description: f.text("description")? })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HttpMediaLocationProps {
    pub url: Option<String>,
    pub port: Option<u16>,
}

impl HttpMediaLocationProps {
    pub fn decode(properties: &PropertyMap) -> Result<Self> {
        let f = Fields::new(DomainClass::HttpMediaLocation, properties);
        Ok(Self { url: f.text("url")?, port: f.uint("port")? })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct JoystreamMediaLocationProps {
    pub data_object_id: Option<String>,
}

impl JoystreamMediaLocationProps {
    pub fn decode(properties: &PropertyMap) -> Result<Self> {
        let f = Fields::new(DomainClass::JoystreamMediaLocation, properties);
        Ok(Self { data_object_id: f.text("dataObjectId")? })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct KnownLicenseProps {
    pub code: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
}

impl KnownLicenseProps {
    pub fn decode(properties: &PropertyMap) -> Result<Self> {
        let f = Fields::new(DomainClass::KnownLicense, properties);
        Ok(Self {
            code: f.text("code")?,
            name: f.text("name")?,
            description: f.text("description")?,
            url: f.text("url")?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LanguageProps {
    pub name: Option<String>,
    pub code: Option<String>,
}

impl LanguageProps {
    pub fn decode(properties: &PropertyMap) -> Result<Self> {
        let f = Fields::new(DomainClass::Language, properties);
        Ok(Self { name: f.text("name")?, code: f.text("code")? })
    }
}

/// At most one of `known_license` and `user_defined_license` is set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LicenseProps {
    pub known_license: Option<EntityRef>,
    pub user_defined_license: Option<EntityRef>,
    pub attribution: Option<String>,
}

impl LicenseProps {
    pub fn decode(properties: &PropertyMap) -> Result<Self> {
        let f = Fields::new(DomainClass::License, properties);
        f.exclusive("knownLicense", "userDefinedLicense")?;
        Ok(Self {
            known_license: f.reference("knownLicense")?,
            user_defined_license: f.reference("userDefinedLicense")?,
            attribution: f.text("attribution")?,
        })
    }
}

/// At most one of the two location references is set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaLocationProps {
    pub http_media_location: Option<EntityRef>,
    pub joystream_media_location: Option<EntityRef>,
}

impl MediaLocationProps {
    pub fn decode(properties: &PropertyMap) -> Result<Self> {
        let f = Fields::new(DomainClass::MediaLocation, properties);
        f.exclusive("httpMediaLocation", "joystreamMediaLocation")?;
        Ok(Self {
            http_media_location: f.reference("httpMediaLocation")?,
            joystream_media_location: f.reference("joystreamMediaLocation")?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserDefinedLicenseProps {
    pub content: Option<String>,
}

impl UserDefinedLicenseProps {
    pub fn decode(properties: &PropertyMap) -> Result<Self> {
        let f = Fields::new(DomainClass::UserDefinedLicense, properties);
        Ok(Self { content: f.text("content")? })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoProps {
    pub channel: Option<EntityRef>,
    pub category: Option<EntityRef>,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Seconds.
    pub duration: Option<u32>,
    pub skippable_intro_duration: Option<u32>,
    pub thumbnail_url: Option<String>,
    pub language: Option<EntityRef>,
    pub media: Option<EntityRef>,
    pub has_marketing: Option<bool>,
    /// Unix timestamp of the original publication elsewhere.
    pub published_before_joystream: Option<u64>,
    pub is_public: Option<bool>,
    pub is_curated: Option<bool>,
    pub is_explicit: Option<bool>,
    pub license: Option<EntityRef>,
}

impl VideoProps {
    pub fn decode(properties: &PropertyMap) -> Result<Self> {
        let f = Fields::new(DomainClass::Video, properties);
        Ok(Self {
            channel: f.reference("channel")?,
            category: f.reference("category")?,
            title: f.text("title")?,
            description: f.text("description")?,
            duration: f.uint("duration")?,
            skippable_intro_duration: f.uint("skippableIntroDuration")?,
            thumbnail_url: f.text("thumbnailUrl")?,
            language: f.reference("language")?,
            media: f.reference("media")?,
            has_marketing: f.bool("hasMarketing")?,
            published_before_joystream: f.uint("publishedBeforeJoystream")?,
            is_public: f.bool("isPublic")?,
            is_curated: f.bool("isCurated")?,
            is_explicit: f.bool("isExplicit")?,
            license: f.reference("license")?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoMediaProps {
    pub encoding: Option<EntityRef>,
    pub pixel_width: Option<u16>,
    pub pixel_height: Option<u16>,
    /// Bytes.
    pub size: Option<u64>,
    pub location: Option<EntityRef>,
}

impl VideoMediaProps {
    pub fn decode(properties: &PropertyMap) -> Result<Self> {
        let f = Fields::new(DomainClass::VideoMedia, properties);
        Ok(Self {
            encoding: f.reference("encoding")?,
            pixel_width: f.uint("pixelWidth")?,
            pixel_height: f.uint("pixelHeight")?,
            size: f.uint("size")?,
            location: f.reference("location")?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoMediaEncodingProps {
    pub name: Option<String>,
}

impl VideoMediaEncodingProps {
    pub fn decode(properties: &PropertyMap) -> Result<Self> {
        let f = Fields::new(DomainClass::VideoMediaEncoding, properties);
        Ok(Self { name: f.text("name")? })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeaturedVideoProps {
    pub video: Option<EntityRef>,
}

impl FeaturedVideoProps {
    pub fn decode(properties: &PropertyMap) -> Result<Self> {
        let f = Fields::new(DomainClass::FeaturedVideo, properties);
        Ok(Self { video: f.reference("video")? })
    }
}

/// Typed properties of any domain class.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassProps {
    Channel(ChannelProps),
    ContentCategory(CategoryProps),
    HttpMediaLocation(HttpMediaLocationProps),
    JoystreamMediaLocation(JoystreamMediaLocationProps),
    KnownLicense(KnownLicenseProps),
    Language(LanguageProps),
    License(LicenseProps),
    MediaLocation(MediaLocationProps),
    UserDefinedLicense(UserDefinedLicenseProps),
    Video(VideoProps),
    VideoMedia(VideoMediaProps),
    VideoMediaEncoding(VideoMediaEncodingProps),
    FeaturedVideo(FeaturedVideoProps),
}

impl ClassProps {
    pub fn decode(class: DomainClass, properties: &PropertyMap) -> Result<Self> {
        Ok(match class {
            DomainClass::Channel => Self::Channel(ChannelProps::decode(properties)?),
            DomainClass::ContentCategory => Self::ContentCategory(CategoryProps::decode(properties)?),
            DomainClass::HttpMediaLocation => Self::HttpMediaLocation(HttpMediaLocationProps::decode(properties)?),
            DomainClass::JoystreamMediaLocation => {
                Self::JoystreamMediaLocation(JoystreamMediaLocationProps::decode(properties)?)
            },
            DomainClass::KnownLicense => Self::KnownLicense(KnownLicenseProps::decode(properties)?),
            DomainClass::Language => Self::Language(LanguageProps::decode(properties)?),
            DomainClass::License => Self::License(LicenseProps::decode(properties)?),
            DomainClass::MediaLocation => Self::MediaLocation(MediaLocationProps::decode(properties)?),
            DomainClass::UserDefinedLicense => Self::UserDefinedLicense(UserDefinedLicenseProps::decode(properties)?),
            DomainClass::Video => Self::Video(VideoProps::decode(properties)?),
            DomainClass::VideoMedia => Self::VideoMedia(VideoMediaProps::decode(properties)?),
            DomainClass::VideoMediaEncoding => Self::VideoMediaEncoding(VideoMediaEncodingProps::decode(properties)?),
            DomainClass::FeaturedVideo => Self::FeaturedVideo(FeaturedVideoProps::decode(properties)?),
        })
    }

    pub fn class(&self) -> DomainClass {
        match self {
            Self::Channel(_) => DomainClass::Channel,
            Self::ContentCategory(_) => DomainClass::ContentCategory,
            Self::HttpMediaLocation(_) => DomainClass::HttpMediaLocation,
            Self::JoystreamMediaLocation(_) => DomainClass::JoystreamMediaLocation,
            Self::KnownLicense(_) => DomainClass::KnownLicense,
            Self::Language(_) => DomainClass::Language,
            Self::License(_) => DomainClass::License,
            Self::MediaLocation(_) => DomainClass::MediaLocation,
            Self::UserDefinedLicense(_) => DomainClass::UserDefinedLicense,
            Self::Video(_) => DomainClass::Video,
            Self::VideoMedia(_) => DomainClass::VideoMedia,
            Self::VideoMediaEncoding(_) => DomainClass::VideoMediaEncoding,
            Self::FeaturedVideo(_) => DomainClass::FeaturedVideo,
        }
    }
}
