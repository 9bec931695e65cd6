use derive_more::Display;
use std::collections::BTreeMap;

use crate::{ClassId, SlotIndex};

/// Every content directory class this indexer knows how to materialize.
///
/// Classes the chain defines but that are missing here are skipped (with a
/// warning) wherever they are encountered, never treated as errors.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DomainClass {
    Channel,
    ContentCategory,
    HttpMediaLocation,
    JoystreamMediaLocation,
    KnownLicense,
    Language,
    License,
    MediaLocation,
    UserDefinedLicense,
    Video,
    VideoMedia,
    VideoMediaEncoding,
    FeaturedVideo,
}

impl DomainClass {
    /// All classes in class id order.
    pub const ALL: [DomainClass; 13] = [
        Self::Channel,
        Self::ContentCategory,
        Self::HttpMediaLocation,
        Self::JoystreamMediaLocation,
        Self::KnownLicense,
        Self::Language,
        Self::License,
        Self::MediaLocation,
        Self::UserDefinedLicense,
        Self::Video,
        Self::VideoMedia,
        Self::VideoMediaEncoding,
        Self::FeaturedVideo,
    ];

    pub fn from_class_id(id: ClassId) -> Option<Self> {
        let index = usize::try_from(id).ok()?.checked_sub(1)?;
        Self::ALL.get(index).copied()
    }

    pub fn class_id(self) -> ClassId {
        // ALL is ordered by class id, starting from one.
        Self::ALL.iter().position(|c| *c == self).map_or(0, |i| i as ClassId + 1)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Channel => "Channel",
            Self::ContentCategory => "ContentCategory",
            Self::HttpMediaLocation => "HttpMediaLocation",
            Self::JoystreamMediaLocation => "JoystreamMediaLocation",
            Self::KnownLicense => "KnownLicense",
            Self::Language => "Language",
            Self::License => "License",
            Self::MediaLocation => "MediaLocation",
            Self::UserDefinedLicense => "UserDefinedLicense",
            Self::Video => "Video",
            Self::VideoMedia => "VideoMedia",
            Self::VideoMediaEncoding => "VideoMediaEncoding",
            Self::FeaturedVideo => "FeaturedVideo",
        }
    }

    /// Field names indexed by property slot.
    pub fn property_slots(self) -> &'static [&'static str] {
        match self {
            Self::Channel => &[
                "title",
                "description",
                "coverPhotoUrl",
                "avatarPhotoUrl",
                "isPublic",
                "isCurated",
                "language",
            ],
            Self::ContentCategory => &["name", "description"],
            Self::HttpMediaLocation => &["url", "port"],
            Self::JoystreamMediaLocation => &["dataObjectId"],
            Self::KnownLicense => &["code", "name", "description", "url"],
            Self::Language => &["name", "code"],
            Self::License => &["knownLicense", "userDefinedLicense", "attribution"],
            Self::MediaLocation => &["httpMediaLocation", "joystreamMediaLocation"],
            Self::UserDefinedLicense => &["content"],
            Self::Video => &[
                "channel",
                "category",
                "title",
                "description",
                "duration",
                "skippableIntroDuration",
                "thumbnailUrl",
                "language",
                "media",
                "hasMarketing",
                "publishedBeforeJoystream",
                "isPublic",
                "isCurated",
                "isExplicit",
                "license",
            ],
            Self::VideoMedia => &["encoding", "pixelWidth", "pixelHeight", "size", "location"],
            Self::VideoMediaEncoding => &["name"],
            Self::FeaturedVideo => &["video"],
        }
    }

    /// Field name for a single slot, if this class defines it.
    pub fn field_name(self, slot: SlotIndex) -> Option<&'static str> {
        self.property_slots().get(usize::from(slot)).copied()
    }
}

/// Domain class name for a numeric class id.
pub fn class_name_for(id: ClassId) -> Option<&'static str> {
    DomainClass::from_class_id(id).map(DomainClass::name)
}

/// Ordered slot table for a class name.
pub fn property_slot_table(class_name: &str) -> Option<BTreeMap<SlotIndex, &'static str>> {
    let class = DomainClass::from_name(class_name)?;
    Some(
        class
            .property_slots()
            .iter()
            .enumerate()
            .filter_map(|(slot, name)| Some((SlotIndex::try_from(slot).ok()?, *name)))
            .collect(),
    )
}
