//! Seeding the id-0 template row of every domain class.
//!
//! Later creations fall back to these rows for every field they leave out, so
//! they have to exist before the first transaction is applied. Rows already
//! present are left untouched, which makes re-running harmless and keeps any
//! template edits made through updates.

use cdmirror_config::{LocationBranch, Templates};
use cdmirror_store::Record;
use cdmirror_store::models::{
    Category, Channel, FeaturedVideo, HttpMediaLocation, JoystreamMediaLocation, KnownLicense, Language, License,
    LicenseTarget, LocationTarget, MediaLocation, UserDefinedLicense, Video, VideoMedia, VideoMediaEncoding,
};
use tracing::instrument;

use crate::context::Batch;
use crate::error::Result;
use crate::repo::{license_kind, location_kind};

const TEMPLATE_ID: u64 = 0;

/// Save `template` unless its class already has a template row.
async fn ensure<R: Record>(batch: &mut Batch, template: R) -> Result<bool> {
    if batch.exists(R::CLASS, TEMPLATE_ID).await? {
        tracing::trace!(class = R::CLASS.name(), "template already present");
        return Ok(false);
    }
    batch.save(&template).await?;
    tracing::debug!(class = R::CLASS.name(), "template created");
    Ok(true)
}

/// Returns how many templates were created.
#[instrument(level = "debug", skip_all, fields(block = batch.block()))]
pub(crate) async fn seed_templates(batch: &mut Batch, templates: &Templates) -> Result<usize> {
    let id = TEMPLATE_ID;
    let version = batch.block();
    let mut created = 0;

    let t = &templates.language;
    created += usize::from(ensure(batch, Language { id, name: t.name.clone(), code: t.code.clone(), version }).await?);

    let t = &templates.category;
    let category = Category { id, name: t.name.clone(), description: t.description.clone(), version };
    created += usize::from(ensure(batch, category).await?);

    let t = &templates.channel;
    let channel = Channel {
        id,
        title: t.title.clone(),
        description: t.description.clone(),
        cover_photo_url: t.cover_photo_url.clone(),
        avatar_photo_url: t.avatar_photo_url.clone(),
        is_public: t.is_public,
        is_curated: t.is_curated,
        language: None,
        version,
    };
    created += usize::from(ensure(batch, channel).await?);

    let t = &templates.known_license;
    let known = KnownLicense {
        id,
        code: t.code.clone(),
        name: t.name.clone(),
        description: t.description.clone(),
        url: t.url.clone(),
        version,
    };
    created += usize::from(ensure(batch, known).await?);

    let content = templates.user_defined_license.content.clone();
    created += usize::from(ensure(batch, UserDefinedLicense { id, content, version }).await?);

    let license = License {
        id,
        target: LicenseTarget::Known(id),
        attribution: templates.license.attribution.clone(),
        version,
    };
    created += usize::from(ensure(batch, license).await?);

    let data_object_id = templates.joystream_media_location.data_object_id.clone();
    created += usize::from(ensure(batch, JoystreamMediaLocation { id, data_object_id, version }).await?);

    let t = &templates.http_media_location;
    created += usize::from(ensure(batch, HttpMediaLocation { id, url: t.url.clone(), port: t.port, version }).await?);

    let target = match templates.media_location.branch {
        LocationBranch::Http => LocationTarget::Http(id),
        LocationBranch::Joystream => LocationTarget::Joystream(id),
    };
    created += usize::from(ensure(batch, MediaLocation { id, target, version }).await?);

    let name = templates.video_media_encoding.name.clone();
    created += usize::from(ensure(batch, VideoMediaEncoding { id, name, version }).await?);

    // Embedded values come from the stored templates, which may predate the
    // current configuration.
    let media_location: MediaLocation = batch.template().await?;
    let location = location_kind(batch, &media_location.target).await?;
    let t = &templates.video_media;
    let media = VideoMedia {
        id,
        encoding: None,
        pixel_width: t.pixel_width,
        pixel_height: t.pixel_height,
        size: t.size,
        location,
        version,
    };
    created += usize::from(ensure(batch, media).await?);

    let license: License = batch.template().await?;
    let license = license_kind(batch, &license.target).await?;
    let t = &templates.video;
    let video = Video {
        id,
        channel: id,
        category: id,
        title: t.title.clone(),
        description: t.description.clone(),
        duration: t.duration,
        skippable_intro_duration: None,
        thumbnail_url: t.thumbnail_url.clone(),
        language: None,
        media: id,
        has_marketing: None,
        published_before_joystream: None,
        is_public: t.is_public,
        is_curated: t.is_curated,
        is_explicit: t.is_explicit,
        is_featured: false,
        license,
        version,
    };
    created += usize::from(ensure(batch, video).await?);

    created += usize::from(ensure(batch, FeaturedVideo { id, video: id, version }).await?);

    tracing::info!(created, "templates seeded");
    Ok(created)
}
