use cdmirror_schema::props::{VideoMediaEncodingProps, VideoMediaProps, VideoProps};
use cdmirror_schema::{DomainClass, EntityId, EntityRef};
use cdmirror_store::models::{
    FeaturedVideo, License, LicenseKind, MediaLocation, MediaLocationKind, Video, VideoMedia, VideoMediaEncoding,
};
use exn::ResultExt;

use super::{license_kind, location_kind};
use crate::context::Batch;
use crate::error::{ErrorKind, Result};

pub(super) async fn create_encoding(batch: &mut Batch, id: EntityId, props: VideoMediaEncodingProps) -> Result<()> {
    let template: VideoMediaEncoding = batch.template().await?;
    let encoding = VideoMediaEncoding { id, name: props.name.unwrap_or(template.name), version: batch.block() };
    batch.save(&encoding).await
}

pub(super) async fn update_encoding(batch: &mut Batch, id: EntityId, props: VideoMediaEncodingProps) -> Result<()> {
    let mut encoding: VideoMediaEncoding = batch.require(id).await?;
    if let Some(name) = props.name {
        encoding.name = name;
    }
    batch.save(&encoding).await
}

pub(super) async fn remove_encoding(batch: &mut Batch, id: EntityId) -> Result<()> {
    let media = VideoMedia::clear_encoding(batch.conn(), id).await.or_raise(|| ErrorKind::Store)?;
    tracing::debug!(media, "detached encoding");
    batch.delete(DomainClass::VideoMediaEncoding, id).await
}

async fn embedded_location(batch: &mut Batch, location: EntityRef) -> Result<MediaLocationKind> {
    let location: MediaLocation = batch.resolve_row(location).await?;
    location_kind(batch, &location.target).await
}

pub(super) async fn create_media(batch: &mut Batch, id: EntityId, props: VideoMediaProps) -> Result<()> {
    let template: VideoMedia = batch.template().await?;
    let encoding = batch.resolve_opt(props.encoding, DomainClass::VideoMediaEncoding).await?;
    let location = match props.location {
        Some(location) => embedded_location(batch, location).await?,
        None => template.location,
    };
    let media = VideoMedia {
        id,
        encoding,
        pixel_width: props.pixel_width.unwrap_or(template.pixel_width),
        pixel_height: props.pixel_height.unwrap_or(template.pixel_height),
        size: props.size.or(template.size),
        location,
        version: batch.block(),
    };
    batch.save(&media).await
}

pub(super) async fn update_media(batch: &mut Batch, id: EntityId, props: VideoMediaProps) -> Result<()> {
    let mut media: VideoMedia = batch.require(id).await?;
    if let Some(encoding) = props.encoding {
        media.encoding = Some(batch.resolve(encoding, DomainClass::VideoMediaEncoding).await?);
    }
    if let Some(width) = props.pixel_width {
        media.pixel_width = width;
    }
    if let Some(height) = props.pixel_height {
        media.pixel_height = height;
    }
    if props.size.is_some() {
        media.size = props.size;
    }
    if let Some(location) = props.location {
        media.location = embedded_location(batch, location).await?;
    }
    batch.save(&media).await
}

pub(super) async fn remove_media(batch: &mut Batch, id: EntityId) -> Result<()> {
    for video in Video::ids_by_media(batch.conn(), id).await.or_raise(|| ErrorKind::Store)? {
        remove_video(batch, video).await?;
    }
    batch.delete(DomainClass::VideoMedia, id).await
}

async fn embedded_license(batch: &mut Batch, license: EntityRef) -> Result<LicenseKind> {
    let license: License = batch.resolve_row(license).await?;
    license_kind(batch, &license.target).await
}

async fn resolve_or(
    batch: &mut Batch,
    target: Option<EntityRef>,
    class: DomainClass,
    fallback: EntityId,
) -> Result<EntityId> {
    match target {
        Some(target) => batch.resolve(target, class).await,
        None => Ok(fallback),
    }
}

pub(super) async fn create_video(batch: &mut Batch, id: EntityId, props: VideoProps) -> Result<()> {
    let template: Video = batch.template().await?;
    let channel = resolve_or(batch, props.channel, DomainClass::Channel, template.channel).await?;
    let category = resolve_or(batch, props.category, DomainClass::ContentCategory, template.category).await?;
    let media = resolve_or(batch, props.media, DomainClass::VideoMedia, template.media).await?;
    let language = batch.resolve_opt(props.language, DomainClass::Language).await?;
    let license = match props.license {
        Some(license) => embedded_license(batch, license).await?,
        None => template.license,
    };
    let video = Video {
        id,
        channel,
        category,
        title: props.title.unwrap_or(template.title),
        description: props.description.unwrap_or(template.description),
        duration: props.duration.unwrap_or(template.duration),
        skippable_intro_duration: props.skippable_intro_duration.or(template.skippable_intro_duration),
        thumbnail_url: props.thumbnail_url.unwrap_or(template.thumbnail_url),
        language,
        media,
        has_marketing: props.has_marketing.or(template.has_marketing),
        published_before_joystream: props.published_before_joystream.or(template.published_before_joystream),
        is_public: props.is_public.unwrap_or(template.is_public),
        is_curated: props.is_curated.unwrap_or(template.is_curated),
        is_explicit: props.is_explicit.unwrap_or(template.is_explicit),
        is_featured: false,
        license,
        version: batch.block(),
    };
    batch.save(&video).await
}

pub(super) async fn update_video(batch: &mut Batch, id: EntityId, props: VideoProps) -> Result<()> {
    let mut video: Video = batch.require(id).await?;
    video.channel = resolve_or(batch, props.channel, DomainClass::Channel, video.channel).await?;
    video.category = resolve_or(batch, props.category, DomainClass::ContentCategory, video.category).await?;
    video.media = resolve_or(batch, props.media, DomainClass::VideoMedia, video.media).await?;
    if let Some(language) = props.language {
        video.language = Some(batch.resolve(language, DomainClass::Language).await?);
    }
    if let Some(license) = props.license {
        video.license = embedded_license(batch, license).await?;
    }
    if let Some(title) = props.title {
        video.title = title;
    }
    if let Some(description) = props.description {
        video.description = description;
    }
    if let Some(duration) = props.duration {
        video.duration = duration;
    }
    if props.skippable_intro_duration.is_some() {
        video.skippable_intro_duration = props.skippable_intro_duration;
    }
    if let Some(url) = props.thumbnail_url {
        video.thumbnail_url = url;
    }
    if props.has_marketing.is_some() {
        video.has_marketing = props.has_marketing;
    }
    if props.published_before_joystream.is_some() {
        video.published_before_joystream = props.published_before_joystream;
    }
    if let Some(is_public) = props.is_public {
        video.is_public = is_public;
    }
    if let Some(is_curated) = props.is_curated {
        video.is_curated = is_curated;
    }
    if let Some(is_explicit) = props.is_explicit {
        video.is_explicit = is_explicit;
    }
    batch.save(&video).await
}

/// Featured entries pointing at the video go with it.
pub(super) async fn remove_video(batch: &mut Batch, id: EntityId) -> Result<()> {
    for featured in FeaturedVideo::ids_by_video(batch.conn(), id).await.or_raise(|| ErrorKind::Store)? {
        batch.delete(DomainClass::FeaturedVideo, featured).await?;
    }
    batch.delete(DomainClass::Video, id).await
}
