use cdmirror_schema::props::{CategoryProps, ChannelProps, FeaturedVideoProps, LanguageProps};
use cdmirror_schema::{DomainClass, EntityId};
use cdmirror_store::models::{Category, Channel, FeaturedVideo, Language, Video};
use exn::ResultExt;

use super::video::remove_video;
use crate::context::Batch;
use crate::error::{ErrorKind, Result};

pub(super) async fn create_language(batch: &mut Batch, id: EntityId, props: LanguageProps) -> Result<()> {
    let template: Language = batch.template().await?;
    let language = Language {
        id,
        name: props.name.unwrap_or(template.name),
        code: props.code.unwrap_or(template.code),
        version: batch.block(),
    };
    batch.save(&language).await
}

pub(super) async fn update_language(batch: &mut Batch, id: EntityId, props: LanguageProps) -> Result<()> {
    let mut language: Language = batch.require(id).await?;
    if let Some(name) = props.name {
        language.name = name;
    }
    if let Some(code) = props.code {
        language.code = code;
    }
    batch.save(&language).await
}

/// Languages are optional everywhere, so dependents lose the reference
/// instead of being removed.
pub(super) async fn remove_language(batch: &mut Batch, id: EntityId) -> Result<()> {
    let channels = Channel::clear_language(batch.conn(), id).await.or_raise(|| ErrorKind::Store)?;
    let videos = Video::clear_language(batch.conn(), id).await.or_raise(|| ErrorKind::Store)?;
    tracing::debug!(channels, videos, "detached language");
    batch.delete(DomainClass::Language, id).await
}

pub(super) async fn create_category(batch: &mut Batch, id: EntityId, props: CategoryProps) -> Result<()> {
    let template: Category = batch.template().await?;
    let category = Category {
        id,
        name: props.name.unwrap_or(template.name),
        description: props.description.unwrap_or(template.description),
        version: batch.block(),
    };
    batch.save(&category).await
}

pub(super) async fn update_category(batch: &mut Batch, id: EntityId, props: CategoryProps) -> Result<()> {
    let mut category: Category = batch.require(id).await?;
    if let Some(name) = props.name {
        category.name = name;
    }
    if let Some(description) = props.description {
        category.description = description;
    }
    batch.save(&category).await
}

pub(super) async fn remove_category(batch: &mut Batch, id: EntityId) -> Result<()> {
    for video in Video::ids_by_category(batch.conn(), id).await.or_raise(|| ErrorKind::Store)? {
        remove_video(batch, video).await?;
    }
    batch.delete(DomainClass::ContentCategory, id).await
}

pub(super) async fn create_channel(batch: &mut Batch, id: EntityId, props: ChannelProps) -> Result<()> {
    let template: Channel = batch.template().await?;
    let language = batch.resolve_opt(props.language, DomainClass::Language).await?;
    let channel = Channel {
        id,
        title: props.title.unwrap_or(template.title),
        description: props.description.unwrap_or(template.description),
        cover_photo_url: props.cover_photo_url.unwrap_or(template.cover_photo_url),
        avatar_photo_url: props.avatar_photo_url.unwrap_or(template.avatar_photo_url),
        is_public: props.is_public.unwrap_or(template.is_public),
        is_curated: props.is_curated.unwrap_or(template.is_curated),
        language,
        version: batch.block(),
    };
    batch.save(&channel).await
}

pub(super) async fn update_channel(batch: &mut Batch, id: EntityId, props: ChannelProps) -> Result<()> {
    let mut channel: Channel = batch.require(id).await?;
    if let Some(title) = props.title {
        channel.title = title;
    }
    if let Some(description) = props.description {
        channel.description = description;
    }
    if let Some(url) = props.cover_photo_url {
        channel.cover_photo_url = url;
    }
    if let Some(url) = props.avatar_photo_url {
        channel.avatar_photo_url = url;
    }
    if let Some(is_public) = props.is_public {
        channel.is_public = is_public;
    }
    if let Some(is_curated) = props.is_curated {
        channel.is_curated = is_curated;
    }
    if let Some(language) = props.language {
        channel.language = Some(batch.resolve(language, DomainClass::Language).await?);
    }
    batch.save(&channel).await
}

pub(super) async fn remove_channel(batch: &mut Batch, id: EntityId) -> Result<()> {
    for video in Video::ids_by_channel(batch.conn(), id).await.or_raise(|| ErrorKind::Store)? {
        remove_video(batch, video).await?;
    }
    batch.delete(DomainClass::Channel, id).await
}

/// Flag `video` as featured. The template video never carries the flag.
async fn feature(batch: &mut Batch, video: EntityId) -> Result<()> {
    if video == 0 {
        return Ok(());
    }
    Video::set_featured(batch.conn(), video, true).await.or_raise(|| ErrorKind::Store)
}

/// Clear the flag of `video` once `entry` stops pointing at it, unless some
/// other featured entry still does.
async fn unfeature(batch: &mut Batch, video: EntityId, entry: EntityId) -> Result<()> {
    if video == 0 {
        return Ok(());
    }
    let entries = FeaturedVideo::ids_by_video(batch.conn(), video).await.or_raise(|| ErrorKind::Store)?;
    if entries.iter().any(|id| *id != entry) {
        tracing::debug!(video, "still featured by another entry");
        return Ok(());
    }
    Video::set_featured(batch.conn(), video, false).await.or_raise(|| ErrorKind::Store)
}

pub(super) async fn create_featured(batch: &mut Batch, id: EntityId, props: FeaturedVideoProps) -> Result<()> {
    let video = match props.video {
        Some(video) => batch.resolve(video, DomainClass::Video).await?,
        None => batch.template::<FeaturedVideo>().await?.video,
    };
    let featured = FeaturedVideo { id, video, version: batch.block() };
    batch.save(&featured).await?;
    feature(batch, video).await
}

pub(super) async fn update_featured(batch: &mut Batch, id: EntityId, props: FeaturedVideoProps) -> Result<()> {
    let mut featured: FeaturedVideo = batch.require(id).await?;
    let Some(video) = props.video else {
        return Ok(());
    };
    let video = batch.resolve(video, DomainClass::Video).await?;
    if video != featured.video {
        unfeature(batch, featured.video, id).await?;
        feature(batch, video).await?;
        featured.video = video;
        batch.save(&featured).await?;
    }
    Ok(())
}

pub(super) async fn remove_featured(batch: &mut Batch, id: EntityId) -> Result<()> {
    let featured: FeaturedVideo = batch.require(id).await?;
    unfeature(batch, featured.video, id).await?;
    batch.delete(DomainClass::FeaturedVideo, id).await
}
