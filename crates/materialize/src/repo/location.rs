use cdmirror_schema::props::{HttpMediaLocationProps, JoystreamMediaLocationProps, MediaLocationProps};
use cdmirror_schema::{DomainClass, EntityId, EntityRef};
use cdmirror_store::models::{
    HttpMediaLocation, JoystreamMediaLocation, LocationTarget, MediaLocation, MediaLocationKind, VideoMedia,
};
use exn::ResultExt;

use super::video::remove_media;
use crate::context::Batch;
use crate::error::{ErrorKind, Result};

/// The value video media embeds for a location.
pub(crate) async fn location_kind(batch: &mut Batch, target: &LocationTarget) -> Result<MediaLocationKind> {
    Ok(match *target {
        LocationTarget::Http(id) => MediaLocationKind::from(&batch.require::<HttpMediaLocation>(id).await?),
        LocationTarget::Joystream(id) => MediaLocationKind::from(&batch.require::<JoystreamMediaLocation>(id).await?),
    })
}

async fn remove_media_located(batch: &mut Batch, kind: &MediaLocationKind) -> Result<()> {
    let media = VideoMedia::matching_location(batch.conn(), kind).await.or_raise(|| ErrorKind::Store)?;
    let media: Vec<_> = media.into_iter().map(|media| media.id).filter(|id| *id != 0).collect();
    tracing::debug!(media = media.len(), "removing located media");
    for media in media {
        remove_media(batch, media).await?;
    }
    Ok(())
}

pub(super) async fn create_http(batch: &mut Batch, id: EntityId, props: HttpMediaLocationProps) -> Result<()> {
    let template: HttpMediaLocation = batch.template().await?;
    let location = HttpMediaLocation {
        id,
        url: props.url.unwrap_or(template.url),
        port: props.port.or(template.port),
        version: batch.block(),
    };
    batch.save(&location).await
}

pub(super) async fn update_http(batch: &mut Batch, id: EntityId, props: HttpMediaLocationProps) -> Result<()> {
    let mut location: HttpMediaLocation = batch.require(id).await?;
    if let Some(url) = props.url {
        location.url = url;
    }
    if props.port.is_some() {
        location.port = props.port;
    }
    batch.save(&location).await
}

pub(super) async fn remove_http(batch: &mut Batch, id: EntityId) -> Result<()> {
    let location: HttpMediaLocation = batch.require(id).await?;
    remove_media_located(batch, &MediaLocationKind::from(&location)).await?;
    for media_location in MediaLocation::ids_by_http(batch.conn(), id).await.or_raise(|| ErrorKind::Store)? {
        remove_media_location(batch, media_location).await?;
    }
    batch.delete(DomainClass::HttpMediaLocation, id).await
}

pub(super) async fn create_joystream(batch: &mut Batch, id: EntityId, props: JoystreamMediaLocationProps) -> Result<()> {
    let template: JoystreamMediaLocation = batch.template().await?;
    let location = JoystreamMediaLocation {
        id,
        data_object_id: props.data_object_id.unwrap_or(template.data_object_id),
        version: batch.block(),
    };
    batch.save(&location).await
}

pub(super) async fn update_joystream(batch: &mut Batch, id: EntityId, props: JoystreamMediaLocationProps) -> Result<()> {
    let mut location: JoystreamMediaLocation = batch.require(id).await?;
    if let Some(data_object_id) = props.data_object_id {
        location.data_object_id = data_object_id;
    }
    batch.save(&location).await
}

pub(super) async fn remove_joystream(batch: &mut Batch, id: EntityId) -> Result<()> {
    let location: JoystreamMediaLocation = batch.require(id).await?;
    remove_media_located(batch, &MediaLocationKind::from(&location)).await?;
    for media_location in MediaLocation::ids_by_joystream(batch.conn(), id).await.or_raise(|| ErrorKind::Store)? {
        remove_media_location(batch, media_location).await?;
    }
    batch.delete(DomainClass::JoystreamMediaLocation, id).await
}

async fn resolve_target(
    batch: &mut Batch,
    http: Option<EntityRef>,
    joystream: Option<EntityRef>,
) -> Result<Option<LocationTarget>> {
    if let Some(http) = http {
        return Ok(Some(LocationTarget::Http(batch.resolve(http, DomainClass::HttpMediaLocation).await?)));
    }
    if let Some(joystream) = joystream {
        let id = batch.resolve(joystream, DomainClass::JoystreamMediaLocation).await?;
        return Ok(Some(LocationTarget::Joystream(id)));
    }
    Ok(None)
}

pub(super) async fn create_media_location(batch: &mut Batch, id: EntityId, props: MediaLocationProps) -> Result<()> {
    let template: MediaLocation = batch.template().await?;
    let target = resolve_target(batch, props.http_media_location, props.joystream_media_location).await?;
    let location = MediaLocation { id, target: target.unwrap_or(template.target), version: batch.block() };
    batch.save(&location).await
}

pub(super) async fn update_media_location(batch: &mut Batch, id: EntityId, props: MediaLocationProps) -> Result<()> {
    let mut location: MediaLocation = batch.require(id).await?;
    if let Some(target) = resolve_target(batch, props.http_media_location, props.joystream_media_location).await? {
        location.target = target;
        batch.save(&location).await?;
    }
    Ok(())
}

pub(super) async fn remove_media_location(batch: &mut Batch, id: EntityId) -> Result<()> {
    let location: MediaLocation = batch.require(id).await?;
    let kind = location_kind(batch, &location.target).await?;
    remove_media_located(batch, &kind).await?;
    batch.delete(DomainClass::MediaLocation, id).await
}
