use cdmirror_schema::props::{KnownLicenseProps, LicenseProps, UserDefinedLicenseProps};
use cdmirror_schema::{DomainClass, EntityId, EntityRef};
use cdmirror_store::models::{KnownLicense, License, LicenseKind, LicenseTarget, UserDefinedLicense, Video};
use exn::ResultExt;

use super::video::remove_video;
use crate::context::Batch;
use crate::error::{ErrorKind, Result};

/// The value a video embeds for a license: the fields of whichever license
/// row the target points at.
pub(crate) async fn license_kind(batch: &mut Batch, target: &LicenseTarget) -> Result<LicenseKind> {
    Ok(match *target {
        LicenseTarget::Known(id) => LicenseKind::from(&batch.require::<KnownLicense>(id).await?),
        LicenseTarget::UserDefined(id) => LicenseKind::from(&batch.require::<UserDefinedLicense>(id).await?),
    })
}

/// Videos embedding `kind` go first, they have no reference to follow back.
async fn remove_videos_licensed(batch: &mut Batch, kind: &LicenseKind) -> Result<()> {
    let videos = Video::matching_license(batch.conn(), kind).await.or_raise(|| ErrorKind::Store)?;
    // The template may embed the same values; it stays.
    let videos: Vec<_> = videos.into_iter().map(|video| video.id).filter(|id| *id != 0).collect();
    tracing::debug!(videos = videos.len(), "removing licensed videos");
    for video in videos {
        remove_video(batch, video).await?;
    }
    Ok(())
}

pub(super) async fn create_known(batch: &mut Batch, id: EntityId, props: KnownLicenseProps) -> Result<()> {
    let template: KnownLicense = batch.template().await?;
    let license = KnownLicense {
        id,
        code: props.code.unwrap_or(template.code),
        name: props.name.or(template.name),
        description: props.description.or(template.description),
        url: props.url.or(template.url),
        version: batch.block(),
    };
    batch.save(&license).await
}

pub(super) async fn update_known(batch: &mut Batch, id: EntityId, props: KnownLicenseProps) -> Result<()> {
    let mut license: KnownLicense = batch.require(id).await?;
    if let Some(code) = props.code {
        license.code = code;
    }
    if props.name.is_some() {
        license.name = props.name;
    }
    if props.description.is_some() {
        license.description = props.description;
    }
    if props.url.is_some() {
        license.url = props.url;
    }
    batch.save(&license).await
}

pub(super) async fn remove_known(batch: &mut Batch, id: EntityId) -> Result<()> {
    let known: KnownLicense = batch.require(id).await?;
    remove_videos_licensed(batch, &LicenseKind::from(&known)).await?;
    for license in License::ids_by_known_license(batch.conn(), id).await.or_raise(|| ErrorKind::Store)? {
        remove_license(batch, license).await?;
    }
    batch.delete(DomainClass::KnownLicense, id).await
}

pub(super) async fn create_user_defined(batch: &mut Batch, id: EntityId, props: UserDefinedLicenseProps) -> Result<()> {
    let template: UserDefinedLicense = batch.template().await?;
    let license =
        UserDefinedLicense { id, content: props.content.unwrap_or(template.content), version: batch.block() };
    batch.save(&license).await
}

pub(super) async fn update_user_defined(batch: &mut Batch, id: EntityId, props: UserDefinedLicenseProps) -> Result<()> {
    let mut license: UserDefinedLicense = batch.require(id).await?;
    if let Some(content) = props.content {
        license.content = content;
    }
    batch.save(&license).await
}

pub(super) async fn remove_user_defined(batch: &mut Batch, id: EntityId) -> Result<()> {
    let user_defined: UserDefinedLicense = batch.require(id).await?;
    remove_videos_licensed(batch, &LicenseKind::from(&user_defined)).await?;
    for license in License::ids_by_user_defined_license(batch.conn(), id).await.or_raise(|| ErrorKind::Store)? {
        remove_license(batch, license).await?;
    }
    batch.delete(DomainClass::UserDefinedLicense, id).await
}

/// Resolve whichever branch was supplied. The decoder already rejected
/// property sets carrying both.
async fn resolve_target(
    batch: &mut Batch,
    known: Option<EntityRef>,
    user_defined: Option<EntityRef>,
) -> Result<Option<LicenseTarget>> {
    if let Some(known) = known {
        return Ok(Some(LicenseTarget::Known(batch.resolve(known, DomainClass::KnownLicense).await?)));
    }
    if let Some(user_defined) = user_defined {
        let id = batch.resolve(user_defined, DomainClass::UserDefinedLicense).await?;
        return Ok(Some(LicenseTarget::UserDefined(id)));
    }
    Ok(None)
}

pub(super) async fn create_license(batch: &mut Batch, id: EntityId, props: LicenseProps) -> Result<()> {
    let template: License = batch.template().await?;
    let target = resolve_target(batch, props.known_license, props.user_defined_license).await?;
    let license = License {
        id,
        target: target.unwrap_or(template.target),
        attribution: props.attribution.or(template.attribution),
        version: batch.block(),
    };
    batch.save(&license).await
}

pub(super) async fn update_license(batch: &mut Batch, id: EntityId, props: LicenseProps) -> Result<()> {
    let mut license: License = batch.require(id).await?;
    if let Some(target) = resolve_target(batch, props.known_license, props.user_defined_license).await? {
        license.target = target;
    }
    if props.attribution.is_some() {
        license.attribution = props.attribution;
    }
    batch.save(&license).await
}

pub(super) async fn remove_license(batch: &mut Batch, id: EntityId) -> Result<()> {
    let license: License = batch.require(id).await?;
    let kind = license_kind(batch, &license.target).await?;
    remove_videos_licensed(batch, &kind).await?;
    batch.delete(DomainClass::License, id).await
}
