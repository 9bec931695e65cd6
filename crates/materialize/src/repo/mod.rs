//! Domain repository: create, update and remove for every domain class.
//!
//! The functions in here are the only place that knows how decoded property
//! sets map onto stored rows. Each entry point is a single exhaustive match
//! over the class, so a class without a handler cannot compile.

mod channel;
mod license;
mod location;
mod video;

use cdmirror_schema::props::ClassProps;
use cdmirror_schema::{DomainClass, EntityId, PropertyMap};
use cdmirror_store::models::ClassEntity;
use exn::ResultExt;
use tracing::instrument;

use crate::context::Batch;
use crate::error::{ErrorKind, Result};

pub(crate) use self::license::license_kind;
pub(crate) use self::location::location_kind;

/// Build the row for `id` from `properties`, falling back to the class
/// template for anything left out. A row that already exists is kept as is.
#[instrument(level = "debug", skip(batch, properties), fields(class = class.name()))]
pub(crate) async fn create(batch: &mut Batch, class: DomainClass, id: EntityId, properties: &PropertyMap) -> Result<()> {
    if batch.exists(class, id).await? {
        tracing::debug!("already materialized, keeping stored row");
        return Ok(());
    }
    match ClassProps::decode(class, properties).or_raise(|| ErrorKind::Decode)? {
        ClassProps::Channel(props) => channel::create_channel(batch, id, props).await,
        ClassProps::ContentCategory(props) => channel::create_category(batch, id, props).await,
        ClassProps::HttpMediaLocation(props) => location::create_http(batch, id, props).await,
        ClassProps::JoystreamMediaLocation(props) => location::create_joystream(batch, id, props).await,
        ClassProps::KnownLicense(props) => license::create_known(batch, id, props).await,
        ClassProps::Language(props) => channel::create_language(batch, id, props).await,
        ClassProps::License(props) => license::create_license(batch, id, props).await,
        ClassProps::MediaLocation(props) => location::create_media_location(batch, id, props).await,
        ClassProps::UserDefinedLicense(props) => license::create_user_defined(batch, id, props).await,
        ClassProps::Video(props) => video::create_video(batch, id, props).await,
        ClassProps::VideoMedia(props) => video::create_media(batch, id, props).await,
        ClassProps::VideoMediaEncoding(props) => video::create_encoding(batch, id, props).await,
        ClassProps::FeaturedVideo(props) => channel::create_featured(batch, id, props).await,
    }
}

/// Apply the supplied fields to the stored row of `id`.
#[instrument(level = "debug", skip(batch, properties), fields(class = class.name()))]
pub(crate) async fn update(batch: &mut Batch, class: DomainClass, id: EntityId, properties: &PropertyMap) -> Result<()> {
    match ClassProps::decode(class, properties).or_raise(|| ErrorKind::Decode)? {
        ClassProps::Channel(props) => channel::update_channel(batch, id, props).await,
        ClassProps::ContentCategory(props) => channel::update_category(batch, id, props).await,
        ClassProps::HttpMediaLocation(props) => location::update_http(batch, id, props).await,
        ClassProps::JoystreamMediaLocation(props) => location::update_joystream(batch, id, props).await,
        ClassProps::KnownLicense(props) => license::update_known(batch, id, props).await,
        ClassProps::Language(props) => channel::update_language(batch, id, props).await,
        ClassProps::License(props) => license::update_license(batch, id, props).await,
        ClassProps::MediaLocation(props) => location::update_media_location(batch, id, props).await,
        ClassProps::UserDefinedLicense(props) => license::update_user_defined(batch, id, props).await,
        ClassProps::Video(props) => video::update_video(batch, id, props).await,
        ClassProps::VideoMedia(props) => video::update_media(batch, id, props).await,
        ClassProps::VideoMediaEncoding(props) => video::update_encoding(batch, id, props).await,
        ClassProps::FeaturedVideo(props) => channel::update_featured(batch, id, props).await,
    }
}

/// Remove `id` and everything that depends on it.
#[instrument(level = "debug", skip(batch), fields(class = class.name()))]
pub(crate) async fn remove(batch: &mut Batch, class: DomainClass, id: EntityId) -> Result<()> {
    if !batch.exists(class, id).await? {
        // Created on chain but never given a schema.
        tracing::debug!("no typed row, dropping class entity only");
        ClassEntity::delete(batch.conn(), id).await.or_raise(|| ErrorKind::Store)?;
        return Ok(());
    }
    match class {
        DomainClass::Channel => channel::remove_channel(batch, id).await,
        DomainClass::ContentCategory => channel::remove_category(batch, id).await,
        DomainClass::HttpMediaLocation => location::remove_http(batch, id).await,
        DomainClass::JoystreamMediaLocation => location::remove_joystream(batch, id).await,
        DomainClass::KnownLicense => license::remove_known(batch, id).await,
        DomainClass::Language => channel::remove_language(batch, id).await,
        DomainClass::License => license::remove_license(batch, id).await,
        DomainClass::MediaLocation => location::remove_media_location(batch, id).await,
        DomainClass::UserDefinedLicense => license::remove_user_defined(batch, id).await,
        DomainClass::Video => video::remove_video(batch, id).await,
        DomainClass::VideoMedia => video::remove_media(batch, id).await,
        DomainClass::VideoMediaEncoding => video::remove_encoding(batch, id).await,
        DomainClass::FeaturedVideo => channel::remove_featured(batch, id).await,
    }
}
