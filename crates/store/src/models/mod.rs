mod channel;
mod license;
mod location;
mod meta;
mod video;

pub use self::channel::{Category, Channel, FeaturedVideo, Language};
pub use self::license::{KnownLicense, License, LicenseKind, LicenseTarget, UserDefinedLicense};
pub use self::location::{HttpMediaLocation, JoystreamMediaLocation, LocationTarget, MediaLocation, MediaLocationKind};
pub use self::meta::{Block, ClassEntity, Cursor, NextEntityId};
pub use self::video::{Video, VideoMedia, VideoMediaEncoding};
