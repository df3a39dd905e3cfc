//! Backend resources managed by the admin console.
//!
//! Four of them (heritage sites, artifacts, chapters, levels) go through moderation and
//! implement [`Reviewable`](resource_framework::Reviewable). Exhibitions and users are
//! plain CRUD resources.

/// Declares a numeric newtype identifier.
///
/// Ids are interpolated into URL paths, so `Display` prints the bare number.
macro_rules! resource_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl From<u32> for $name {
            fn from(id: u32) -> Self {
                Self(id)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

mod artifact;
mod chapter;
mod exhibition;
mod heritage_site;
mod level;
mod user;

pub use artifact::{Artifact, ArtifactId, ArtifactCreate, ArtifactUpdate};
pub use chapter::{Chapter, ChapterId, ChapterCreate, ChapterUpdate};
pub use exhibition::{Exhibition, ExhibitionId, ExhibitionCreate, ExhibitionUpdate};
pub use heritage_site::{HeritageSite, HeritageSiteId, HeritageSiteCreate, HeritageSiteUpdate};
pub use level::{Level, LevelId, LevelCreate, LevelType, LevelUpdate};
pub use user::{User, UserId, UserCreate, UserUpdate};
