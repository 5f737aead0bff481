pub mod media_ids;
pub mod movie;
pub mod show;

pub use media_ids::MediaIds;
pub use movie::{LibraryEntry, Movie};
pub use show::{Episode, Season, Show};
