pub mod error;
pub mod kodi;
pub mod payload;
pub mod traits;
pub mod trakt;

pub use error::SourceError;
pub use payload::{HistoryPayload, RatingsPayload};
pub use traits::{MediaLibrary, ShowRatingUpdate, Tracker};
pub use kodi::KodiClient;
pub use trakt::TraktClient;
