use async_trait::async_trait;
use couch_sync_models::{Movie, Show};

use crate::error::SourceError;
use crate::payload::{HistoryPayload, RatingsPayload};

/// A show rating write destined for the local library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShowRatingUpdate {
    pub show_id: u32,
    pub rating: u8,
}

/// The local media library.
///
/// Loaders return catalog-model values directly; an empty library is
/// `Ok(vec![])`, not an error. Rating writes arrive pre-chunked, one call per
/// chunk.
#[async_trait]
pub trait MediaLibrary: Send + Sync {
    async fn get_movies(&self) -> Result<Vec<Movie>, SourceError>;

    /// Shows with their seasons and episodes fully populated.
    async fn get_shows(&self) -> Result<Vec<Show>, SourceError>;

    /// Applies one chunk of rating writes as a single batched request.
    async fn set_show_ratings(&self, updates: &[ShowRatingUpdate]) -> Result<(), SourceError>;
}

/// The remote tracking service.
#[async_trait]
pub trait Tracker: Send + Sync {
    async fn get_movies_watched(&self) -> Result<Vec<Movie>, SourceError>;
    async fn get_movies_rated(&self) -> Result<Vec<Movie>, SourceError>;
    async fn get_shows_watched(&self) -> Result<Vec<Show>, SourceError>;
    async fn get_shows_rated(&self) -> Result<Vec<Show>, SourceError>;
    /// Episode ratings, grouped under their shows.
    async fn get_episodes_rated(&self) -> Result<Vec<Show>, SourceError>;

    async fn add_to_history(&self, payload: &HistoryPayload) -> Result<(), SourceError>;
    async fn add_ratings(&self, payload: &RatingsPayload) -> Result<(), SourceError>;
}
