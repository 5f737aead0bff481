use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::media_ids::MediaIds;

/// A movie as seen by either side of a sync run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Movie {
    pub title: String,
    pub ids: MediaIds,
    pub year: Option<u32>,
    /// Times watched; zero means unwatched.
    #[serde(default)]
    pub plays: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_watched: Option<DateTime<Utc>>,
    /// User rating, 0 = unrated, 1-10 = rated.
    #[serde(default)]
    pub rating: u8,
    /// Present only for items loaded from the local library. Never part of
    /// tracker payloads.
    #[serde(skip)]
    pub library: Option<LibraryEntry>,
}

/// Library-side attributes used to address and describe a local item.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LibraryEntry {
    pub movie_id: u32,
    pub file: Option<String>,
    pub date_added: Option<DateTime<Utc>>,
    /// Runtime in seconds.
    pub runtime: Option<u32>,
}

impl Movie {
    pub fn is_watched(&self) -> bool {
        self.plays > 0
    }

    pub fn is_rated(&self) -> bool {
        self.rating > 0
    }
}
