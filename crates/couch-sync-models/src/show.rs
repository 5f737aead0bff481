use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::media_ids::MediaIds;

/// A show with its seasons and episodes. Loaders populate the full tree;
/// reconciliation emits pruned copies containing only qualifying episodes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Show {
    pub title: String,
    pub ids: MediaIds,
    pub year: Option<u32>,
    /// User rating of the show itself, 0 = unrated.
    #[serde(default)]
    pub rating: u8,
    /// Local library handle; absent on tracker-loaded shows.
    #[serde(skip)]
    pub show_id: Option<u32>,
    #[serde(default)]
    pub seasons: Vec<Season>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Season {
    pub number: u32,
    #[serde(default)]
    pub episodes: Vec<Episode>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Episode {
    pub number: u32,
    #[serde(default)]
    pub ids: MediaIds,
    #[serde(default)]
    pub plays: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_watched: Option<DateTime<Utc>>,
    #[serde(default)]
    pub rating: u8,
}

impl Show {
    pub fn episode_count(&self) -> usize {
        self.seasons.iter().map(|s| s.episodes.len()).sum()
    }

    pub fn season(&self, number: u32) -> Option<&Season> {
        self.seasons.iter().find(|s| s.number == number)
    }
}

impl Season {
    pub fn episode(&self, number: u32) -> Option<&Episode> {
        self.episodes.iter().find(|e| e.number == number)
    }
}

impl Episode {
    pub fn is_watched(&self) -> bool {
        self.plays > 0
    }

    pub fn is_rated(&self) -> bool {
        self.rating > 0
    }
}
