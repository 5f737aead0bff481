use chrono::{DateTime, Utc};
use couch_sync_models::{MediaIds, Movie, Show};
use serde::Serialize;

/// Body for a history write: `{"movies": [...]}` or `{"shows": [...]}`.
///
/// Payload types carry only tracker-addressable fields; library attributes
/// (file paths, library IDs, date added) never appear on the wire.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HistoryPayload {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub movies: Vec<HistoryMovie>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub shows: Vec<HistoryShow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryMovie {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    pub ids: MediaIds,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watched_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryShow {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    pub ids: MediaIds,
    pub seasons: Vec<HistorySeason>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistorySeason {
    pub number: u32,
    pub episodes: Vec<HistoryEpisode>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryEpisode {
    pub number: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watched_at: Option<DateTime<Utc>>,
}

impl HistoryPayload {
    pub fn movies(items: &[Movie]) -> Self {
        Self {
            movies: items
                .iter()
                .map(|m| HistoryMovie {
                    title: m.title.clone(),
                    year: m.year,
                    ids: m.ids.clone(),
                    watched_at: m.last_watched,
                })
                .collect(),
            shows: Vec::new(),
        }
    }

    pub fn shows(items: &[Show]) -> Self {
        Self {
            movies: Vec::new(),
            shows: items
                .iter()
                .map(|show| HistoryShow {
                    title: show.title.clone(),
                    year: show.year,
                    ids: show.ids.clone(),
                    seasons: show
                        .seasons
                        .iter()
                        .map(|season| HistorySeason {
                            number: season.number,
                            episodes: season
                                .episodes
                                .iter()
                                .map(|ep| HistoryEpisode {
                                    number: ep.number,
                                    watched_at: ep.last_watched,
                                })
                                .collect(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.movies.len() + self.shows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty() && self.shows.is_empty()
    }
}

/// Body for a ratings write, same domain scoping as [`HistoryPayload`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct RatingsPayload {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub movies: Vec<RatedMovie>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub shows: Vec<RatedShow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RatedMovie {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    pub ids: MediaIds,
    pub rating: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct RatedShow {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    pub ids: MediaIds,
    /// Absent when the payload rates episodes rather than the show itself.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub seasons: Vec<RatedSeason>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RatedSeason {
    pub number: u32,
    pub episodes: Vec<RatedEpisode>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RatedEpisode {
    pub number: u32,
    pub rating: u8,
}

impl RatingsPayload {
    pub fn movies(items: &[Movie]) -> Self {
        Self {
            movies: items
                .iter()
                .map(|m| RatedMovie {
                    title: m.title.clone(),
                    year: m.year,
                    ids: m.ids.clone(),
                    rating: m.rating,
                })
                .collect(),
            shows: Vec::new(),
        }
    }

    /// Show-level ratings; season trees are not sent.
    pub fn shows(items: &[Show]) -> Self {
        Self {
            movies: Vec::new(),
            shows: items
                .iter()
                .map(|show| RatedShow {
                    title: show.title.clone(),
                    year: show.year,
                    ids: show.ids.clone(),
                    rating: Some(show.rating),
                    seasons: Vec::new(),
                })
                .collect(),
        }
    }

    /// Episode ratings nested under their shows.
    pub fn episodes(items: &[Show]) -> Self {
        Self {
            movies: Vec::new(),
            shows: items
                .iter()
                .map(|show| RatedShow {
                    title: show.title.clone(),
                    year: show.year,
                    ids: show.ids.clone(),
                    rating: None,
                    seasons: show
                        .seasons
                        .iter()
                        .map(|season| RatedSeason {
                            number: season.number,
                            episodes: season
                                .episodes
                                .iter()
                                .map(|ep| RatedEpisode {
                                    number: ep.number,
                                    rating: ep.rating,
                                })
                                .collect(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.movies.len() + self.shows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty() && self.shows.is_empty()
    }
}
