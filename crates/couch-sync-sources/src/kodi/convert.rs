use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveDateTime, Utc};
use couch_sync_models::{Episode, LibraryEntry, MediaIds, Movie, Season, Show};
use serde::Deserialize;

/// Raw records as returned by the library's `VideoLibrary.*` methods, and
/// their lossless conversion into the catalog model. Identifiers, play
/// counts, ratings, and season/episode numbering all survive the conversion.

#[derive(Debug, Deserialize)]
pub(crate) struct Limits {
    pub total: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MoviesResponse {
    pub limits: Limits,
    #[serde(default)]
    pub movies: Vec<MovieRecord>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ShowsResponse {
    pub limits: Limits,
    #[serde(default)]
    pub tvshows: Vec<ShowRecord>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EpisodesResponse {
    #[serde(default)]
    pub episodes: Vec<EpisodeRecord>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MovieRecord {
    pub movieid: u32,
    pub title: String,
    #[serde(default)]
    pub year: Option<u32>,
    #[serde(default)]
    pub imdbnumber: Option<String>,
    #[serde(default)]
    pub uniqueid: Option<HashMap<String, String>>,
    #[serde(default)]
    pub playcount: u32,
    #[serde(default)]
    pub lastplayed: Option<String>,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub dateadded: Option<String>,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default)]
    pub userrating: u8,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ShowRecord {
    pub tvshowid: u32,
    pub title: String,
    #[serde(default)]
    pub year: Option<u32>,
    #[serde(default)]
    pub uniqueid: Option<HashMap<String, String>>,
    #[serde(default)]
    pub userrating: u8,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EpisodeRecord {
    pub season: u32,
    pub episode: u32,
    #[serde(default)]
    pub uniqueid: Option<HashMap<String, String>>,
    #[serde(default)]
    pub playcount: u32,
    #[serde(default)]
    pub lastplayed: Option<String>,
    #[serde(default)]
    pub userrating: u8,
}

/// Library timestamps look like `2023-01-15 20:11:04`; empty means never.
fn parse_datetime(value: Option<&str>) -> Option<DateTime<Utc>> {
    let value = value?.trim();
    if value.is_empty() {
        return None;
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|dt| dt.and_utc())
}

/// The `uniqueid` map carries per-provider IDs as strings; `imdbnumber` is
/// the legacy field kept for older library versions.
fn ids_from_record(
    imdbnumber: Option<&str>,
    uniqueid: Option<&HashMap<String, String>>,
) -> MediaIds {
    let mut ids = MediaIds::new();
    if let Some(map) = uniqueid {
        ids.imdb = map.get("imdb").filter(|v| !v.is_empty()).cloned();
        ids.tmdb = map.get("tmdb").and_then(|v| v.parse().ok());
        ids.tvdb = map.get("tvdb").and_then(|v| v.parse().ok());
    }
    if ids.imdb.is_none() {
        ids.imdb = imdbnumber
            .filter(|v| v.starts_with("tt"))
            .map(str::to_string);
    }
    ids
}

pub(crate) fn movie_from_record(record: MovieRecord) -> Movie {
    let ids = ids_from_record(record.imdbnumber.as_deref(), record.uniqueid.as_ref());
    Movie {
        title: record.title,
        ids,
        year: record.year,
        plays: record.playcount,
        last_watched: parse_datetime(record.lastplayed.as_deref()),
        rating: record.userrating,
        library: Some(LibraryEntry {
            movie_id: record.movieid,
            file: record.file,
            date_added: parse_datetime(record.dateadded.as_deref()),
            runtime: record.runtime,
        }),
    }
}

pub(crate) fn show_from_records(record: ShowRecord, episodes: Vec<EpisodeRecord>) -> Show {
    let ids = ids_from_record(None, record.uniqueid.as_ref());
    let mut seasons: BTreeMap<u32, Vec<Episode>> = BTreeMap::new();
    for ep in episodes {
        seasons
            .entry(ep.season)
            .or_default()
            .push(Episode {
                number: ep.episode,
                ids: ids_from_record(None, ep.uniqueid.as_ref()),
                plays: ep.playcount,
                last_watched: parse_datetime(ep.lastplayed.as_deref()),
                rating: ep.userrating,
            });
    }
    Show {
        title: record.title,
        ids,
        year: record.year,
        rating: record.userrating,
        show_id: Some(record.tvshowid),
        seasons: seasons
            .into_iter()
            .map(|(number, episodes)| Season { number, episodes })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movie_conversion_keeps_identifiers_and_state() {
        let record: MovieRecord = serde_json::from_value(serde_json::json!({
            "movieid": 12,
            "title": "Heat",
            "year": 1995,
            "imdbnumber": "tt0113277",
            "uniqueid": {"imdb": "tt0113277", "tmdb": "949"},
            "playcount": 2,
            "lastplayed": "2024-03-01 21:30:00",
            "file": "/media/movies/heat.mkv",
            "userrating": 9
        }))
        .unwrap();

        let movie = movie_from_record(record);
        assert_eq!(movie.ids.imdb.as_deref(), Some("tt0113277"));
        assert_eq!(movie.ids.tmdb, Some(949));
        assert_eq!(movie.plays, 2);
        assert_eq!(movie.rating, 9);
        assert!(movie.last_watched.is_some());
        assert_eq!(movie.library.as_ref().unwrap().movie_id, 12);
    }

    #[test]
    fn test_empty_lastplayed_is_none() {
        let record: MovieRecord = serde_json::from_value(serde_json::json!({
            "movieid": 1,
            "title": "Unwatched",
            "lastplayed": ""
        }))
        .unwrap();
        let movie = movie_from_record(record);
        assert!(movie.last_watched.is_none());
        assert_eq!(movie.plays, 0);
    }

    #[test]
    fn test_episodes_group_into_ordered_seasons() {
        let record: ShowRecord = serde_json::from_value(serde_json::json!({
            "tvshowid": 5,
            "title": "The Wire",
            "uniqueid": {"tvdb": "79126"}
        }))
        .unwrap();
        let episodes: Vec<EpisodeRecord> = serde_json::from_value(serde_json::json!([
            {"season": 2, "episode": 1, "playcount": 0},
            {"season": 1, "episode": 1, "playcount": 1, "lastplayed": "2024-01-01 20:00:00"},
            {"season": 1, "episode": 2, "playcount": 0}
        ]))
        .unwrap();

        let show = show_from_records(record, episodes);
        assert_eq!(show.show_id, Some(5));
        assert_eq!(show.seasons.len(), 2);
        assert_eq!(show.seasons[0].number, 1);
        assert_eq!(show.seasons[0].episodes.len(), 2);
        assert!(show.seasons[0].episodes[0].is_watched());
        assert_eq!(show.seasons[1].number, 2);
    }
}
