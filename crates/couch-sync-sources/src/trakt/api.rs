use chrono::{DateTime, Utc};
use couch_sync_models::{Episode, MediaIds, Movie, Season, Show};
use serde::Deserialize;

/// Wire types for the tracker's sync endpoints and their typed conversion
/// into the catalog model. Each entity kind has one conversion function; the
/// reconciler never sees these shapes.

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TraktIds {
    #[serde(default)]
    pub imdb: Option<String>,
    #[serde(default)]
    pub tmdb: Option<u32>,
    #[serde(default)]
    pub tvdb: Option<u32>,
    #[serde(default)]
    pub trakt: Option<u64>,
    #[serde(default)]
    pub slug: Option<String>,
}

impl TraktIds {
    fn into_media_ids(self) -> MediaIds {
        MediaIds {
            imdb: self.imdb.filter(|s| !s.is_empty()),
            tmdb: self.tmdb,
            tvdb: self.tvdb,
            trakt: self.trakt,
            slug: self.slug.filter(|s| !s.is_empty()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TraktMovie {
    pub title: String,
    #[serde(default)]
    pub year: Option<u32>,
    pub ids: TraktIds,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TraktShow {
    pub title: String,
    #[serde(default)]
    pub year: Option<u32>,
    pub ids: TraktIds,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WatchedMovieItem {
    #[serde(default)]
    pub plays: u32,
    #[serde(default)]
    pub last_watched_at: Option<DateTime<Utc>>,
    pub movie: TraktMovie,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RatedMovieItem {
    pub rating: u8,
    pub movie: TraktMovie,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WatchedShowItem {
    pub show: TraktShow,
    #[serde(default)]
    pub seasons: Vec<WatchedSeason>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WatchedSeason {
    pub number: u32,
    #[serde(default)]
    pub episodes: Vec<WatchedEpisode>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WatchedEpisode {
    pub number: u32,
    #[serde(default)]
    pub plays: u32,
    #[serde(default)]
    pub last_watched_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RatedShowItem {
    pub rating: u8,
    pub show: TraktShow,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RatedEpisodeItem {
    pub rating: u8,
    pub episode: RatedEpisodeRef,
    pub show: TraktShow,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RatedEpisodeRef {
    pub season: u32,
    pub number: u32,
    #[serde(default)]
    pub ids: Option<TraktIds>,
}

pub(crate) fn watched_movie(item: WatchedMovieItem) -> Movie {
    Movie {
        title: item.movie.title,
        ids: item.movie.ids.into_media_ids(),
        year: item.movie.year,
        plays: item.plays,
        last_watched: item.last_watched_at,
        rating: 0,
        library: None,
    }
}

pub(crate) fn rated_movie(item: RatedMovieItem) -> Movie {
    Movie {
        title: item.movie.title,
        ids: item.movie.ids.into_media_ids(),
        year: item.movie.year,
        plays: 0,
        last_watched: None,
        rating: item.rating,
        library: None,
    }
}

pub(crate) fn watched_show(item: WatchedShowItem) -> Show {
    Show {
        title: item.show.title,
        ids: item.show.ids.into_media_ids(),
        year: item.show.year,
        rating: 0,
        show_id: None,
        seasons: item
            .seasons
            .into_iter()
            .map(|season| Season {
                number: season.number,
                episodes: season
                    .episodes
                    .into_iter()
                    .map(|ep| Episode {
                        number: ep.number,
                        ids: MediaIds::new(),
                        plays: ep.plays,
                        last_watched: ep.last_watched_at,
                        rating: 0,
                    })
                    .collect(),
            })
            .collect(),
    }
}

pub(crate) fn rated_show(item: RatedShowItem) -> Show {
    Show {
        title: item.show.title,
        ids: item.show.ids.into_media_ids(),
        year: item.show.year,
        rating: item.rating,
        show_id: None,
        seasons: Vec::new(),
    }
}

/// Flat episode ratings regrouped under their shows, preserving response
/// order for shows and episodes alike.
pub(crate) fn rated_episodes(items: Vec<RatedEpisodeItem>) -> Vec<Show> {
    let mut shows: Vec<Show> = Vec::new();
    for item in items {
        let show_ids = item.show.ids.into_media_ids();
        let episode = Episode {
            number: item.episode.number,
            ids: item
                .episode
                .ids
                .map(TraktIds::into_media_ids)
                .unwrap_or_default(),
            plays: 0,
            last_watched: None,
            rating: item.rating,
        };

        let show_index = match shows.iter().position(|s| s.ids.matches(&show_ids)) {
            Some(index) => index,
            None => {
                shows.push(Show {
                    title: item.show.title,
                    ids: show_ids,
                    year: item.show.year,
                    rating: 0,
                    show_id: None,
                    seasons: Vec::new(),
                });
                shows.len() - 1
            }
        };
        let show = &mut shows[show_index];

        match show
            .seasons
            .iter_mut()
            .find(|s| s.number == item.episode.season)
        {
            Some(season) => season.episodes.push(episode),
            None => show.seasons.push(Season {
                number: item.episode.season,
                episodes: vec![episode],
            }),
        }
    }
    shows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rated_episodes_group_by_show() {
        let items: Vec<RatedEpisodeItem> = serde_json::from_value(serde_json::json!([
            {
                "rating": 9,
                "episode": {"season": 1, "number": 1, "ids": {"tvdb": 1234}},
                "show": {"title": "The Wire", "year": 2002, "ids": {"tvdb": 79126}}
            },
            {
                "rating": 8,
                "episode": {"season": 1, "number": 2},
                "show": {"title": "The Wire", "year": 2002, "ids": {"tvdb": 79126}}
            },
            {
                "rating": 10,
                "episode": {"season": 4, "number": 6},
                "show": {"title": "Deadwood", "year": 2004, "ids": {"tvdb": 72023}}
            }
        ]))
        .unwrap();

        let shows = rated_episodes(items);
        assert_eq!(shows.len(), 2);
        assert_eq!(shows[0].title, "The Wire");
        assert_eq!(shows[0].seasons[0].episodes.len(), 2);
        assert_eq!(shows[0].seasons[0].episodes[0].rating, 9);
        assert_eq!(shows[1].seasons[0].number, 4);
    }

    #[test]
    fn test_watched_movie_conversion() {
        let item: WatchedMovieItem = serde_json::from_value(serde_json::json!({
            "plays": 3,
            "last_watched_at": "2024-05-01T19:00:00.000Z",
            "movie": {"title": "Heat", "year": 1995, "ids": {"imdb": "tt0113277", "trakt": 77}}
        }))
        .unwrap();
        let movie = watched_movie(item);
        assert_eq!(movie.plays, 3);
        assert_eq!(movie.ids.trakt, Some(77));
        assert!(movie.library.is_none());
    }
}
