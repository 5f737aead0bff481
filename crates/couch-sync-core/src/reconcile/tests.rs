use super::*;
use chrono::{TimeZone, Utc};
use couch_sync_models::{LibraryEntry, MediaIds, Movie};

fn ids(imdb: &str) -> MediaIds {
    MediaIds {
        imdb: Some(imdb.to_string()),
        ..MediaIds::default()
    }
}

fn movie(title: &str, imdb: &str, plays: u32, rating: u8) -> Movie {
    Movie {
        title: title.to_string(),
        ids: ids(imdb),
        year: Some(2000),
        plays,
        last_watched: None,
        rating,
        library: None,
    }
}

fn local_movie(title: &str, imdb: &str, plays: u32, rating: u8, movie_id: u32) -> Movie {
    Movie {
        library: Some(LibraryEntry {
            movie_id,
            ..LibraryEntry::default()
        }),
        ..movie(title, imdb, plays, rating)
    }
}

fn show(title: &str, tvdb: u32, rating: u8, episodes: &[(u32, u32, u32, u8)]) -> Show {
    // episodes: (season, number, plays, rating)
    let mut result = Show {
        title: title.to_string(),
        ids: MediaIds {
            tvdb: Some(tvdb),
            ..MediaIds::default()
        },
        year: Some(2005),
        rating,
        show_id: None,
        seasons: Vec::new(),
    };
    for &(season, number, plays, rating) in episodes {
        let episode = Episode {
            number,
            ids: MediaIds::default(),
            plays,
            last_watched: None,
            rating,
        };
        match result.seasons.iter_mut().find(|s| s.number == season) {
            Some(existing) => existing.episodes.push(episode),
            None => result.seasons.push(Season {
                number: season,
                episodes: vec![episode],
            }),
        }
    }
    result
}

fn local_show(title: &str, tvdb: u32, rating: u8, show_id: u32, episodes: &[(u32, u32, u32, u8)]) -> Show {
    Show {
        show_id: Some(show_id),
        ..show(title, tvdb, rating, episodes)
    }
}

#[test]
fn test_watched_movie_missing_remotely_is_pushed() {
    let local = vec![local_movie("Fight Club", "tt1", 1, 0, 3)];
    let remote: Vec<Movie> = vec![];

    let set = reconcile_movies(
        &local,
        &remote,
        Facet::Watched,
        Direction::ToRemote,
        &ReconcileOptions::default(),
    );
    assert_eq!(set.len(), 1);
    assert_eq!(set.items[0].title, "Fight Club");
}

#[test]
fn test_watched_never_resent_when_remote_already_watched() {
    let local = vec![local_movie("Heat", "tt1", 2, 0, 1)];
    let remote = vec![movie("Heat", "tt1", 1, 0)];

    let set = reconcile_movies(
        &local,
        &remote,
        Facet::Watched,
        Direction::ToRemote,
        &ReconcileOptions::default(),
    );
    assert!(set.is_empty());
}

#[test]
fn test_fallback_resends_only_with_strictly_newer_timestamp() {
    let opts = ReconcileOptions {
        fallback: true,
        ..ReconcileOptions::default()
    };
    let remote_at = Utc.with_ymd_and_hms(2024, 5, 1, 20, 0, 0).unwrap();

    let mut local = vec![local_movie("Heat", "tt1", 1, 0, 1)];
    let mut remote = vec![movie("Heat", "tt1", 1, 0)];
    remote[0].last_watched = Some(remote_at);

    // Newer by more than the tolerance: resend.
    local[0].last_watched = Some(remote_at + Duration::minutes(10));
    let set = reconcile_movies(&local, &remote, Facet::Watched, Direction::ToRemote, &opts);
    assert_eq!(set.len(), 1);

    // Newer, but inside the tolerance: leave alone.
    local[0].last_watched = Some(remote_at + Duration::seconds(30));
    let set = reconcile_movies(&local, &remote, Facet::Watched, Direction::ToRemote, &opts);
    assert!(set.is_empty());

    // Without fallback the timestamps are ignored entirely.
    local[0].last_watched = Some(remote_at + Duration::days(7));
    let set = reconcile_movies(
        &local,
        &remote,
        Facet::Watched,
        Direction::ToRemote,
        &ReconcileOptions::default(),
    );
    assert!(set.is_empty());
}

#[test]
fn test_rating_pushed_when_changed_and_skipped_when_equal() {
    let local = vec![
        local_movie("Heat", "tt1", 0, 9, 1),
        local_movie("Alien", "tt2", 0, 8, 2),
        local_movie("Unrated", "tt3", 0, 0, 3),
    ];
    let remote = vec![
        movie("Heat", "tt1", 0, 7),
        movie("Alien", "tt2", 0, 8),
        movie("Unrated", "tt3", 0, 5),
    ];

    let set = reconcile_movies(
        &local,
        &remote,
        Facet::Rating,
        Direction::ToRemote,
        &ReconcileOptions::default(),
    );
    assert_eq!(set.len(), 1);
    assert_eq!(set.items[0].title, "Heat");
    assert_eq!(set.items[0].rating, 9);
}

#[test]
fn test_ratings_are_never_invented_for_unmatched_items() {
    let local = vec![local_movie("Obscure", "tt9", 0, 10, 1)];
    let remote: Vec<Movie> = vec![];

    let set = reconcile_movies(
        &local,
        &remote,
        Facet::Rating,
        Direction::ToRemote,
        &ReconcileOptions::default(),
    );
    assert!(set.is_empty());
}

#[test]
fn test_to_local_updates_adopt_the_library_handle() {
    let local = vec![local_movie("Heat", "tt1", 0, 0, 42)];
    let mut remote = vec![movie("Heat", "tt1", 0, 9)];
    remote[0].ids.trakt = Some(77);

    let set = reconcile_movies(
        &local,
        &remote,
        Facet::Rating,
        Direction::ToLocal,
        &ReconcileOptions {
            restrict: true,
            ..ReconcileOptions::default()
        },
    );
    assert_eq!(set.len(), 1);
    let update = &set.items[0];
    assert_eq!(update.rating, 9);
    assert_eq!(update.library.as_ref().unwrap().movie_id, 42);
    // Identifier sets are merged on the emitted clone.
    assert_eq!(update.ids.trakt, Some(77));
    assert_eq!(update.ids.imdb.as_deref(), Some("tt1"));
}

#[test]
fn test_restrict_requires_presence_on_both_sides() {
    let local = vec![local_movie("Heat", "tt1", 0, 0, 1)];
    let remote = vec![movie("Heat", "tt1", 0, 9), movie("Invented", "tt8", 0, 10)];

    let set = reconcile_movies(
        &local,
        &remote,
        Facet::Rating,
        Direction::ToLocal,
        &ReconcileOptions {
            restrict: true,
            ..ReconcileOptions::default()
        },
    );
    assert_eq!(set.len(), 1);
    for update in &set.items {
        assert!(local.iter().any(|m| m.ids.matches(&update.ids)));
    }
}

#[test]
fn test_output_preserves_source_iteration_order() {
    let local = vec![
        local_movie("C", "tt3", 1, 0, 3),
        local_movie("A", "tt1", 1, 0, 1),
        local_movie("B", "tt2", 1, 0, 2),
    ];
    let remote: Vec<Movie> = vec![];

    let set = reconcile_movies(
        &local,
        &remote,
        Facet::Watched,
        Direction::ToRemote,
        &ReconcileOptions::default(),
    );
    let titles: Vec<&str> = set.items.iter().map(|m| m.title.as_str()).collect();
    assert_eq!(titles, vec!["C", "A", "B"]);
}

#[test]
fn test_reconcile_is_idempotent_after_applying_updates() {
    let local = vec![
        local_movie("Heat", "tt1", 1, 0, 1),
        local_movie("Alien", "tt2", 1, 0, 2),
    ];
    let mut remote = vec![movie("Heat", "tt1", 0, 0)];

    let set = reconcile_movies(
        &local,
        &remote,
        Facet::Watched,
        Direction::ToRemote,
        &ReconcileOptions::default(),
    );
    assert_eq!(set.len(), 2);

    // Apply the update set to the remote catalog.
    for update in &set.items {
        match remote.iter_mut().find(|m| m.ids.matches(&update.ids)) {
            Some(existing) => existing.plays = update.plays,
            None => remote.push(Movie {
                library: None,
                ..update.clone()
            }),
        }
    }

    let again = reconcile_movies(
        &local,
        &remote,
        Facet::Watched,
        Direction::ToRemote,
        &ReconcileOptions::default(),
    );
    assert!(again.is_empty());
}

#[test]
fn test_consistent_show_produces_no_updates() {
    let local = vec![local_show("The Wire", 79126, 0, 5, &[(1, 1, 1, 0), (1, 2, 0, 0)])];
    let remote = vec![show("The Wire", 79126, 0, &[(1, 1, 1, 0), (1, 2, 0, 0)])];

    let set = reconcile_episodes(
        &local,
        &remote,
        Facet::Watched,
        Direction::ToRemote,
        &ReconcileOptions::default(),
    );
    assert!(set.is_empty());
}

#[test]
fn test_only_qualifying_episodes_are_emitted() {
    let local = vec![local_show(
        "The Wire",
        79126,
        0,
        5,
        &[(1, 1, 1, 0), (1, 2, 1, 0), (2, 1, 0, 0)],
    )];
    let remote = vec![show("The Wire", 79126, 0, &[(1, 1, 1, 0), (1, 2, 0, 0)])];

    let set = reconcile_episodes(
        &local,
        &remote,
        Facet::Watched,
        Direction::ToRemote,
        &ReconcileOptions::default(),
    );
    assert_eq!(set.len(), 1);
    let emitted = &set.items[0];
    assert_eq!(emitted.episode_count(), 1);
    assert_eq!(emitted.seasons[0].number, 1);
    assert_eq!(emitted.seasons[0].episodes[0].number, 2);
}

#[test]
fn test_unmatched_show_becomes_new_remote_history_only() {
    let local = vec![local_show("Deadwood", 72023, 0, 9, &[(1, 1, 1, 0), (1, 2, 0, 0)])];
    let remote: Vec<Show> = vec![];

    let watched = reconcile_episodes(
        &local,
        &remote,
        Facet::Watched,
        Direction::ToRemote,
        &ReconcileOptions::default(),
    );
    assert_eq!(watched.len(), 1);
    assert_eq!(watched.items[0].episode_count(), 1);

    // Ratings never materialize unmatched shows.
    let rated = reconcile_episodes(
        &local,
        &remote,
        Facet::Rating,
        Direction::ToRemote,
        &ReconcileOptions::default(),
    );
    assert!(rated.is_empty());

    // And a show only the tracker knows is never invented locally.
    let to_local = reconcile_episodes(
        &[],
        &local,
        Facet::Watched,
        Direction::ToLocal,
        &ReconcileOptions::default(),
    );
    assert!(to_local.is_empty());
}

#[test]
fn test_episode_rating_changes_are_per_episode() {
    let local = vec![local_show("The Wire", 79126, 0, 5, &[(1, 1, 0, 9), (1, 2, 0, 8)])];
    let remote = vec![show("The Wire", 79126, 0, &[(1, 1, 0, 9), (1, 2, 0, 6)])];

    let set = reconcile_episodes(
        &local,
        &remote,
        Facet::Rating,
        Direction::ToRemote,
        &ReconcileOptions::default(),
    );
    assert_eq!(set.len(), 1);
    assert_eq!(set.items[0].episode_count(), 1);
    assert_eq!(set.items[0].seasons[0].episodes[0].number, 2);
}

#[test]
fn test_show_rating_sync_strips_seasons_and_adopts_handle() {
    let local = vec![local_show("The Wire", 79126, 0, 5, &[(1, 1, 1, 0)])];
    let remote = vec![show("The Wire", 79126, 10, &[])];

    let set = reconcile_show_ratings(
        &local,
        &remote,
        Direction::ToLocal,
        &ReconcileOptions {
            restrict: true,
            ..ReconcileOptions::default()
        },
    );
    assert_eq!(set.len(), 1);
    let update = &set.items[0];
    assert_eq!(update.rating, 10);
    assert_eq!(update.show_id, Some(5));
    assert!(update.seasons.is_empty());
}

#[test]
fn test_show_rating_restrict_skips_shows_outside_the_library() {
    let local = vec![local_show("The Wire", 79126, 0, 5, &[])];
    let remote = vec![
        show("The Wire", 79126, 10, &[]),
        show("Unknown Show", 999, 9, &[]),
    ];

    let set = reconcile_show_ratings(
        &local,
        &remote,
        Direction::ToLocal,
        &ReconcileOptions {
            restrict: true,
            ..ReconcileOptions::default()
        },
    );
    // ToLocal walks the remote catalog; only the library-owned show survives.
    assert_eq!(set.len(), 1);
    assert_eq!(set.items[0].title, "The Wire");
}
