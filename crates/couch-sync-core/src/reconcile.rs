use chrono::Duration;
use couch_sync_models::{Episode, Movie, Season, Show};
use tracing::{debug, trace};

/// Which aspect of state a reconciliation pass evolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facet {
    Watched,
    Rating,
}

/// Which side receives the resulting updates. `ToRemote` walks the local
/// catalog against the remote one; `ToLocal` the reverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    ToRemote,
    ToLocal,
}

/// Knobs for a single reconciliation pass.
#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    /// Include items watched on both sides when the source's watch timestamp
    /// leads the target's by more than `tolerance` (missed-scrobble recovery).
    pub fallback: bool,
    /// Drop items whose counterpart has no library handle; used when writing
    /// back to the library so updates never address IDs it does not own.
    pub restrict: bool,
    pub tolerance: Duration,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            fallback: false,
            restrict: false,
            tolerance: Duration::seconds(60),
        }
    }
}

/// An ordered update sequence scoped to one facet and one direction. Item
/// order matches the walk order of the source catalog.
#[derive(Debug, Clone)]
pub struct UpdateSet<T> {
    pub facet: Facet,
    pub direction: Direction,
    pub items: Vec<T>,
}

impl<T> UpdateSet<T> {
    pub fn new(facet: Facet, direction: Direction) -> Self {
        Self {
            facet,
            direction,
            items: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

fn watched_later(
    source: Option<chrono::DateTime<chrono::Utc>>,
    target: Option<chrono::DateTime<chrono::Utc>>,
    tolerance: Duration,
) -> bool {
    match (source, target) {
        (Some(s), Some(t)) => s > t + tolerance,
        _ => false,
    }
}

/// Computes the updates needed to make one side's movie state consistent
/// with the other's. Purely a function of its inputs; emissions are clones
/// enriched with the counterpart's identifiers and library handle.
pub fn reconcile_movies(
    local: &[Movie],
    remote: &[Movie],
    facet: Facet,
    direction: Direction,
    opts: &ReconcileOptions,
) -> UpdateSet<Movie> {
    let (source, target) = match direction {
        Direction::ToRemote => (local, remote),
        Direction::ToLocal => (remote, local),
    };

    let mut out = UpdateSet::new(facet, direction);
    for item in source {
        match target.iter().find(|c| c.ids.matches(&item.ids)) {
            Some(counterpart) => {
                let include = match facet {
                    Facet::Watched => {
                        (item.plays > 0 && counterpart.plays == 0)
                            || (opts.fallback
                                && item.plays > 0
                                && counterpart.plays > 0
                                && watched_later(
                                    item.last_watched,
                                    counterpart.last_watched,
                                    opts.tolerance,
                                ))
                    }
                    Facet::Rating => item.rating > 0 && item.rating != counterpart.rating,
                };
                if !include {
                    continue;
                }
                if opts.restrict
                    && direction == Direction::ToLocal
                    && counterpart.library.is_none()
                {
                    trace!(title = %item.title, "counterpart has no library entry, skipping");
                    continue;
                }
                let mut update = item.clone();
                update.ids.merge(&counterpart.ids);
                if update.library.is_none() {
                    update.library = counterpart.library.clone();
                }
                out.items.push(update);
            }
            None => {
                // Newly watched items may create remote history; nothing is
                // ever invented on the local side, and ratings only evolve
                // state the target already knows.
                if facet == Facet::Watched
                    && direction == Direction::ToRemote
                    && !opts.restrict
                    && item.plays > 0
                {
                    out.items.push(item.clone());
                }
            }
        }
    }

    debug!(
        ?facet,
        ?direction,
        count = out.len(),
        "movie reconciliation computed"
    );
    out
}

/// Show-level rating reconciliation. Watched state and episode ratings are
/// handled per episode by [`reconcile_episodes`]; emitted shows carry no
/// season tree.
pub fn reconcile_show_ratings(
    local: &[Show],
    remote: &[Show],
    direction: Direction,
    opts: &ReconcileOptions,
) -> UpdateSet<Show> {
    let (source, target) = match direction {
        Direction::ToRemote => (local, remote),
        Direction::ToLocal => (remote, local),
    };

    let mut out = UpdateSet::new(Facet::Rating, direction);
    for show in source {
        let Some(counterpart) = target.iter().find(|c| c.ids.matches(&show.ids)) else {
            continue;
        };
        if show.rating == 0 || show.rating == counterpart.rating {
            continue;
        }
        if opts.restrict && direction == Direction::ToLocal && counterpart.show_id.is_none() {
            trace!(title = %show.title, "counterpart has no library entry, skipping");
            continue;
        }
        let mut update = Show {
            seasons: Vec::new(),
            ..show.clone()
        };
        update.ids.merge(&counterpart.ids);
        if update.show_id.is_none() {
            update.show_id = counterpart.show_id;
        }
        out.items.push(update);
    }

    debug!(?direction, count = out.len(), "show rating reconciliation computed");
    out
}

/// Episode-level reconciliation, nested under shows. Shows match by
/// identifier set, seasons and episodes pair by number; an episode's
/// inclusion is independent of its siblings. A show is emitted only when at
/// least one of its episodes qualifies, carrying only the qualifying
/// seasons and episodes.
pub fn reconcile_episodes(
    local: &[Show],
    remote: &[Show],
    facet: Facet,
    direction: Direction,
    opts: &ReconcileOptions,
) -> UpdateSet<Show> {
    let (source, target) = match direction {
        Direction::ToRemote => (local, remote),
        Direction::ToLocal => (remote, local),
    };

    let mut out = UpdateSet::new(facet, direction);
    for show in source {
        let counterpart = target.iter().find(|c| c.ids.matches(&show.ids));

        // An entirely unknown show only ever materializes as new remote
        // watch history.
        let new_history = facet == Facet::Watched && direction == Direction::ToRemote;
        if counterpart.is_none() && !new_history {
            continue;
        }
        if opts.restrict {
            let addressable = match direction {
                Direction::ToLocal => counterpart.map_or(false, |c| c.show_id.is_some()),
                Direction::ToRemote => counterpart.is_some(),
            };
            if !addressable {
                trace!(title = %show.title, "counterpart is not addressable, skipping");
                continue;
            }
        }

        let mut seasons = Vec::new();
        for season in &show.seasons {
            let season_counterpart = counterpart.and_then(|c| c.season(season.number));
            let episodes: Vec<Episode> = season
                .episodes
                .iter()
                .filter(|episode| {
                    let other = season_counterpart.and_then(|s| s.episode(episode.number));
                    episode_qualifies(episode, other, facet, new_history, opts)
                })
                .cloned()
                .collect();
            if !episodes.is_empty() {
                seasons.push(Season {
                    number: season.number,
                    episodes,
                });
            }
        }
        if seasons.is_empty() {
            continue;
        }

        let mut update = Show {
            seasons,
            ..show.clone()
        };
        if let Some(counterpart) = counterpart {
            update.ids.merge(&counterpart.ids);
            if update.show_id.is_none() {
                update.show_id = counterpart.show_id;
            }
        }
        out.items.push(update);
    }

    debug!(
        ?facet,
        ?direction,
        shows = out.len(),
        episodes = out.items.iter().map(Show::episode_count).sum::<usize>(),
        "episode reconciliation computed"
    );
    out
}

fn episode_qualifies(
    episode: &Episode,
    other: Option<&Episode>,
    facet: Facet,
    new_history: bool,
    opts: &ReconcileOptions,
) -> bool {
    match (facet, other) {
        (Facet::Watched, Some(other)) => {
            (episode.plays > 0 && other.plays == 0)
                || (opts.fallback
                    && episode.plays > 0
                    && other.plays > 0
                    && watched_later(episode.last_watched, other.last_watched, opts.tolerance))
        }
        (Facet::Watched, None) => new_history && episode.plays > 0,
        (Facet::Rating, Some(other)) => episode.rating > 0 && episode.rating != other.rating,
        (Facet::Rating, None) => false,
    }
}

#[cfg(test)]
mod tests;
