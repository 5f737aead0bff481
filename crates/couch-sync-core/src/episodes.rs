use couch_sync_models::{Season, Show};
use couch_sync_sources::{HistoryPayload, MediaLibrary, RatingsPayload, ShowRatingUpdate, Tracker};
use tracing::{debug, error, info};

use crate::batch::{for_each_chunk, PercentSpan};
use crate::context::SyncContext;
use crate::reconcile::{reconcile_episodes, reconcile_show_ratings, Direction, Facet};
use crate::sanitize::sanitize_shows;
use crate::sync::{DomainOutcome, DomainStatus, LoadError};

/// Library rating writes go out in batches of this many shows.
pub(crate) const RATING_WRITE_CHUNK_SIZE: usize = 50;

const TITLE: &str = "Episode sync";

/// Drives the show/episode domain: watched state per episode, ratings for
/// shows (both directions) and for episodes.
pub(crate) struct EpisodeSync<'a> {
    library: &'a dyn MediaLibrary,
    tracker: &'a dyn Tracker,
    ctx: &'a SyncContext,
}

impl<'a> EpisodeSync<'a> {
    pub(crate) fn new(
        library: &'a dyn MediaLibrary,
        tracker: &'a dyn Tracker,
        ctx: &'a SyncContext,
    ) -> Self {
        Self {
            library,
            tracker,
            ctx,
        }
    }

    pub(crate) async fn run(&self) -> DomainOutcome {
        let mut outcome = DomainOutcome::default();
        if self.ctx.should_notify() {
            self.ctx.notify(TITLE, "Sync started");
        }
        self.ctx.begin_segment(TITLE);

        let local = match self.load_library_shows().await {
            Ok(shows) => shows,
            Err(err) => {
                debug!(error = %err, "aborting episode sync");
                self.ctx.end_segment();
                outcome.status = DomainStatus::Aborted;
                return outcome;
            }
        };
        let (watched, rated_shows, rated_episodes) = match self.load_tracker_shows().await {
            Ok(catalogs) => catalogs,
            Err(err) => {
                debug!(error = %err, "aborting episode sync");
                self.ctx.end_segment();
                outcome.status = DomainStatus::Aborted;
                return outcome;
            }
        };

        self.push_watched(&local, &watched, PercentSpan::new(59, 69), &mut outcome)
            .await;
        self.sync_show_ratings(
            &local,
            &watched,
            &rated_shows,
            PercentSpan::new(92, 95),
            &mut outcome,
        )
        .await;
        self.sync_episode_ratings(
            &local,
            &watched,
            &rated_episodes,
            PercentSpan::new(96, 99),
            &mut outcome,
        )
        .await;

        if self.ctx.is_canceled() {
            self.ctx.end_segment();
            outcome.status = DomainStatus::Canceled;
            return outcome;
        }

        self.ctx.report(100, &["Episode sync complete"]);
        self.ctx.end_segment();
        if self.ctx.should_notify() {
            self.ctx.notify(TITLE, "Sync complete");
        }
        debug!(
            local_shows = local.len(),
            local_episodes = local.iter().map(Show::episode_count).sum::<usize>(),
            remote_shows = watched.len(),
            "episode sync complete"
        );
        outcome.status = DomainStatus::Completed;
        outcome
    }

    async fn load_library_shows(&self) -> Result<Vec<Show>, LoadError> {
        self.ctx.report(1, &["Loading shows from the library"]);
        debug!("getting show data from the library");
        let shows = self.library.get_shows().await?;
        if shows.is_empty() {
            return Err(LoadError::EmptyLibrary("shows"));
        }
        self.ctx.report(10, &["Library shows loaded"]);
        Ok(shows)
    }

    async fn load_tracker_shows(&self) -> Result<(Vec<Show>, Vec<Show>, Vec<Show>), LoadError> {
        self.ctx.report(10, &["Loading shows from the tracker"]);
        debug!("getting watched and rated shows from the tracker");

        self.ctx.report(12, &["Loading watched shows"]);
        let watched = self.tracker.get_shows_watched().await?;

        let mut rated_shows = Vec::new();
        let mut rated_episodes = Vec::new();
        if self.ctx.toggles.sync_ratings {
            self.ctx.report(16, &["Loading show ratings"]);
            rated_shows = self.tracker.get_shows_rated().await?;
            self.ctx.report(20, &["Loading episode ratings"]);
            rated_episodes = self.tracker.get_episodes_rated().await?;
        }

        self.ctx.report(25, &["Tracker shows loaded"]);
        Ok((watched, rated_shows, rated_episodes))
    }

    /// One history write per emitted show; a failing show does not block the
    /// rest.
    async fn push_watched(
        &self,
        local: &[Show],
        remote: &[Show],
        span: PercentSpan,
        outcome: &mut DomainOutcome,
    ) {
        if !self.ctx.toggles.sync_watched_episodes {
            debug!("episode watched sync is disabled, skipping");
            self.ctx.report(span.to, &["Watched sync skipped"]);
            return;
        }
        if self.ctx.is_canceled() {
            return;
        }

        let mut updates = reconcile_episodes(
            local,
            remote,
            Facet::Watched,
            Direction::ToRemote,
            &self.ctx.reconcile_options(false),
        );
        sanitize_shows(&mut updates);

        if updates.is_empty() {
            self.ctx
                .report(span.to, &["Tracker episode playcounts are up to date"]);
            debug!("tracker episode playcounts are up to date");
            return;
        }

        let episode_total: usize = updates.items.iter().map(Show::episode_count).sum();
        info!(
            shows = updates.len(),
            episodes = episode_total,
            "updating episode playcounts on the tracker"
        );
        for show in &updates.items {
            debug!(title = %show.title, id = %show.ids.label(), episodes = show.episode_count(), "episodes to update");
        }

        self.ctx.report(
            span.from,
            &[&format!("Updating {} shows on the tracker", updates.len())],
        );
        let errors = for_each_chunk(
            self.ctx,
            updates.items,
            1,
            span,
            "Updating watched episodes",
            |chunk| async move {
                self.tracker
                    .add_to_history(&HistoryPayload::shows(&chunk))
                    .await?;
                Ok(())
            },
        )
        .await;

        debug!(errors, "episode playcount update finished");
        outcome.synced += episode_total;
        outcome.errors += errors;
        if !self.ctx.is_canceled() {
            self.ctx
                .report(span.to, &[&format!("{} episodes updated", episode_total)]);
        }
    }

    /// Show-level ratings go both ways: missing ratings are added on the
    /// tracker, then tracker ratings are written back to the library in
    /// bounded batches.
    async fn sync_show_ratings(
        &self,
        local: &[Show],
        watched: &[Show],
        rated: &[Show],
        span: PercentSpan,
        outcome: &mut DomainOutcome,
    ) {
        if !self.ctx.toggles.sync_ratings {
            debug!("rating sync is disabled, skipping");
            self.ctx.report(span.to, &["Rating sync skipped"]);
            return;
        }
        if self.ctx.is_canceled() {
            return;
        }

        let remote = merge_rated_shows(watched, rated);

        let mut to_remote = reconcile_show_ratings(
            local,
            &remote,
            Direction::ToRemote,
            &self.ctx.reconcile_options(false),
        );
        sanitize_shows(&mut to_remote);
        if to_remote.is_empty() {
            self.ctx
                .report(span.to, &["Tracker show ratings are up to date"]);
            debug!("tracker show ratings are up to date");
        } else {
            let total = to_remote.len();
            info!(count = total, "adding show ratings on the tracker");
            self.ctx.report(
                span.from,
                &[&format!("Adding ratings for {} shows", total)],
            );
            match self
                .tracker
                .add_ratings(&RatingsPayload::shows(&to_remote.items))
                .await
            {
                Ok(()) => outcome.synced += total,
                Err(err) => {
                    error!(error = %err, "show rating update failed");
                    outcome.errors += 1;
                }
            }
        }

        if self.ctx.is_canceled() {
            return;
        }

        // Write-back is restricted so ratings never land on shows the
        // library does not own.
        let to_local = reconcile_show_ratings(
            local,
            &remote,
            Direction::ToLocal,
            &self
                .ctx
                .reconcile_options(self.ctx.toggles.restrict_to_library),
        );
        if to_local.is_empty() {
            self.ctx
                .report(span.to, &["Library show ratings are up to date"]);
            debug!("library show ratings are up to date");
            return;
        }

        let writes: Vec<ShowRatingUpdate> = to_local
            .items
            .iter()
            .filter_map(|show| {
                show.show_id.map(|show_id| ShowRatingUpdate {
                    show_id,
                    rating: show.rating,
                })
            })
            .collect();
        let total = writes.len();
        info!(count = total, "updating show ratings in the library");
        let errors = for_each_chunk(
            self.ctx,
            writes,
            RATING_WRITE_CHUNK_SIZE,
            span,
            "Updating library show ratings",
            |chunk| async move {
                self.library.set_show_ratings(&chunk).await?;
                Ok(())
            },
        )
        .await;

        outcome.synced += total;
        outcome.errors += errors;
        if !self.ctx.is_canceled() {
            self.ctx
                .report(span.to, &[&format!("{} show ratings updated", total)]);
        }
    }

    async fn sync_episode_ratings(
        &self,
        local: &[Show],
        watched: &[Show],
        rated: &[Show],
        span: PercentSpan,
        outcome: &mut DomainOutcome,
    ) {
        if !self.ctx.toggles.sync_ratings {
            self.ctx.report(span.to, &["Rating sync skipped"]);
            return;
        }
        if self.ctx.is_canceled() {
            return;
        }

        let remote = merge_rated_episodes(watched, rated);

        let mut updates = reconcile_episodes(
            local,
            &remote,
            Facet::Rating,
            Direction::ToRemote,
            &self.ctx.reconcile_options(false),
        );
        sanitize_shows(&mut updates);
        if updates.is_empty() {
            self.ctx
                .report(span.to, &["Tracker episode ratings are up to date"]);
            debug!("tracker episode ratings are up to date");
            return;
        }

        let episode_total: usize = updates.items.iter().map(Show::episode_count).sum();
        info!(
            shows = updates.len(),
            episodes = episode_total,
            "adding episode ratings on the tracker"
        );
        self.ctx.report(
            span.from,
            &[&format!("Adding ratings for {} episodes", episode_total)],
        );
        match self
            .tracker
            .add_ratings(&RatingsPayload::episodes(&updates.items))
            .await
        {
            Ok(()) => {
                outcome.synced += episode_total;
                self.ctx
                    .report(span.to, &[&format!("{} episode ratings added", episode_total)]);
            }
            Err(err) => {
                error!(error = %err, "episode rating update failed");
                outcome.errors += 1;
            }
        }
    }
}

/// The tracker reports watched state and ratings as separate projections of
/// the same catalog. Folding the rated projection over the watched one gives
/// the reconciler a single entity-complete remote catalog, so a show the
/// tracker knows but has not rated shows up with rating 0 rather than not at
/// all.
fn merge_rated_shows(watched: &[Show], rated: &[Show]) -> Vec<Show> {
    let mut merged = watched.to_vec();
    for entry in rated {
        match merged.iter_mut().find(|s| s.ids.matches(&entry.ids)) {
            Some(existing) => {
                existing.rating = entry.rating;
                existing.ids.merge(&entry.ids);
            }
            None => merged.push(entry.clone()),
        }
    }
    merged
}

/// Same folding at episode level: rated episodes land on the watched tree,
/// filling in seasons and episodes the watched projection does not carry.
fn merge_rated_episodes(watched: &[Show], rated: &[Show]) -> Vec<Show> {
    let mut merged = watched.to_vec();
    for rated_show in rated {
        let show_index = match merged.iter().position(|s| s.ids.matches(&rated_show.ids)) {
            Some(index) => index,
            None => {
                merged.push(Show {
                    seasons: Vec::new(),
                    ..rated_show.clone()
                });
                merged.len() - 1
            }
        };
        let show = &mut merged[show_index];
        for rated_season in &rated_show.seasons {
            let season_index = match show
                .seasons
                .iter()
                .position(|s| s.number == rated_season.number)
            {
                Some(index) => index,
                None => {
                    show.seasons.push(Season {
                        number: rated_season.number,
                        episodes: Vec::new(),
                    });
                    show.seasons.len() - 1
                }
            };
            let season = &mut show.seasons[season_index];
            for rated_episode in &rated_season.episodes {
                match season
                    .episodes
                    .iter_mut()
                    .find(|e| e.number == rated_episode.number)
                {
                    Some(existing) => existing.rating = rated_episode.rating,
                    None => season.episodes.push(rated_episode.clone()),
                }
            }
        }
    }
    merged
}
