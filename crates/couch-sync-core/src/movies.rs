use couch_sync_models::Movie;
use couch_sync_sources::{HistoryPayload, MediaLibrary, RatingsPayload, Tracker};
use tracing::{debug, error, info};

use crate::batch::{for_each_chunk, PercentSpan};
use crate::context::SyncContext;
use crate::reconcile::{reconcile_movies, Direction, Facet};
use crate::sanitize::sanitize_movies;
use crate::sync::{DomainOutcome, DomainStatus, LoadError};

/// History writes go out in bounded batches of this many movies.
pub(crate) const HISTORY_CHUNK_SIZE: usize = 200;

const TITLE: &str = "Movie sync";

/// Drives the movie domain: load both catalogs, push watched state, push
/// ratings, all inside fixed progress budgets.
pub(crate) struct MovieSync<'a> {
    library: &'a dyn MediaLibrary,
    tracker: &'a dyn Tracker,
    ctx: &'a SyncContext,
}

impl<'a> MovieSync<'a> {
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

        let local = match self.load_library_movies().await {
            Ok(movies) => movies,
            Err(err) => {
                debug!(error = %err, "aborting movie sync");
                self.ctx.end_segment();
                outcome.status = DomainStatus::Aborted;
                return outcome;
            }
        };
        let remote = match self.load_tracker_movies().await {
            Ok(movies) => movies,
            Err(err) => {
                debug!(error = %err, "aborting movie sync");
                self.ctx.end_segment();
                outcome.status = DomainStatus::Aborted;
                return outcome;
            }
        };

        self.push_watched(&local, &remote, PercentSpan::new(59, 69), &mut outcome)
            .await;
        self.push_ratings(&local, &remote, PercentSpan::new(92, 99), &mut outcome)
            .await;

        if self.ctx.is_canceled() {
            self.ctx.end_segment();
            outcome.status = DomainStatus::Canceled;
            return outcome;
        }

        self.ctx.report(100, &["Movie sync complete"]);
        self.ctx.end_segment();
        if self.ctx.should_notify() {
            self.ctx.notify(TITLE, "Sync complete");
        }
        debug!(
            local = local.len(),
            remote = remote.len(),
            "movie sync complete"
        );
        outcome.status = DomainStatus::Completed;
        outcome
    }

    async fn load_library_movies(&self) -> Result<Vec<Movie>, LoadError> {
        self.ctx.report(1, &["Loading movies from the library"]);
        debug!("getting movie data from the library");
        let movies = self.library.get_movies().await?;
        if movies.is_empty() {
            return Err(LoadError::EmptyLibrary("movies"));
        }
        self.ctx.report(10, &["Library movies loaded"]);
        Ok(movies)
    }

    /// Watched and rated movies come from separate endpoints; the rated list
    /// is folded into the watched one so the reconciler sees a single
    /// entity-complete catalog.
    async fn load_tracker_movies(&self) -> Result<Vec<Movie>, LoadError> {
        self.ctx.report(10, &["Loading movies from the tracker"]);
        debug!("getting watched movies from the tracker");

        self.ctx.report(17, &["Loading watched movies"]);
        let mut movies = self.tracker.get_movies_watched().await?;

        if self.ctx.toggles.sync_ratings {
            self.ctx.report(24, &["Loading movie ratings"]);
            let rated = self.tracker.get_movies_rated().await?;
            merge_rated(&mut movies, rated);
        }

        self.ctx.report(25, &["Tracker movies loaded"]);
        Ok(movies)
    }

    async fn push_watched(
        &self,
        local: &[Movie],
        remote: &[Movie],
        span: PercentSpan,
        outcome: &mut DomainOutcome,
    ) {
        if !self.ctx.toggles.sync_watched_movies {
            debug!("movie watched sync is disabled, skipping");
            self.ctx.report(span.to, &["Watched sync skipped"]);
            return;
        }
        if self.ctx.is_canceled() {
            return;
        }

        let mut updates = reconcile_movies(
            local,
            remote,
            Facet::Watched,
            Direction::ToRemote,
            &self.ctx.reconcile_options(false),
        );
        sanitize_movies(&mut updates);

        if updates.is_empty() {
            self.ctx.report(span.to, &["Tracker watched status is up to date"]);
            debug!("tracker movie playcounts are up to date");
            return;
        }

        info!(count = updates.len(), "updating movie playcounts on the tracker");
        debug!(
            titles = %updates
                .items
                .iter()
                .map(|m| m.title.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            "movies to update"
        );

        let total = updates.len();
        self.ctx.report(
            span.from,
            &[&format!("Updating {} movies on the tracker", total)],
        );
        let errors = for_each_chunk(
            self.ctx,
            updates.items,
            HISTORY_CHUNK_SIZE,
            span,
            "Updating watched movies",
            |chunk| async move {
                self.tracker
                    .add_to_history(&HistoryPayload::movies(&chunk))
                    .await?;
                Ok(())
            },
        )
        .await;

        debug!(errors, "movie playcount update finished");
        outcome.synced += total;
        outcome.errors += errors;
        if !self.ctx.is_canceled() {
            self.ctx.report(
                span.to,
                &[&format!("{} movies updated on the tracker", total)],
            );
        }
    }

    async fn push_ratings(
        &self,
        local: &[Movie],
        remote: &[Movie],
        span: PercentSpan,
        outcome: &mut DomainOutcome,
    ) {
        if !self.ctx.toggles.sync_ratings {
            debug!("rating sync is disabled, skipping");
            self.ctx.report(span.to, &["Rating sync skipped"]);
            return;
        }
        if remote.is_empty() || self.ctx.is_canceled() {
            return;
        }

        let mut updates = reconcile_movies(
            local,
            remote,
            Facet::Rating,
            Direction::ToRemote,
            &self.ctx.reconcile_options(false),
        );
        sanitize_movies(&mut updates);

        if updates.is_empty() {
            self.ctx.report(span.to, &["Tracker movie ratings are up to date"]);
            debug!("tracker movie ratings are up to date");
            return;
        }

        let total = updates.len();
        info!(count = total, "adding movie ratings on the tracker");
        self.ctx.report(
            span.from,
            &[&format!("Adding ratings for {} movies", total)],
        );
        match self
            .tracker
            .add_ratings(&RatingsPayload::movies(&updates.items))
            .await
        {
            Ok(()) => {
                outcome.synced += total;
                self.ctx
                    .report(span.to, &[&format!("{} movie ratings added", total)]);
            }
            Err(err) => {
                error!(error = %err, "movie rating update failed");
                outcome.errors += 1;
            }
        }
    }
}

fn merge_rated(movies: &mut Vec<Movie>, rated: Vec<Movie>) {
    for entry in rated {
        match movies.iter_mut().find(|m| m.ids.matches(&entry.ids)) {
            Some(existing) => {
                existing.rating = entry.rating;
                existing.ids.merge(&entry.ids);
            }
            None => movies.push(entry),
        }
    }
}
