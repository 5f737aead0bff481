use couch_sync_sources::{MediaLibrary, SourceError, Tracker};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::context::SyncContext;
use crate::episodes::EpisodeSync;
use crate::movies::MovieSync;

/// Why a domain's catalogs could not be loaded.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The library answered with an empty catalog; there is nothing to
    /// reconcile against.
    #[error("the library returned no {0}")]
    EmptyLibrary(&'static str),

    #[error(transparent)]
    Source(#[from] SourceError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum DomainStatus {
    #[default]
    Skipped,
    Completed,
    Canceled,
    Aborted,
}

/// Result of one domain's sync. `errors` counts failed write batches; they
/// are logged and surfaced here but never abort the run.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct DomainOutcome {
    pub status: DomainStatus,
    pub synced: usize,
    pub errors: usize,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SyncSummary {
    pub movies: DomainOutcome,
    pub episodes: DomainOutcome,
}

impl SyncSummary {
    pub fn synced(&self) -> usize {
        self.movies.synced + self.episodes.synced
    }

    pub fn errors(&self) -> usize {
        self.movies.errors + self.episodes.errors
    }
}

/// Which domains a run covers; manual runs can scope to one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LibraryFilter {
    #[default]
    All,
    Movies,
    Episodes,
}

impl LibraryFilter {
    fn includes_movies(self) -> bool {
        matches!(self, Self::All | Self::Movies)
    }

    fn includes_episodes(self) -> bool {
        matches!(self, Self::All | Self::Episodes)
    }
}

/// Top-level controller: the movie domain runs first, then shows/episodes.
/// Failures are absorbed at the narrowest scope (chunk, then phase, then
/// domain); the run always completes and reports a summary.
pub struct Sync<'a> {
    library: &'a dyn MediaLibrary,
    tracker: &'a dyn Tracker,
}

impl<'a> Sync<'a> {
    pub fn new(library: &'a dyn MediaLibrary, tracker: &'a dyn Tracker) -> Self {
        Self { library, tracker }
    }

    pub async fn run(&self, ctx: &SyncContext, filter: LibraryFilter) -> SyncSummary {
        debug!("starting synchronization with the tracker");
        let mut summary = SyncSummary::default();

        if filter.includes_movies() {
            summary.movies = MovieSync::new(self.library, self.tracker, ctx).run().await;
        } else {
            debug!("movie sync is being skipped for this run");
        }

        if filter.includes_episodes() {
            // Movies are phase one; a cancel observed there covers the rest
            // of the run.
            if summary.movies.status == DomainStatus::Canceled {
                debug!("episode sync is being skipped because movie sync was canceled");
            } else {
                summary.episodes = EpisodeSync::new(self.library, self.tracker, ctx)
                    .run()
                    .await;
            }
        } else {
            debug!("episode sync is being skipped for this run");
        }

        info!(
            movies = ?summary.movies.status,
            episodes = ?summary.episodes.status,
            synced = summary.synced(),
            errors = summary.errors(),
            "synchronization finished"
        );
        summary
    }
}
