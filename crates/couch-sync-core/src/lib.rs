pub mod batch;
pub mod context;
mod episodes;
mod movies;
pub mod reconcile;
pub mod sanitize;
pub mod sync;

pub use batch::{for_each_chunk, PercentSpan};
pub use context::{Notifier, ProgressSurface, SyncContext, SyncToggles};
pub use reconcile::{
    reconcile_episodes, reconcile_movies, reconcile_show_ratings, Direction, Facet,
    ReconcileOptions, UpdateSet,
};
pub use sanitize::{sanitize_movies, sanitize_shows};
pub use sync::{DomainOutcome, DomainStatus, LibraryFilter, LoadError, Sync, SyncSummary};
