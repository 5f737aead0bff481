use couch_sync_models::{MediaIds, Movie, Show};
use tracing::debug;

use crate::reconcile::{Facet, UpdateSet};

/// Drops update entries the write endpoint would reject: items without any
/// usable identifier, and duplicates (first occurrence wins). A filter, not
/// a transform; sanitizing an already-sanitized set changes nothing.
pub fn sanitize_movies(set: &mut UpdateSet<Movie>) {
    let mut seen: Vec<MediaIds> = Vec::new();
    set.items.retain(|movie| {
        if movie.ids.is_empty() {
            debug!(title = %movie.title, "dropping movie without identifiers");
            return false;
        }
        if seen.iter().any(|ids| ids.matches(&movie.ids)) {
            debug!(title = %movie.title, "dropping duplicate movie");
            return false;
        }
        seen.push(movie.ids.clone());
        true
    });
}

/// Episodes are addressed through their show's identifier set, so a show
/// without identifiers takes all of its episodes with it. Seasons left with
/// no episodes are pruned; in a watched set a show must keep at least one
/// episode to stay.
pub fn sanitize_shows(set: &mut UpdateSet<Show>) {
    let facet = set.facet;
    let mut seen: Vec<MediaIds> = Vec::new();
    set.items.retain_mut(|show| {
        if show.ids.is_empty() {
            debug!(title = %show.title, "dropping show without identifiers");
            return false;
        }
        if seen.iter().any(|ids| ids.matches(&show.ids)) {
            debug!(title = %show.title, "dropping duplicate show");
            return false;
        }
        show.seasons.retain(|season| !season.episodes.is_empty());
        if facet == Facet::Watched && show.seasons.is_empty() {
            debug!(title = %show.title, "dropping show with no episodes left");
            return false;
        }
        seen.push(show.ids.clone());
        true
    });
}
