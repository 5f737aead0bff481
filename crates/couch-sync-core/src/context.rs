use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

use chrono::Duration;
use tracing::trace;

use crate::reconcile::ReconcileOptions;

/// Visible progress surface for a sync run: a percentage plus up to three
/// lines of status text, a cancel query, and open/close lifecycle calls.
/// Entirely optional; the engine behaves identically without one.
pub trait ProgressSurface: Send + Sync {
    fn open(&self, title: &str);
    fn update(&self, percent: u8, lines: &[&str]);
    fn is_canceled(&self) -> bool;
    fn close(&self);
}

/// Receives start/finish notifications for silent runs.
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, message: &str);
}

/// Feature toggles for one run, resolved from settings by the caller.
#[derive(Debug, Clone)]
pub struct SyncToggles {
    pub sync_watched_movies: bool,
    pub sync_watched_episodes: bool,
    pub sync_ratings: bool,
    pub scrobble_fallback: bool,
    pub restrict_to_library: bool,
    pub sync_on_update: bool,
    pub notify: bool,
    pub hide_notifications_during_playback: bool,
}

impl Default for SyncToggles {
    fn default() -> Self {
        Self {
            sync_watched_movies: true,
            sync_watched_episodes: true,
            sync_ratings: true,
            scrobble_fallback: false,
            restrict_to_library: true,
            sync_on_update: false,
            notify: true,
            hide_notifications_during_playback: false,
        }
    }
}

/// Mutable single-run state: monotonic progress, an asynchronously settable
/// cancellation flag, and the toggle set. One value per invocation, passed by
/// reference into every phase and chunk callback, discarded at run end.
pub struct SyncContext {
    progress: Option<Arc<dyn ProgressSurface>>,
    notifier: Option<Arc<dyn Notifier>>,
    cancel: Arc<AtomicBool>,
    last_percent: AtomicU8,
    playback_active: bool,
    pub toggles: SyncToggles,
    pub tolerance: Duration,
}

impl SyncContext {
    pub fn new(toggles: SyncToggles) -> Self {
        Self {
            progress: None,
            notifier: None,
            cancel: Arc::new(AtomicBool::new(false)),
            last_percent: AtomicU8::new(0),
            playback_active: false,
            toggles,
            tolerance: Duration::seconds(60),
        }
    }

    pub fn with_progress(mut self, surface: Arc<dyn ProgressSurface>) -> Self {
        self.progress = Some(surface);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn with_playback_active(mut self, active: bool) -> Self {
        self.playback_active = active;
        self
    }

    pub fn with_tolerance(mut self, tolerance: Duration) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Handle for the invoking environment to cancel the run from another
    /// task; observed at the next check, not preemptively.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn request_cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    pub fn is_canceled(&self) -> bool {
        if self.cancel.load(Ordering::Relaxed) {
            return true;
        }
        self.progress.as_ref().map_or(false, |p| p.is_canceled())
    }

    /// No progress surface attached.
    pub fn is_silent(&self) -> bool {
        self.progress.is_none()
    }

    /// Opens a fresh progress dialog and resets the monotonic floor.
    pub fn begin_segment(&self, title: &str) {
        self.last_percent.store(0, Ordering::Relaxed);
        if let Some(progress) = &self.progress {
            progress.open(title);
        }
    }

    /// Reports progress, clamped so the percentage never decreases within a
    /// segment.
    pub fn report(&self, percent: u8, lines: &[&str]) {
        let percent = percent.min(100);
        let shown = self.last_percent.fetch_max(percent, Ordering::Relaxed).max(percent);
        match &self.progress {
            Some(progress) => progress.update(shown, lines),
            None => trace!(percent = shown, ?lines, "progress"),
        }
    }

    pub fn end_segment(&self) {
        if let Some(progress) = &self.progress {
            progress.close();
        }
    }

    /// Lifecycle notifications fire only for silent runs triggered by a
    /// library update, and only when the user wants them.
    pub fn should_notify(&self) -> bool {
        self.is_silent()
            && self.toggles.sync_on_update
            && self.toggles.notify
            && !(self.playback_active && self.toggles.hide_notifications_during_playback)
    }

    pub fn notify(&self, title: &str, message: &str) {
        if let Some(notifier) = &self.notifier {
            notifier.notify(title, message);
        }
    }

    pub fn reconcile_options(&self, restrict: bool) -> ReconcileOptions {
        ReconcileOptions {
            fallback: self.toggles.scrobble_fallback,
            restrict,
            tolerance: self.tolerance,
        }
    }
}
