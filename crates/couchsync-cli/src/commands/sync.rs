use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use chrono::Duration;
use color_eyre::eyre::{eyre, Context};
use color_eyre::Result;
use couch_sync_config::{default_config_file, Config};
use couch_sync_core::{DomainOutcome, LibraryFilter, Sync, SyncContext, SyncSummary, SyncToggles};
use couch_sync_sources::{KodiClient, TraktClient};
use owo_colors::OwoColorize;

use crate::progress::{ProgressDialog, TermNotifier};

pub async fn run_sync(
    filter: LibraryFilter,
    silent: bool,
    json: bool,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let path = config_path.unwrap_or_else(default_config_file);
    let config = Config::load_from_file(&path)
        .map_err(|e| eyre!(e))
        .wrap_err_with(|| format!("failed to load config from {}", path.display()))?;
    config
        .validate()
        .map_err(|e| eyre!("invalid configuration: {}", e))?;

    let library = KodiClient::from_config(&config.library);
    let tracker = TraktClient::from_config(&config.tracker);

    let toggles = SyncToggles {
        sync_watched_movies: config.sync.watched_movies,
        sync_watched_episodes: config.sync.watched_episodes,
        sync_ratings: config.sync.ratings,
        scrobble_fallback: config.sync.scrobble_fallback,
        restrict_to_library: config.sync.restrict_to_library,
        sync_on_update: config.sync.sync_on_update,
        notify: config.sync.notifications,
        hide_notifications_during_playback: config.sync.hide_notifications_during_playback,
    };
    let mut ctx = SyncContext::new(toggles)
        .with_tolerance(Duration::seconds(config.sync.fallback_tolerance_secs))
        .with_notifier(Arc::new(TermNotifier));
    if !silent {
        ctx = ctx.with_progress(Arc::new(ProgressDialog::new()));
    }

    // Ctrl-C cancels at the next batch boundary; work already sent stays.
    let cancel = ctx.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("cancellation requested");
            cancel.store(true, Ordering::Relaxed);
        }
    });

    let summary = Sync::new(&library, &tracker).run(&ctx, filter).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn print_summary(summary: &SyncSummary) {
    print_domain("movies", &summary.movies);
    print_domain("episodes", &summary.episodes);
    let line = format!(
        "{} items synced, {} failed batches",
        summary.synced(),
        summary.errors()
    );
    if summary.errors() > 0 {
        println!("{} {}", "sync finished:".yellow().bold(), line);
    } else {
        println!("{} {}", "sync finished:".green().bold(), line);
    }
}

fn print_domain(name: &str, outcome: &DomainOutcome) {
    println!(
        "  {:<9} {:?} ({} synced, {} errors)",
        name, outcome.status, outcome.synced, outcome.errors
    );
}
