use std::io::IsTerminal;
use std::sync::Mutex;

use couch_sync_core::{Notifier, ProgressSurface};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;

/// Terminal progress dialog backing the engine's progress surface. One bar
/// per segment, opened and closed by the orchestrator.
pub struct ProgressDialog {
    bar: Mutex<Option<ProgressBar>>,
    interactive: bool,
}

impl ProgressDialog {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
            interactive: is_interactive(),
        }
    }
}

impl ProgressSurface for ProgressDialog {
    fn open(&self, title: &str) {
        if !self.interactive {
            tracing::info!(title, "progress dialog suppressed in non-interactive mode");
            return;
        }
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} {prefix:.bold} [{wide_bar:.cyan/blue}] {pos:>3}% {msg}")
                .unwrap()
                .progress_chars("█▉▊▋▌▍▎▏  "),
        );
        bar.set_prefix(title.to_string());
        *self.bar.lock().unwrap() = Some(bar);
    }

    fn update(&self, percent: u8, lines: &[&str]) {
        match &*self.bar.lock().unwrap() {
            Some(bar) => {
                bar.set_position(u64::from(percent));
                bar.set_message(lines.join(" · "));
            }
            None => tracing::info!(percent, message = %lines.join(" · "), "sync progress"),
        }
    }

    fn is_canceled(&self) -> bool {
        // Cancellation comes in through the context's cancel flag (Ctrl-C).
        false
    }

    fn close(&self) {
        if let Some(bar) = self.bar.lock().unwrap().take() {
            bar.finish_and_clear();
        }
    }
}

pub struct TermNotifier;

impl Notifier for TermNotifier {
    fn notify(&self, title: &str, message: &str) {
        println!("{} {}", title.bold(), message);
    }
}

pub fn is_interactive() -> bool {
    std::io::stdout().is_terminal() && std::io::stderr().is_terminal()
}
