use std::future::Future;

use anyhow::Result;
use tracing::{debug, error};

use crate::context::SyncContext;

/// Progress budget `[from, to]` assigned to one phase by the orchestrator.
#[derive(Debug, Clone, Copy)]
pub struct PercentSpan {
    pub from: u8,
    pub to: u8,
}

impl PercentSpan {
    pub fn new(from: u8, to: u8) -> Self {
        Self { from, to }
    }

    /// Progress after finishing chunk `done` of `total` (1-based):
    /// `from + (done/total) * (to - from)`, truncated.
    pub fn at(&self, done: usize, total: usize) -> u8 {
        if total == 0 {
            return self.to;
        }
        let fraction = done as f32 / total as f32;
        self.from + (fraction * f32::from(self.to.saturating_sub(self.from))) as u8
    }
}

/// Dispatches `items` in consecutive chunks of at most `chunk_size`,
/// reporting progress and checking cancellation between chunks.
///
/// A failing chunk is logged and counted but never blocks the chunks after
/// it. Cancellation stops dispatch immediately; the error count accumulated
/// so far is returned either way.
pub async fn for_each_chunk<T, F, Fut>(
    ctx: &SyncContext,
    items: Vec<T>,
    chunk_size: usize,
    span: PercentSpan,
    label: &str,
    mut on_chunk: F,
) -> usize
where
    T: Clone,
    F: FnMut(Vec<T>) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let total = items.len();
    if total == 0 {
        return 0;
    }
    let chunks: Vec<Vec<T>> = items.chunks(chunk_size).map(<[T]>::to_vec).collect();
    let count = chunks.len();

    let mut errors = 0;
    for (index, chunk) in chunks.into_iter().enumerate() {
        if ctx.is_canceled() {
            debug!(
                dispatched = index,
                total = count,
                "cancellation observed between chunks"
            );
            return errors;
        }
        let done = index + 1;
        let covered = (done * chunk_size).min(total);
        ctx.report(
            span.at(done, count),
            &[label, &format!("{} of {}", covered, total)],
        );
        if let Err(err) = on_chunk(chunk).await {
            error!(chunk = done, of = count, error = %err, "chunk dispatch failed");
            errors += 1;
        }
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ProgressSurface, SyncContext, SyncToggles};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct RecordingSurface {
        updates: Mutex<Vec<u8>>,
        canceled: AtomicBool,
    }

    impl ProgressSurface for RecordingSurface {
        fn open(&self, _title: &str) {}
        fn update(&self, percent: u8, _lines: &[&str]) {
            self.updates.lock().unwrap().push(percent);
        }
        fn is_canceled(&self) -> bool {
            self.canceled.load(Ordering::Relaxed)
        }
        fn close(&self) {}
    }

    fn ctx() -> SyncContext {
        SyncContext::new(SyncToggles::default())
    }

    #[test]
    fn test_span_arithmetic_matches_the_budget() {
        let span = PercentSpan::new(59, 69);
        assert_eq!(span.at(1, 2), 64);
        assert_eq!(span.at(2, 2), 69);
        assert_eq!(span.at(1, 1), 69);
        assert_eq!(PercentSpan::new(92, 99).at(1, 3), 94);
    }

    #[tokio::test]
    async fn test_chunks_cover_all_items_in_order() {
        let ctx = ctx();
        let seen: Mutex<Vec<Vec<u32>>> = Mutex::new(Vec::new());
        let items: Vec<u32> = (0..10).collect();

        let errors = for_each_chunk(&ctx, items, 3, PercentSpan::new(0, 100), "batch", |chunk| {
            let seen = &seen;
            async move {
                seen.lock().unwrap().push(chunk);
                Ok(())
            }
        })
        .await;

        assert_eq!(errors, 0);
        let seen = seen.into_inner().unwrap();
        assert_eq!(seen.len(), 4);
        assert!(seen.iter().all(|c| c.len() <= 3));
        let flat: Vec<u32> = seen.into_iter().flatten().collect();
        assert_eq!(flat, (0..10).collect::<Vec<u32>>());
    }

    #[tokio::test]
    async fn test_single_undersized_chunk_jumps_to_the_end_of_the_budget() {
        let surface = Arc::new(RecordingSurface::default());
        let ctx = SyncContext::new(SyncToggles::default()).with_progress(surface.clone());
        let items: Vec<u32> = (0..120).collect();

        let dispatched = Mutex::new(0usize);
        for_each_chunk(&ctx, items, 200, PercentSpan::new(59, 69), "batch", |chunk| {
            let dispatched = &dispatched;
            async move {
                *dispatched.lock().unwrap() += chunk.len();
                Ok(())
            }
        })
        .await;

        assert_eq!(*dispatched.lock().unwrap(), 120);
        assert_eq!(*surface.updates.lock().unwrap(), vec![69]);
    }

    #[tokio::test]
    async fn test_cancellation_stops_remaining_chunks() {
        let ctx = ctx();
        let calls = Mutex::new(0usize);
        let items: Vec<u32> = (0..9).collect();

        let errors = for_each_chunk(&ctx, items, 3, PercentSpan::new(0, 100), "batch", |_chunk| {
            let calls = &calls;
            let ctx = &ctx;
            async move {
                *calls.lock().unwrap() += 1;
                ctx.request_cancel();
                anyhow::bail!("write failed")
            }
        })
        .await;

        // Chunk 1 ran and errored; chunks 2 and 3 were never dispatched.
        assert_eq!(*calls.lock().unwrap(), 1);
        assert_eq!(errors, 1);
    }

    #[tokio::test]
    async fn test_failed_chunks_do_not_block_the_rest() {
        let ctx = ctx();
        let calls = Mutex::new(0usize);
        let items: Vec<u32> = (0..6).collect();

        let errors = for_each_chunk(&ctx, items, 2, PercentSpan::new(0, 100), "batch", |chunk| {
            let calls = &calls;
            async move {
                *calls.lock().unwrap() += 1;
                if chunk[0] == 2 {
                    anyhow::bail!("write failed")
                }
                Ok(())
            }
        })
        .await;

        assert_eq!(*calls.lock().unwrap(), 3);
        assert_eq!(errors, 1);
    }
}
