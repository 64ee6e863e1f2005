//! Fixed-size worker pool over an ordered work list.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::future::join_all;

/// Run `handler` over every item with at most `concurrency` calls in flight.
///
/// `concurrency` workers share one cursor; each claims the next unclaimed
/// index, awaits the handler and claims again until the list is exhausted.
/// The returned vector is index-aligned with `items` whatever the completion
/// order. A `concurrency` of zero is treated as one; a limit above the item
/// count spawns one worker per item.
///
/// Workers are polled cooperatively on the caller's task, so nothing here
/// needs to be `Send` or `'static`.
pub async fn run_with_concurrency<'a, T, R, F, Fut>(
    items: &'a [T],
    concurrency: usize,
    handler: F,
) -> Vec<R>
where
    F: Fn(&'a T, usize) -> Fut,
    Fut: Future<Output = R>,
{
    if items.is_empty() {
        return Vec::new();
    }
    let worker_count = concurrency.clamp(1, items.len());

    let cursor = AtomicUsize::new(0);
    let cursor = &cursor;
    let handler = &handler;

    let workers = (0..worker_count).map(move |_| async move {
        let mut finished = Vec::new();
        loop {
            // Claim-and-advance is a single step; no await between read and increment.
            let index = cursor.fetch_add(1, Ordering::SeqCst);
            let Some(item) = items.get(index) else {
                break;
            };
            finished.push((index, handler(item, index).await));
        }
        finished
    });

    let mut slots: Vec<Option<R>> = std::iter::repeat_with(|| None).take(items.len()).collect();
    for (index, result) in join_all(workers).await.into_iter().flatten() {
        slots[index] = Some(result);
    }
    slots.into_iter().flatten().collect()
}
