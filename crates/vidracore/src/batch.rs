//! Generic batch runner for bulk downloads.
//!
//! Items are partitioned into fixed-size cohorts. Jobs within a cohort run
//! concurrently on the current task; cohorts run strictly in sequence — a
//! later cohort never starts before every job of the previous one has
//! settled, success or failure. No OS threads are involved; fan-out is
//! purely cooperative via `join_all`.

use futures_util::future::join_all;
use std::future::Future;
use std::ops::Range;

/// "[3/12]"-style job label for progress lines.
pub fn job_label(index: usize, total: usize) -> String {
    format!("[{}/{}]", index + 1, total)
}

/// Run `run_job` over all items, `batch_size` at a time.
///
/// `on_batch_start` is awaited before each cohort with the cohort index
/// and the item index range it covers — the orchestrator announces the
/// range in the progress report there.
pub async fn run_batches<T, FB, FutB, FJ, FutJ>(items: Vec<T>, batch_size: usize, mut on_batch_start: FB, run_job: FJ)
where
    FB: FnMut(usize, Range<usize>) -> FutB,
    FutB: Future<Output = ()>,
    FJ: Fn(usize, T) -> FutJ,
    FutJ: Future<Output = ()>,
{
    let batch_size = batch_size.max(1);
    let mut iter = items.into_iter();
    let mut offset = 0usize;
    let mut batch_index = 0usize;

    loop {
        let batch: Vec<T> = iter.by_ref().take(batch_size).collect();
        if batch.is_empty() {
            break;
        }
        let range = offset..offset + batch.len();
        on_batch_start(batch_index, range.clone()).await;

        let jobs = batch
            .into_iter()
            .enumerate()
            .map(|(k, item)| run_job(offset + k, item));
        join_all(jobs).await;

        offset = range.end;
        batch_index += 1;
    }
}
