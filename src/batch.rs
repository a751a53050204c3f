//! Batch orchestration.
//!
//! Fans the single-record pipeline out over many records with a bounded
//! worker pool and fans the results back in. Output order always equals
//! input order: results land in index-addressed slots, never append order.
//! A record that panics or outlives the batch deadline yields a `Failed`
//! or `TimedOut` result instead of taking the batch down.

use crate::models::{MatchResult, SoundtrackRecord};
use crate::pipeline::Linker;
use indicatif::ProgressBar;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Run the pipeline over `records`, preserving input order in the output.
///
/// `progress`, when given, is ticked once per completed record.
pub async fn run_batch(
    linker: Arc<Linker>,
    records: Vec<SoundtrackRecord>,
    progress: Option<ProgressBar>,
) -> Vec<MatchResult> {
    let workers = linker.settings().workers;
    let deadline = linker.settings().batch_timeout;

    info!(
        record_count = records.len(),
        workers,
        ?deadline,
        "starting batch run"
    );

    let semaphore = Arc::new(Semaphore::new(workers));
    let cancel = CancellationToken::new();

    let deadline_timer = deadline.map(|deadline| {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(deadline).await;
            cancel.cancel();
        })
    });

    let mut handles = Vec::with_capacity(records.len());
    for record in &records {
        let record = record.clone();
        let linker = linker.clone();
        let semaphore = semaphore.clone();
        let cancel = cancel.clone();
        let progress = progress.clone();

        handles.push(tokio::spawn(async move {
            let result = tokio::select! {
                _ = cancel.cancelled() => MatchResult::timed_out(record),
                result = async {
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .expect("worker semaphore closed");
                    linker.find_match(&record).await
                } => result,
            };
            if let Some(progress) = &progress {
                progress.inc(1);
            }
            result
        }));
    }

    // Results land in the slot matching their input index; completion
    // order is irrelevant.
    let mut results: Vec<MatchResult> = Vec::with_capacity(records.len());
    for (index, handle) in handles.into_iter().enumerate() {
        match handle.await {
            Ok(result) => results.push(result),
            Err(e) => {
                error!(index, error = %e, "record pipeline panicked");
                results.push(MatchResult::failed(records[index].clone(), Vec::new()));
            }
        }
    }

    // The timer would otherwise keep sleeping out the full deadline.
    if let Some(timer) = deadline_timer {
        timer.abort();
    }

    let resolved = results.iter().filter(|r| r.is_resolved()).count();
    info!(
        record_count = results.len(),
        resolved,
        quota_units_used = linker.quota().used(),
        "batch run complete"
    );

    results
}
