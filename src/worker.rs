//! DNS workers: pull items, check them, push the results.

use crate::{
    core::{CheckedItem, WorkItem},
    validation::Checker,
};
use async_channel::{Receiver, Sender};
use std::sync::Arc;
use tracing::{debug, error, trace, warn};

pub type WorkerId = usize;

/// Sends the worker's completion signal when dropped.
///
/// Held for the whole life of a worker so that the signal goes out exactly
/// once on every exit path, including a panic unwinding through the loop.
struct CompletionGuard {
    worker_id: WorkerId,
    done_tx: Sender<WorkerId>,
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        // The completion queue is unbounded, so this only fails once the
        // collector has gone away.
        if self.done_tx.try_send(self.worker_id).is_err() {
            warn!(
                worker_id = self.worker_id,
                "Completion queue closed before worker finished"
            );
        }
    }
}

/// Runs one worker until the input queue is closed and drained.
///
/// Each result is sent before the completion signal, so a collector that has
/// seen every completion has also had every result made available to it.
pub async fn run_worker(
    worker_id: WorkerId,
    checker: Arc<Checker>,
    work_rx: Receiver<WorkItem>,
    results_tx: Sender<CheckedItem>,
    done_tx: Sender<WorkerId>,
) {
    let _completion = CompletionGuard { worker_id, done_tx };
    trace!("DNS worker {} started.", worker_id);

    let mut processed = 0usize;
    while let Ok(item) = work_rx.recv().await {
        trace!(worker_id, domain = %item.domain, "Worker picked up item");
        let checked = checker.check(item).await;
        if let Err(e) = results_tx.send(checked).await {
            error!(
                worker_id,
                domain = %e.into_inner().item.domain,
                "Result queue closed, worker shutting down"
            );
            break;
        }
        processed += 1;
    }

    debug!(worker_id, processed, "Work queue drained, worker finished");
}
