//! Replay of queued operations against the remote store.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;

use crate::connectivity::Connectivity;
use crate::queue::{FailureDisposition, OperationQueue};
use crate::remote::RemoteStore;
use crate::types::SyncReport;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("a replay pass is already in progress")]
    ReplayInProgress,
}

/// Drives replay passes over the queue.
///
/// A pass walks the pending operations oldest first. Each delivered
/// operation is durably removed before the next is attempted, so a crash
/// mid-pass re-delivers at most one operation. The first failure ends the
/// pass with everything from the failed operation onward still queued, in
/// order; the exception is an operation that exhausts its retry budget,
/// which moves to the dead-letter list and lets the pass continue.
pub struct SyncEngine {
    queue: Arc<OperationQueue>,
    connectivity: Arc<Connectivity>,
    in_flight: AtomicBool,
}

impl SyncEngine {
    pub fn new(queue: Arc<OperationQueue>, connectivity: Arc<Connectivity>) -> Self {
        Self {
            queue,
            connectivity,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Run one replay pass. A pass already in flight refuses the new one.
    pub async fn replay_all(&self, remote: &dyn RemoteStore) -> Result<SyncReport, SyncError> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            return Err(SyncError::ReplayInProgress);
        }

        let report = self.replay_pass(remote).await;
        self.in_flight.store(false, Ordering::SeqCst);
        Ok(report)
    }

    /// Network came back: mark online and run one replay pass.
    pub async fn handle_online(&self, remote: &dyn RemoteStore) -> Result<SyncReport, SyncError> {
        self.connectivity.set_online();
        self.replay_all(remote).await
    }

    /// Network went away: mark offline. Queued operations wait for the next
    /// online signal.
    pub fn handle_offline(&self) {
        self.connectivity.set_offline();
    }

    async fn replay_pass(&self, remote: &dyn RemoteStore) -> SyncReport {
        let mut report = SyncReport::default();

        let pending = self.queue.list_pending().await;
        if pending.is_empty() {
            return report;
        }

        tracing::info!("replaying {} pending operation(s)", pending.len());

        for op in pending {
            match remote.apply(&op).await {
                Ok(()) => {
                    if let Err(err) = self.queue.mark_success(op.id).await {
                        tracing::error!(
                            "delivered operation {} but failed to remove it, stopping pass: {err:?}",
                            op.id
                        );
                        report.succeeded += 1;
                        break;
                    }
                    report.succeeded += 1;
                }
                Err(err) => {
                    tracing::warn!("replay of operation {} failed: {err}", op.id);
                    report.failed += 1;

                    match self.queue.mark_failure(op.id).await {
                        FailureDisposition::DeadLettered => {
                            report.dead_lettered += 1;
                        }
                        FailureDisposition::Retained => break,
                    }
                }
            }
        }

        tracing::info!(
            "replay pass finished: {} succeeded, {} failed, {} dead-lettered",
            report.succeeded,
            report.failed,
            report.dead_lettered
        );

        report
    }
}
