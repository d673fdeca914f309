//! Offline-first write path.

use std::sync::Arc;

use serde_json::Value;

use crate::connectivity::Connectivity;
use crate::queue::OperationQueue;
use crate::remote::{RemoteError, RemoteStore};
use crate::types::{OpKind, OperationId, QueuedOperation};

/// Where a submitted write ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Delivered to the remote immediately.
    Applied,
    /// Parked in the queue for replay.
    Queued(OperationId),
}

/// Routes each write either straight to the remote or into the queue.
///
/// Online writes go to the remote; offline writes and writes interrupted by
/// a network failure are queued (a network failure also flips the tracker
/// offline). A semantic rejection is the caller's problem: it is returned
/// as-is and never queued, since replaying it verbatim cannot succeed.
pub struct OfflineWriter {
    queue: Arc<OperationQueue>,
    connectivity: Arc<Connectivity>,
}

impl OfflineWriter {
    pub fn new(queue: Arc<OperationQueue>, connectivity: Arc<Connectivity>) -> Self {
        Self {
            queue,
            connectivity,
        }
    }

    pub async fn submit(
        &self,
        remote: &dyn RemoteStore,
        kind: OpKind,
        target: &str,
        payload: Value,
    ) -> Result<WriteOutcome, RemoteError> {
        let op = QueuedOperation::new(kind, target, payload);

        if self.connectivity.is_offline() {
            let id = self.queue.enqueue_operation(op).await;
            return Ok(WriteOutcome::Queued(id));
        }

        match remote.apply(&op).await {
            Ok(()) => Ok(WriteOutcome::Applied),
            Err(RemoteError::Network(reason)) => {
                tracing::warn!("write to {target} hit a network failure, queuing: {reason}");
                self.connectivity.set_offline();
                let id = self.queue.enqueue_operation(op).await;
                Ok(WriteOutcome::Queued(id))
            }
            Err(err) => Err(err),
        }
    }
}
