//! Durable FIFO queue of pending remote writes.
//!
//! The whole queue is one JSON document under a single key, rewritten on
//! every mutation. Mutations are serialized behind a single-writer lock;
//! reads take a plain snapshot. Read or parse failures degrade to an empty
//! queue, and `enqueue` never raises: a failed write is retried once after
//! evicting the cache document to make room.

use std::sync::Arc;

use anyhow::Context;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::cache::CACHE_KEY;
use crate::store::KvStore;
use crate::types::{OpKind, OperationId, QueuedOperation, RetryPolicy};

/// Storage key of the pending-operation document.
pub const QUEUE_KEY: &str = "ppro_offline_queue";

/// Storage key of the dead-letter document.
pub const DEAD_LETTER_KEY: &str = "ppro_dead_letter";

/// What happened to a failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FailureDisposition {
    /// Still pending; will be retried on a later pass.
    Retained,
    /// Retry budget exhausted; moved to the dead-letter list.
    DeadLettered,
}

/// Durable operation queue over a [`KvStore`].
pub struct OperationQueue {
    store: Arc<dyn KvStore>,
    policy: RetryPolicy,
    write_lock: Mutex<()>,
}

impl OperationQueue {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self::with_policy(store, RetryPolicy::default())
    }

    pub fn with_policy(store: Arc<dyn KvStore>, policy: RetryPolicy) -> Self {
        Self {
            store,
            policy,
            write_lock: Mutex::new(()),
        }
    }

    /// Append a new operation; returns its assigned id.
    pub async fn enqueue(
        &self,
        kind: OpKind,
        target: impl Into<String>,
        payload: Value,
    ) -> OperationId {
        self.enqueue_operation(QueuedOperation::new(kind, target, payload))
            .await
    }

    /// Append an already-built operation (the write path constructs the
    /// operation before trying the remote, so a queued fallback keeps its id).
    pub async fn enqueue_operation(&self, op: QueuedOperation) -> OperationId {
        let _guard = self.write_lock.lock().await;

        let id = op.id;
        let mut ops = self.load(QUEUE_KEY).await;
        ops.push(op);

        if let Err(err) = self.save(QUEUE_KEY, &ops).await {
            tracing::warn!("queue write failed, evicting cache to make room: {err:?}");
            if let Err(err) = self.store.remove(CACHE_KEY).await {
                tracing::warn!("cache eviction failed: {err:?}");
            }
            if let Err(err) = self.save(QUEUE_KEY, &ops).await {
                tracing::error!("failed to enqueue operation {id} after cache eviction: {err:?}");
            }
        }

        id
    }

    /// Pending operations, oldest first.
    pub async fn list_pending(&self) -> Vec<QueuedOperation> {
        self.load(QUEUE_KEY).await
    }

    /// Operations retired after exhausting their retry budget.
    pub async fn dead_letters(&self) -> Vec<QueuedOperation> {
        self.load(DEAD_LETTER_KEY).await
    }

    /// Unconditionally empty the pending queue.
    pub async fn clear(&self) {
        let _guard = self.write_lock.lock().await;
        if let Err(err) = self.store.remove(QUEUE_KEY).await {
            tracing::error!("failed to clear queue: {err:?}");
        }
    }

    /// Drop the dead-letter list.
    pub async fn clear_dead_letters(&self) {
        let _guard = self.write_lock.lock().await;
        if let Err(err) = self.store.remove(DEAD_LETTER_KEY).await {
            tracing::error!("failed to clear dead letters: {err:?}");
        }
    }

    /// Durably remove a delivered operation. Replay stops if removal fails,
    /// so an operation is never re-run within the same pass.
    pub(crate) async fn mark_success(&self, id: OperationId) -> anyhow::Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut ops = self.load(QUEUE_KEY).await;
        let before = ops.len();
        ops.retain(|op| op.id != id);
        if ops.len() == before {
            tracing::warn!("operation {id} missing from queue during removal");
        }

        self.save(QUEUE_KEY, &ops).await
    }

    /// Record a failed delivery: bump the durable attempt counter and move
    /// the operation to the dead-letter list once the budget is exhausted.
    pub(crate) async fn mark_failure(&self, id: OperationId) -> FailureDisposition {
        let _guard = self.write_lock.lock().await;

        let mut ops = self.load(QUEUE_KEY).await;
        let Some(pos) = ops.iter().position(|op| op.id == id) else {
            tracing::warn!("operation {id} missing from queue during failure bookkeeping");
            return FailureDisposition::Retained;
        };

        ops[pos].attempts = ops[pos].attempts.saturating_add(1);

        if ops[pos].attempts >= self.policy.max_attempts {
            let dead = ops.remove(pos);
            tracing::warn!(
                "operation {} exhausted its retry budget after {} attempts, dead-lettering",
                dead.id,
                dead.attempts
            );

            let mut letters = self.load(DEAD_LETTER_KEY).await;
            letters.push(dead);
            if let Err(err) = self.save(DEAD_LETTER_KEY, &letters).await {
                tracing::error!("failed to persist dead-letter list: {err:?}");
            }
            if let Err(err) = self.save(QUEUE_KEY, &ops).await {
                tracing::error!("failed to persist queue after dead-lettering: {err:?}");
            }
            FailureDisposition::DeadLettered
        } else {
            if let Err(err) = self.save(QUEUE_KEY, &ops).await {
                tracing::warn!("failed to persist attempt counter for {id}: {err:?}");
            }
            FailureDisposition::Retained
        }
    }

    async fn load(&self, key: &str) -> Vec<QueuedOperation> {
        let raw = match self.store.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                tracing::warn!("failed to read {key:?}, treating as empty: {err:?}");
                return Vec::new();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(ops) => ops,
            Err(err) => {
                tracing::warn!("corrupt document under {key:?}, treating as empty: {err:?}");
                Vec::new()
            }
        }
    }

    async fn save(&self, key: &str, ops: &[QueuedOperation]) -> anyhow::Result<()> {
        let raw = serde_json::to_string(ops).context("failed to serialize queue document")?;
        self.store.set(key, &raw).await
    }
}
