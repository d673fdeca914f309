//! Shared types for the offline queue and sync machinery.
//!
//! These types are serialization-friendly and carry no storage or network
//! dependencies; the queue persists them as one JSON document per key.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Kind of a queued write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpKind {
    Insert,
    Update,
    Delete,
}

impl OpKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpKind::Insert => "insert",
            OpKind::Update => "update",
            OpKind::Delete => "delete",
        }
    }
}

/// Identifier of a queued operation (uuid v7, assigned at enqueue).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationId(pub Uuid);

impl OperationId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for OperationId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for OperationId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl core::str::FromStr for OperationId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// A write queued for replay against the remote store.
///
/// Payload shape by kind: full record for `insert`, partial record carrying
/// `id` for `update`, `{"id": ...}` for `delete`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedOperation {
    pub id: OperationId,
    pub kind: OpKind,
    /// Remote table name (`profiles`, `clients`, `quotes`, `quote_items`,
    /// `saved_items`).
    pub target: String,
    pub payload: Value,
    pub enqueued_at: DateTime<Utc>,
    /// Durable failure counter; drives the dead-letter policy.
    #[serde(default)]
    pub attempts: u32,
}

impl QueuedOperation {
    pub fn new(kind: OpKind, target: impl Into<String>, payload: Value) -> Self {
        Self {
            id: OperationId::new(),
            kind,
            target: target.into(),
            payload,
            enqueued_at: Utc::now(),
            attempts: 0,
        }
    }
}

/// Outcome of one replay pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub succeeded: usize,
    pub failed: usize,
    pub dead_lettered: usize,
}

/// Retry budget for queued operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Failures allowed before an operation is moved to the dead-letter list.
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 8 }
    }
}

/// Connectivity state of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectivityState {
    /// Online and reachable remote.
    Online,
    /// Offline (network unreachable or remote unavailable).
    Offline,
}
