//! `presupro-offline`
//!
//! **Responsibility:** Offline-first persistence and sync.
//!
//! This crate provides:
//! - A durable FIFO queue of pending remote writes over a key-value store
//! - Replay of the queue against a remote store when connectivity returns
//! - A best-effort read cache and a connectivity tracker
//! - The `presupro-sync` maintenance binary
//!
//! All domain decisions stay in the domain crates; this crate only moves
//! already-validated records.

pub mod cache;
pub mod connectivity;
pub mod queue;
pub mod remote;
pub mod store;
pub mod sync;
pub mod types;
pub mod writer;

pub use cache::{CACHE_KEY, OfflineCache};
pub use connectivity::Connectivity;
pub use queue::{DEAD_LETTER_KEY, OperationQueue, QUEUE_KEY};
pub use remote::{HttpRemote, MemoryRemote, RemoteError, RemoteStore};
pub use store::{KvStore, MemoryStore, SqliteStore, default_db_path};
pub use sync::{SyncEngine, SyncError};
pub use types::{
    ConnectivityState, OpKind, OperationId, QueuedOperation, RetryPolicy, SyncReport,
};
pub use writer::{OfflineWriter, WriteOutcome};
