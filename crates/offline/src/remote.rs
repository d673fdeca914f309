//! Remote-store capability: where queued writes are delivered.
//!
//! `HttpRemote` speaks to the hosted backend over PostgREST-style REST.
//! `MemoryRemote` is the test double, recording applied operations in order
//! and allowing failure injection.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::types::{OpKind, OperationId, QueuedOperation};

#[derive(Debug, Error)]
pub enum RemoteError {
    /// Transport failure; the remote was not reached.
    #[error("network error: {0}")]
    Network(String),
    /// The remote answered with a server-side error.
    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },
    /// The remote refused the operation itself (4xx-style). Not retryable.
    #[error("operation rejected: {0}")]
    Rejected(String),
}

/// Destination of queued writes.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn apply(&self, op: &QueuedOperation) -> Result<(), RemoteError>;
}

/// Hosted backend speaking PostgREST-style REST.
///
/// Insert maps to `POST /{target}`, update to `PATCH /{target}?id=eq.{id}`
/// with `id` stripped from the body, delete to `DELETE /{target}?id=eq.{id}`.
pub struct HttpRemote {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    token: Option<String>,
}

impl HttpRemote {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            token: None,
        }
    }

    pub fn with_token(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            token: Some(token.into()),
            ..Self::new(base_url, api_key)
        }
    }

    fn target_url(&self, target: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), target)
    }

    fn decorate(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let req = req
            .header("apikey", &self.api_key)
            .header("Prefer", "return=minimal");
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }
}

#[async_trait]
impl RemoteStore for HttpRemote {
    async fn apply(&self, op: &QueuedOperation) -> Result<(), RemoteError> {
        let url = self.target_url(&op.target);

        let req = match op.kind {
            OpKind::Insert => self.client.post(&url).json(&op.payload),
            OpKind::Update => {
                let (id, body) = split_update_payload(&op.payload)?;
                self.client
                    .patch(&url)
                    .query(&[("id", format!("eq.{id}"))])
                    .json(&body)
            }
            OpKind::Delete => {
                let id = payload_id(&op.payload)?;
                self.client
                    .delete(&url)
                    .query(&[("id", format!("eq.{id}"))])
            }
        };

        let resp = self
            .decorate(req)
            .send()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }

        let body = resp.text().await.unwrap_or_default();
        if status.is_client_error() {
            Err(RemoteError::Rejected(format!("{}: {}", status.as_u16(), body)))
        } else {
            Err(RemoteError::Api {
                status: status.as_u16(),
                body,
            })
        }
    }
}

/// Extract the record id an update/delete addresses.
fn payload_id(payload: &Value) -> Result<String, RemoteError> {
    let id = payload
        .get("id")
        .ok_or_else(|| RemoteError::Rejected("payload missing id".to_string()))?;
    match id {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(RemoteError::Rejected(
            "payload id must be a string or number".to_string(),
        )),
    }
}

/// Split an update payload into the addressed id and the patch body.
fn split_update_payload(payload: &Value) -> Result<(String, Value), RemoteError> {
    let obj = payload
        .as_object()
        .ok_or_else(|| RemoteError::Rejected("update payload must be an object".to_string()))?;
    let id = payload_id(payload)?;

    let mut body = obj.clone();
    body.remove("id");
    Ok((id, Value::Object(body)))
}

/// In-memory remote for tests: records applied operations in order.
#[derive(Debug, Default)]
pub struct MemoryRemote {
    applied: Mutex<Vec<QueuedOperation>>,
    failing: Mutex<HashSet<OperationId>>,
    fail_all: AtomicBool,
    reject_all: AtomicBool,
    delay: Option<Duration>,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remote that sleeps before every apply, for overlap tests.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    /// Inject a network failure for one specific operation.
    pub async fn fail_operation(&self, id: OperationId) {
        self.failing.lock().await.insert(id);
    }

    pub async fn clear_failure(&self, id: OperationId) {
        self.failing.lock().await.remove(&id);
    }

    /// Every apply fails with a network error.
    pub fn fail_everything(&self) {
        self.fail_all.store(true, Ordering::SeqCst);
    }

    /// Every apply is rejected (semantic refusal, not retryable).
    pub fn reject_everything(&self) {
        self.reject_all.store(true, Ordering::SeqCst);
    }

    pub fn restore(&self) {
        self.fail_all.store(false, Ordering::SeqCst);
        self.reject_all.store(false, Ordering::SeqCst);
    }

    /// Operations applied so far, in delivery order.
    pub async fn applied(&self) -> Vec<QueuedOperation> {
        self.applied.lock().await.clone()
    }
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    async fn apply(&self, op: &QueuedOperation) -> Result<(), RemoteError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_all.load(Ordering::SeqCst) {
            return Err(RemoteError::Network("injected network failure".to_string()));
        }
        if self.reject_all.load(Ordering::SeqCst) {
            return Err(RemoteError::Rejected("injected rejection".to_string()));
        }
        if self.failing.lock().await.contains(&op.id) {
            return Err(RemoteError::Network("injected network failure".to_string()));
        }

        self.applied.lock().await.push(op.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn update_payload_splits_id_from_body() {
        let payload = json!({"id": "q1", "title": "Nuevo", "tax_percent": 2100});
        let (id, body) = split_update_payload(&payload).unwrap();
        assert_eq!(id, "q1");
        assert_eq!(body, json!({"title": "Nuevo", "tax_percent": 2100}));
    }

    #[test]
    fn payload_without_id_is_rejected() {
        let err = payload_id(&json!({"name": "x"})).unwrap_err();
        assert!(matches!(err, RemoteError::Rejected(_)));
    }

    #[test]
    fn numeric_ids_are_accepted() {
        assert_eq!(payload_id(&json!({"id": 42})).unwrap(), "42");
    }

    #[tokio::test]
    async fn memory_remote_records_in_order_and_honors_injection() {
        let remote = MemoryRemote::new();
        let first = QueuedOperation::new(OpKind::Insert, "quotes", json!({"n": 1}));
        let second = QueuedOperation::new(OpKind::Insert, "quotes", json!({"n": 2}));

        remote.fail_operation(second.id).await;

        remote.apply(&first).await.unwrap();
        let err = remote.apply(&second).await.unwrap_err();
        assert!(matches!(err, RemoteError::Network(_)));

        remote.clear_failure(second.id).await;
        remote.apply(&second).await.unwrap();

        let applied = remote.applied().await;
        assert_eq!(applied.len(), 2);
        assert_eq!(applied[0].id, first.id);
        assert_eq!(applied[1].id, second.id);
    }
}
