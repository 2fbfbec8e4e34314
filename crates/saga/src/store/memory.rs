//! In-memory implementation of [`IdempotencyStore`].

use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::IdempotencyStore;

/// In-process idempotency store.
///
/// Markers are visible to every saga sharing the store as soon as
/// `mark_completed` returns. Nothing survives a restart; use a persistent
/// backend to resume across processes.
#[derive(Debug, Default)]
pub struct MemoryIdempotencyStore {
    completed: RwLock<HashSet<String>>,
}

impl MemoryIdempotencyStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded keys.
    pub async fn len(&self) -> usize {
        self.completed.read().await.len()
    }

    /// Whether no key has been recorded.
    pub async fn is_empty(&self) -> bool {
        self.completed.read().await.is_empty()
    }

    /// Forget every recorded key.
    pub async fn clear(&self) {
        self.completed.write().await.clear();
    }
}

#[async_trait]
impl IdempotencyStore for MemoryIdempotencyStore {
    async fn mark_completed(&self, key: &str) {
        self.completed.write().await.insert(key.to_string());
    }

    async fn is_completed(&self, key: &str) -> bool {
        self.completed.read().await.contains(key)
    }
}
