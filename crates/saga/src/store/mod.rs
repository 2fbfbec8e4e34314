//! Idempotency store capability.
//!
//! The orchestrator records a completion marker for every step it finishes
//! and consults the store before running a step, so a saga driven again
//! after a crash or a retried request resumes instead of repeating work.

mod memory;

use async_trait::async_trait;

pub use memory::MemoryIdempotencyStore;

/// Records which idempotency keys have completed.
///
/// Implementations must be safe to share between sagas running on different
/// tasks. Neither method reports errors: a backend that cannot answer
/// `is_completed` must answer `false`, so that an outage causes a step to run
/// again rather than be skipped silently. Forward operations therefore have to
/// tolerate being re-run.
#[async_trait]
pub trait IdempotencyStore: Send + Sync {
    /// Record that the step identified by `key` completed.
    ///
    /// Must return within the backend's own timeout.
    async fn mark_completed(&self, key: &str);

    /// Check whether `key` was recorded as completed.
    async fn is_completed(&self, key: &str) -> bool;
}
