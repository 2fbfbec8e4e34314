//! Idempotency key derivation.

/// Build the idempotency key of the step at `index` (0-based).
///
/// The key is a pure function of the saga name, the step name and the
/// step's 1-based position, so two steps of one saga never share a key even
/// when their names repeat.
pub fn idempotency_key(saga: &str, step: &str, index: usize) -> String {
    format!("{saga}-action-{step}-{}", index.saturating_add(1))
}
