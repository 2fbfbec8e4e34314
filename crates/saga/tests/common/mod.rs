//! Shared fixtures for saga integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, Once};

use saga::StepOperation;

static TRACING: Once = Once::new();

/// Install a test-writer subscriber once per test binary.
///
/// Honors `RUST_LOG`; defaults to `saga=debug`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("saga=debug"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// Ordered record of operation invocations, shared between operations.
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entry: impl Into<String>) {
        if let Ok(mut entries) = self.0.lock() {
            entries.push(entry.into());
        }
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

/// Counts invocations and fails the first `fail_first` of them.
///
/// Use `u32::MAX` for an operation that never succeeds.
#[derive(Debug, Clone)]
pub struct Scripted {
    label: String,
    fail_first: u32,
    calls: Arc<AtomicU32>,
    journal: Journal,
}

impl Scripted {
    pub fn ok(label: &str, journal: &Journal) -> Self {
        Self::failing(label, 0, journal)
    }

    pub fn always_failing(label: &str, journal: &Journal) -> Self {
        Self::failing(label, u32::MAX, journal)
    }

    pub fn failing(label: &str, fail_first: u32, journal: &Journal) -> Self {
        Self {
            label: label.to_string(),
            fail_first,
            calls: Arc::new(AtomicU32::new(0)),
            journal: journal.clone(),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl StepOperation for Scripted {
    async fn invoke(&self) -> anyhow::Result<()> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        self.journal.record(self.label.clone());
        if n < self.fail_first {
            anyhow::bail!("{} failed on attempt {}", self.label, n + 1);
        }
        Ok(())
    }
}
