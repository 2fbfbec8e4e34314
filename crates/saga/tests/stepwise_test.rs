//! Integration tests for stepwise driving with `Saga::next` and `Saga::prev`.

#![allow(clippy::unwrap_used)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{Journal, Scripted, init_tracing};
use saga::{Error, IdempotencyStore, MemoryIdempotencyStore, Saga, SagaConfig, StepStatus, noop};

fn three_step_saga(name: &str, journal: &Journal) -> Saga {
    let mut saga =
        Saga::in_memory(name).with_config(SagaConfig::new(3, Duration::from_millis(1)).unwrap());
    for label in ["one", "two", "three"] {
        saga.add_step(
            label,
            Scripted::ok(label, journal),
            Scripted::ok(&format!("undo-{label}"), journal),
        )
        .unwrap();
    }
    saga
}

// =============================================================================
// Forward
// =============================================================================

#[tokio::test]
async fn test_next_runs_one_step_at_a_time() {
    init_tracing();
    let journal = Journal::new();
    let mut saga = three_step_saga("walk", &journal);

    saga.next().await.unwrap();
    assert_eq!(saga.cursor(), 1);
    assert_eq!(
        saga.statuses(),
        vec![
            StepStatus::Completed,
            StepStatus::Pending,
            StepStatus::Pending
        ]
    );

    saga.next().await.unwrap();
    saga.next().await.unwrap();
    assert!(saga.is_finished());
    assert_eq!(journal.entries(), vec!["one", "two", "three"]);
}

#[tokio::test]
async fn test_next_at_end_is_rejected() {
    init_tracing();
    let journal = Journal::new();
    let mut saga = three_step_saga("end", &journal);
    for _ in 0..3 {
        saga.next().await.unwrap();
    }

    let err = saga.next().await.unwrap_err();
    assert!(matches!(err, Error::NoMoreSteps { .. }));
    assert!(err.is_protocol_error());
    assert_eq!(saga.cursor(), 3);
}

#[tokio::test]
async fn test_next_on_empty_saga() {
    let mut saga = Saga::in_memory("empty");
    assert!(matches!(
        saga.next().await,
        Err(Error::NoMoreSteps { .. })
    ));
    assert_eq!(saga.cursor(), 0);
}

#[tokio::test]
async fn test_next_retries_before_giving_up() {
    init_tracing();
    let journal = Journal::new();
    let flaky = Scripted::failing("flaky", 2, &journal);
    let mut saga =
        Saga::in_memory("retries").with_config(SagaConfig::new(3, Duration::ZERO).unwrap());
    saga.add_step("setup", noop(), noop())
        .unwrap()
        .add_step("flaky", flaky.clone(), noop())
        .unwrap();

    saga.next().await.unwrap();
    saga.next().await.unwrap();
    assert_eq!(flaky.calls(), 3);
    assert_eq!(saga.cursor(), 2);
}

#[tokio::test]
async fn test_next_failure_rolls_back_and_keeps_cursor() {
    init_tracing();
    let journal = Journal::new();
    let mut saga =
        Saga::in_memory("fail").with_config(SagaConfig::new(2, Duration::ZERO).unwrap());
    saga.add_step("one", noop(), Scripted::ok("undo-one", &journal))
        .unwrap()
        .add_step("two", noop(), Scripted::ok("undo-two", &journal))
        .unwrap()
        .add_step("three", Scripted::always_failing("three", &journal), noop())
        .unwrap();

    saga.next().await.unwrap();
    saga.next().await.unwrap();
    let err = saga.next().await.unwrap_err();

    assert!(matches!(err, Error::StepFailed { attempts: 2, .. }));
    assert_eq!(saga.cursor(), 2);
    assert_eq!(
        saga.statuses(),
        vec![
            StepStatus::Compensated,
            StepStatus::Compensated,
            StepStatus::Failed
        ]
    );
    assert_eq!(
        journal.entries(),
        vec!["three", "three", "undo-two", "undo-one"]
    );
}

#[tokio::test]
async fn test_next_skips_completed_keys() {
    init_tracing();
    let store: Arc<dyn IdempotencyStore> = Arc::new(MemoryIdempotencyStore::new());
    store.mark_completed("skip-action-one-1").await;
    store.mark_completed("skip-action-two-2").await;

    let journal = Journal::new();
    let three = Scripted::ok("three", &journal);
    let mut saga = Saga::new("skip", store);
    saga.add_step("one", Scripted::ok("one", &journal), noop())
        .unwrap()
        .add_step("two", Scripted::ok("two", &journal), noop())
        .unwrap()
        .add_step("three", three.clone(), noop())
        .unwrap();

    saga.next().await.unwrap();
    assert_eq!(saga.cursor(), 3);
    assert_eq!(three.calls(), 1);
    assert_eq!(journal.entries(), vec!["three"]);
}

#[tokio::test]
async fn test_next_skipping_to_end_reports_no_more_steps() {
    init_tracing();
    let store: Arc<dyn IdempotencyStore> = Arc::new(MemoryIdempotencyStore::new());
    store.mark_completed("done-action-only-1").await;

    let mut saga = Saga::new("done", store);
    saga.add_step("only", noop(), noop()).unwrap();

    assert!(matches!(
        saga.next().await,
        Err(Error::NoMoreSteps { .. })
    ));
    assert_eq!(saga.cursor(), 1);
}

// =============================================================================
// Backward
// =============================================================================

#[tokio::test]
async fn test_prev_undoes_last_next() {
    init_tracing();
    let journal = Journal::new();
    let mut saga = three_step_saga("symmetry", &journal);

    saga.next().await.unwrap();
    saga.next().await.unwrap();
    saga.prev().await.unwrap();

    assert_eq!(saga.cursor(), 1);
    assert_eq!(
        saga.statuses(),
        vec![
            StepStatus::Completed,
            StepStatus::Compensated,
            StepStatus::Pending
        ]
    );
    assert_eq!(journal.entries(), vec!["one", "two", "undo-two"]);
}

#[tokio::test]
async fn test_prev_at_start_is_rejected() {
    init_tracing();
    let journal = Journal::new();
    let mut saga = three_step_saga("start", &journal);

    let err = saga.prev().await.unwrap_err();
    assert!(matches!(err, Error::NoPreviousStep { .. }));
    assert_eq!(saga.cursor(), 0);
    assert!(journal.entries().is_empty());
}

#[tokio::test]
async fn test_prev_walks_back_to_start() {
    init_tracing();
    let journal = Journal::new();
    let mut saga = three_step_saga("unwind", &journal);
    for _ in 0..3 {
        saga.next().await.unwrap();
    }
    for _ in 0..3 {
        saga.prev().await.unwrap();
    }

    assert_eq!(saga.cursor(), 0);
    assert_eq!(saga.statuses(), vec![StepStatus::Compensated; 3]);
    assert_eq!(
        journal.entries(),
        vec!["one", "two", "three", "undo-three", "undo-two", "undo-one"]
    );
    assert!(saga.prev().await.is_err());
}

#[tokio::test]
async fn test_prev_over_uncompleted_step_is_silent() {
    init_tracing();
    let store: Arc<dyn IdempotencyStore> = Arc::new(MemoryIdempotencyStore::new());
    store.mark_completed("silent-action-one-1").await;

    let journal = Journal::new();
    let mut saga = Saga::new("silent", store);
    saga.add_step("one", noop(), Scripted::ok("undo-one", &journal))
        .unwrap()
        .add_step("two", noop(), noop())
        .unwrap();

    // "one" was skipped, so it is still Pending locally.
    saga.next().await.unwrap();
    saga.prev().await.unwrap();
    saga.prev().await.unwrap();

    assert_eq!(saga.cursor(), 0);
    assert_eq!(saga.statuses()[0], StepStatus::Pending);
    assert!(journal.entries().is_empty());
}

#[tokio::test]
async fn test_prev_compensation_failure_is_reported() {
    init_tracing();
    let journal = Journal::new();
    let mut saga = Saga::in_memory("stuck");
    saga.add_step("hold", noop(), Scripted::always_failing("release", &journal))
        .unwrap();

    saga.next().await.unwrap();
    let err = saga.prev().await.unwrap_err();

    assert!(matches!(err, Error::CompensationFailed { ref step, .. } if step == "hold"));
    assert_eq!(saga.cursor(), 0);
    assert_eq!(saga.statuses(), vec![StepStatus::Compensating]);
    assert_eq!(saga.compensation_failures().len(), 1);
}

#[tokio::test]
async fn test_add_step_rejected_after_next_skips_to_end() {
    init_tracing();
    let store: Arc<dyn IdempotencyStore> = Arc::new(MemoryIdempotencyStore::new());
    store.mark_completed("sealed-action-a-1").await;

    let mut saga = Saga::new("sealed", store);
    saga.add_step("a", noop(), noop()).unwrap();

    assert!(matches!(
        saga.next().await,
        Err(Error::NoMoreSteps { .. })
    ));
    assert!(matches!(
        saga.add_step("b", noop(), noop()),
        Err(Error::AlreadyStarted { .. })
    ));
    assert_eq!(saga.len(), 1);
}

#[tokio::test]
async fn test_add_step_rejected_after_next() {
    let mut saga = Saga::in_memory("frozen");
    saga.add_step("a", noop(), noop()).unwrap();
    saga.next().await.unwrap();

    assert!(matches!(
        saga.add_step("b", noop(), noop()),
        Err(Error::AlreadyStarted { .. })
    ));
}
