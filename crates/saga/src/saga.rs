//! Saga orchestrator.

use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span, warn};
use ulid::Ulid;

use crate::config::SagaConfig;
use crate::error::{Error, Result};
use crate::key::idempotency_key;
use crate::operation::StepOperation;
use crate::retry::{RetryOutcome, run_with_retry};
use crate::status::{StatusHandle, StepStatus};
use crate::step::SagaStep;
use crate::store::{IdempotencyStore, MemoryIdempotencyStore};

/// A compensation that failed during rollback or `prev`.
///
/// The step stays in `Compensating` and needs operator attention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompensationFailure {
    /// Name of the step whose compensation failed.
    pub step: String,
    /// Position of the step in the saga.
    pub index: usize,
    /// Rendered error chain of the failed compensation.
    pub error: String,
}

/// An ordered sequence of steps executed with retry and unwound on failure.
///
/// A saga is driven by one owner at a time; every driving method takes
/// `&mut self`. Step statuses can still be observed concurrently through
/// [`Saga::status_handle`].
pub struct Saga {
    name: String,
    steps: Vec<SagaStep>,
    config: SagaConfig,
    store: Arc<dyn IdempotencyStore>,
    cursor: usize,
    started: bool,
    cancel: CancellationToken,
    compensation_failures: Vec<CompensationFailure>,
}

impl Saga {
    /// Create an empty saga with the default configuration.
    ///
    /// `name` namespaces the idempotency keys of every step; sagas sharing a
    /// store must use distinct names unless they are meant to share progress.
    pub fn new(name: impl Into<String>, store: Arc<dyn IdempotencyStore>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
            config: SagaConfig::default(),
            store,
            cursor: 0,
            started: false,
            cancel: CancellationToken::new(),
            compensation_failures: Vec::new(),
        }
    }

    /// Create an empty saga backed by a fresh in-memory store.
    pub fn in_memory(name: impl Into<String>) -> Self {
        Self::new(name, Arc::new(MemoryIdempotencyStore::new()))
    }

    /// Replace the retry configuration.
    #[must_use]
    pub const fn with_config(mut self, config: SagaConfig) -> Self {
        self.config = config;
        self
    }

    /// Drive the saga with a caller-owned cancellation token.
    #[must_use]
    pub fn with_cancellation_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Append a step.
    ///
    /// Steps run in the order they are added. Names should be unique within
    /// the saga; a repeated name is accepted but logged.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyStarted`] once `execute` or `next` has run.
    pub fn add_step<A, C>(&mut self, name: impl Into<String>, action: A, compensate: C) -> Result<&mut Self>
    where
        A: StepOperation + 'static,
        C: StepOperation + 'static,
    {
        if self.started {
            return Err(Error::AlreadyStarted {
                saga: self.name.clone(),
            });
        }

        let name = name.into();
        if self.steps.iter().any(|s| s.name() == name) {
            warn!(saga = %self.name, step = %name, "Duplicate step name in saga");
        }

        self.steps
            .push(SagaStep::new(name, Arc::new(action), Arc::new(compensate)));
        Ok(self)
    }

    /// Saga name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Retry configuration in effect.
    pub const fn config(&self) -> &SagaConfig {
        &self.config
    }

    /// Steps in execution order.
    pub fn steps(&self) -> &[SagaStep] {
        &self.steps
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the saga has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Position of the stepwise cursor, in `0..=len()`.
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Whether the stepwise cursor has passed the last step.
    pub fn is_finished(&self) -> bool {
        self.cursor == self.steps.len()
    }

    /// Snapshot of every step's status, in execution order.
    pub fn statuses(&self) -> Vec<StepStatus> {
        self.steps.iter().map(SagaStep::status).collect()
    }

    /// Observe the status of the step at `index` from another task.
    pub fn status_handle(&self, index: usize) -> Option<StatusHandle> {
        self.steps.get(index).map(SagaStep::status_handle)
    }

    /// Idempotency key of the step at `index`.
    pub fn idempotency_key(&self, index: usize) -> Option<String> {
        self.steps
            .get(index)
            .map(|step| idempotency_key(&self.name, step.name(), index))
    }

    /// A clone of the token that cancels this saga.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Compensations that failed so far.
    pub fn compensation_failures(&self) -> &[CompensationFailure] {
        &self.compensation_failures
    }

    /// Run every step in order.
    ///
    /// Steps whose idempotency key is already recorded are skipped without
    /// touching their status. The first step that exhausts its retries is
    /// marked `Failed`, every `Completed` step up to it is compensated in
    /// reverse order, and its error is returned; later steps never run.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StepFailed`] for the first terminal failure,
    /// [`Error::Cancelled`] if the cancellation token fired, or
    /// [`Error::InvalidTransition`] if a step was already used up by an
    /// earlier run.
    pub async fn execute(&mut self) -> Result<()> {
        self.started = true;
        let span = info_span!("saga_execute", saga = %self.name, run_id = %Ulid::new());

        async {
            info!(steps = self.steps.len(), "Starting saga execution");

            for index in 0..self.steps.len() {
                let Some(key) = self.idempotency_key(index) else {
                    break;
                };

                if self.store.is_completed(&key).await {
                    debug!(index, key = %key, "Step already completed (idempotent), skipping");
                    continue;
                }

                self.run_step(index, &key, index.saturating_add(1)).await?;
            }

            info!("Saga completed successfully");
            Ok(())
        }
        .instrument(span)
        .await
    }

    /// Run the step at the cursor and advance past it.
    ///
    /// Steps whose idempotency key is already recorded are passed over,
    /// advancing the cursor for each. On failure the cursor stays on the
    /// failed step and every `Completed` step before it is compensated.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoMoreSteps`] if the cursor is, or after skipping
    /// reaches, the end of the saga; otherwise the same errors as
    /// [`Saga::execute`].
    pub async fn next(&mut self) -> Result<()> {
        self.started = true;
        let key = loop {
            let Some(key) = self.idempotency_key(self.cursor) else {
                return Err(Error::NoMoreSteps {
                    saga: self.name.clone(),
                });
            };

            if !self.store.is_completed(&key).await {
                break key;
            }

            debug!(
                saga = %self.name,
                index = self.cursor,
                key = %key,
                "Step already completed (idempotent), skipping"
            );
            self.cursor = self.cursor.saturating_add(1);
        };

        let index = self.cursor;
        self.run_step(index, &key, index).await?;
        self.cursor = index.saturating_add(1);

        if self.is_finished() {
            info!(saga = %self.name, "Saga completed successfully");
        }
        Ok(())
    }

    /// Move the cursor back one step, compensating that step if it completed.
    ///
    /// A step that never completed (or was already compensated) is passed
    /// over silently.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoPreviousStep`] if the cursor is at the start, or
    /// [`Error::CompensationFailed`] if the compensation fails; the step is
    /// then left in `Compensating`.
    pub async fn prev(&mut self) -> Result<()> {
        let Some(index) = self.cursor.checked_sub(1) else {
            return Err(Error::NoPreviousStep {
                saga: self.name.clone(),
            });
        };
        self.cursor = index;

        let Some(step) = self.steps.get(index) else {
            return Ok(());
        };

        if step.status() != StepStatus::Completed {
            debug!(
                saga = %self.name,
                step = step.name(),
                index,
                status = %step.status(),
                "Step not completed, nothing to compensate"
            );
            return Ok(());
        }

        info!(saga = %self.name, step = step.name(), index, "Compensating step");
        let result = step.compensate().await;
        match result {
            Ok(()) => Ok(()),
            Err(source) => {
                let step = step.name().to_string();
                error!(
                    saga = %self.name,
                    step = %step,
                    index,
                    error = %source,
                    "Compensation failed"
                );
                self.compensation_failures.push(CompensationFailure {
                    step: step.clone(),
                    index,
                    error: format!("{source:#}"),
                });
                Err(Error::CompensationFailed {
                    saga: self.name.clone(),
                    step,
                    source,
                })
            }
        }
    }

    /// Run one step with retry and settle its status.
    ///
    /// On failure the steps in `..rollback_end` are rolled back.
    async fn run_step(&mut self, index: usize, key: &str, rollback_end: usize) -> Result<()> {
        let Some(step) = self.steps.get(index) else {
            return Err(Error::NoMoreSteps {
                saga: self.name.clone(),
            });
        };

        let outcome = run_with_retry(step, &self.config, &self.cancel).await?;
        match outcome {
            RetryOutcome::Succeeded { attempts } => {
                step.transition(StepStatus::Completed)?;
                self.store.mark_completed(key).await;
                debug!(
                    saga = %self.name,
                    step = step.name(),
                    index,
                    attempts,
                    "Step completed"
                );
                Ok(())
            }
            RetryOutcome::Exhausted { attempts, error } => {
                step.transition(StepStatus::Failed)?;
                let step = step.name().to_string();
                error!(
                    saga = %self.name,
                    step = %step,
                    index,
                    attempts,
                    error = %error,
                    "Step failed, starting rollback"
                );
                self.rollback(rollback_end).await;
                Err(Error::StepFailed {
                    saga: self.name.clone(),
                    step,
                    attempts,
                    source: error,
                })
            }
            RetryOutcome::Cancelled { attempts } => {
                step.transition(StepStatus::Failed)?;
                let step = step.name().to_string();
                warn!(
                    saga = %self.name,
                    step = %step,
                    index,
                    attempts,
                    "Saga cancelled, starting rollback"
                );
                self.rollback(rollback_end).await;
                Err(Error::Cancelled {
                    saga: self.name.clone(),
                    step,
                })
            }
        }
    }

    /// Compensate every `Completed` step in `..end`, last first.
    ///
    /// A failed compensation is recorded and the sweep continues with the
    /// earlier steps.
    async fn rollback(&mut self, end: usize) {
        let Self {
            name,
            steps,
            compensation_failures,
            ..
        } = self;
        let attempted = steps.get(..end).unwrap_or_default();

        info!(saga = %name, steps = attempted.len(), "Initiating rollback");

        for (index, step) in attempted.iter().enumerate().rev() {
            if step.status() != StepStatus::Completed {
                continue;
            }

            debug!(saga = %name, step = step.name(), index, "Compensating step");
            if let Err(source) = step.compensate().await {
                error!(
                    saga = %name,
                    step = step.name(),
                    index,
                    error = %source,
                    "Compensation failed (continuing with remaining compensations)"
                );
                compensation_failures.push(CompensationFailure {
                    step: step.name().to_string(),
                    index,
                    error: format!("{source:#}"),
                });
            }
        }
    }
}

impl fmt::Debug for Saga {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Saga")
            .field("name", &self.name)
            .field("steps", &self.steps)
            .field("config", &self.config)
            .field("cursor", &self.cursor)
            .field("started", &self.started)
            .finish_non_exhaustive()
    }
}
