//! Bounded retry of a step's forward action.

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::SagaConfig;
use crate::error::Result;
use crate::status::StepStatus;
use crate::step::SagaStep;

/// How a retried action ended.
#[derive(Debug)]
pub(crate) enum RetryOutcome {
    /// An attempt succeeded.
    Succeeded { attempts: u32 },
    /// Every attempt failed; carries the last error.
    Exhausted { attempts: u32, error: anyhow::Error },
    /// The token fired during an attempt or a wait.
    Cancelled { attempts: u32 },
}

/// Run the step's action up to `config.max_retries` times.
///
/// Each attempt moves the step to `InProgress`. Attempts are separated by a
/// fixed `config.retry_wait_time`; there is no wait after the last one.
/// Cancellation drops the in-flight action future and ends the wait early.
///
/// The step's final status is left to the caller.
pub(crate) async fn run_with_retry(
    step: &SagaStep,
    config: &SagaConfig,
    cancel: &CancellationToken,
) -> Result<RetryOutcome> {
    let max_attempts = config.max_retries.get();
    let mut attempt = 1u32;

    loop {
        step.transition(StepStatus::InProgress)?;

        debug!(
            step = step.name(),
            attempt,
            max_attempts,
            "Attempting step action"
        );

        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(RetryOutcome::Cancelled { attempts: attempt }),
            result = step.action().invoke() => result,
        };

        let error = match result {
            Ok(()) => return Ok(RetryOutcome::Succeeded { attempts: attempt }),
            Err(error) => error,
        };

        warn!(
            step = step.name(),
            attempt,
            max_attempts,
            error = %error,
            "Step attempt failed"
        );

        if attempt >= max_attempts {
            return Ok(RetryOutcome::Exhausted {
                attempts: attempt,
                error,
            });
        }

        tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(RetryOutcome::Cancelled { attempts: attempt }),
            () = tokio::time::sleep(config.retry_wait_time) => {}
        }

        attempt = attempt.saturating_add(1);
    }
}
