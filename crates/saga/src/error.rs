//! Error types for the saga crate.

use thiserror::Error;

use crate::status::StepStatus;

/// Result type alias for saga operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Saga error types.
#[derive(Debug, Error)]
pub enum Error {
    /// A step's forward action exhausted its retries.
    #[error("step '{step}' in saga '{saga}' failed after {attempts} attempt(s): {source}")]
    StepFailed {
        saga: String,
        step: String,
        attempts: u32,
        #[source]
        source: anyhow::Error,
    },

    /// A compensating action failed while stepping backwards.
    #[error("compensation of step '{step}' in saga '{saga}' failed: {source}")]
    CompensationFailed {
        saga: String,
        step: String,
        #[source]
        source: anyhow::Error,
    },

    /// `next` was called with the cursor past the last step.
    #[error("no more actions to execute in saga '{saga}'")]
    NoMoreSteps { saga: String },

    /// `prev` was called with the cursor at the first step.
    #[error("no previous action to roll back in saga '{saga}'")]
    NoPreviousStep { saga: String },

    /// The saga was cancelled while a step was running or waiting to retry.
    #[error("saga '{saga}' cancelled during step '{step}'")]
    Cancelled { saga: String, step: String },

    /// A status change outside the allowed edges was requested.
    #[error("invalid status transition for step '{step}' from '{from}' to '{to}'")]
    InvalidTransition {
        step: String,
        from: StepStatus,
        to: StepStatus,
    },

    /// Steps were appended after execution began.
    #[error("saga '{saga}' has already started; steps can no longer be added")]
    AlreadyStarted { saga: String },

    /// Configuration failed validation.
    #[error("invalid saga configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl Error {
    /// Create an invalid configuration error.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Whether this error reports misuse of the stepwise API rather than a
    /// failed operation.
    #[must_use]
    pub const fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            Self::NoMoreSteps { .. } | Self::NoPreviousStep { .. } | Self::AlreadyStarted { .. }
        )
    }

    /// Name of the step this error concerns, if any.
    #[must_use]
    pub fn step_name(&self) -> Option<&str> {
        match self {
            Self::StepFailed { step, .. }
            | Self::CompensationFailed { step, .. }
            | Self::Cancelled { step, .. }
            | Self::InvalidTransition { step, .. } => Some(step),
            Self::NoMoreSteps { .. }
            | Self::NoPreviousStep { .. }
            | Self::AlreadyStarted { .. }
            | Self::InvalidConfig { .. } => None,
        }
    }
}
