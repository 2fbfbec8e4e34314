//! Step status state machine and its concurrently readable cell.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

/// Status of a single saga step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StepStatus {
    /// Not yet attempted.
    Pending = 0,
    /// Forward action is executing.
    InProgress = 1,
    /// Forward effect applied.
    Completed = 2,
    /// Forward action exhausted its retries.
    Failed = 3,
    /// Compensating action is executing. Also the resting state of a step
    /// whose compensation failed.
    Compensating = 4,
    /// Reverse effect applied.
    Compensated = 5,
}

impl StepStatus {
    /// Check if the step can move to the given status.
    ///
    /// `InProgress -> InProgress` is allowed so that every retry attempt can
    /// re-announce itself.
    pub const fn can_transition_to(self, target: Self) -> bool {
        use StepStatus::{Compensated, Compensating, Completed, Failed, InProgress, Pending};
        matches!(
            (self, target),
            (Pending | InProgress, InProgress)
                | (InProgress, Completed | Failed)
                | (Completed | Failed, Compensating)
                | (Compensating, Compensated)
        )
    }

    const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::InProgress,
            2 => Self::Completed,
            3 => Self::Failed,
            4 => Self::Compensating,
            5 => Self::Compensated,
            _ => Self::Pending,
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Compensating => "compensating",
            Self::Compensated => "compensated",
        };
        write!(f, "{s}")
    }
}

/// Atomic storage for a step status.
#[derive(Debug)]
pub(crate) struct StatusCell(AtomicU8);

impl StatusCell {
    pub(crate) const fn new(status: StepStatus) -> Self {
        Self(AtomicU8::new(status as u8))
    }

    pub(crate) fn load(&self) -> StepStatus {
        StepStatus::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Move to `to` if the edge is allowed, returning the previous status on
    /// rejection.
    pub(crate) fn transition(&self, to: StepStatus) -> Result<(), StepStatus> {
        self.0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |raw| {
                StepStatus::from_u8(raw)
                    .can_transition_to(to)
                    .then_some(to as u8)
            })
            .map(|_| ())
            .map_err(StepStatus::from_u8)
    }
}

/// Read-only view of a step's status that can be moved to another task.
///
/// Reads never block the orchestrator and never observe a torn value.
#[derive(Debug, Clone)]
pub struct StatusHandle {
    step: Arc<str>,
    cell: Arc<StatusCell>,
}

impl StatusHandle {
    pub(crate) const fn new(step: Arc<str>, cell: Arc<StatusCell>) -> Self {
        Self { step, cell }
    }

    /// Name of the observed step.
    pub fn step(&self) -> &str {
        &self.step
    }

    /// Current status of the observed step.
    pub fn status(&self) -> StepStatus {
        self.cell.load()
    }
}
