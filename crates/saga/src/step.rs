//! A single saga step: forward action, compensation and status.

use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::operation::StepOperation;
use crate::status::{StatusCell, StatusHandle, StepStatus};

/// One forward/compensating operation pair plus its status.
///
/// A step is single-use: its status only moves forward along the allowed
/// edges of [`StepStatus`] and is never reset.
#[derive(Clone)]
pub struct SagaStep {
    name: Arc<str>,
    action: Arc<dyn StepOperation>,
    compensate: Arc<dyn StepOperation>,
    status: Arc<StatusCell>,
}

impl SagaStep {
    pub(crate) fn new(
        name: impl Into<Arc<str>>,
        action: Arc<dyn StepOperation>,
        compensate: Arc<dyn StepOperation>,
    ) -> Self {
        Self {
            name: name.into(),
            action,
            compensate,
            status: Arc::new(StatusCell::new(StepStatus::Pending)),
        }
    }

    /// Step name, unique within its saga by caller contract.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current status.
    pub fn status(&self) -> StepStatus {
        self.status.load()
    }

    /// A handle that observes this step's status from another task.
    pub fn status_handle(&self) -> StatusHandle {
        StatusHandle::new(Arc::clone(&self.name), Arc::clone(&self.status))
    }

    pub(crate) fn action(&self) -> &dyn StepOperation {
        self.action.as_ref()
    }

    pub(crate) fn transition(&self, to: StepStatus) -> Result<()> {
        self.status
            .transition(to)
            .map_err(|from| Error::InvalidTransition {
                step: self.name.to_string(),
                from,
                to,
            })
    }

    /// Run the compensation of a completed step.
    ///
    /// On failure the step stays in `Compensating`.
    pub(crate) async fn compensate(&self) -> anyhow::Result<()> {
        self.transition(StepStatus::Compensating)?;
        self.compensate.invoke().await?;
        self.transition(StepStatus::Compensated)?;
        Ok(())
    }
}

impl fmt::Debug for SagaStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SagaStep")
            .field("name", &self.name)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}
