//! Saga orchestration with retry, compensation and idempotent resume.
//!
//! A [`Saga`] is an ordered list of steps, each pairing a forward action with
//! a compensating action. Steps run one at a time with bounded, fixed-interval
//! retry. When a step fails for good, every step that already completed is
//! compensated in reverse order.
//!
//! Completed steps are recorded in an [`IdempotencyStore`] under a key derived
//! from the saga name, step name and position, so a saga rebuilt after a crash
//! skips the work it already did.
//!
//! # Example
//!
//! ```no_run
//! use saga::{Saga, SagaConfig, from_fn, noop};
//!
//! # async fn run() -> saga::Result<()> {
//! let mut saga = Saga::in_memory("booking").with_config(SagaConfig::default());
//! saga.add_step("reserve", from_fn(|| Ok(())), from_fn(|| Ok(())))?
//!     .add_step("notify", from_fn(|| Ok(())), noop())?;
//! saga.execute().await?;
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod key;
mod operation;
mod retry;
mod saga;
mod status;
mod step;
pub mod store;

pub use config::{DEFAULT_RETRY_WAIT_TIME, SagaConfig};
pub use error::{Error, Result};
pub use key::idempotency_key;
pub use operation::{FnOperation, NoOp, StepOperation, from_fn, noop};
pub use saga::{CompensationFailure, Saga};
pub use status::{StatusHandle, StepStatus};
pub use step::SagaStep;
pub use store::{IdempotencyStore, MemoryIdempotencyStore};
pub use tokio_util::sync::CancellationToken;
