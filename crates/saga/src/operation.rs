//! Forward and compensating operations supplied by the caller.

use std::future::Future;

use async_trait::async_trait;

/// A zero-argument fallible operation.
///
/// Both the forward action and the compensation of a step implement this
/// trait. Any `Fn() -> impl Future<Output = anyhow::Result<()>>` closure
/// implements it directly; use [`from_fn`] for synchronous closures.
#[async_trait]
pub trait StepOperation: Send + Sync {
    /// Run the operation once.
    async fn invoke(&self) -> anyhow::Result<()>;
}

#[async_trait]
impl<F, Fut> StepOperation for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn invoke(&self) -> anyhow::Result<()> {
        (self)().await
    }
}

/// An operation that runs a synchronous closure.
pub struct FnOperation<F>
where
    F: Fn() -> anyhow::Result<()> + Send + Sync,
{
    func: F,
}

#[async_trait]
impl<F> StepOperation for FnOperation<F>
where
    F: Fn() -> anyhow::Result<()> + Send + Sync,
{
    async fn invoke(&self) -> anyhow::Result<()> {
        (self.func)()
    }
}

/// Wrap a synchronous closure as a step operation.
pub const fn from_fn<F>(func: F) -> FnOperation<F>
where
    F: Fn() -> anyhow::Result<()> + Send + Sync,
{
    FnOperation { func }
}

/// An operation that does nothing and always succeeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOp;

#[async_trait]
impl StepOperation for NoOp {
    async fn invoke(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// An operation that does nothing. Handy for steps with no reverse effect.
pub const fn noop() -> NoOp {
    NoOp
}
