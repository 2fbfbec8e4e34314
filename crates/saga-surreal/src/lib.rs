//! SurrealDB-backed idempotency store for the `saga` crate.
//!
//! Completion markers are persisted as records in the `saga_marker` table so
//! that sagas resume across process restarts. The store fails open: database
//! errors and timeouts are logged and reported as "not completed".
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use saga::Saga;
//! use saga_surreal::{SurrealIdempotencyStore, SurrealStoreConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let store = SurrealIdempotencyStore::connect(SurrealStoreConfig::websocket("localhost", 8000)).await?;
//! let mut saga = Saga::new("order-17", Arc::new(store));
//! saga.add_step("reserve", saga::noop(), saga::noop())?;
//! saga.execute().await?;
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod store;

pub use config::{Credentials, DEFAULT_KEY_PREFIX, DEFAULT_TIMEOUT, SurrealStoreConfig};
pub use error::{SurrealStoreError, SurrealStoreResult, from_surrealdb_error};
pub use store::SurrealIdempotencyStore;
