//! SurrealDB implementation of [`IdempotencyStore`].

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use saga::IdempotencyStore;
use serde::{Deserialize, Serialize};
use surrealdb::Surreal;
use surrealdb::engine::any::Any;
use surrealdb::opt::auth::Root;
use tracing::{debug, info, warn};

use crate::config::SurrealStoreConfig;
use crate::error::{SurrealStoreError, SurrealStoreResult, from_surrealdb_error};

const MARKER_TABLE: &str = "saga_marker";

/// Completion marker as written.
#[derive(Debug, Serialize)]
struct MarkerInput {
    completed: bool,
    completed_at: DateTime<Utc>,
}

/// Completion marker as read back.
#[derive(Debug, Deserialize)]
struct MarkerRecord {
    completed: bool,
}

/// Idempotency store persisted in SurrealDB.
///
/// Markers never expire. Every call is bounded by the configured timeout and
/// fails open: an unreachable or slow database makes `is_completed` answer
/// `false` and turns `mark_completed` into a logged no-op. Steps guarded by
/// this store may therefore run again during an outage and must be safe to
/// re-run.
#[derive(Debug, Clone)]
pub struct SurrealIdempotencyStore {
    db: Arc<Surreal<Any>>,
    config: SurrealStoreConfig,
}

impl SurrealIdempotencyStore {
    /// Connect to the database and verify it answers.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection, sign-in or ping fails, or if the
    /// whole sequence exceeds the configured timeout.
    pub async fn connect(config: SurrealStoreConfig) -> SurrealStoreResult<Self> {
        let timeout = config.timeout;
        let store = tokio::time::timeout(timeout, Self::open(config))
            .await
            .map_err(|_| SurrealStoreError::timeout(timeout))??;

        info!(
            url = %store.config.url,
            namespace = %store.config.namespace,
            database = %store.config.database,
            "Connected idempotency store"
        );
        Ok(store)
    }

    async fn open(config: SurrealStoreConfig) -> SurrealStoreResult<Self> {
        let db = Surreal::<Any>::init();

        db.connect(&config.url)
            .await
            .map_err(|e| SurrealStoreError::connection_failed(e.to_string()))?;

        if let Some(creds) = &config.credentials {
            db.signin(Root {
                username: &creds.username,
                password: &creds.password,
            })
            .await
            .map_err(|e| SurrealStoreError::authentication_failed(e.to_string()))?;
        }

        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await
            .map_err(from_surrealdb_error)?;

        let store = Self {
            db: Arc::new(db),
            config,
        };
        store.ping().await?;
        Ok(store)
    }

    /// Get the store configuration.
    #[must_use]
    pub const fn config(&self) -> &SurrealStoreConfig {
        &self.config
    }

    /// Check that the database answers within the timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or times out.
    pub async fn health_check(&self) -> SurrealStoreResult<()> {
        self.bounded(self.ping()).await
    }

    /// Record id for a key: the key with the configured prefix.
    fn record_id(&self, key: &str) -> String {
        format!("{}{key}", self.config.key_prefix)
    }

    async fn ping(&self) -> SurrealStoreResult<()> {
        self.db
            .query("INFO FOR DB")
            .await
            .map_err(from_surrealdb_error)?;
        Ok(())
    }

    async fn write_marker(&self, id: &str) -> SurrealStoreResult<()> {
        let input = MarkerInput {
            completed: true,
            completed_at: Utc::now(),
        };

        let _: Option<MarkerRecord> = self
            .db
            .upsert((MARKER_TABLE, id))
            .content(input)
            .await
            .map_err(from_surrealdb_error)?;
        Ok(())
    }

    async fn read_marker(&self, id: &str) -> SurrealStoreResult<bool> {
        let record: Option<MarkerRecord> = self
            .db
            .select((MARKER_TABLE, id))
            .await
            .map_err(from_surrealdb_error)?;
        Ok(record.is_some_and(|r| r.completed))
    }

    async fn bounded<T>(
        &self,
        op: impl Future<Output = SurrealStoreResult<T>>,
    ) -> SurrealStoreResult<T> {
        tokio::time::timeout(self.config.timeout, op)
            .await
            .map_err(|_| SurrealStoreError::timeout(self.config.timeout))?
    }
}

#[async_trait]
impl IdempotencyStore for SurrealIdempotencyStore {
    async fn mark_completed(&self, key: &str) {
        let id = self.record_id(key);
        self.record(key, self.write_marker(&id)).await;
    }

    async fn is_completed(&self, key: &str) -> bool {
        let id = self.record_id(key);
        self.check(key, self.read_marker(&id)).await
    }
}

impl SurrealIdempotencyStore {
    /// Run a marker write under the timeout, logging instead of failing.
    async fn record(&self, key: &str, write: impl Future<Output = SurrealStoreResult<()>>) {
        match self.bounded(write).await {
            Ok(()) => debug!(key, "Recorded idempotency marker"),
            Err(e) => warn!(key, error = %e, "Failed to record idempotency marker"),
        }
    }

    /// Run a marker lookup under the timeout, answering `false` on any error.
    async fn check(&self, key: &str, read: impl Future<Output = SurrealStoreResult<bool>>) -> bool {
        match self.bounded(read).await {
            Ok(completed) => completed,
            Err(e) => {
                warn!(key, error = %e, "Idempotency lookup failed, treating step as not completed");
                false
            }
        }
    }
}
