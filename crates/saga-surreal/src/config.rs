//! Connection settings for the SurrealDB idempotency store.

use std::time::Duration;

/// Default bound on every store call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default prefix prepended to every idempotency key.
pub const DEFAULT_KEY_PREFIX: &str = "saga:";

/// Configuration for [`SurrealIdempotencyStore`](crate::SurrealIdempotencyStore).
#[derive(Debug, Clone)]
pub struct SurrealStoreConfig {
    /// Connection URL (e.g., "mem://", "ws://localhost:8000")
    pub url: String,
    /// Namespace to use
    pub namespace: String,
    /// Database to use
    pub database: String,
    /// Prefix applied to keys before they become record ids
    pub key_prefix: String,
    /// Bound on connect and on every store call
    pub timeout: Duration,
    /// Optional root credentials
    pub credentials: Option<Credentials>,
}

/// Root credentials for authentication.
#[derive(Clone)]
pub struct Credentials {
    /// Username
    pub username: String,
    /// Password
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl SurrealStoreConfig {
    /// Create an in-memory configuration for testing.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            url: "mem://".to_string(),
            namespace: "saga".to_string(),
            database: "test".to_string(),
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            timeout: DEFAULT_TIMEOUT,
            credentials: None,
        }
    }

    /// Create a WebSocket configuration.
    #[must_use]
    pub fn websocket(host: &str, port: u16) -> Self {
        Self {
            url: format!("ws://{host}:{port}"),
            database: "production".to_string(),
            ..Self::in_memory()
        }
    }

    /// Set credentials for authentication.
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials = Some(Credentials {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    /// Set the namespace.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Set the database.
    #[must_use]
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Set the key prefix.
    #[must_use]
    pub fn with_key_prefix(mut self, key_prefix: impl Into<String>) -> Self {
        self.key_prefix = key_prefix.into();
        self
    }

    /// Set the per-call timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for SurrealStoreConfig {
    fn default() -> Self {
        Self::in_memory()
    }
}
