//! Retry configuration for a saga.

use std::num::NonZeroU32;
use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::error::{Error, Result};

const DEFAULT_MAX_RETRIES: NonZeroU32 = match NonZeroU32::new(5) {
    Some(n) => n,
    None => NonZeroU32::MIN,
};

/// Default delay between two attempts of the same step.
pub const DEFAULT_RETRY_WAIT_TIME: Duration = Duration::from_millis(300);

/// Retry policy applied to every step of a saga.
///
/// Loaded from TOML with the keys `max_retries` and `retry_wait_ms`; missing
/// keys take their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SagaConfig {
    /// Total attempts per step, including the first one.
    #[serde(default = "default_max_retries")]
    pub max_retries: NonZeroU32,

    /// Fixed delay between attempts.
    #[serde(
        default = "default_retry_wait_time",
        rename = "retry_wait_ms",
        deserialize_with = "deserialize_millis"
    )]
    pub retry_wait_time: Duration,
}

impl Default for SagaConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_wait_time: default_retry_wait_time(),
        }
    }
}

impl SagaConfig {
    /// Create a configuration, rejecting a zero attempt count.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `max_retries` is zero.
    pub fn new(max_retries: u32, retry_wait_time: Duration) -> Result<Self> {
        let max_retries = NonZeroU32::new(max_retries)
            .ok_or_else(|| Error::invalid_config("max_retries must be greater than 0"))?;
        Ok(Self {
            max_retries,
            retry_wait_time,
        })
    }

    /// Parse a configuration from TOML.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the document is malformed or a
    /// value is out of range.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        toml::from_str(input).map_err(|e| Error::invalid_config(e.message()))
    }

    /// Set the number of attempts per step.
    pub const fn with_max_retries(mut self, max_retries: NonZeroU32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the delay between attempts.
    pub const fn with_retry_wait_time(mut self, retry_wait_time: Duration) -> Self {
        self.retry_wait_time = retry_wait_time;
        self
    }
}

const fn default_max_retries() -> NonZeroU32 {
    DEFAULT_MAX_RETRIES
}

const fn default_retry_wait_time() -> Duration {
    DEFAULT_RETRY_WAIT_TIME
}

fn deserialize_millis<'de, D>(deserializer: D) -> std::result::Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    u64::deserialize(deserializer).map(Duration::from_millis)
}
