//! Configuration loaded from environment variables with sensible defaults.
//!
//! A `.env` file in the working directory is honored when present.

use reservas_runtime::PublishQueueConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Activities directory configuration.
    pub directory: DirectoryConfig,
    /// Message broker configuration.
    pub broker: BrokerConfig,
    /// Publish queue configuration.
    pub queue: QueueConfig,
    /// Fork-join scope deadline in seconds.
    pub orchestrator_timeout_secs: u64,
    /// Default log filter (overridden by `RUST_LOG`).
    pub log_level: String,
}

/// Activities directory configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Base URL of the activities API.
    pub base_url: String,
}

/// Message broker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Broker addresses (comma-separated).
    pub brokers: String,
    /// Topic reservation lifecycle events are published to.
    pub topic: String,
    /// Producer acknowledgment mode: "0", "1" or "all".
    pub acks: String,
}

/// Publish queue configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Bounded queue capacity.
    pub capacity: usize,
    /// Number of worker tasks.
    pub workers: usize,
    /// Delivery attempts per message.
    pub max_retries: u32,
    /// Base of the linear backoff in milliseconds.
    pub base_backoff_ms: u64,
    /// Per-attempt delivery timeout in seconds.
    pub attempt_timeout_secs: u64,
}

fn var_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables, reading a `.env` file
    /// first when one exists. Missing or unparseable variables fall back to
    /// their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            directory: DirectoryConfig {
                base_url: env::var("ACTIVITIES_API_URL")
                    .unwrap_or_else(|_| "http://localhost:8082".to_string()),
            },
            broker: BrokerConfig {
                brokers: env::var("REDPANDA_BROKERS")
                    .unwrap_or_else(|_| "localhost:9092".to_string()),
                topic: env::var("RESERVATION_TOPIC")
                    .unwrap_or_else(|_| "reservation-events".to_string()),
                acks: env::var("PRODUCER_ACKS").unwrap_or_else(|_| "1".to_string()),
            },
            queue: QueueConfig {
                capacity: var_or("QUEUE_CAPACITY", 200),
                workers: var_or("QUEUE_WORKERS", 3),
                max_retries: var_or("QUEUE_MAX_RETRIES", 3),
                base_backoff_ms: var_or("QUEUE_BASE_BACKOFF_MS", 200),
                attempt_timeout_secs: var_or("QUEUE_ATTEMPT_TIMEOUT_SECS", 5),
            },
            orchestrator_timeout_secs: var_or("ORCHESTRATOR_TIMEOUT_SECS", 5),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        }
    }

    /// The publish queue configuration in runtime form.
    #[must_use]
    pub fn queue_config(&self) -> PublishQueueConfig {
        PublishQueueConfig::builder()
            .capacity(self.queue.capacity)
            .workers(self.queue.workers)
            .max_retries(self.queue.max_retries)
            .base_backoff(Duration::from_millis(self.queue.base_backoff_ms))
            .attempt_timeout(Duration::from_secs(self.queue.attempt_timeout_secs))
            .build()
    }

    /// The fork-join scope deadline as a [`Duration`].
    #[must_use]
    pub const fn orchestrator_timeout(&self) -> Duration {
        Duration::from_secs(self.orchestrator_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            directory: DirectoryConfig {
                base_url: "http://localhost:8082".to_string(),
            },
            broker: BrokerConfig {
                brokers: "localhost:9092".to_string(),
                topic: "reservation-events".to_string(),
                acks: "1".to_string(),
            },
            queue: QueueConfig {
                capacity: 200,
                workers: 3,
                max_retries: 3,
                base_backoff_ms: 200,
                attempt_timeout_secs: 5,
            },
            orchestrator_timeout_secs: 5,
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_queue_defaults() {
        let config = Config::default();
        let queue = config.queue_config();
        assert_eq!(queue.capacity, PublishQueueConfig::default().capacity);
        assert_eq!(queue.workers, PublishQueueConfig::default().workers);
        assert_eq!(queue.max_retries, PublishQueueConfig::default().max_retries);
    }

    #[test]
    fn orchestrator_timeout_in_seconds() {
        let config = Config {
            orchestrator_timeout_secs: 2,
            ..Config::default()
        };
        assert_eq!(config.orchestrator_timeout(), Duration::from_secs(2));
    }
}
