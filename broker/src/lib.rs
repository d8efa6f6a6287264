//! Redpanda publisher for reservation lifecycle events.
//!
//! Implements [`ReservationPublisher`] on top of rdkafka. Each publication is
//! a single produce attempt against the configured topic; retry policy lives
//! in the publish queue upstream, not here.
//!
//! # Wire format
//!
//! Messages are JSON envelopes keyed by reservation id:
//!
//! ```json
//! {"action": "create", "reserva_id": "a1b2c3"}
//! ```
//!
//! Keying by reservation id keeps all events for one reservation on the same
//! partition, so consumers see that reservation's lifecycle in order.
//!
//! # Example
//!
//! ```no_run
//! use reservas_broker::RedpandaPublisher;
//! use reservas_core::publisher::{PublishAction, ReservationPublisher};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let publisher = RedpandaPublisher::builder()
//!     .brokers("localhost:9092")
//!     .topic("reservation-events")
//!     .build()?;
//!
//! publisher.publish(PublishAction::Create, "a1b2c3").await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use reservas_core::publisher::{PublishAction, PublishError, ReservationPublisher};
use std::time::Duration;

/// Default per-produce timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default topic for reservation lifecycle events.
const DEFAULT_TOPIC: &str = "reservation-events";

/// Redpanda-backed [`ReservationPublisher`].
///
/// Works against any Kafka-compatible broker. The producer is created once at
/// build time and reused for every publication.
pub struct RedpandaPublisher {
    producer: FutureProducer,
    topic: String,
    timeout: Duration,
}

impl RedpandaPublisher {
    /// Create a publisher with default configuration against `brokers`.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::ConnectionFailed`] if the producer cannot be
    /// created from the given broker addresses.
    pub fn new(brokers: &str) -> Result<Self, PublishError> {
        Self::builder().brokers(brokers).build()
    }

    /// Create a builder for configuring the publisher.
    #[must_use]
    pub fn builder() -> RedpandaPublisherBuilder {
        RedpandaPublisherBuilder::default()
    }

    /// The topic events are published to.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }
}

/// Builder for configuring a [`RedpandaPublisher`].
#[derive(Default)]
pub struct RedpandaPublisherBuilder {
    brokers: Option<String>,
    topic: Option<String>,
    acks: Option<String>,
    timeout: Option<Duration>,
}

impl RedpandaPublisherBuilder {
    /// Set the broker addresses (comma-separated, e.g. "localhost:9092").
    #[must_use]
    pub fn brokers(mut self, brokers: impl Into<String>) -> Self {
        self.brokers = Some(brokers.into());
        self
    }

    /// Set the destination topic.
    ///
    /// Default: "reservation-events"
    #[must_use]
    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// Set the producer acknowledgment mode.
    ///
    /// # Parameters
    ///
    /// - `acks`: "0" (no acks), "1" (leader ack), "all" (all replicas ack)
    ///
    /// Default: "1"
    #[must_use]
    pub fn acks(mut self, acks: impl Into<String>) -> Self {
        self.acks = Some(acks.into());
        self
    }

    /// Set the per-produce timeout.
    ///
    /// Default: 5 seconds
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the [`RedpandaPublisher`].
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::ConnectionFailed`] if brokers are not set or
    /// the producer cannot be created.
    pub fn build(self) -> Result<RedpandaPublisher, PublishError> {
        let brokers = self
            .brokers
            .ok_or_else(|| PublishError::ConnectionFailed("brokers not configured".to_string()))?;
        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);

        let mut config = ClientConfig::new();
        config
            .set("bootstrap.servers", &brokers)
            .set("message.timeout.ms", timeout.as_millis().to_string())
            .set("acks", self.acks.as_deref().unwrap_or("1"));

        let producer: FutureProducer = config.create().map_err(|e| {
            PublishError::ConnectionFailed(format!("failed to create producer: {e}"))
        })?;

        let topic = self.topic.unwrap_or_else(|| DEFAULT_TOPIC.to_string());

        tracing::info!(
            brokers = %brokers,
            topic = %topic,
            acks = self.acks.as_deref().unwrap_or("1"),
            "RedpandaPublisher created"
        );

        Ok(RedpandaPublisher {
            producer,
            topic,
            timeout,
        })
    }
}

#[async_trait]
impl ReservationPublisher for RedpandaPublisher {
    async fn publish(&self, action: PublishAction, reservation_id: &str) -> Result<(), PublishError> {
        let payload = serde_json::to_vec(&serde_json::json!({
            "action": action.as_str(),
            "reserva_id": reservation_id,
        }))
        .map_err(|e| PublishError::Serialization(e.to_string()))?;

        let record = FutureRecord::to(&self.topic)
            .payload(&payload)
            .key(reservation_id);

        match self.producer.send(record, Timeout::After(self.timeout)).await {
            Ok((partition, offset)) => {
                tracing::debug!(
                    topic = %self.topic,
                    partition = partition,
                    offset = offset,
                    action = %action,
                    reservation_id = %reservation_id,
                    "event published"
                );
                Ok(())
            }
            Err((kafka_error, _)) => {
                tracing::error!(
                    topic = %self.topic,
                    action = %action,
                    reservation_id = %reservation_id,
                    error = %kafka_error,
                    "failed to publish event"
                );
                Err(PublishError::Failed {
                    id: reservation_id.to_string(),
                    reason: kafka_error.to_string(),
                })
            }
        }
    }
}
