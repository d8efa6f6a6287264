//! Asynchronous publish queue with a fixed worker pool, retry and backoff.
//!
//! Decouples message-broker publication latency and failure from the request
//! path of mutation endpoints: the caller enqueues `{action, reservation id}`
//! and returns; workers deliver in the background.
//!
//! # Lifecycle
//!
//! ```text
//! Stopped --start()--> Running --stop()--> Draining --(workers exit)--> Stopped
//! ```
//!
//! `stop()` refuses further enqueues and unblocks producers waiting on a full
//! queue, then waits until every already-accepted message has finished
//! processing (success or retry exhaustion) and every worker has exited.
//!
//! # Delivery semantics
//!
//! Best-effort, at-most-once-after-N-retries, unordered. A message that
//! exhausts its retries is logged and dropped: there is no dead-letter store,
//! by intent. Backoff between attempts grows linearly
//! (`attempt × base_backoff`).

use crate::orchestrator::CancelSignal;
use reservas_core::publisher::{PublishAction, ReservationPublisher};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;

/// An ephemeral domain-change notification. Consumed exactly once by a
/// worker, then discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishMessage {
    /// The mutation that produced the notification.
    pub action: PublishAction,
    /// Id of the mutated reservation.
    pub id: String,
}

/// Errors reported to producers at enqueue time.
///
/// Delivery failures are never reported here: once a message is accepted,
/// the mutation is complete from the caller's perspective.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnqueueError {
    /// The queue is draining and accepts no further messages.
    #[error("publish queue is stopping")]
    Stopping,
}

/// Configuration for a [`PublishQueue`].
///
/// # Default Values
///
/// - `capacity`: 200 slots
/// - `workers`: 3
/// - `max_retries`: 3 attempts per message
/// - `base_backoff`: 200ms (attempt N waits N × base)
/// - `attempt_timeout`: 5 seconds per delivery attempt
#[derive(Debug, Clone)]
pub struct PublishQueueConfig {
    /// Bounded queue capacity; producers block when full.
    pub capacity: usize,
    /// Fixed number of worker tasks.
    pub workers: usize,
    /// Delivery attempts per message before it is dropped.
    pub max_retries: u32,
    /// Base of the linear backoff between attempts.
    pub base_backoff: Duration,
    /// Timeout wrapped around each individual delivery attempt.
    pub attempt_timeout: Duration,
}

impl Default for PublishQueueConfig {
    fn default() -> Self {
        Self {
            capacity: 200,
            workers: 3,
            max_retries: 3,
            base_backoff: Duration::from_millis(200),
            attempt_timeout: Duration::from_secs(5),
        }
    }
}

impl PublishQueueConfig {
    /// Create a new config builder.
    #[must_use]
    pub fn builder() -> PublishQueueConfigBuilder {
        PublishQueueConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`PublishQueueConfig`].
#[derive(Debug, Clone)]
pub struct PublishQueueConfigBuilder {
    config: PublishQueueConfig,
}

impl PublishQueueConfigBuilder {
    /// Set the bounded queue capacity.
    #[must_use]
    pub const fn capacity(mut self, capacity: usize) -> Self {
        self.config.capacity = capacity;
        self
    }

    /// Set the number of worker tasks.
    #[must_use]
    pub const fn workers(mut self, workers: usize) -> Self {
        self.config.workers = workers;
        self
    }

    /// Set the number of delivery attempts per message.
    #[must_use]
    pub const fn max_retries(mut self, max_retries: u32) -> Self {
        self.config.max_retries = max_retries;
        self
    }

    /// Set the base of the linear backoff.
    #[must_use]
    pub const fn base_backoff(mut self, backoff: Duration) -> Self {
        self.config.base_backoff = backoff;
        self
    }

    /// Set the per-attempt delivery timeout.
    #[must_use]
    pub const fn attempt_timeout(mut self, timeout: Duration) -> Self {
        self.config.attempt_timeout = timeout;
        self
    }

    /// Build the [`PublishQueueConfig`].
    #[must_use]
    pub fn build(self) -> PublishQueueConfig {
        self.config
    }
}

/// Bounded queue plus worker pool delivering notifications to the broker.
///
/// Safe for concurrent producers and consumers by construction; the channel
/// is the only shared mutable structure in the publish pipeline.
pub struct PublishQueue {
    tx: Mutex<Option<mpsc::Sender<PublishMessage>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    shutdown: CancelSignal,
}

impl PublishQueue {
    /// Launch the worker pool and return the running queue.
    #[must_use]
    pub fn start(publisher: Arc<dyn ReservationPublisher>, config: PublishQueueConfig) -> Self {
        let (tx, rx) = mpsc::channel(config.capacity.max(1));
        let rx = Arc::new(Mutex::new(rx));

        let mut workers = Vec::with_capacity(config.workers);
        for index in 0..config.workers.max(1) {
            let rx = Arc::clone(&rx);
            let publisher = Arc::clone(&publisher);
            let config = config.clone();
            workers.push(tokio::spawn(async move {
                worker_loop(index, rx, publisher, config).await;
            }));
        }

        tracing::info!(
            workers = config.workers.max(1),
            capacity = config.capacity.max(1),
            max_retries = config.max_retries,
            "publish queue started"
        );

        Self {
            tx: Mutex::new(Some(tx)),
            workers: Mutex::new(workers),
            shutdown: CancelSignal::new(),
        }
    }

    /// Enqueue a notification for asynchronous delivery.
    ///
    /// Returns as soon as the message is accepted. When the queue is full the
    /// call waits for a slot; callers with a deadline wrap the call in
    /// `tokio::time::timeout`, and the elapsed error is theirs to report.
    ///
    /// # Errors
    ///
    /// [`EnqueueError::Stopping`] once [`PublishQueue::stop`] has begun.
    pub async fn enqueue(&self, action: PublishAction, id: &str) -> Result<(), EnqueueError> {
        let sender = self.tx.lock().await.clone();
        let Some(sender) = sender else {
            return Err(EnqueueError::Stopping);
        };

        let message = PublishMessage {
            action,
            id: id.to_string(),
        };

        tokio::select! {
            // Shutdown wins over a freed slot so stop() cuts off producers
            // deterministically.
            biased;
            () = self.shutdown.cancelled() => Err(EnqueueError::Stopping),
            sent = sender.send(message) => sent.map_err(|_| EnqueueError::Stopping),
        }
    }

    /// Drain and shut down.
    ///
    /// Refuses further enqueues, unblocks producers waiting on a full queue,
    /// lets workers finish every already-accepted message (including retries
    /// and backoff) and returns once the last worker has exited.
    pub async fn stop(&self) {
        self.shutdown.cancel();
        // Closing the channel is what moves workers from Running to Draining:
        // recv() returns None once the buffer is empty.
        drop(self.tx.lock().await.take());

        let handles = std::mem::take(&mut *self.workers.lock().await);
        for result in futures::future::join_all(handles).await {
            if let Err(err) = result {
                tracing::error!(error = %err, "publish worker panicked");
            }
        }
        tracing::info!("publish queue stopped");
    }
}

async fn worker_loop(
    index: usize,
    rx: Arc<Mutex<mpsc::Receiver<PublishMessage>>>,
    publisher: Arc<dyn ReservationPublisher>,
    config: PublishQueueConfig,
) {
    loop {
        let message = {
            let mut rx = rx.lock().await;
            rx.recv().await
        };
        match message {
            Some(message) => deliver(index, publisher.as_ref(), &config, message).await,
            None => break,
        }
    }
    tracing::debug!(worker = index, "publish worker exiting");
}

/// Deliver one message: up to `max_retries` attempts, each under its own
/// timeout, linear backoff in between. Exhaustion drops the message.
async fn deliver(
    worker: usize,
    publisher: &dyn ReservationPublisher,
    config: &PublishQueueConfig,
    message: PublishMessage,
) {
    let mut last_error = String::new();

    for attempt in 1..=config.max_retries.max(1) {
        let outcome = tokio::time::timeout(
            config.attempt_timeout,
            publisher.publish(message.action, &message.id),
        )
        .await;

        match outcome {
            Ok(Ok(())) => {
                tracing::info!(
                    worker,
                    action = %message.action,
                    reserva_id = %message.id,
                    attempt,
                    "event published"
                );
                return;
            }
            Ok(Err(err)) => {
                tracing::warn!(
                    worker,
                    action = %message.action,
                    reserva_id = %message.id,
                    attempt,
                    error = %err,
                    "publish attempt failed"
                );
                last_error = err.to_string();
            }
            Err(_) => {
                tracing::warn!(
                    worker,
                    action = %message.action,
                    reserva_id = %message.id,
                    attempt,
                    timeout_ms = config.attempt_timeout.as_millis(),
                    "publish attempt timed out"
                );
                last_error = "attempt timed out".to_string();
            }
        }

        if attempt < config.max_retries {
            tokio::time::sleep(config.base_backoff * attempt).await;
        }
    }

    // Intentional: no dead-letter store. The message is gone; only the log
    // remains.
    tracing::error!(
        worker,
        action = %message.action,
        reserva_id = %message.id,
        retries = config.max_retries,
        error = %last_error,
        "dropping event after exhausting retries"
    );
}
