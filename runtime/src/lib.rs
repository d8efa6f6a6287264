//! # Reservas Runtime
//!
//! Concurrency machinery shared by the Reservas services:
//!
//! - [`queue::PublishQueue`]: a bounded queue drained by a fixed worker pool
//!   that delivers domain-change notifications to the message broker with
//!   retry and linear backoff, decoupled from the mutation request path.
//! - [`orchestrator`]: the fork-join scope every mutating operation uses to
//!   run its independent checks in parallel under one timeout, with advisory
//!   cancellation on the first failure.
//!
//! Both are built on tokio channels and tasks; neither requires external
//! locking beyond the structures they own.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod orchestrator;
pub mod queue;

pub use orchestrator::{CancelSignal, OrchestratorError, Subtask, fork_join};
pub use queue::{EnqueueError, PublishMessage, PublishQueue, PublishQueueConfig};
