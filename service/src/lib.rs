//! # Reservas Service
//!
//! Composition root of the reservation platform: admission, fork-join
//! orchestration, persistence and reliable event publication behind one
//! [`ReservationService`].
//!
//! ```text
//! caller ──▶ ReservationService::create
//!               │
//!               ├── fork-join scope (one ~5 s deadline)
//!               │     ├── validate  (admission: directory + repository)
//!               │     ├── price     (simulated, cancellation-aware)
//!               │     └── enrich    (simulated, cancellation-aware)
//!               │
//!               ├── ReservationRepository::create
//!               └── PublishQueue::enqueue ──▶ workers ──▶ broker
//! ```
//!
//! The publish queue decouples broker delivery from the request path: a
//! mutation returns once its event is accepted by the queue, and workers
//! retry delivery with linear backoff in the background.
//!
//! Configuration comes from environment variables ([`Config::from_env`]);
//! [`bootstrap::build_service`] wires the HTTP directory client and the
//! Redpanda producer from it.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod service;

pub use bootstrap::{BootstrapError, build_service, init_tracing};
pub use config::Config;
pub use error::{ServiceError, TaskError};
pub use service::ReservationService;
