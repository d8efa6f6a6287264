//! # Reservas Core
//!
//! Domain model and admission control for the Reservas platform.
//!
//! This crate holds everything the reservation engine needs to decide whether
//! a booking request may be accepted, independent of any transport or storage
//! technology:
//!
//! - The domain types ([`Reservation`], [`Activity`], [`ScheduleSlot`])
//! - The boundary traits implemented by infrastructure crates
//!   ([`ActivityDirectory`], [`ReservationRepository`], [`ReservationPublisher`])
//! - The [`AdmissionController`], which applies schedule membership, duplicate,
//!   overlap and capacity rules against fresh repository reads
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │  ReservationService  │  (reservas-service)
//! └──────────┬───────────┘
//!            │ admit()
//!            ▼
//! ┌──────────────────────┐     ┌─────────────────────┐
//! │ AdmissionController  │────►│  ActivityDirectory  │  (HTTP leaf)
//! └──────────┬───────────┘     └─────────────────────┘
//!            │
//!            ▼
//! ┌──────────────────────────┐
//! │  ReservationRepository   │  (persistence leaf)
//! └──────────────────────────┘
//! ```
//!
//! The controller holds no mutable state of its own: every decision is computed
//! against the repository's current reads. Two concurrent admissions for the
//! same (activity, slot, date) can therefore both pass the capacity check and
//! jointly overrun capacity; see [`AdmissionController`] for details.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod admission;
pub mod clock;
pub mod directory;
pub mod error;
pub mod publisher;
pub mod repository;
pub mod reservation;
pub mod schedule;

pub use admission::{AdmissionController, AdmissionRequest};
pub use clock::{Clock, SystemClock};
pub use directory::{Activity, ActivityDirectory, DirectoryError};
pub use error::AdmissionError;
pub use publisher::{PublishAction, PublishError, ReservationPublisher};
pub use repository::{RepositoryError, ReservationRepository};
pub use reservation::{Reservation, ReservationId, ReservationStatus, UserId};
pub use schedule::ScheduleSlot;
