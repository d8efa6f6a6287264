//! # Reservas Testing
//!
//! In-memory mocks and helpers for testing the reservation engine without a
//! database, an activities API or a message broker:
//!
//! - [`mocks::InMemoryReservationRepository`]: `HashMap`-backed repository
//!   with the same aggregate-query semantics as the production store
//! - [`mocks::InMemoryActivityDirectory`]: scriptable directory that can be
//!   flipped to "unavailable" to exercise failure paths
//! - [`mocks::RecordingPublisher`]: captures every delivery attempt and can
//!   be told to fail the first N attempts or fail forever
//! - [`mocks::FixedClock`]: deterministic time
//!
//! # Example
//!
//! ```
//! use reservas_testing::mocks::RecordingPublisher;
//!
//! let publisher = RecordingPublisher::new().fail_times(2);
//! assert_eq!(publisher.delivery_count(), 0);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod helpers;
pub mod mocks;
