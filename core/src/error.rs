//! Admission error taxonomy.
//!
//! Every rejection an admission decision can produce is typed and reported
//! synchronously to the caller. Nothing here is retried automatically: retries
//! belong to the publish pipeline, never to admission decisions.

use crate::directory::DirectoryError;
use crate::repository::RepositoryError;
use thiserror::Error;

/// Reasons a booking request is rejected, plus the boundary failures that
/// abort an admission decision.
#[derive(Error, Debug)]
pub enum AdmissionError {
    /// A field-level constraint failed (empty slot, non-positive quota,
    /// empty user set, malformed schedule string, past date).
    #[error("validation failed: {0}")]
    Validation(String),

    /// The requested slot is not in the activity's published schedule list.
    #[error("schedule '{schedule}' does not exist for this activity")]
    ScheduleNotFound {
        /// The slot that was requested.
        schedule: String,
    },

    /// The user already holds an active reservation for the same activity
    /// and slot on this date.
    #[error("an active reservation already exists for this activity, schedule and date")]
    DuplicateReservation,

    /// The window overlaps another active reservation of the same user on
    /// the same weekday.
    #[error(
        "schedule '{schedule}' overlaps an existing reservation of '{activity}' at '{conflicting_schedule}'"
    )]
    ScheduleConflict {
        /// Name of the activity already booked.
        activity: String,
        /// Slot of the conflicting reservation.
        conflicting_schedule: String,
        /// Slot that was requested.
        schedule: String,
    },

    /// The requested quota does not fit the activity's remaining capacity
    /// for this slot and date.
    #[error("insufficient capacity: requested {requested}, available {available}")]
    CapacityExceeded {
        /// Seats requested.
        requested: u32,
        /// Seats still available at decision time.
        available: i64,
    },

    /// The activity directory could not answer; the whole admission fails
    /// synchronously, no partial commit.
    #[error("activity lookup failed: {0}")]
    Directory(#[from] DirectoryError),

    /// A repository read failed during the decision.
    #[error("repository read failed: {0}")]
    Repository(#[from] RepositoryError),
}
