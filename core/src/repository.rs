//! Reservation repository boundary.
//!
//! Persistence plus the two aggregate queries admission control depends on.
//! Implementations own the status lifecycle and must exclude cancelled
//! reservations from the aggregate queries; date parameters are normalized to
//! start-of-day/end-of-day boundaries before matching.

use crate::reservation::{Reservation, ReservationId, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors from reservation persistence.
#[derive(Error, Debug, Clone)]
pub enum RepositoryError {
    /// No reservation with this id.
    #[error("reserva not found (id: {0})")]
    NotFound(String),

    /// The storage backend failed.
    #[error("repository backend error: {0}")]
    Backend(String),
}

/// Persistence and aggregate queries for reservations.
#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// All reservations (admin read).
    async fn list(&self) -> Result<Vec<Reservation>, RepositoryError>;

    /// Reservations held by a user.
    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Reservation>, RepositoryError>;

    /// Persist a new reservation, assigning its id and returning the stored copy.
    async fn create(&self, reservation: Reservation) -> Result<Reservation, RepositoryError>;

    /// Fetch a reservation by id.
    async fn get_by_id(&self, id: &ReservationId) -> Result<Reservation, RepositoryError>;

    /// Replace an existing reservation, returning the stored copy.
    async fn update(
        &self,
        id: &ReservationId,
        reservation: Reservation,
    ) -> Result<Reservation, RepositoryError>;

    /// Delete a reservation by id.
    async fn delete(&self, id: &ReservationId) -> Result<(), RepositoryError>;

    /// Sum of quota over active (non-cancelled) reservations for the given
    /// activity, slot and calendar day.
    async fn count_active_by_schedule(
        &self,
        activity_id: &str,
        schedule: &str,
        date: DateTime<Utc>,
    ) -> Result<u32, RepositoryError>;

    /// Whether the user already holds an active reservation for this exact
    /// activity, slot and calendar day.
    async fn exists_active_reservation(
        &self,
        user_id: UserId,
        activity_id: &str,
        schedule: &str,
        date: DateTime<Utc>,
    ) -> Result<bool, RepositoryError>;

    /// All active reservations held by the user on the given calendar day.
    async fn get_user_active_reservations_by_date(
        &self,
        user_id: UserId,
        date: DateTime<Utc>,
    ) -> Result<Vec<Reservation>, RepositoryError>;
}
