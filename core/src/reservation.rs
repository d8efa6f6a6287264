//! Reservation domain types.
//!
//! A [`Reservation`] books `quota` seats of an activity's schedule slot on a
//! calendar day for a set of users. Its status lifecycle is owned exclusively
//! by the repository; the admission controller only reads snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a user holding a reservation.
pub type UserId = i64;

/// Opaque reservation identifier, assigned by the repository at creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct ReservationId(pub String);

impl ReservationId {
    /// Create an id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the id has not been assigned yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for ReservationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ReservationId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Lifecycle status of a reservation.
///
/// Created as `Pendiente` (or caller-supplied), confirmed by an external
/// workflow, and cancelled as the terminal state. A cancelled reservation
/// releases its quota and no longer participates in conflict scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    /// Awaiting confirmation. Counts against capacity.
    #[default]
    Pendiente,
    /// Confirmed by the external workflow. Counts against capacity and is
    /// policy-blocked from direct deletion.
    Confirmada,
    /// Terminal. Releases quota and is excluded from admission checks.
    Cancelada,
}

impl ReservationStatus {
    /// Whether the reservation still holds seats against capacity.
    #[must_use]
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Cancelada)
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Pendiente => "pendiente",
            Self::Confirmada => "confirmada",
            Self::Cancelada => "cancelada",
        };
        f.write_str(label)
    }
}

/// A booking of seats against an activity's schedule slot on a calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    /// Opaque id, empty until the repository assigns one.
    pub id: ReservationId,
    /// Id of the booked activity.
    pub activity_id: String,
    /// Schedule slot string, "Weekday HH:MM" (e.g. "Lunes 20:00").
    pub schedule: String,
    /// Calendar day of the booking. Repository queries normalize this to
    /// start-of-day/end-of-day boundaries.
    pub date: DateTime<Utc>,
    /// Seats consumed against the activity's capacity (cupo). Always > 0.
    pub quota: u32,
    /// Users holding the reservation. Never empty.
    pub user_ids: Vec<UserId>,
    /// Lifecycle status, owned by the repository. Absent on the wire at
    /// creation time; defaults to [`ReservationStatus::Pendiente`].
    #[serde(default)]
    pub status: ReservationStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Reservation {
    /// Whether this reservation still counts against capacity.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_to_lowercase_spanish() {
        let json = serde_json::to_string(&ReservationStatus::Confirmada).unwrap();
        assert_eq!(json, "\"confirmada\"");

        let parsed: ReservationStatus = serde_json::from_str("\"cancelada\"").unwrap();
        assert_eq!(parsed, ReservationStatus::Cancelada);
    }

    #[test]
    fn cancelled_is_not_active() {
        assert!(ReservationStatus::Pendiente.is_active());
        assert!(ReservationStatus::Confirmada.is_active());
        assert!(!ReservationStatus::Cancelada.is_active());
    }

    #[test]
    fn default_status_is_pendiente() {
        assert_eq!(ReservationStatus::default(), ReservationStatus::Pendiente);
    }

    #[test]
    fn reservation_without_status_key_deserializes_as_pendiente() {
        let json = r#"{
            "id": "",
            "activity_id": "yoga-101",
            "schedule": "Lunes 20:00",
            "date": "2026-09-07T00:00:00Z",
            "quota": 2,
            "user_ids": [42],
            "created_at": "2026-08-29T10:00:00Z",
            "updated_at": "2026-08-29T10:00:00Z"
        }"#;
        let parsed: Reservation = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.status, ReservationStatus::Pendiente);
    }
}
