//! Small builders shared by the platform's test suites.

use chrono::{DateTime, Duration, Utc};
use reservas_core::directory::Activity;
use reservas_core::reservation::{Reservation, ReservationId, ReservationStatus, UserId};

/// A date the given number of days in the future, safely past the admission
/// controller's past-date check.
#[must_use]
pub fn days_from_now(days: i64) -> DateTime<Utc> {
    Utc::now() + Duration::days(days)
}

/// An activity with one schedule slot, for admission scenarios.
#[must_use]
pub fn activity(id: &str, name: &str, slot: &str, duration: u32, max_capacity: u32) -> Activity {
    Activity {
        id: id.to_string(),
        name: name.to_string(),
        max_capacity,
        schedule: vec![slot.to_string()],
        duration,
    }
}

/// A pending reservation for one user, not yet persisted (empty id).
#[must_use]
pub fn reservation(
    activity_id: &str,
    schedule: &str,
    date: DateTime<Utc>,
    quota: u32,
    user_id: UserId,
) -> Reservation {
    let now = Utc::now();
    Reservation {
        id: ReservationId::default(),
        activity_id: activity_id.to_string(),
        schedule: schedule.to_string(),
        date,
        quota,
        user_ids: vec![user_id],
        status: ReservationStatus::Pendiente,
        created_at: now,
        updated_at: now,
    }
}
