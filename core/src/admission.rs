//! Admission control: accept or reject a booking request before persistence.
//!
//! The controller applies, in order: field-level validation, activity lookup,
//! schedule membership, per-user duplicate and overlap scans, and the capacity
//! aggregate. Every rejection is typed ([`AdmissionError`]) and reported
//! synchronously; nothing is retried here.
//!
//! # Check-then-act race
//!
//! The capacity check reads the repository's current aggregate and the insert
//! happens later, outside this controller, with no transactional guard. Two
//! concurrent admissions for the same (activity, slot, date) can both pass the
//! check and jointly overrun `max_capacity`. This mirrors the observed design
//! of the platform; hardening it (optimistic locking, atomic
//! increment-and-check) would be a new repository contract.

use crate::clock::Clock;
use crate::directory::{Activity, ActivityDirectory, DirectoryError};
use crate::error::AdmissionError;
use crate::repository::{RepositoryError, ReservationRepository};
use crate::reservation::{ReservationId, UserId};
use crate::schedule::ScheduleSlot;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

/// A booking request under admission.
#[derive(Debug, Clone)]
pub struct AdmissionRequest {
    /// Activity to book.
    pub activity_id: String,
    /// Requested slot, "Weekday HH:MM".
    pub schedule: String,
    /// Calendar day of the booking.
    pub date: DateTime<Utc>,
    /// Seats requested.
    pub quota: u32,
    /// Users that will hold the reservation.
    pub user_ids: Vec<UserId>,
    /// Reservation id to ignore in the conflict scan. Set when validating an
    /// update so the reservation does not conflict with itself.
    pub exclude: Option<ReservationId>,
}

/// Decides whether a booking request may be accepted against an activity's
/// schedule and capacity.
///
/// Holds no mutable state; every decision is freshly computed against the
/// directory and repository.
#[derive(Clone)]
pub struct AdmissionController {
    directory: Arc<dyn ActivityDirectory>,
    repository: Arc<dyn ReservationRepository>,
    clock: Arc<dyn Clock>,
}

impl AdmissionController {
    /// Wire the controller to its two read-only leaves.
    pub fn new(
        directory: Arc<dyn ActivityDirectory>,
        repository: Arc<dyn ReservationRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            directory,
            repository,
            clock,
        }
    }

    /// Admit or reject the request.
    ///
    /// On acceptance returns the activity snapshot the decision was made
    /// against, so callers can reuse its name and duration.
    ///
    /// # Errors
    ///
    /// Any [`AdmissionError`] variant; see the module docs for the order in
    /// which checks run.
    pub async fn admit(&self, request: &AdmissionRequest) -> Result<Activity, AdmissionError> {
        self.check_fields(request)?;
        let requested_slot = ScheduleSlot::parse(&request.schedule)?;

        // Directory failure aborts the whole admission; no partial commit.
        let activity = self.directory.get_activity(&request.activity_id).await?;

        if !activity.schedule.iter().any(|s| s == &request.schedule) {
            return Err(AdmissionError::ScheduleNotFound {
                schedule: request.schedule.clone(),
            });
        }

        for &user_id in &request.user_ids {
            self.check_user_conflicts(request, &requested_slot, &activity, user_id)
                .await?;
        }

        let mut booked = self
            .repository
            .count_active_by_schedule(&request.activity_id, &request.schedule, request.date)
            .await?;
        if let Some(excluded) = &request.exclude {
            // The aggregate still counts the reservation being replaced; its
            // own seats must not block its re-admission.
            booked = booked.saturating_sub(self.excluded_quota(excluded, request).await?);
        }
        let available = i64::from(activity.max_capacity) - i64::from(booked);
        if i64::from(request.quota) > available {
            return Err(AdmissionError::CapacityExceeded {
                requested: request.quota,
                available,
            });
        }

        tracing::debug!(
            activity_id = %request.activity_id,
            schedule = %request.schedule,
            quota = request.quota,
            available,
            "admission accepted"
        );
        Ok(activity)
    }

    fn check_fields(&self, request: &AdmissionRequest) -> Result<(), AdmissionError> {
        if request.activity_id.trim().is_empty() {
            return Err(AdmissionError::Validation(
                "activity id is required and cannot be empty".into(),
            ));
        }
        if request.schedule.trim().is_empty() {
            return Err(AdmissionError::Validation(
                "schedule is required and cannot be empty".into(),
            ));
        }
        if request.quota == 0 {
            return Err(AdmissionError::Validation(
                "quota must be greater than zero".into(),
            ));
        }
        if request.user_ids.is_empty() {
            return Err(AdmissionError::Validation(
                "at least one user is required".into(),
            ));
        }
        // One minute of slack so requests racing the clock are not rejected.
        if request.date < self.clock.now() - Duration::minutes(1) {
            return Err(AdmissionError::Validation(
                "reservation date must not be in the past".into(),
            ));
        }
        Ok(())
    }

    /// Quota the excluded reservation holds against the requested
    /// (activity, slot, day) aggregate. Zero when it has vanished, was
    /// cancelled, or sits on a different slot.
    async fn excluded_quota(
        &self,
        id: &ReservationId,
        request: &AdmissionRequest,
    ) -> Result<u32, AdmissionError> {
        let existing = match self.repository.get_by_id(id).await {
            Ok(reservation) => reservation,
            Err(RepositoryError::NotFound(_)) => return Ok(0),
            Err(err) => return Err(err.into()),
        };
        let same_slot = existing.activity_id == request.activity_id
            && existing.schedule == request.schedule
            && existing.date.date_naive() == request.date.date_naive();
        if existing.is_active() && same_slot {
            Ok(existing.quota)
        } else {
            Ok(0)
        }
    }

    /// Duplicate and window-overlap scan for one user.
    async fn check_user_conflicts(
        &self,
        request: &AdmissionRequest,
        requested_slot: &ScheduleSlot,
        activity: &Activity,
        user_id: UserId,
    ) -> Result<(), AdmissionError> {
        // With an exclusion set (update validation) the shortcut would see
        // the reservation being replaced; the scan below handles duplicates
        // while skipping the excluded id.
        if request.exclude.is_none()
            && self
                .repository
                .exists_active_reservation(
                    user_id,
                    &request.activity_id,
                    &request.schedule,
                    request.date,
                )
                .await?
        {
            return Err(AdmissionError::DuplicateReservation);
        }

        let existing = self
            .repository
            .get_user_active_reservations_by_date(user_id, request.date)
            .await?;

        tracing::debug!(
            user_id,
            date = %request.date.date_naive(),
            count = existing.len(),
            "scanning existing reservations for conflicts"
        );

        for reservation in &existing {
            if request.exclude.as_ref() == Some(&reservation.id) {
                continue;
            }
            if reservation.activity_id == request.activity_id
                && reservation.schedule == request.schedule
            {
                return Err(AdmissionError::DuplicateReservation);
            }

            // The conflicting side's window length comes from its own activity.
            // An activity that has since been deleted cannot conflict.
            let other_activity = match self.directory.get_activity(&reservation.activity_id).await {
                Ok(activity) => activity,
                Err(DirectoryError::NotFound(id)) => {
                    tracing::debug!(activity_id = %id, "conflicting activity no longer exists, skipping");
                    continue;
                }
                Err(err) => return Err(err.into()),
            };

            let existing_slot = ScheduleSlot::parse(&reservation.schedule)?;
            if requested_slot.overlaps(
                activity.duration,
                &existing_slot,
                other_activity.duration,
            ) {
                return Err(AdmissionError::ScheduleConflict {
                    activity: other_activity.name,
                    conflicting_schedule: reservation.schedule.clone(),
                    schedule: request.schedule.clone(),
                });
            }
        }

        Ok(())
    }
}

// The admission controller tests live in `tests/admission.rs`: they rely on
// the in-memory mocks from `reservas-testing`, whose dev-dependency cycle
// back to this crate makes a unit-test module see two distinct builds of the
// boundary traits.
