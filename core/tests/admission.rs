//! Admission controller tests, exercised against the in-memory mocks from
//! `reservas-testing`. These live as an integration test (not a unit test
//! module) because the dev-dependency cycle core -> testing -> core would
//! otherwise pit two builds of the crate's traits against each other.

#![allow(clippy::unwrap_used)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use reservas_core::clock::SystemClock;
use reservas_core::{
    AdmissionController, AdmissionError, AdmissionRequest, DirectoryError, UserId,
};
use reservas_testing::helpers::{activity, days_from_now, reservation};
use reservas_testing::mocks::{FixedClock, InMemoryActivityDirectory, InMemoryReservationRepository};
use std::sync::Arc;

struct Setup {
    directory: Arc<InMemoryActivityDirectory>,
    repository: Arc<InMemoryReservationRepository>,
    controller: AdmissionController,
}

fn setup() -> Setup {
    let directory = Arc::new(InMemoryActivityDirectory::new());
    let repository = Arc::new(InMemoryReservationRepository::new());
    let controller = AdmissionController::new(
        directory.clone(),
        repository.clone(),
        Arc::new(SystemClock),
    );
    Setup {
        directory,
        repository,
        controller,
    }
}

fn request(
    activity_id: &str,
    schedule: &str,
    date: DateTime<Utc>,
    quota: u32,
    user_id: UserId,
) -> AdmissionRequest {
    AdmissionRequest {
        activity_id: activity_id.to_string(),
        schedule: schedule.to_string(),
        date,
        quota,
        user_ids: vec![user_id],
        exclude: None,
    }
}

#[tokio::test]
async fn accepts_and_returns_the_activity_snapshot() {
    let s = setup();
    s.directory
        .insert(activity("yoga-101", "Yoga", "Monday 18:00", 60, 10));

    let admitted = s
        .controller
        .admit(&request("yoga-101", "Monday 18:00", days_from_now(7), 2, 42))
        .await
        .unwrap();
    assert_eq!(admitted.name, "Yoga");
    assert_eq!(admitted.duration, 60);
}

#[tokio::test]
async fn past_date_check_allows_one_minute_of_slack() {
    let now = Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap();
    let s = setup();
    let controller = AdmissionController::new(
        s.directory.clone(),
        s.repository.clone(),
        Arc::new(FixedClock::new(now)),
    );
    s.directory
        .insert(activity("yoga-101", "Yoga", "Monday 18:00", 60, 10));

    // 30 seconds in the past is within the slack window.
    let recent = controller
        .admit(&request(
            "yoga-101",
            "Monday 18:00",
            now - Duration::seconds(30),
            1,
            42,
        ))
        .await;
    assert!(recent.is_ok());

    let stale = controller
        .admit(&request(
            "yoga-101",
            "Monday 18:00",
            now - Duration::minutes(2),
            1,
            42,
        ))
        .await;
    assert!(matches!(stale, Err(AdmissionError::Validation(_))));
}

#[tokio::test]
async fn excluded_reservation_does_not_conflict_with_itself() {
    use reservas_core::repository::ReservationRepository as _;

    let s = setup();
    s.directory
        .insert(activity("yoga-101", "Yoga", "Monday 18:00", 60, 10));
    let date = days_from_now(7);
    let existing = s
        .repository
        .create(reservation("yoga-101", "Monday 18:00", date, 1, 42))
        .await
        .unwrap();

    let mut revalidation = request("yoga-101", "Monday 18:00", date, 3, 42);
    revalidation.exclude = Some(existing.id.clone());
    assert!(s.controller.admit(&revalidation).await.is_ok());

    // Without the exclusion the same request is an exact duplicate.
    let fresh = request("yoga-101", "Monday 18:00", date, 3, 42);
    assert!(matches!(
        s.controller.admit(&fresh).await,
        Err(AdmissionError::DuplicateReservation)
    ));
}

#[tokio::test]
async fn excluded_reservation_releases_its_quota_for_revalidation() {
    use reservas_core::repository::ReservationRepository as _;

    let s = setup();
    s.directory
        .insert(activity("yoga-101", "Yoga", "Monday 18:00", 60, 10));
    let date = days_from_now(7);
    let existing = s
        .repository
        .create(reservation("yoga-101", "Monday 18:00", date, 10, 42))
        .await
        .unwrap();

    // The slot is full, but the seats are the excluded reservation's own.
    let mut revalidation = request("yoga-101", "Monday 18:00", date, 10, 42);
    revalidation.exclude = Some(existing.id.clone());
    assert!(s.controller.admit(&revalidation).await.is_ok());

    // Another user's seats still count toward the aggregate.
    s.repository
        .create(reservation("yoga-101", "Monday 18:00", date, 3, 77))
        .await
        .unwrap();
    let over = s.controller.admit(&revalidation).await;
    assert!(matches!(
        over,
        Err(AdmissionError::CapacityExceeded {
            requested: 10,
            available: 7,
        })
    ));
}

#[tokio::test]
async fn conflicting_reservation_with_vanished_activity_is_skipped() {
    use reservas_core::repository::ReservationRepository as _;

    let s = setup();
    s.directory
        .insert(activity("yoga-101", "Yoga", "Monday 18:00", 60, 10));
    s.directory
        .insert(activity("boxing-201", "Boxing", "Monday 18:30", 45, 10));
    let date = days_from_now(7);
    s.repository
        .create(reservation("yoga-101", "Monday 18:00", date, 1, 42))
        .await
        .unwrap();

    // While yoga exists the overlapping boxing request conflicts.
    let conflicted = s
        .controller
        .admit(&request("boxing-201", "Monday 18:30", date, 1, 42))
        .await;
    assert!(matches!(
        conflicted,
        Err(AdmissionError::ScheduleConflict { .. })
    ));

    // Once yoga is gone from the directory its reservation cannot
    // conflict any more.
    s.directory.remove("yoga-101");
    assert!(
        s.controller
            .admit(&request("boxing-201", "Monday 18:30", date, 1, 42))
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn malformed_existing_slot_fails_closed() {
    use reservas_core::repository::ReservationRepository as _;

    let s = setup();
    s.directory
        .insert(activity("yoga-101", "Yoga", "Monday 18:00", 60, 10));
    s.directory
        .insert(activity("weird-301", "Weird", "Monday 18h00", 60, 10));
    let date = days_from_now(7);
    s.repository
        .create(reservation("weird-301", "Monday 18h00", date, 1, 42))
        .await
        .unwrap();

    let result = s
        .controller
        .admit(&request("yoga-101", "Monday 18:00", date, 1, 42))
        .await;
    assert!(matches!(result, Err(AdmissionError::Validation(_))));
}

#[tokio::test]
async fn directory_outage_aborts_the_decision() {
    let s = setup();
    s.directory
        .insert(activity("yoga-101", "Yoga", "Monday 18:00", 60, 10));
    s.directory.set_unavailable(true);

    let result = s
        .controller
        .admit(&request("yoga-101", "Monday 18:00", days_from_now(7), 1, 42))
        .await;
    assert!(matches!(
        result,
        Err(AdmissionError::Directory(DirectoryError::Unavailable(_)))
    ));
}
