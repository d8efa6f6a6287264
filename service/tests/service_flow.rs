//! Mutation flows and the publication pipeline, end to end against mocks.

#![allow(clippy::unwrap_used, clippy::panic)]

use reservas_core::{Activity, PublishAction, ReservationStatus};
use reservas_runtime::{EnqueueError, PublishQueue, PublishQueueConfig};
use reservas_service::{ReservationService, ServiceError};
use reservas_testing::helpers::{activity, days_from_now, reservation};
use reservas_testing::mocks::{
    InMemoryActivityDirectory, InMemoryReservationRepository, RecordingPublisher,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

struct Harness {
    service: ReservationService,
    directory: Arc<InMemoryActivityDirectory>,
    repository: Arc<InMemoryReservationRepository>,
    publisher: Arc<RecordingPublisher>,
}

fn harness_with(publisher: RecordingPublisher) -> Harness {
    let directory = Arc::new(InMemoryActivityDirectory::new());
    let repository = Arc::new(InMemoryReservationRepository::new());
    let publisher = Arc::new(publisher);
    let config = PublishQueueConfig::builder()
        .base_backoff(Duration::from_millis(10))
        .build();
    let queue = Arc::new(PublishQueue::start(publisher.clone(), config));
    let service = ReservationService::new(directory.clone(), repository.clone(), queue);
    Harness {
        service,
        directory,
        repository,
        publisher,
    }
}

fn harness() -> Harness {
    harness_with(RecordingPublisher::new())
}

#[tokio::test]
async fn create_persists_and_publishes_create_event() {
    let h = harness();
    h.directory
        .insert(activity("yoga-101", "Yoga", "Monday 18:00", 60, 10));

    let created = h
        .service
        .create(reservation(
            "yoga-101",
            "Monday 18:00",
            days_from_now(7),
            2,
            42,
        ))
        .await
        .unwrap();

    assert!(!created.id.is_empty());
    assert_eq!(created.status, ReservationStatus::Pendiente);
    assert_eq!(h.repository.len(), 1);

    h.service.shutdown().await;
    assert_eq!(
        h.publisher.deliveries(),
        vec![(PublishAction::Create, created.id.as_str().to_string())]
    );
}

#[tokio::test]
async fn update_replaces_and_publishes_update_event() {
    let h = harness();
    h.directory
        .insert(activity("yoga-101", "Yoga", "Monday 18:00", 60, 10));
    let date = days_from_now(7);

    let created = h
        .service
        .create(reservation("yoga-101", "Monday 18:00", date, 1, 42))
        .await
        .unwrap();

    // Same user, same slot: the revision must not conflict with itself.
    let revised = reservation("yoga-101", "Monday 18:00", date, 3, 42);
    let updated = h.service.update(&created.id, revised).await.unwrap();

    assert_eq!(updated.id, created.id);
    assert_eq!(updated.quota, 3);
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at >= created.updated_at);

    h.service.shutdown().await;
    let actions: Vec<PublishAction> = h
        .publisher
        .deliveries()
        .into_iter()
        .map(|(action, _)| action)
        .collect();
    assert!(actions.contains(&PublishAction::Create));
    assert!(actions.contains(&PublishAction::Update));
}

#[tokio::test]
async fn update_of_a_full_slot_reservation_is_not_blocked_by_its_own_quota() {
    let h = harness();
    h.directory
        .insert(activity("yoga-101", "Yoga", "Monday 18:00", 60, 10));
    let date = days_from_now(7);

    // A single reservation fills the slot.
    let created = h
        .service
        .create(reservation("yoga-101", "Monday 18:00", date, 10, 42))
        .await
        .unwrap();

    // Revalidating the update must not count the replaced seats as booked.
    let unchanged = reservation("yoga-101", "Monday 18:00", date, 10, 42);
    let updated = h.service.update(&created.id, unchanged).await.unwrap();
    assert_eq!(updated.quota, 10);

    // Growing past capacity is still rejected.
    let oversized = reservation("yoga-101", "Monday 18:00", date, 11, 42);
    let result = h.service.update(&created.id, oversized).await;
    assert!(matches!(
        result,
        Err(ServiceError::Admission(
            reservas_core::AdmissionError::CapacityExceeded {
                requested: 11,
                available: 10,
            }
        ))
    ));

    h.service.shutdown().await;
}

#[tokio::test]
async fn update_of_unknown_id_is_not_found() {
    let h = harness();
    h.directory
        .insert(activity("yoga-101", "Yoga", "Monday 18:00", 60, 10));

    let result = h
        .service
        .update(
            &"missing".into(),
            reservation("yoga-101", "Monday 18:00", days_from_now(7), 1, 42),
        )
        .await;
    assert!(matches!(result, Err(ServiceError::NotFound(id)) if id == "missing"));

    h.service.shutdown().await;
}

#[tokio::test]
async fn delete_removes_and_publishes_delete_event() {
    let h = harness();
    h.directory
        .insert(activity("yoga-101", "Yoga", "Monday 18:00", 60, 10));

    let created = h
        .service
        .create(reservation(
            "yoga-101",
            "Monday 18:00",
            days_from_now(7),
            1,
            42,
        ))
        .await
        .unwrap();

    h.service.delete(&created.id).await.unwrap();
    assert!(h.repository.is_empty());

    h.service.shutdown().await;
    let actions: Vec<PublishAction> = h
        .publisher
        .deliveries()
        .into_iter()
        .map(|(action, _)| action)
        .collect();
    assert_eq!(actions.last(), Some(&PublishAction::Delete));
}

#[tokio::test]
async fn confirmed_reservation_cannot_be_deleted() {
    let h = harness();
    h.directory
        .insert(activity("yoga-101", "Yoga", "Monday 18:00", 60, 10));

    let created = h
        .service
        .create(reservation(
            "yoga-101",
            "Monday 18:00",
            days_from_now(7),
            1,
            42,
        ))
        .await
        .unwrap();

    // Confirm it behind the service's back.
    let mut confirmed = created.clone();
    confirmed.status = ReservationStatus::Confirmada;
    use reservas_core::ReservationRepository;
    h.repository
        .update(&created.id, confirmed)
        .await
        .unwrap();

    let result = h.service.delete(&created.id).await;
    assert!(matches!(result, Err(ServiceError::ConfirmedReservation)));
    assert_eq!(h.repository.len(), 1);

    h.service.shutdown().await;
}

#[tokio::test]
async fn validation_failure_returns_well_before_scope_deadline() {
    let h = harness();
    // No activity registered: admission fails on the directory lookup while
    // the price and enrichment branches are still sleeping.

    let started = Instant::now();
    let result = h
        .service
        .create(reservation(
            "yoga-101",
            "Monday 18:00",
            days_from_now(7),
            1,
            42,
        ))
        .await;
    let elapsed = started.elapsed();

    assert!(matches!(result, Err(ServiceError::Admission(_))));
    assert!(
        elapsed < Duration::from_secs(2),
        "fail-fast took {elapsed:?}"
    );
    assert!(h.repository.is_empty());

    h.service.shutdown().await;
}

#[tokio::test]
async fn delivery_retries_until_success() {
    let h = harness_with(RecordingPublisher::new().fail_times(2));
    h.directory
        .insert(activity("yoga-101", "Yoga", "Monday 18:00", 60, 10));

    h.service
        .create(reservation(
            "yoga-101",
            "Monday 18:00",
            days_from_now(7),
            1,
            42,
        ))
        .await
        .unwrap();

    h.service.shutdown().await;
    assert_eq!(h.publisher.attempt_count(), 3);
    assert_eq!(h.publisher.delivery_count(), 1);
}

#[tokio::test]
async fn mutation_after_shutdown_persists_but_reports_queue_refusal() {
    let h = harness();
    h.directory
        .insert(activity("yoga-101", "Yoga", "Monday 18:00", 60, 10));

    h.service.shutdown().await;

    let result = h
        .service
        .create(reservation(
            "yoga-101",
            "Monday 18:00",
            days_from_now(7),
            1,
            42,
        ))
        .await;
    assert!(matches!(
        result,
        Err(ServiceError::Queue(EnqueueError::Stopping))
    ));
    // The write happened before the queue refused the event.
    assert_eq!(h.repository.len(), 1);
}

#[tokio::test]
async fn schedule_availability_reports_remaining_seats_per_slot() {
    let h = harness();
    h.directory.insert(Activity {
        id: "yoga-101".to_string(),
        name: "Yoga".to_string(),
        max_capacity: 10,
        schedule: vec!["Monday 18:00".to_string(), "Wednesday 07:00".to_string()],
        duration: 60,
    });
    let date = days_from_now(7);

    h.service
        .create(reservation("yoga-101", "Monday 18:00", date, 4, 42))
        .await
        .unwrap();

    let availability = h
        .service
        .schedule_availability("yoga-101", date)
        .await
        .unwrap();
    assert_eq!(availability.get("Monday 18:00"), Some(&6));
    assert_eq!(availability.get("Wednesday 07:00"), Some(&10));

    h.service.shutdown().await;
}

#[tokio::test]
async fn reads_go_straight_to_the_repository() {
    let h = harness();
    h.directory
        .insert(activity("yoga-101", "Yoga", "Monday 18:00", 60, 10));
    let date = days_from_now(7);

    let first = h
        .service
        .create(reservation("yoga-101", "Monday 18:00", date, 1, 42))
        .await
        .unwrap();
    h.service
        .create(reservation("yoga-101", "Monday 18:00", date, 1, 43))
        .await
        .unwrap();

    assert_eq!(h.service.list().await.unwrap().len(), 2);
    assert_eq!(h.service.list_by_user(42).await.unwrap().len(), 1);
    assert_eq!(h.service.get_by_id(&first.id).await.unwrap().id, first.id);
    assert!(matches!(
        h.service.get_by_id(&"missing".into()).await,
        Err(ServiceError::NotFound(_))
    ));

    h.service.shutdown().await;
}
