//! Mock implementations of the platform's boundary traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reservas_core::clock::Clock;
use reservas_core::directory::{Activity, ActivityDirectory, DirectoryError};
use reservas_core::publisher::{PublishAction, PublishError, ReservationPublisher};
use reservas_core::repository::{RepositoryError, ReservationRepository};
use reservas_core::reservation::{Reservation, ReservationId, UserId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use uuid::Uuid;

/// Fixed clock for deterministic tests. Always returns the same instant.
#[derive(Debug, Clone)]
pub struct FixedClock {
    time: DateTime<Utc>,
}

impl FixedClock {
    /// Create a fixed clock frozen at the given time.
    #[must_use]
    pub const fn new(time: DateTime<Utc>) -> Self {
        Self { time }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.time
    }
}

/// Scriptable activity directory backed by a `HashMap`.
#[derive(Default)]
pub struct InMemoryActivityDirectory {
    activities: Mutex<HashMap<String, Activity>>,
    unavailable: AtomicBool,
}

impl InMemoryActivityDirectory {
    /// Empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an activity, replacing any previous one with the same id.
    pub fn insert(&self, activity: Activity) {
        if let Ok(mut guard) = self.activities.lock() {
            guard.insert(activity.id.clone(), activity);
        }
    }

    /// Remove an activity, simulating deletion from the directory.
    pub fn remove(&self, id: &str) {
        if let Ok(mut guard) = self.activities.lock() {
            guard.remove(id);
        }
    }

    /// When set, every lookup fails with [`DirectoryError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

#[async_trait]
impl ActivityDirectory for InMemoryActivityDirectory {
    async fn get_activity(&self, id: &str) -> Result<Activity, DirectoryError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DirectoryError::Unavailable(
                "directory marked unavailable".to_string(),
            ));
        }
        let guard = self
            .activities
            .lock()
            .map_err(|_| DirectoryError::Unavailable("directory state poisoned".to_string()))?;
        guard
            .get(id)
            .cloned()
            .ok_or_else(|| DirectoryError::NotFound(id.to_string()))
    }
}

/// `HashMap`-backed repository with the same aggregate-query semantics as
/// the production store: cancelled reservations are excluded and dates match
/// on the calendar day.
#[derive(Default)]
pub struct InMemoryReservationRepository {
    store: Mutex<HashMap<String, Reservation>>,
}

impl InMemoryReservationRepository {
    /// Empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored reservations, any status.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    #[allow(clippy::unwrap_used)]
    pub fn len(&self) -> usize {
        self.store.lock().unwrap().len()
    }

    /// Whether the repository holds no reservations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn guard(&self) -> Result<MutexGuard<'_, HashMap<String, Reservation>>, RepositoryError> {
        self.store
            .lock()
            .map_err(|_| RepositoryError::Backend("repository state poisoned".to_string()))
    }
}

fn same_day(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    a.date_naive() == b.date_naive()
}

#[async_trait]
impl ReservationRepository for InMemoryReservationRepository {
    async fn list(&self) -> Result<Vec<Reservation>, RepositoryError> {
        Ok(self.guard()?.values().cloned().collect())
    }

    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Reservation>, RepositoryError> {
        Ok(self
            .guard()?
            .values()
            .filter(|r| r.user_ids.contains(&user_id))
            .cloned()
            .collect())
    }

    async fn create(&self, mut reservation: Reservation) -> Result<Reservation, RepositoryError> {
        if reservation.id.is_empty() {
            reservation.id = ReservationId::new(Uuid::new_v4().to_string());
        }
        let mut guard = self.guard()?;
        guard.insert(reservation.id.as_str().to_string(), reservation.clone());
        Ok(reservation)
    }

    async fn get_by_id(&self, id: &ReservationId) -> Result<Reservation, RepositoryError> {
        self.guard()?
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))
    }

    async fn update(
        &self,
        id: &ReservationId,
        mut reservation: Reservation,
    ) -> Result<Reservation, RepositoryError> {
        let mut guard = self.guard()?;
        if !guard.contains_key(id.as_str()) {
            return Err(RepositoryError::NotFound(id.to_string()));
        }
        reservation.id = id.clone();
        guard.insert(id.as_str().to_string(), reservation.clone());
        Ok(reservation)
    }

    async fn delete(&self, id: &ReservationId) -> Result<(), RepositoryError> {
        self.guard()?
            .remove(id.as_str())
            .map(|_| ())
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))
    }

    async fn count_active_by_schedule(
        &self,
        activity_id: &str,
        schedule: &str,
        date: DateTime<Utc>,
    ) -> Result<u32, RepositoryError> {
        Ok(self
            .guard()?
            .values()
            .filter(|r| {
                r.is_active()
                    && r.activity_id == activity_id
                    && r.schedule == schedule
                    && same_day(r.date, date)
            })
            .map(|r| r.quota)
            .sum())
    }

    async fn exists_active_reservation(
        &self,
        user_id: UserId,
        activity_id: &str,
        schedule: &str,
        date: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        Ok(self.guard()?.values().any(|r| {
            r.is_active()
                && r.user_ids.contains(&user_id)
                && r.activity_id == activity_id
                && r.schedule == schedule
                && same_day(r.date, date)
        }))
    }

    async fn get_user_active_reservations_by_date(
        &self,
        user_id: UserId,
        date: DateTime<Utc>,
    ) -> Result<Vec<Reservation>, RepositoryError> {
        Ok(self
            .guard()?
            .values()
            .filter(|r| r.is_active() && r.user_ids.contains(&user_id) && same_day(r.date, date))
            .cloned()
            .collect())
    }
}

/// Publisher that records every attempt and delivery, with scriptable
/// failures for exercising the publish queue's retry and drop paths.
#[derive(Default)]
pub struct RecordingPublisher {
    deliveries: Mutex<Vec<(PublishAction, String)>>,
    attempts: AtomicUsize,
    fail_remaining: AtomicUsize,
    fail_forever: AtomicBool,
    delay: Option<Duration>,
}

impl RecordingPublisher {
    /// Publisher that succeeds immediately on every attempt.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the first `n` attempts, then succeed.
    #[must_use]
    pub fn fail_times(self, n: usize) -> Self {
        self.fail_remaining.store(n, Ordering::SeqCst);
        self
    }

    /// Fail every attempt.
    #[must_use]
    pub fn always_fail(self) -> Self {
        self.fail_forever.store(true, Ordering::SeqCst);
        self
    }

    /// Sleep this long inside every attempt, simulating broker latency.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Total attempts seen, successful or not.
    #[must_use]
    pub fn attempt_count(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Number of successful deliveries.
    #[must_use]
    pub fn delivery_count(&self) -> usize {
        self.deliveries
            .lock()
            .map(|guard| guard.len())
            .unwrap_or(0)
    }

    /// Every successful delivery, in completion order.
    #[must_use]
    pub fn deliveries(&self) -> Vec<(PublishAction, String)> {
        self.deliveries
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ReservationPublisher for RecordingPublisher {
    async fn publish(
        &self,
        action: PublishAction,
        reservation_id: &str,
    ) -> Result<(), PublishError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let scripted_failure = self
            .fail_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if scripted_failure || self.fail_forever.load(Ordering::SeqCst) {
            return Err(PublishError::Failed {
                id: reservation_id.to_string(),
                reason: "scripted failure".to_string(),
            });
        }

        if let Ok(mut guard) = self.deliveries.lock() {
            guard.push((action, reservation_id.to_string()));
        }
        Ok(())
    }
}
