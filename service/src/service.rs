//! The reservation service composition root.
//!
//! Every mutation follows the same shape: run the operation's independent
//! subtasks in a fork-join scope, persist through the repository, then hand a
//! `{action, id}` notification to the publish queue. Delivery failures stay
//! inside the queue's worker pool; only enqueue-time refusals (the queue
//! draining for shutdown) reach the mutation caller, and by then the
//! mutation has already been persisted.

use crate::error::{ServiceError, TaskError};
use chrono::{DateTime, Utc};
use reservas_core::{
    Activity, ActivityDirectory, AdmissionController, AdmissionRequest, Clock, PublishAction,
    Reservation, ReservationId, ReservationRepository, ReservationStatus, SystemClock, UserId,
};
use reservas_runtime::{CancelSignal, PublishQueue, Subtask, fork_join};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

/// Default deadline for one fork-join scope.
pub const DEFAULT_ORCHESTRATOR_TIMEOUT: Duration = Duration::from_secs(5);

/// Base price of any reservation.
const BASE_PRICE: f64 = 10.0;
/// Surcharge applied to premium activities.
const PREMIUM_SURCHARGE: f64 = 20.0;
/// Simulated latency of the price computation.
const PRICE_LATENCY: Duration = Duration::from_millis(100);
/// Simulated latency of the enrichment call.
const ENRICHMENT_LATENCY: Duration = Duration::from_millis(50);
/// Simulated latency of preparing an audit note.
const AUDIT_LATENCY: Duration = Duration::from_millis(20);

/// Output of one orchestrated subtask.
enum TaskOutput {
    Validated(Activity),
    Price(f64),
    Note(String),
    Existing(Reservation),
    AuditReady,
}

/// Reservation lifecycle operations over pluggable boundaries.
pub struct ReservationService {
    directory: Arc<dyn ActivityDirectory>,
    repository: Arc<dyn ReservationRepository>,
    queue: Arc<PublishQueue>,
    admission: AdmissionController,
    orchestrator_timeout: Duration,
}

impl ReservationService {
    /// Wire the service to its boundaries. The admission controller shares
    /// the same directory and repository and reads the system clock.
    #[must_use]
    pub fn new(
        directory: Arc<dyn ActivityDirectory>,
        repository: Arc<dyn ReservationRepository>,
        queue: Arc<PublishQueue>,
    ) -> Self {
        let admission = AdmissionController::new(
            Arc::clone(&directory),
            Arc::clone(&repository),
            Arc::new(SystemClock),
        );
        Self {
            directory,
            repository,
            queue,
            admission,
            orchestrator_timeout: DEFAULT_ORCHESTRATOR_TIMEOUT,
        }
    }

    /// Replace the admission controller's clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.admission = AdmissionController::new(
            Arc::clone(&self.directory),
            Arc::clone(&self.repository),
            clock,
        );
        self
    }

    /// Override the fork-join scope deadline.
    #[must_use]
    pub const fn with_orchestrator_timeout(mut self, timeout: Duration) -> Self {
        self.orchestrator_timeout = timeout;
        self
    }

    /// All reservations.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Repository`] when the backing store fails.
    pub async fn list(&self) -> Result<Vec<Reservation>, ServiceError> {
        Ok(self.repository.list().await?)
    }

    /// Reservations held by one user.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Repository`] when the backing store fails.
    pub async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Reservation>, ServiceError> {
        Ok(self.repository.list_by_user(user_id).await?)
    }

    /// One reservation by id.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotFound`] for an unknown id.
    pub async fn get_by_id(&self, id: &ReservationId) -> Result<Reservation, ServiceError> {
        Ok(self.repository.get_by_id(id).await?)
    }

    /// Admit and persist a new reservation, then enqueue a `create` event.
    ///
    /// Validation, price computation and enrichment run concurrently in one
    /// fork-join scope; any failure rejects the whole request before
    /// anything is written.
    ///
    /// # Errors
    ///
    /// Admission rejections as [`ServiceError::Admission`];
    /// [`ServiceError::Timeout`] when the scope deadline elapses;
    /// [`ServiceError::Queue`] when the reservation was persisted but the
    /// queue is draining and refused the event.
    pub async fn create(&self, reservation: Reservation) -> Result<Reservation, ServiceError> {
        let cancel = CancelSignal::new();

        let admission = self.admission.clone();
        let request = admission_request(&reservation, None);
        let validate: Subtask<TaskOutput, TaskError> = Subtask::new("validate", async move {
            let activity = admission.admit(&request).await?;
            Ok(TaskOutput::Validated(activity))
        });

        let price_cancel = cancel.clone();
        let price_activity = reservation.activity_id.clone();
        let price = Subtask::new("price", async move {
            let amount = simulate_price(&price_activity, &price_cancel).await?;
            Ok(TaskOutput::Price(amount))
        });

        let enrich_cancel = cancel.clone();
        let enrich_activity = reservation.activity_id.clone();
        let enrich = Subtask::new("enrich", async move {
            let note = simulate_enrichment(&enrich_activity, &enrich_cancel).await?;
            Ok(TaskOutput::Note(note))
        });

        let outputs = fork_join(
            self.orchestrator_timeout,
            cancel,
            vec![validate, price, enrich],
        )
        .await?;

        for (_, output) in outputs {
            match output {
                TaskOutput::Price(amount) => tracing::info!(amount, "calculated price"),
                TaskOutput::Note(note) => tracing::info!(%note, "enrichment note"),
                _ => {}
            }
        }

        let created = self.repository.create(reservation).await?;
        tracing::info!(id = %created.id, activity_id = %created.activity_id, "reserva created");

        self.queue
            .enqueue(PublishAction::Create, created.id.as_str())
            .await?;

        Ok(created)
    }

    /// Re-admit and replace an existing reservation, then enqueue an
    /// `update` event.
    ///
    /// Fetching the current revision and validating the new one run
    /// concurrently; the reservation under update is excluded from the
    /// conflict scan so it never conflicts with itself. The stored revision
    /// keeps its `created_at` and gets a fresh `updated_at`.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotFound`] for an unknown id, plus everything
    /// [`Self::create`] can return.
    pub async fn update(
        &self,
        id: &ReservationId,
        mut reservation: Reservation,
    ) -> Result<Reservation, ServiceError> {
        let cancel = CancelSignal::new();

        let repository = Arc::clone(&self.repository);
        let fetch_id = id.clone();
        let fetch: Subtask<TaskOutput, TaskError> = Subtask::new("fetch", async move {
            let existing = repository.get_by_id(&fetch_id).await?;
            Ok(TaskOutput::Existing(existing))
        });

        let admission = self.admission.clone();
        let request = admission_request(&reservation, Some(id.clone()));
        let validate = Subtask::new("validate", async move {
            let activity = admission.admit(&request).await?;
            Ok(TaskOutput::Validated(activity))
        });

        let outputs = fork_join(self.orchestrator_timeout, cancel, vec![fetch, validate]).await?;

        if let Some(existing) = take_existing(outputs) {
            tracing::debug!(
                id = %existing.id,
                activity_id = %existing.activity_id,
                "fetched existing reserva"
            );
            reservation.created_at = existing.created_at;
        }
        reservation.id = id.clone();
        reservation.updated_at = Utc::now();

        let updated = self.repository.update(id, reservation).await?;
        tracing::info!(id = %updated.id, "reserva updated");

        self.queue
            .enqueue(PublishAction::Update, updated.id.as_str())
            .await?;

        Ok(updated)
    }

    /// Delete a reservation, then enqueue a `delete` event.
    ///
    /// Fetching the reservation and preparing the audit note run
    /// concurrently. Confirmed reservations cannot be deleted directly; they
    /// must be cancelled first.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotFound`] for an unknown id,
    /// [`ServiceError::ConfirmedReservation`] when the reservation is
    /// `Confirmada`, plus timeout and queue errors as in [`Self::create`].
    pub async fn delete(&self, id: &ReservationId) -> Result<(), ServiceError> {
        let cancel = CancelSignal::new();

        let repository = Arc::clone(&self.repository);
        let fetch_id = id.clone();
        let fetch: Subtask<TaskOutput, TaskError> = Subtask::new("fetch", async move {
            let existing = repository.get_by_id(&fetch_id).await?;
            Ok(TaskOutput::Existing(existing))
        });

        let audit_cancel = cancel.clone();
        let audit = Subtask::new("audit", async move {
            tokio::select! {
                () = audit_cancel.cancelled() => Err(TaskError::Cancelled),
                () = sleep(AUDIT_LATENCY) => Ok(TaskOutput::AuditReady),
            }
        });

        let outputs = fork_join(self.orchestrator_timeout, cancel, vec![fetch, audit]).await?;

        let existing = take_existing(outputs)
            .ok_or_else(|| ServiceError::NotFound(id.as_str().to_string()))?;
        if existing.status == ReservationStatus::Confirmada {
            return Err(ServiceError::ConfirmedReservation);
        }

        self.repository.delete(id).await?;
        tracing::info!(id = %id, "reserva deleted");

        self.queue
            .enqueue(PublishAction::Delete, id.as_str())
            .await?;

        Ok(())
    }

    /// Remaining seats per published slot of an activity on a date.
    ///
    /// A failed count for one slot degrades to 0 remaining instead of
    /// failing the whole map.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Directory`] when the activity cannot be fetched.
    pub async fn schedule_availability(
        &self,
        activity_id: &str,
        date: DateTime<Utc>,
    ) -> Result<HashMap<String, i64>, ServiceError> {
        let activity = self.directory.get_activity(activity_id).await?;

        let mut availability = HashMap::with_capacity(activity.schedule.len());
        for slot in &activity.schedule {
            let remaining = match self
                .repository
                .count_active_by_schedule(activity_id, slot, date)
                .await
            {
                Ok(booked) => i64::from(activity.max_capacity) - i64::from(booked),
                Err(err) => {
                    tracing::warn!(
                        activity_id = %activity_id,
                        slot = %slot,
                        error = %err,
                        "count failed, reporting slot as full"
                    );
                    0
                }
            };
            availability.insert(slot.clone(), remaining);
        }

        Ok(availability)
    }

    /// Stop the publish queue, draining every accepted event first.
    pub async fn shutdown(&self) {
        self.queue.stop().await;
    }
}

fn admission_request(reservation: &Reservation, exclude: Option<ReservationId>) -> AdmissionRequest {
    AdmissionRequest {
        activity_id: reservation.activity_id.clone(),
        schedule: reservation.schedule.clone(),
        date: reservation.date,
        quota: reservation.quota,
        user_ids: reservation.user_ids.clone(),
        exclude,
    }
}

fn take_existing(outputs: Vec<(&'static str, TaskOutput)>) -> Option<Reservation> {
    outputs.into_iter().find_map(|(_, output)| match output {
        TaskOutput::Existing(reservation) => Some(reservation),
        _ => None,
    })
}

async fn simulate_price(activity_id: &str, cancel: &CancelSignal) -> Result<f64, TaskError> {
    tokio::select! {
        () = cancel.cancelled() => return Err(TaskError::Cancelled),
        () = sleep(PRICE_LATENCY) => {}
    }
    let mut amount = BASE_PRICE;
    if activity_id.to_lowercase().contains("premium") {
        amount += PREMIUM_SURCHARGE;
    }
    Ok(amount)
}

async fn simulate_enrichment(activity_id: &str, cancel: &CancelSignal) -> Result<String, TaskError> {
    tokio::select! {
        () = cancel.cancelled() => return Err(TaskError::Cancelled),
        () = sleep(ENRICHMENT_LATENCY) => {}
    }
    Ok(format!(
        "reserva for activity '{activity_id}' processed at {}",
        Utc::now().to_rfc3339()
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn price_is_base_for_regular_activities() {
        let cancel = CancelSignal::new();
        let amount = simulate_price("yoga-101", &cancel).await.unwrap();
        assert!((amount - BASE_PRICE).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn price_adds_surcharge_for_premium_activities() {
        let cancel = CancelSignal::new();
        let amount = simulate_price("Premium-Spinning", &cancel).await.unwrap();
        assert!((amount - (BASE_PRICE + PREMIUM_SURCHARGE)).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn price_stops_on_cancel() {
        let cancel = CancelSignal::new();
        cancel.cancel();
        let result = simulate_price("yoga-101", &cancel).await;
        assert!(matches!(result, Err(TaskError::Cancelled)));
    }
}
