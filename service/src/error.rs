//! Service-level error taxonomy.
//!
//! Two layers: [`TaskError`] is what a single orchestrated subtask can fail
//! with, [`ServiceError`] is what callers of [`crate::ReservationService`]
//! see. Conversions unwrap the orchestrator's envelope so callers match on
//! admission rejections and missing reservations directly instead of digging
//! through task wrappers.

use reservas_core::{AdmissionError, DirectoryError, RepositoryError};
use reservas_runtime::{EnqueueError, OrchestratorError};
use thiserror::Error;

/// Failure of one subtask inside a fork-join scope.
#[derive(Error, Debug)]
pub enum TaskError {
    /// Admission rejected the request.
    #[error(transparent)]
    Admission(#[from] AdmissionError),

    /// The repository failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// The subtask observed the scope's cancel signal and stopped early.
    #[error("task cancelled")]
    Cancelled,

    /// The subtask panicked; its output never materialized.
    #[error("task panicked")]
    Panicked,
}

/// Errors returned by [`crate::ReservationService`] operations.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Admission rejected the mutation.
    #[error(transparent)]
    Admission(#[from] AdmissionError),

    /// The activity directory failed outside an admission check.
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    /// An orchestrated subtask failed for a reason that is not an admission
    /// rejection or a missing reservation.
    #[error("task '{name}' failed: {source}")]
    Task {
        /// Name of the failing subtask.
        name: &'static str,
        /// The subtask's error.
        #[source]
        source: TaskError,
    },

    /// The orchestration scope's deadline elapsed.
    #[error("operation timed out")]
    Timeout,

    /// No reservation with this id.
    #[error("reserva not found (id: {0})")]
    NotFound(String),

    /// Confirmed reservations cannot be deleted directly.
    #[error("cannot delete a confirmed reserva")]
    ConfirmedReservation,

    /// Repository failure outside an orchestration scope.
    #[error("repository error: {0}")]
    Repository(RepositoryError),

    /// The publish queue refused the notification.
    #[error(transparent)]
    Queue(#[from] EnqueueError),
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(id) => Self::NotFound(id),
            other => Self::Repository(other),
        }
    }
}

impl From<OrchestratorError<TaskError>> for ServiceError {
    fn from(err: OrchestratorError<TaskError>) -> Self {
        match err {
            OrchestratorError::Timeout => Self::Timeout,
            OrchestratorError::Task { name, source } => match source {
                TaskError::Admission(e) => Self::Admission(e),
                TaskError::Repository(RepositoryError::NotFound(id)) => Self::NotFound(id),
                source => Self::Task { name, source },
            },
            OrchestratorError::Panicked { name } => Self::Task {
                name,
                source: TaskError::Panicked,
            },
        }
    }
}
