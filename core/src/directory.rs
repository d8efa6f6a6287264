//! Activity directory boundary.
//!
//! The directory is a read-only external leaf: it answers with an activity's
//! published schedule list, per-session duration and maximum capacity. The
//! admission controller fetches a fresh snapshot for every decision.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Snapshot of an activity as served by the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    /// Activity id.
    pub id: String,
    /// Human-readable name, used in conflict messages.
    pub name: String,
    /// Maximum seats per schedule slot and date.
    pub max_capacity: u32,
    /// Published schedule slots ("Weekday HH:MM").
    pub schedule: Vec<String>,
    /// Session length in minutes.
    pub duration: u32,
}

/// Errors from the activity directory.
#[derive(Error, Debug, Clone)]
pub enum DirectoryError {
    /// No activity with this id.
    #[error("activity not found (id: {0})")]
    NotFound(String),

    /// The directory was unreachable or answered with an unexpected status.
    #[error("activity directory unavailable: {0}")]
    Unavailable(String),
}

/// Read-only lookup of activity snapshots.
#[async_trait]
pub trait ActivityDirectory: Send + Sync {
    /// Fetch the activity with the given id.
    ///
    /// # Errors
    ///
    /// [`DirectoryError::NotFound`] when the id is unknown,
    /// [`DirectoryError::Unavailable`] for transport failures.
    async fn get_activity(&self, id: &str) -> Result<Activity, DirectoryError>;
}
