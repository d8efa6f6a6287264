//! HTTP client for the activities directory API.
//!
//! The directory serves activity snapshots at `GET {base_url}/activities/{id}`
//! wrapped in an `{"activity": {...}}` envelope:
//!
//! ```json
//! {
//!   "activity": {
//!     "id": "yoga-101",
//!     "name": "Yoga",
//!     "max_capacity": 10,
//!     "schedule": ["Monday 18:00"],
//!     "duration": 60
//!   }
//! }
//! ```
//!
//! A 404 maps to [`DirectoryError::NotFound`]; any transport failure or other
//! non-200 status maps to [`DirectoryError::Unavailable`]. Failures abort the
//! caller's admission decision synchronously; there are no retries here.
//!
//! # Example
//!
//! ```no_run
//! use reservas_directory::HttpActivityDirectory;
//! use reservas_core::directory::ActivityDirectory;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let directory = HttpActivityDirectory::new("http://activities-api:8082")?;
//! let activity = directory.get_activity("yoga-101").await?;
//! println!("capacity: {}", activity.max_capacity);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use reservas_core::directory::{Activity, ActivityDirectory, DirectoryError};
use serde::Deserialize;
use std::time::Duration;

/// Per-request timeout against the directory.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Activity payload as served by the directory.
#[derive(Debug, Deserialize)]
struct ActivityDto {
    id: String,
    name: String,
    max_capacity: u32,
    schedule: Vec<String>,
    duration: u32,
}

/// Envelope the directory wraps activity payloads in.
#[derive(Debug, Deserialize)]
struct ActivityEnvelope {
    activity: ActivityDto,
}

impl From<ActivityDto> for Activity {
    fn from(dto: ActivityDto) -> Self {
        Self {
            id: dto.id,
            name: dto.name,
            max_capacity: dto.max_capacity,
            schedule: dto.schedule,
            duration: dto.duration,
        }
    }
}

/// Reqwest-backed [`ActivityDirectory`] implementation.
#[derive(Clone)]
pub struct HttpActivityDirectory {
    client: Client,
    base_url: String,
}

impl HttpActivityDirectory {
    /// Create a client for the directory at `base_url` (no trailing slash).
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Unavailable`] if the base URL is empty or
    /// the underlying HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self, DirectoryError> {
        let base_url = base_url.into();
        if base_url.trim().is_empty() {
            return Err(DirectoryError::Unavailable(
                "directory base URL cannot be empty".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| DirectoryError::Unavailable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// The configured base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ActivityDirectory for HttpActivityDirectory {
    async fn get_activity(&self, id: &str) -> Result<Activity, DirectoryError> {
        if id.trim().is_empty() {
            return Err(DirectoryError::NotFound(id.to_string()));
        }

        let url = format!("{}/activities/{id}", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| DirectoryError::Unavailable(format!("error calling activities API: {e}")))?;

        match response.status() {
            StatusCode::OK => {
                let envelope = response
                    .json::<ActivityEnvelope>()
                    .await
                    .map_err(|e| {
                        DirectoryError::Unavailable(format!("error decoding activity response: {e}"))
                    })?;
                tracing::debug!(activity_id = %envelope.activity.id, "activity fetched");
                Ok(envelope.activity.into())
            }
            StatusCode::NOT_FOUND => Err(DirectoryError::NotFound(id.to_string())),
            status => Err(DirectoryError::Unavailable(format!(
                "activities API returned status {status}"
            ))),
        }
    }
}
