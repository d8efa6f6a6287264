//! Wiring of the concrete boundary clients from configuration.
//!
//! The repository is supplied by the caller; persistence engines live
//! outside this workspace. Everything else (directory client, broker
//! producer, publish queue) is built here from [`Config`].

use crate::config::Config;
use crate::service::ReservationService;
use reservas_broker::RedpandaPublisher;
use reservas_core::{DirectoryError, PublishError, ReservationRepository};
use reservas_directory::HttpActivityDirectory;
use reservas_runtime::PublishQueue;
use std::sync::Arc;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Errors while building the service from configuration.
#[derive(Error, Debug)]
pub enum BootstrapError {
    /// The directory client could not be built.
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    /// The broker producer could not be built.
    #[error(transparent)]
    Broker(#[from] PublishError),
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured default filter. Calling this twice is
/// a no-op.
pub fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Build a [`ReservationService`] against the configured directory and
/// broker, starting the publish queue's worker pool.
///
/// # Errors
///
/// [`BootstrapError`] when the directory client or the broker producer
/// cannot be created.
pub fn build_service(
    config: &Config,
    repository: Arc<dyn ReservationRepository>,
) -> Result<ReservationService, BootstrapError> {
    let directory = Arc::new(HttpActivityDirectory::new(&config.directory.base_url)?);

    let publisher = Arc::new(
        RedpandaPublisher::builder()
            .brokers(&config.broker.brokers)
            .topic(&config.broker.topic)
            .acks(&config.broker.acks)
            .build()?,
    );
    let queue = Arc::new(PublishQueue::start(publisher, config.queue_config()));

    Ok(
        ReservationService::new(directory, repository, queue)
            .with_orchestrator_timeout(config.orchestrator_timeout()),
    )
}
