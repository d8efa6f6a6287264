//! Fork-join orchestration with advisory cancellation on first failure.
//!
//! Every mutating operation of the reservation service runs its independent
//! checks (validation, price computation, enrichment, fetch-existing) as
//! parallel subtasks under one timeout-bound scope. Each subtask reports on a
//! shared fan-in channel; the first error cancels a shared [`CancelSignal`]
//! that sibling subtasks may poll to stop early. Cancellation is advisory,
//! not pre-emptive: a subtask that ignores the signal still finishes and its
//! late result is discarded. The scope always awaits every spawned task
//! before returning, so no tasks leak.
//!
//! # Example
//!
//! ```no_run
//! use reservas_runtime::orchestrator::{fork_join, CancelSignal, Subtask};
//! use std::time::Duration;
//!
//! # #[derive(Debug, thiserror::Error)]
//! # #[error("boom")]
//! # struct MyError;
//! # async fn example() {
//! let cancel = CancelSignal::new();
//! let outputs = fork_join(
//!     Duration::from_secs(5),
//!     cancel.clone(),
//!     vec![
//!         Subtask::new("validate", async { Ok::<_, MyError>(1) }),
//!         Subtask::new("price", async { Ok(2) }),
//!     ],
//! )
//! .await;
//! # let _ = outputs;
//! # }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, watch};

/// Shared advisory cancellation token for one fork-join scope.
///
/// Cloning is cheap; all clones observe the same signal. Subtasks poll
/// [`CancelSignal::is_cancelled`] or await [`CancelSignal::cancelled`] in a
/// `select!` arm to exit early.
#[derive(Clone)]
pub struct CancelSignal {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    /// A fresh, un-cancelled signal.
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
            rx,
        }
    }

    /// Trigger the signal. Idempotent.
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }

    /// Whether the signal has been triggered.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once the signal is triggered.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow() {
                return;
            }
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// A named unit of work inside a fork-join scope.
pub struct Subtask<T, E> {
    name: &'static str,
    future: Pin<Box<dyn Future<Output = Result<T, E>> + Send>>,
}

impl<T, E> Subtask<T, E> {
    /// Wrap a future under a name used in error reporting and logs.
    pub fn new(name: &'static str, future: impl Future<Output = Result<T, E>> + Send + 'static) -> Self {
        Self {
            name,
            future: Box::pin(future),
        }
    }
}

/// Errors from a fork-join scope.
#[derive(Error, Debug)]
pub enum OrchestratorError<E>
where
    E: std::error::Error + 'static,
{
    /// A subtask reported an error; the scope was cancelled and every other
    /// subtask was still awaited before returning.
    #[error("task '{name}' failed: {source}")]
    Task {
        /// Name of the failing subtask.
        name: &'static str,
        /// The subtask's error.
        #[source]
        source: E,
    },

    /// The scope's timeout elapsed before all subtasks reported.
    #[error("orchestration timed out")]
    Timeout,

    /// A subtask panicked instead of reporting; its output is unrecoverable,
    /// so the scope cannot claim success.
    #[error("task '{name}' panicked")]
    Panicked {
        /// Name of the panicked subtask.
        name: &'static str,
    },
}

/// Run subtasks in parallel and wait for all of them (or fail on the first
/// error, or time out).
///
/// On the first reported error the shared `cancel` signal is triggered so
/// sibling subtasks can stop early; their late results are discarded. The
/// scope then drains the fan-in channel and joins every task handle before
/// returning, in every path.
///
/// On success returns every subtask's output paired with its name, in
/// completion order.
///
/// # Errors
///
/// [`OrchestratorError::Task`] naming the first failing subtask, or
/// [`OrchestratorError::Timeout`] when `timeout` elapses first.
pub async fn fork_join<T, E>(
    timeout: Duration,
    cancel: CancelSignal,
    tasks: Vec<Subtask<T, E>>,
) -> Result<Vec<(&'static str, T)>, OrchestratorError<E>>
where
    T: Send + 'static,
    E: std::error::Error + Send + 'static,
{
    let (report_tx, mut report_rx) = mpsc::channel(tasks.len().max(1));
    let mut handles = Vec::with_capacity(tasks.len());

    for Subtask { name, future } in tasks {
        let report_tx = report_tx.clone();
        let handle = tokio::spawn(async move {
            let result = future.await;
            // Receiver only goes away on timeout; the report is then moot.
            let _ = report_tx.send((name, result)).await;
        });
        handles.push((name, handle));
    }
    drop(report_tx);

    // Collect until every subtask has reported (channel closes) or the
    // deadline fires. The loop itself is the completion barrier.
    let collect = async {
        let mut outputs = Vec::new();
        let mut first_error = None;
        while let Some((name, result)) = report_rx.recv().await {
            match result {
                Ok(output) => {
                    if first_error.is_none() {
                        outputs.push((name, output));
                    } else {
                        tracing::debug!(task = name, "discarding late result after failure");
                    }
                }
                Err(err) => {
                    if first_error.is_none() {
                        tracing::warn!(task = name, error = %err, "subtask failed, cancelling siblings");
                        cancel.cancel();
                        first_error = Some((name, err));
                    } else {
                        tracing::debug!(task = name, error = %err, "discarding late error after failure");
                    }
                }
            }
        }
        (outputs, first_error)
    };

    let result = match tokio::time::timeout(timeout, collect).await {
        Ok((outputs, None)) => Ok(outputs),
        Ok((_, Some((name, source)))) => Err(OrchestratorError::Task { name, source }),
        Err(_) => {
            tracing::warn!(timeout_ms = timeout.as_millis(), "orchestration timed out");
            cancel.cancel();
            Err(OrchestratorError::Timeout)
        }
    };

    // No leaked tasks: cooperative subtasks exit on the cancel signal, and
    // even uncooperative ones are awaited to completion here. A panicked
    // subtask closed its report sender without reporting, so an otherwise
    // clean scope would be missing that task's output; surface it instead.
    let mut panicked = None;
    for (name, handle) in handles {
        if let Err(err) = handle.await {
            tracing::error!(task = name, error = %err, "subtask join failed");
            if panicked.is_none() {
                panicked = Some(name);
            }
        }
    }
    match (result, panicked) {
        (Ok(_), Some(name)) => Err(OrchestratorError::Panicked { name }),
        (result, _) => result,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use std::time::Instant;
    use tokio::time::sleep;

    #[derive(Debug, Error, PartialEq)]
    #[error("{0}")]
    struct TestError(&'static str);

    #[tokio::test]
    async fn collects_all_outputs_on_success() {
        let cancel = CancelSignal::new();
        let outputs = fork_join(
            Duration::from_secs(1),
            cancel,
            vec![
                Subtask::new("a", async { Ok::<_, TestError>(1) }),
                Subtask::new("b", async {
                    sleep(Duration::from_millis(20)).await;
                    Ok(2)
                }),
                Subtask::new("c", async { Ok(3) }),
            ],
        )
        .await
        .unwrap();

        let mut values: Vec<i32> = outputs.into_iter().map(|(_, v)| v).collect();
        values.sort_unstable();
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn first_error_wins_and_cancels_siblings() {
        let cancel = CancelSignal::new();
        let sibling_cancel = cancel.clone();
        let started = Instant::now();

        let result = fork_join(
            Duration::from_secs(10),
            cancel,
            vec![
                Subtask::new("boom", async {
                    sleep(Duration::from_millis(10)).await;
                    Err::<i32, _>(TestError("validation failed"))
                }),
                Subtask::new("slow", async move {
                    tokio::select! {
                        () = sleep(Duration::from_secs(5)) => Ok(42),
                        () = sibling_cancel.cancelled() => Err(TestError("cancelled")),
                    }
                }),
            ],
        )
        .await;

        match result {
            Err(OrchestratorError::Task { name, source }) => {
                assert_eq!(name, "boom");
                assert_eq!(source, TestError("validation failed"));
            }
            other => panic!("expected task error, got {other:?}"),
        }
        // The cooperative sibling observed the cancel signal; the scope did
        // not sit out the full 5 s sleep.
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn timeout_is_distinguishable_from_task_failure() {
        let cancel = CancelSignal::new();
        let sibling_cancel = cancel.clone();

        let result = fork_join(
            Duration::from_millis(50),
            cancel,
            vec![Subtask::new("sleepy", async move {
                tokio::select! {
                    () = sleep(Duration::from_secs(5)) => Ok(1),
                    () = sibling_cancel.cancelled() => Err(TestError("cancelled")),
                }
            })],
        )
        .await;

        assert!(matches!(result, Err(OrchestratorError::Timeout)));
    }

    #[tokio::test]
    async fn uncooperative_task_is_still_awaited() {
        let cancel = CancelSignal::new();
        let result = fork_join(
            Duration::from_secs(10),
            cancel,
            vec![
                Subtask::new("boom", async { Err::<i32, _>(TestError("fail")) }),
                // Ignores the cancel signal entirely; its late result must be
                // discarded, not leaked.
                Subtask::new("stubborn", async {
                    sleep(Duration::from_millis(100)).await;
                    Ok(7)
                }),
            ],
        )
        .await;

        assert!(matches!(
            result,
            Err(OrchestratorError::Task { name: "boom", .. })
        ));
    }

    #[tokio::test]
    async fn panicked_subtask_fails_the_scope() {
        let cancel = CancelSignal::new();
        let result = fork_join(
            Duration::from_secs(1),
            cancel,
            vec![
                Subtask::new("steady", async { Ok::<_, TestError>(1) }),
                // Never reports; the scope must not claim success with this
                // task's output silently missing.
                Subtask::new("explosive", async { panic!("subtask blew up") }),
            ],
        )
        .await;

        assert!(matches!(
            result,
            Err(OrchestratorError::Panicked { name: "explosive" })
        ));
    }

    #[tokio::test]
    async fn cancel_signal_is_shared_across_clones() {
        let signal = CancelSignal::new();
        let clone = signal.clone();
        assert!(!clone.is_cancelled());
        signal.cancel();
        assert!(clone.is_cancelled());
        clone.cancelled().await; // resolves immediately
    }
}
