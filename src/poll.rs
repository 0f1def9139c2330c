//! Bounded fixed-interval polling
//!
//! The platform runs two slow asynchronous processes per submission (file
//! validation and order execution), plus a short lag between an SFTP upload
//! and the file becoming visible through the query API. All three waits go
//! through [`poll`]: a fixed-interval, wall-clock-bounded loop with no
//! backoff and no jitter. Callers budget hours, so an adaptive schedule
//! would only make the wait harder to reason about.

use std::time::Duration;
use thiserror::Error;
use tokio::time::{self, Instant};
use tracing::info;

/// One observation from a poll check.
#[derive(Debug)]
pub enum PollStep<T> {
    /// The awaited condition holds; polling stops and yields the value.
    Ready(T),
    /// Not ready yet; carries a human-readable description of the last
    /// observed state for logs and for the timeout error.
    Pending(String),
}

#[derive(Debug, Error)]
pub enum PollError<E: std::error::Error> {
    #[error("{what} not ready after {waited:?} (last state: {last})")]
    Timeout {
        what: String,
        waited: Duration,
        last: String,
    },
    /// The check itself failed. Propagated immediately, regardless of the
    /// remaining timeout budget.
    #[error(transparent)]
    Check(E),
}

/// Repeatedly run `check` until it reports ready or `timeout` elapses.
///
/// The check runs once immediately, so a condition that already holds
/// returns without sleeping, and a condition that becomes true between two
/// checks is observed at most one `interval` later.
pub async fn poll<T, E, F>(
    what: &str,
    interval: Duration,
    timeout: Duration,
    mut check: F,
) -> Result<T, PollError<E>>
where
    E: std::error::Error,
    F: AsyncFnMut() -> Result<PollStep<T>, E>,
{
    let started = Instant::now();
    let mut last = String::from("not yet observed");

    loop {
        match check().await {
            Ok(PollStep::Ready(value)) => return Ok(value),
            Ok(PollStep::Pending(state)) => last = state,
            Err(err) => return Err(PollError::Check(err)),
        }

        if started.elapsed() >= timeout {
            return Err(PollError::Timeout {
                what: what.to_string(),
                waited: started.elapsed(),
                last,
            });
        }

        info!(
            what,
            state = %last,
            interval_secs = interval.as_secs(),
            "still waiting"
        );
        time::sleep(interval).await;
    }
}
