//! Cancellation and delayed work.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::api::{ClientError, ClientResult};

/// Await `fut` unless `cancel` fires first.
pub async fn run_cancellable<T, F>(cancel: &CancellationToken, fut: F) -> ClientResult<T>
where
    F: Future<Output = ClientResult<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ClientError::Cancelled),
        result = fut => result,
    }
}

/// A unit of work scheduled to run once after a delay.
///
/// Dropping the handle does not cancel the work; call [`ScheduledTask::cancel`].
pub struct ScheduledTask<T> {
    cancel: CancellationToken,
    handle: JoinHandle<Option<T>>,
}

impl<T: Send + 'static> ScheduledTask<T> {
    pub fn after<F>(delay: Duration, work: F) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    debug!("Scheduled task cancelled before it ran");
                    None
                }
                _ = tokio::time::sleep(delay) => Some(work.await),
            }
        });
        Self { cancel, handle }
    }

    /// Prevent the work from starting. Has no effect once it is running.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the outcome; `None` when the task was cancelled.
    pub async fn join(self) -> Option<T> {
        self.handle.await.ok().flatten()
    }
}
