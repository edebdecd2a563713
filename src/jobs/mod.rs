//! Jobs owned by the signed-in user and their observed status.

pub mod status;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::api::{AudioJob, ClientError, ClientResult, JobId};
use crate::session::SessionManager;
use crate::task::{run_cancellable, ScheduledTask};

pub use status::{JobStatus, StatusBadge};

#[derive(Default)]
struct StoreState {
    /// Session epoch the cached jobs were fetched under.
    epoch: u64,
    jobs: Vec<AudioJob>,
    /// Last known status per job, used to detect regressions.
    observed: HashMap<JobId, JobStatus>,
}

impl StoreState {
    /// Drop everything cached for an earlier session.
    fn adopt(&mut self, epoch: u64) {
        if self.epoch != epoch {
            self.epoch = epoch;
            self.jobs.clear();
            self.observed.clear();
        }
    }
}

/// Caller-driven view of the backend's job list. There is no polling loop;
/// refresh after an upload, on a timer via [`JobStatusStore::schedule_refresh`],
/// or when a view opens.
pub struct JobStatusStore {
    session: Arc<SessionManager>,
    state: Mutex<StoreState>,
}

impl JobStatusStore {
    pub fn new(session: Arc<SessionManager>) -> Self {
        Self {
            session,
            state: Mutex::new(StoreState::default()),
        }
    }

    /// Fetch the job list, keeping the backend's order.
    ///
    /// A job reported `processing` after it was seen `completed` or `failed`
    /// is a backend contract violation: it is logged and the terminal status
    /// is kept.
    ///
    /// The cache belongs to one session. A result that arrives after the
    /// session changed is discarded with `SessionInvalidated`.
    pub async fn refresh(&self, cancel: &CancellationToken) -> ClientResult<Vec<AudioJob>> {
        let epoch = self.session.epoch().await;
        let backend = self.session.backend().clone();
        let mut jobs = run_cancellable(
            cancel,
            self.session
                .protected(|token| async move { backend.list_jobs(&token).await }),
        )
        .await?;

        let mut state = self.state.lock().await;
        if self.session.epoch().await != epoch {
            debug!("Discarding job list from a superseded session");
            return Err(ClientError::SessionInvalidated);
        }
        state.adopt(epoch);
        for job in jobs.iter_mut() {
            let status = match job.status() {
                Ok(status) => status,
                Err(err) => {
                    warn!("{}", err);
                    continue;
                }
            };

            match state.observed.get(&job.id).copied() {
                Some(previous) if previous.is_terminal() && status == JobStatus::Processing => {
                    warn!(
                        "Job {} reported processing after being {}; keeping {}",
                        job.id, previous, previous
                    );
                    job.set_status(previous);
                }
                _ => {
                    state.observed.insert(job.id, status);
                }
            }
        }

        debug!("Job list refreshed: {} job(s)", jobs.len());
        state.jobs = jobs.clone();
        Ok(jobs)
    }

    /// Look up a job from the last refresh.
    pub async fn get(&self, id: JobId) -> ClientResult<AudioJob> {
        self.current()
            .await
            .into_iter()
            .find(|job| job.id == id)
            .ok_or_else(|| ClientError::NotFound(format!("job {}", id)))
    }

    /// Snapshot of the last refresh, empty once the session has changed.
    pub async fn jobs(&self) -> Vec<AudioJob> {
        self.current().await
    }

    async fn current(&self) -> Vec<AudioJob> {
        let mut state = self.state.lock().await;
        state.adopt(self.session.epoch().await);
        state.jobs.clone()
    }

    /// Refresh once after `delay`. The returned task can be cancelled.
    pub fn schedule_refresh(
        self: &Arc<Self>,
        delay: Duration,
    ) -> ScheduledTask<ClientResult<Vec<AudioJob>>> {
        let store = Arc::clone(self);
        ScheduledTask::after(delay, async move {
            store.refresh(&CancellationToken::new()).await
        })
    }
}
