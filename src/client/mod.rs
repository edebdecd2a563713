//! Wiring of the client components over a single backend and session.

use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::api::{AudioJob, Backend, ClientResult, HealthStatus, HttpBackend};
use crate::config::Config;
use crate::download::DownloadBroker;
use crate::jobs::JobStatusStore;
use crate::notice::NoticeBoard;
use crate::report::ReportReader;
use crate::session::SessionManager;
use crate::task::{run_cancellable, ScheduledTask};
use crate::upload::{UploadController, UploadEvent};

/// Result of [`MeetvocalClient::upload_file`]: the created job and the
/// pending job-list refresh.
pub struct UploadOutcome {
    pub job: AudioJob,
    pub refresh: ScheduledTask<ClientResult<Vec<AudioJob>>>,
}

pub struct MeetvocalClient {
    config: Config,
    session: Arc<SessionManager>,
    uploads: UploadController,
    jobs: Arc<JobStatusStore>,
    reports: ReportReader,
    downloads: DownloadBroker,
}

impl MeetvocalClient {
    pub fn new(config: Config, backend: Arc<dyn Backend>) -> Self {
        let session = Arc::new(SessionManager::new(backend));
        Self {
            uploads: UploadController::new(session.clone()),
            jobs: Arc::new(JobStatusStore::new(session.clone())),
            reports: ReportReader::new(session.clone()),
            downloads: DownloadBroker::new(session.clone()),
            session,
            config,
        }
    }

    /// Client talking to the configured HTTP backend.
    pub fn from_config(config: Config) -> ClientResult<Self> {
        let backend = HttpBackend::from_config(&config.api)?;
        info!("Using backend at {}", backend.base_url());
        Ok(Self::new(config, Arc::new(backend)))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    pub fn uploads(&self) -> &UploadController {
        &self.uploads
    }

    pub fn jobs(&self) -> &Arc<JobStatusStore> {
        &self.jobs
    }

    pub fn reports(&self) -> &ReportReader {
        &self.reports
    }

    pub fn downloads(&self) -> &DownloadBroker {
        &self.downloads
    }

    pub fn notice_board(&self) -> NoticeBoard {
        NoticeBoard::new(self.config.notices.dismiss_after())
    }

    /// Validate, upload, then schedule a job-list refresh after the
    /// configured delay.
    pub async fn upload_file(
        &self,
        path: &Path,
        title: &str,
        events: &UnboundedSender<UploadEvent>,
        cancel: &CancellationToken,
    ) -> ClientResult<UploadOutcome> {
        let mut task = self.uploads.select_file(path)?;
        let job = self
            .uploads
            .start_upload(&mut task, title, events, cancel)
            .await?;
        let refresh = self
            .jobs
            .schedule_refresh(self.config.upload.refresh_delay());
        Ok(UploadOutcome { job, refresh })
    }

    pub async fn health(&self, cancel: &CancellationToken) -> ClientResult<HealthStatus> {
        run_cancellable(cancel, self.session.backend().health()).await
    }
}
