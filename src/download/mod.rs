//! Retrieval of generated artifacts and handing them to the host for storage.

use async_trait::async_trait;
use bytes::Bytes;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::api::{AudioJob, ClientError, ClientResult, JobId};
use crate::jobs::JobStatus;
use crate::session::SessionManager;
use crate::task::run_cancellable;

pub const PDF_EXTENSION: &str = "pdf";

/// Host-side persistence for downloaded artifacts.
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    /// Store `payload` under `suggested_filename`, returning where it went.
    async fn save(&self, payload: Bytes, suggested_filename: &str) -> ClientResult<PathBuf>;
}

/// Writes artifacts into a directory on the local filesystem.
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl ArtifactSink for DirectorySink {
    async fn save(&self, payload: Bytes, suggested_filename: &str) -> ClientResult<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(suggested_filename);
        tokio::fs::write(&path, &payload).await?;
        info!("Saved {} bytes to {:?}", payload.len(), path);
        Ok(path)
    }
}

/// `<title>.<extension>`, with path separators replaced so the name stays a
/// single path component.
pub fn suggested_filename(title: &str, extension: &str) -> String {
    let stem: String = title
        .trim()
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect();
    let stem = if stem.is_empty() { "report".to_string() } else { stem };
    format!("{}.{}", stem, extension)
}

pub struct DownloadBroker {
    session: Arc<SessionManager>,
}

impl DownloadBroker {
    pub fn new(session: Arc<SessionManager>) -> Self {
        Self { session }
    }

    /// Fetch the PDF for a job.
    ///
    /// Callers are expected to ask only for completed jobs; this is not
    /// checked here. Use [`DownloadBroker::export`] for the checked path.
    pub async fn fetch_artifact(
        &self,
        job_id: JobId,
        cancel: &CancellationToken,
    ) -> ClientResult<Bytes> {
        let backend = self.session.backend().clone();
        run_cancellable(
            cancel,
            self.session
                .protected(|token| async move { backend.get_pdf(&token, job_id).await }),
        )
        .await
    }

    pub async fn save(
        &self,
        sink: &dyn ArtifactSink,
        payload: Bytes,
        suggested_filename: &str,
    ) -> ClientResult<PathBuf> {
        sink.save(payload, suggested_filename).await
    }

    /// Download a completed job's PDF and save it as `<title>.pdf`.
    pub async fn export(
        &self,
        job: &AudioJob,
        sink: &dyn ArtifactSink,
        cancel: &CancellationToken,
    ) -> ClientResult<PathBuf> {
        let status = job.status()?;
        if status != JobStatus::Completed {
            return Err(ClientError::JobNotReady {
                id: job.id,
                status: status.to_string(),
            });
        }

        let payload = self.fetch_artifact(job.id, cancel).await?;
        self.save(sink, payload, &suggested_filename(&job.title, PDF_EXTENSION))
            .await
    }
}
