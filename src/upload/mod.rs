//! Audio upload: validation, single-slot transfer and progress reporting.

pub mod progress;

use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::io::ReaderStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::{AudioJob, ClientError, ClientResult, ErrorKind, UploadBody};
use crate::session::SessionManager;
use crate::task::run_cancellable;

pub use progress::ProgressReporter;

/// Extensions accepted for upload, compared case-insensitively.
pub const ALLOWED_EXTENSIONS: [&str; 5] = ["mp3", "wav", "m4a", "ogg", "flac"];

/// Advertised server-side ceiling. Not enforced client-side.
pub const MAX_UPLOAD_BYTES: u64 = 500 * 1024 * 1024;

/// MIME type for a supported audio extension.
pub fn mime_type_for_extension(ext: &str) -> Option<&'static str> {
    match ext.to_lowercase().as_str() {
        "mp3" => Some("audio/mpeg"),
        "wav" => Some("audio/wav"),
        "m4a" => Some("audio/mp4"),
        "ogg" => Some("audio/ogg"),
        "flac" => Some("audio/flac"),
        _ => None,
    }
}

/// Check the file name's extension against [`ALLOWED_EXTENSIONS`].
pub fn validate_extension(path: &Path) -> ClientResult<&'static str> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();

    mime_type_for_extension(ext).ok_or_else(|| {
        ClientError::Validation(format!(
            "Unsupported format: .{}. Supported formats: {}",
            ext.to_lowercase(),
            ALLOWED_EXTENSIONS.join(", ")
        ))
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadPhase {
    Validating,
    Uploading,
    Succeeded,
    Failed,
}

impl UploadPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validating => "validating",
            Self::Uploading => "uploading",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }

    fn can_become(self, next: UploadPhase) -> bool {
        matches!(
            (self, next),
            (Self::Validating, Self::Uploading)
                | (Self::Uploading, Self::Succeeded)
                | (Self::Uploading, Self::Failed)
        )
    }
}

/// A locally selected file that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFile {
    pub path: PathBuf,
    pub file_name: String,
    pub mime_type: &'static str,
    pub size: u64,
}

/// State of one upload attempt.
#[derive(Debug, Clone)]
pub struct UploadTask {
    file: AudioFile,
    bytes_sent: u64,
    bytes_total: u64,
    phase: UploadPhase,
}

impl UploadTask {
    fn new(file: AudioFile) -> Self {
        let bytes_total = file.size;
        Self {
            file,
            bytes_sent: 0,
            bytes_total,
            phase: UploadPhase::Validating,
        }
    }

    pub fn file(&self) -> &AudioFile {
        &self.file
    }

    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }

    pub fn bytes_total(&self) -> u64 {
        self.bytes_total
    }

    pub fn phase(&self) -> UploadPhase {
        self.phase
    }

    fn transition(&mut self, next: UploadPhase) -> ClientResult<()> {
        if !self.phase.can_become(next) {
            return Err(ClientError::InvalidTransition {
                from: self.phase.as_str(),
                to: next.as_str(),
            });
        }
        debug!(
            "Upload of {} {} -> {}",
            self.file.file_name,
            self.phase.as_str(),
            next.as_str()
        );
        self.phase = next;
        Ok(())
    }

    fn record_sent(&mut self, bytes: u64) {
        self.bytes_sent = self.bytes_sent.max(bytes.min(self.bytes_total));
    }
}

/// Events delivered in order for a single upload.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadEvent {
    Progress {
        percent: u8,
        bytes_sent: u64,
        bytes_total: u64,
    },
    Succeeded(AudioJob),
    Failed { kind: ErrorKind, message: String },
}

struct SlotGuard<'a>(&'a AtomicBool);

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct UploadController {
    session: Arc<SessionManager>,
    busy: AtomicBool,
}

impl UploadController {
    pub fn new(session: Arc<SessionManager>) -> Self {
        Self {
            session,
            busy: AtomicBool::new(false),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Validate a local file and prepare an upload task for it.
    ///
    /// Only the extension gates the upload; the size ceiling is advisory.
    pub fn select_file(&self, path: &Path) -> ClientResult<UploadTask> {
        let mime_type = validate_extension(path)?;

        let metadata = std::fs::metadata(path).map_err(|_| {
            ClientError::Validation(format!("File not found: {}", path.display()))
        })?;
        if !metadata.is_file() {
            return Err(ClientError::Validation(format!(
                "Not a regular file: {}",
                path.display()
            )));
        }
        if metadata.len() > MAX_UPLOAD_BYTES {
            warn!(
                "{} is {:.1} MB, above the advertised 500 MB limit; the server may reject it",
                path.display(),
                metadata.len() as f64 / 1_048_576.0
            );
        }

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio")
            .to_string();

        Ok(UploadTask::new(AudioFile {
            path: path.to_path_buf(),
            file_name,
            mime_type,
            size: metadata.len(),
        }))
    }

    /// Transfer the task's file with the given title.
    ///
    /// Progress and the terminal outcome are sent on `events`. A second call
    /// while a transfer is in flight is rejected with `UploadInProgress` and
    /// leaves the running transfer untouched. The job list is not refreshed
    /// here; callers decide when to refresh.
    pub async fn start_upload(
        &self,
        task: &mut UploadTask,
        title: &str,
        events: &UnboundedSender<UploadEvent>,
        cancel: &CancellationToken,
    ) -> ClientResult<AudioJob> {
        let _slot = self.acquire_slot()?;

        if title.trim().is_empty() {
            return Err(ClientError::Validation("A title is required".to_string()));
        }
        task.transition(UploadPhase::Uploading)?;

        info!(
            "Uploading {} ({} bytes) as '{}'",
            task.file.file_name,
            task.bytes_total,
            title.trim()
        );

        let reporter = Arc::new(ProgressReporter::new(task.bytes_total, events.clone()));
        reporter.start();

        let result = run_cancellable(cancel, self.transfer(task, title.trim(), &reporter)).await;
        task.record_sent(reporter.bytes_sent());

        match result {
            Ok(job) => {
                task.transition(UploadPhase::Succeeded)?;
                task.record_sent(task.bytes_total);
                reporter.finish();
                info!("Upload accepted, job {} is {}", job.id, job.raw_status());
                let _ = events.send(UploadEvent::Succeeded(job.clone()));
                Ok(job)
            }
            Err(err) => {
                task.transition(UploadPhase::Failed)?;
                warn!("Upload of {} failed: {}", task.file.file_name, err);
                let _ = events.send(UploadEvent::Failed {
                    kind: err.kind(),
                    message: err.user_message(),
                });
                Err(err)
            }
        }
    }

    async fn transfer(
        &self,
        task: &UploadTask,
        title: &str,
        reporter: &Arc<ProgressReporter>,
    ) -> ClientResult<AudioJob> {
        let file = tokio::fs::File::open(&task.file.path).await?;

        let counter = reporter.clone();
        let stream = ReaderStream::new(file).map(move |chunk| {
            if let Ok(bytes) = &chunk {
                counter.advance(bytes.len());
            }
            chunk
        });

        let body = UploadBody {
            file_name: task.file.file_name.clone(),
            mime_type: task.file.mime_type,
            title: title.to_string(),
            length: task.bytes_total,
            stream: Box::pin(stream),
        };

        let backend = self.session.backend().clone();
        self.session
            .protected(|token| async move { backend.upload(&token, body).await })
            .await
    }

    fn acquire_slot(&self) -> ClientResult<SlotGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| ClientError::UploadInProgress)?;
        Ok(SlotGuard(&self.busy))
    }
}
