//! In-memory backend used by unit tests.

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{Barrier, Notify};

use super::error::{ClientError, ClientResult};
use super::types::*;
use super::Backend;

pub const PASSWORD: &str = "secret1";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub op: &'static str,
    pub token: Option<String>,
}

#[derive(Default)]
pub struct FakeBackend {
    pub calls: Mutex<Vec<Call>>,
    pub jobs: Mutex<Vec<AudioJob>>,
    pub reports: Mutex<HashMap<JobId, TranscriptionReport>>,
    pub pdfs: Mutex<HashMap<JobId, Bytes>>,
    pub uploaded: Mutex<Vec<(String, String, usize)>>,
    /// Protected calls answer with an authentication failure.
    pub expire_tokens: AtomicBool,
    pub reject_uploads: AtomicBool,
    /// Protected calls wait here before answering.
    pub barrier: Mutex<Option<Arc<Barrier>>>,
    /// Uploads wait for this before reading the body.
    pub upload_gate: Mutex<Option<Arc<Notify>>>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn protected_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| !matches!(c.op, "login" | "register" | "health"))
            .collect()
    }

    pub fn push_job(&self, job: AudioJob) {
        self.jobs.lock().unwrap().push(job);
    }

    pub fn set_job_status(&self, id: JobId, status: &str) {
        let mut jobs = self.jobs.lock().unwrap();
        if let Some(pos) = jobs.iter().position(|j| j.id == id) {
            let mut job = AudioJob::new(id, jobs[pos].title.clone(), status);
            job.uploaded_at = jobs[pos].uploaded_at.clone();
            jobs[pos] = job;
        }
    }

    fn record(&self, op: &'static str, token: Option<&AuthToken>) {
        self.calls.lock().unwrap().push(Call {
            op,
            token: token.map(|t| t.as_str().to_string()),
        });
    }

    async fn gate_protected(&self) -> ClientResult<()> {
        let barrier = self.barrier.lock().unwrap().clone();
        if let Some(barrier) = barrier {
            barrier.wait().await;
        }
        if self.expire_tokens.load(Ordering::SeqCst) {
            return Err(ClientError::Auth("Token invalide".to_string()));
        }
        Ok(())
    }
}

fn user(email: &str) -> User {
    User {
        id: 1,
        name: "Ada".to_string(),
        email: email.to_string(),
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn register(&self, request: &RegisterRequest) -> ClientResult<RegisterResponse> {
        self.record("register", None);
        if request.email == "taken@example.com" {
            return Err(ClientError::ServerRejection {
                status: 400,
                message: Some("Email déjà utilisé".to_string()),
            });
        }
        Ok(RegisterResponse {
            id_user: 1,
            name: request.name.clone(),
            email: request.email.clone(),
            message: None,
            access_token: None,
        })
    }

    async fn login(&self, credentials: &Credentials) -> ClientResult<LoginResponse> {
        self.record("login", None);
        if credentials.password != PASSWORD {
            return Err(ClientError::Auth(
                "Email ou mot de passe incorrect".to_string(),
            ));
        }
        Ok(LoginResponse {
            access_token: format!("token-for-{}", credentials.email),
            token_type: Some("bearer".to_string()),
            user: user(&credentials.email),
        })
    }

    async fn list_jobs(&self, token: &AuthToken) -> ClientResult<Vec<AudioJob>> {
        self.record("list_jobs", Some(token));
        self.gate_protected().await?;
        Ok(self.jobs.lock().unwrap().clone())
    }

    async fn upload(&self, token: &AuthToken, body: UploadBody) -> ClientResult<AudioJob> {
        self.record("upload", Some(token));
        let gate = self.upload_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.gate_protected().await?;

        let mut stream = body.stream;
        let mut received = 0usize;
        while let Some(chunk) = stream.next().await {
            received += chunk?.len();
        }

        if self.reject_uploads.load(Ordering::SeqCst) {
            return Err(ClientError::ServerRejection {
                status: 500,
                message: Some("disk full".to_string()),
            });
        }

        self.uploaded
            .lock()
            .unwrap()
            .push((body.file_name.clone(), body.title.clone(), received));

        let mut jobs = self.jobs.lock().unwrap();
        let id = jobs.iter().map(|j| j.id).max().unwrap_or(0) + 1;
        let job = AudioJob::new(id, body.title, "processing");
        jobs.insert(0, job.clone());
        Ok(job)
    }

    async fn get_report(
        &self,
        token: &AuthToken,
        job_id: JobId,
    ) -> ClientResult<TranscriptionReport> {
        self.record("get_report", Some(token));
        self.gate_protected().await?;
        self.reports
            .lock()
            .unwrap()
            .get(&job_id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound("Fichier non trouvé".to_string()))
    }

    async fn get_pdf(&self, token: &AuthToken, job_id: JobId) -> ClientResult<Bytes> {
        self.record("get_pdf", Some(token));
        self.gate_protected().await?;
        self.pdfs
            .lock()
            .unwrap()
            .get(&job_id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound("PDF non disponible".to_string()))
    }

    async fn health(&self) -> ClientResult<HealthStatus> {
        self.record("health", None);
        Ok(HealthStatus {
            status: "ok".to_string(),
            database: None,
        })
    }
}
