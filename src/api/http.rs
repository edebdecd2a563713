//! HTTP client for the transcription backend REST API.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error};

use super::error::{ClientError, ClientResult};
use super::types::{
    AudioJob, AuthToken, Credentials, HealthStatus, JobId, LoginResponse, RegisterRequest,
    RegisterResponse, TranscriptionReport, UploadAccepted, UploadBody,
};
use super::Backend;
use crate::config::ApiConfig;

/// Error body produced by the backend framework.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    detail: serde_json::Value,
}

pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    /// Create a new client with the given base URL.
    pub fn new(base_url: &str, connect_timeout: Duration) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &ApiConfig) -> ClientResult<Self> {
        Self::new(&config.base_url, config.connect_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder, what: &str) -> ClientResult<Response> {
        let response = request.send().await.map_err(|e| {
            error!("{} failed before a response was received: {}", what, e);
            ClientError::Network(e.to_string())
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        debug!("{} failed with status {}: {}", what, status, body);
        Err(map_failure(status, &body))
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        what: &str,
    ) -> ClientResult<T> {
        let response = self.send(request, what).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            ClientError::Decode(format!("Failed to parse {} response: {}", what, e))
        })
    }
}

/// Map a non-success response onto the error taxonomy.
fn map_failure(status: StatusCode, body: &str) -> ClientError {
    let message = extract_detail(body);
    match status {
        StatusCode::UNAUTHORIZED => ClientError::Auth(
            message.unwrap_or_else(|| "credentials rejected or expired".to_string()),
        ),
        StatusCode::NOT_FOUND => {
            ClientError::NotFound(message.unwrap_or_else(|| "resource not found".to_string()))
        }
        _ => ClientError::ServerRejection {
            status: status.as_u16(),
            message,
        },
    }
}

fn extract_detail(body: &str) -> Option<String> {
    let parsed: ErrorResponse = serde_json::from_str(body).ok()?;
    match parsed.detail {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn register(&self, request: &RegisterRequest) -> ClientResult<RegisterResponse> {
        self.send_json(
            self.client.post(self.url("/register")).json(request),
            "registration",
        )
        .await
    }

    async fn login(&self, credentials: &Credentials) -> ClientResult<LoginResponse> {
        self.send_json(
            self.client.post(self.url("/login")).json(credentials),
            "login",
        )
        .await
    }

    async fn list_jobs(&self, token: &AuthToken) -> ClientResult<Vec<AudioJob>> {
        self.send_json(
            self.client
                .get(self.url("/fichiers"))
                .bearer_auth(token.as_str()),
            "job list",
        )
        .await
    }

    async fn upload(&self, token: &AuthToken, body: UploadBody) -> ClientResult<AudioJob> {
        let UploadBody {
            file_name,
            mime_type,
            title,
            length,
            stream,
        } = body;

        let part = Part::stream_with_length(Body::wrap_stream(stream), length)
            .file_name(file_name)
            .mime_str(mime_type)?;

        let form = Form::new().part("file", part).text("title", title.clone());

        let accepted: UploadAccepted = self
            .send_json(
                self.client
                    .post(self.url("/upload"))
                    .bearer_auth(token.as_str())
                    .multipart(form),
                "upload",
            )
            .await?;

        Ok(accepted.into_job(&title))
    }

    async fn get_report(
        &self,
        token: &AuthToken,
        job_id: JobId,
    ) -> ClientResult<TranscriptionReport> {
        self.send_json(
            self.client
                .get(self.url(&format!("/fichiers/{}/compte-rendu", job_id)))
                .bearer_auth(token.as_str()),
            "report",
        )
        .await
    }

    async fn get_pdf(&self, token: &AuthToken, job_id: JobId) -> ClientResult<Bytes> {
        let response = self
            .send(
                self.client
                    .get(self.url(&format!("/fichiers/{}/pdf", job_id)))
                    .bearer_auth(token.as_str()),
                "PDF download",
            )
            .await?;

        Ok(response.bytes().await?)
    }

    async fn health(&self) -> ClientResult<HealthStatus> {
        self.send_json(self.client.get(self.url("/health")), "health check")
            .await
    }
}
