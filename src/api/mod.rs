//! Backend contract consumed by the client core.
//!
//! The [`Backend`] trait is the seam between orchestration (session, uploads,
//! job tracking, downloads) and the wire. [`HttpBackend`] talks to the REST
//! service; tests substitute in-memory fakes.

pub mod error;
pub mod http;
pub mod types;

#[cfg(test)]
pub(crate) mod fake;

use async_trait::async_trait;
use bytes::Bytes;

pub use error::{ClientError, ClientResult, ErrorKind};
pub use http::HttpBackend;
pub use types::{
    AudioJob, AuthToken, ByteStream, Credentials, HealthStatus, JobId, LoginResponse,
    RegisterRequest, RegisterResponse, Session, TranscriptSegment, TranscriptionReport,
    UploadBody, User,
};

#[async_trait]
pub trait Backend: Send + Sync {
    async fn register(&self, request: &RegisterRequest) -> ClientResult<RegisterResponse>;

    async fn login(&self, credentials: &Credentials) -> ClientResult<LoginResponse>;

    /// Jobs owned by the token's user, in backend order.
    async fn list_jobs(&self, token: &AuthToken) -> ClientResult<Vec<AudioJob>>;

    async fn upload(&self, token: &AuthToken, body: UploadBody) -> ClientResult<AudioJob>;

    async fn get_report(&self, token: &AuthToken, job_id: JobId)
        -> ClientResult<TranscriptionReport>;

    async fn get_pdf(&self, token: &AuthToken, job_id: JobId) -> ClientResult<Bytes>;

    async fn health(&self) -> ClientResult<HealthStatus>;
}
