//! Request and response shapes of the transcription backend.

use bytes::Bytes;
use futures::Stream;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::pin::Pin;

use super::error::{ClientError, ClientResult};
use crate::jobs::JobStatus;

pub type JobId = i64;

/// Opaque bearer token. Never printed in logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(***)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "id_user")]
    pub id: i64,
    pub name: String,
    pub email: String,
}

/// The authenticated context: token plus user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: AuthToken,
    pub user: User,
}

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    pub user: User,
}

impl From<LoginResponse> for Session {
    fn from(response: LoginResponse) -> Self {
        Self {
            token: AuthToken::new(response.access_token),
            user: response.user,
        }
    }
}

/// Registration answer. The backend creates the account without issuing a
/// token, so `access_token` is usually absent.
#[derive(Debug, Deserialize)]
pub struct RegisterResponse {
    pub id_user: i64,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
}

/// One uploaded recording tracked by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioJob {
    #[serde(rename = "id_audio")]
    pub id: JobId,
    pub title: String,
    #[serde(rename = "status")]
    raw_status: String,
    #[serde(rename = "date_upload", default)]
    pub uploaded_at: Option<String>,
    #[serde(rename = "duration", default)]
    pub duration_seconds: Option<f64>,
    #[serde(rename = "num_speakers", default)]
    pub speaker_count: Option<u32>,
}

impl AudioJob {
    pub fn new(id: JobId, title: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            raw_status: status.into(),
            uploaded_at: None,
            duration_seconds: None,
            speaker_count: None,
        }
    }

    /// Status as reported by the backend, unvalidated.
    pub fn raw_status(&self) -> &str {
        &self.raw_status
    }

    /// Status mapped onto the closed set. Unrecognized values are an error,
    /// never a silent default.
    pub fn status(&self) -> ClientResult<JobStatus> {
        JobStatus::parse(&self.raw_status).ok_or_else(|| ClientError::UnknownStatus {
            id: self.id,
            status: self.raw_status.clone(),
        })
    }

    pub(crate) fn set_status(&mut self, status: JobStatus) {
        self.raw_status = status.as_str().to_string();
    }
}

/// Body of a successful upload: the job the backend just created.
#[derive(Debug, Deserialize)]
pub struct UploadAccepted {
    pub id_audio: JobId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub date_upload: Option<String>,
}

impl UploadAccepted {
    /// A freshly created job is `processing` by contract when the backend
    /// omits the field.
    pub fn into_job(self, fallback_title: &str) -> AudioJob {
        let mut job = AudioJob::new(
            self.id_audio,
            self.title.unwrap_or_else(|| fallback_title.to_string()),
            self.status
                .unwrap_or_else(|| JobStatus::Processing.as_str().to_string()),
        );
        job.uploaded_at = self.date_upload;
        job
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    #[serde(rename = "temps", default)]
    pub timestamp: Option<String>,
    #[serde(rename = "participant", default)]
    pub speaker_label: Option<String>,
    #[serde(rename = "texte", default, deserialize_with = "null_as_default")]
    pub text: String,
}

/// Structured output of a completed job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionReport {
    #[serde(rename = "titre")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub date: String,
    #[serde(rename = "duree_minutes", default)]
    pub duration_minutes: Option<f64>,
    #[serde(rename = "nombre_participants", default)]
    pub participant_count: Option<u32>,
    #[serde(rename = "resume_general", default, deserialize_with = "null_as_default")]
    pub raw_summary_text: String,
    #[serde(
        rename = "resumes_par_participant",
        default,
        deserialize_with = "null_as_default"
    )]
    pub speaker_summaries: BTreeMap<String, String>,
    #[serde(
        rename = "transcription_complete",
        default,
        deserialize_with = "null_as_default"
    )]
    pub transcript_segments: Vec<TranscriptSegment>,
}

/// The backend sends `null` for report parts it could not produce.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub database: Option<String>,
}

pub type ByteStream = Pin<Box<dyn Stream<Item = std::io::Result<Bytes>> + Send + Sync>>;

/// Multipart upload payload: the audio file as a byte stream plus its title.
pub struct UploadBody {
    pub file_name: String,
    pub mime_type: &'static str,
    pub title: String,
    pub length: u64,
    pub stream: ByteStream,
}

impl fmt::Debug for UploadBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadBody")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("title", &self.title)
            .field("length", &self.length)
            .finish()
    }
}
