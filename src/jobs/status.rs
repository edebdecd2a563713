//! Job lifecycle status and its rendering.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::api::{AudioJob, ClientResult};

/// Lifecycle of a backend job. Transitions are owned by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "processing" => Some(Self::Processing),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One of three mutually exclusive visual states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusBadge {
    pub status: JobStatus,
    pub label: &'static str,
    pub symbol: &'static str,
}

impl StatusBadge {
    pub fn for_status(status: JobStatus) -> Self {
        let (label, symbol) = match status {
            JobStatus::Processing => ("In progress", "…"),
            JobStatus::Completed => ("Done", "✓"),
            JobStatus::Failed => ("Failed", "✗"),
        };
        Self {
            status,
            label,
            symbol,
        }
    }

    /// Badge for a job; unknown statuses surface as `UnknownStatus`.
    pub fn for_job(job: &AudioJob) -> ClientResult<Self> {
        job.status().map(Self::for_status)
    }
}

impl fmt::Display for StatusBadge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.symbol, self.label)
    }
}
