//! Transient user-facing notices.
//!
//! Every notice auto-dismisses after the configured delay and can be
//! dismissed earlier by id.

use std::time::Duration;
use tokio::time::Instant;

use crate::api::ClientError;

/// Notice severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
    Info,
}

pub type NoticeId = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub id: NoticeId,
    pub level: NoticeLevel,
    pub text: String,
    expires_at: Instant,
}

pub struct NoticeBoard {
    dismiss_after: Duration,
    next_id: NoticeId,
    notices: Vec<Notice>,
}

impl NoticeBoard {
    pub fn new(dismiss_after: Duration) -> Self {
        Self {
            dismiss_after,
            next_id: 1,
            notices: Vec::new(),
        }
    }

    pub fn post(&mut self, level: NoticeLevel, text: impl Into<String>) -> NoticeId {
        let id = self.next_id;
        self.next_id += 1;
        self.notices.push(Notice {
            id,
            level,
            text: text.into(),
            expires_at: Instant::now() + self.dismiss_after,
        });
        id
    }

    pub fn success(&mut self, text: impl Into<String>) -> NoticeId {
        self.post(NoticeLevel::Success, text)
    }

    pub fn info(&mut self, text: impl Into<String>) -> NoticeId {
        self.post(NoticeLevel::Info, text)
    }

    /// Post the user-facing message of an error.
    pub fn error(&mut self, err: &ClientError) -> NoticeId {
        self.post(NoticeLevel::Error, err.user_message())
    }

    /// Returns false if the notice was already gone.
    pub fn dismiss(&mut self, id: NoticeId) -> bool {
        let before = self.notices.len();
        self.notices.retain(|n| n.id != id);
        self.notices.len() != before
    }

    /// Notices still visible, oldest first. Expired ones are dropped.
    pub fn active(&mut self) -> &[Notice] {
        let now = Instant::now();
        self.notices.retain(|n| n.expires_at > now);
        &self.notices
    }
}
